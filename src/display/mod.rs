pub mod formatter;

pub use formatter::*;

use std::path::Path;

use anyhow::Result;
use image::{Rgb as Pixel, RgbImage};
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

use crate::colors::Rgb;

/// The window surface: a fixed-size pixel buffer that rectangles accumulate
/// on. Only the initial background fill ever clears it.
#[derive(Clone)]
pub struct Canvas {
    pixels: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        let (r, g, b) = background;
        Self {
            pixels: RgbImage::from_pixel(width, height, Pixel([r, g, b])),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        self.pixels
            .get_pixel_checked(x, y)
            .map(|&Pixel([r, g, b])| (r, g, b))
    }

    /// Solid `w` x `h` rectangle with its top-left corner at (`x`, `y`).
    /// Whatever falls outside the canvas is dropped.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb) {
        let (r, g, b) = color;
        let x_end = x.saturating_add(w).min(self.width());
        let y_end = y.saturating_add(h).min(self.height());

        for py in y..y_end {
            for px in x..x_end {
                self.pixels.put_pixel(px, py, Pixel([r, g, b]));
            }
        }
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.pixels.save(path)?;
        Ok(())
    }
}

/// Draws the canvas scaled into a terminal area, two canvas rows per cell
/// using the upper half block.
pub struct CanvasView<'a> {
    canvas: &'a Canvas,
}

impl<'a> CanvasView<'a> {
    pub fn new(canvas: &'a Canvas) -> Self {
        Self { canvas }
    }

    fn sample(&self, col: u16, row: u32, area: Rect) -> Color {
        // nearest neighbour
        let x = col as u32 * self.canvas.width() / area.width as u32;
        let y = row * self.canvas.height() / (area.height as u32 * 2);
        let (r, g, b) = self.canvas.pixel(x, y).unwrap_or((0, 0, 0));
        Color::Rgb(r, g, b)
    }
}

impl Widget for CanvasView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        for cy in 0..area.height {
            for cx in 0..area.width {
                let top = self.sample(cx, cy as u32 * 2, area);
                let bottom = self.sample(cx, cy as u32 * 2 + 1, area);
                if let Some(cell) = buf.cell_mut((area.x + cx, area.y + cy)) {
                    cell.set_symbol("▀").set_fg(top).set_bg(bottom);
                }
            }
        }
    }
}
