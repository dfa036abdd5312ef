use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::colors::{self, SKY_BLUE};
use crate::config::Config;
use crate::display::{Canvas, CanvasView};
use crate::hexbot::ColorUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Nothing was queued at the last poll; the frame is redrawn as is.
    Idle,
    /// The last poll drew an update.
    Drawing,
    /// The window was closed. Terminal.
    Closed,
}

/// Where and how big each rectangle lands.
#[derive(Debug, Clone)]
pub struct Placement {
    pub width: u32,
    pub height: u32,
    pub grid_interval: Option<u32>,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl Placement {
    pub fn from_config(config: &Config) -> Self {
        Self {
            width: config.window_width,
            height: config.window_height,
            grid_interval: (config.snap_to_grid && config.grid_interval > 0)
                .then_some(config.grid_interval),
            min_width: config.min_rect_width,
            max_width: config.max_rect_width,
            min_height: config.min_rect_height,
            max_height: config.max_rect_height,
        }
    }

    /// Uniform over the window, or over the window plus one grid cell and
    /// then floored onto the grid.
    pub fn position<R: Rng>(&self, rng: &mut R) -> (u32, u32) {
        match self.grid_interval {
            Some(grid) => {
                let x = rng.gen_range(0..self.width + grid);
                let y = rng.gen_range(0..self.height + grid);
                (snap(x, grid), snap(y, grid))
            }
            None => (rng.gen_range(0..self.width), rng.gen_range(0..self.height)),
        }
    }

    /// `min` when the bounds are equal, otherwise uniform in `[min, max)`.
    pub fn size<R: Rng>(&self, rng: &mut R) -> (u32, u32) {
        let w = if self.max_width > self.min_width {
            rng.gen_range(self.min_width..self.max_width)
        } else {
            self.min_width
        };
        let h = if self.max_height > self.min_height {
            rng.gen_range(self.min_height..self.max_height)
        } else {
            self.min_height
        };
        (w, h)
    }
}

/// Rounds `value` down to a multiple of `grid`.
pub fn snap(value: u32, grid: u32) -> u32 {
    if grid == 0 {
        return value;
    }
    (value / grid) * grid
}

pub struct App {
    pub title: String,
    pub canvas: Canvas,
    pub placement: Placement,
    pub state: RenderState,
    pub updates_received: u64,
    pub colors_drawn: u64,
    pub colors_skipped: u64,
    rng: StdRng,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &Config, rng: StdRng) -> Self {
        Self {
            title: config.window_title.clone(),
            canvas: Canvas::new(config.window_width, config.window_height, SKY_BLUE),
            placement: Placement::from_config(config),
            state: RenderState::Idle,
            updates_received: 0,
            colors_drawn: 0,
            colors_skipped: 0,
            rng,
        }
    }

    /// One non-blocking look at the queue. Draws the update if there is
    /// one; never waits for producers.
    pub fn poll(&mut self, updates: &mut mpsc::Receiver<ColorUpdate>) -> RenderState {
        if self.state == RenderState::Closed {
            return RenderState::Closed;
        }

        self.state = match updates.try_recv() {
            Ok(update) => {
                self.draw_update(&update);
                RenderState::Drawing
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => RenderState::Idle,
        };
        self.state
    }

    pub fn draw_update(&mut self, update: &ColorUpdate) {
        self.updates_received += 1;

        for hex in &update.hex {
            let color = match colors::parse_hex(hex) {
                Ok(color) => color,
                Err(e) => {
                    log::warn!("Skipping rectangle: {e}");
                    self.colors_skipped += 1;
                    continue;
                }
            };

            let (x, y) = self.placement.position(&mut self.rng);
            let (w, h) = self.placement.size(&mut self.rng);
            self.canvas.fill_rect(x, y, w, h, color);
            self.colors_drawn += 1;
        }
    }

    pub fn close(&mut self) {
        self.state = RenderState::Closed;
    }
}

/// Runs once per frame until the window is closed: poll the queue, redraw,
/// then wait up to `frame_interval` for a key.
pub fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    updates: &mut mpsc::Receiver<ColorUpdate>,
    frame_interval: Duration,
) -> Result<()> {
    // Clear the terminal once at the start
    terminal.clear()?;

    loop {
        app.poll(updates);

        terminal.draw(|f| ui(f, app))?;

        // Check for input events
        if event::poll(frame_interval)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let ctrl_c = key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL);
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) || ctrl_c {
                    app.close();
                }
            }
        }

        if app.state == RenderState::Closed {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Window
            Constraint::Length(1), // Status
        ])
        .split(f.area());

    let title = Line::from(Span::styled(
        format!(" {} ", app.title),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ));
    let window = Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = window.inner(chunks[0]);
    f.render_widget(window, chunks[0]);

    let canvas_area = fit_area(inner, app.canvas.width(), app.canvas.height());
    f.render_widget(CanvasView::new(&app.canvas), canvas_area);

    let state = match app.state {
        RenderState::Idle => Span::styled("idle", Style::default().fg(Color::DarkGray)),
        RenderState::Drawing => Span::styled("drawing", Style::default().fg(Color::Green)),
        RenderState::Closed => Span::styled("closed", Style::default().fg(Color::Red)),
    };

    let mut status = vec![
        Span::raw(" "),
        Span::styled(
            format!("{} colors", app.colors_drawn),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" from {} updates  ", app.updates_received),
            Style::default().fg(Color::DarkGray),
        ),
        state,
    ];
    if app.colors_skipped > 0 {
        status.push(Span::styled(
            format!("  {} skipped", app.colors_skipped),
            Style::default().fg(Color::Yellow),
        ));
    }
    status.push(Span::styled(
        "  q/Esc to quit",
        Style::default().fg(Color::DarkGray),
    ));

    f.render_widget(Paragraph::new(Line::from(status)), chunks[1]);
}

/// Largest centered area inside `area` that keeps the canvas square-pixeled
/// (one column and half a row per canvas pixel).
pub fn fit_area(area: Rect, canvas_width: u32, canvas_height: u32) -> Rect {
    if area.width == 0 || area.height == 0 || canvas_width == 0 || canvas_height == 0 {
        return Rect::new(area.x, area.y, 0, 0);
    }

    let rows_for_width =
        (area.width as u64 * canvas_height as u64 / (2 * canvas_width as u64)) as u16;
    let rows = area.height.min(rows_for_width.max(1));
    let cols = ((rows as u64 * 2 * canvas_width as u64 / canvas_height as u64) as u16)
        .clamp(1, area.width);

    Rect::new(
        area.x + (area.width - cols) / 2,
        area.y + (area.height - rows) / 2,
        cols,
        rows,
    )
}

pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    terminal.show_cursor()?;
    Ok(())
}
