use palette::{LinSrgb, Srgb};

use crate::error::{HexbotError, HexbotResult};

pub type Rgb = (u8, u8, u8);

/// Initial window background.
pub const SKY_BLUE: Rgb = (135, 206, 235);
pub const BLACK: Rgb = (0, 0, 0);
pub const WHITE: Rgb = (255, 255, 255);

/// Parses a `#RRGGBB` (or short `#RGB`) string into 8-bit channels.
pub fn parse_hex(hex: &str) -> HexbotResult<Rgb> {
    let digits = hex
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| HexbotError::InvalidHex(hex.to_string()))?;

    // palette slices by byte offset and tolerates a second '#'
    if !matches!(digits.len(), 3 | 6) || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(HexbotError::InvalidHex(hex.to_string()));
    }

    let color: Srgb<u8> = digits
        .parse()
        .map_err(|_| HexbotError::InvalidHex(hex.to_string()))?;

    Ok(color.into_components())
}

/// Calculate relative luminance of a color (WCAG formula)
pub fn relative_luminance(color: Rgb) -> f32 {
    let (r, g, b) = color;
    let linear: LinSrgb<f32> = Srgb::new(r, g, b).into_format::<f32>().into_linear();
    0.2126 * linear.red + 0.7152 * linear.green + 0.0722 * linear.blue
}

/// Calculate contrast ratio between two colors (WCAG formula)
pub fn contrast_ratio(color1: Rgb, color2: Rgb) -> f32 {
    let lum1 = relative_luminance(color1);
    let lum2 = relative_luminance(color2);

    let lighter = lum1.max(lum2);
    let darker = lum1.min(lum2);

    (lighter + 0.05) / (darker + 0.05)
}

/// Black or white, whichever reads better on `background`.
pub fn readable_text_color(background: Rgb) -> Rgb {
    if contrast_ratio(background, BLACK) >= contrast_ratio(background, WHITE) {
        BLACK
    } else {
        WHITE
    }
}
