use crate::colors::{self, Rgb};
use crate::hexbot::ColorUpdate;
use crate::pool::BatchOutcome;

// Terminal color constants
pub const COLOR_RESET: &str = "\x1B[0m";
pub const COLOR_BOLD: &str = "\x1B[1m";
pub const COLOR_RED: &str = "\x1B[31m";

const SWATCH_WIDTH: usize = 4;

/// Truecolor foreground escape.
pub fn fg_escape((r, g, b): Rgb) -> String {
    format!("\x1B[38;2;{r};{g};{b}m")
}

/// Truecolor background escape.
pub fn bg_escape((r, g, b): Rgb) -> String {
    format!("\x1B[48;2;{r};{g};{b}m")
}

/// One printed line for a hex string: a colored swatch and the value
/// itself. Strings that are not colors are printed bare.
pub fn format_color_line(hex: &str) -> String {
    match colors::parse_hex(hex) {
        Ok(rgb) => format!(
            "{}{}{}{COLOR_RESET} {hex}",
            bg_escape(rgb),
            fg_escape(colors::readable_text_color(rgb)),
            " ".repeat(SWATCH_WIDTH),
        ),
        Err(_) => format!("{} {hex}", " ".repeat(SWATCH_WIDTH)),
    }
}

/// Every color of an update, one line each.
pub fn format_update(update: &ColorUpdate) -> Vec<String> {
    update.hex.iter().map(|hex| format_color_line(hex)).collect()
}

pub fn format_outcome(outcome: &BatchOutcome) -> Vec<String> {
    match outcome {
        Ok(update) => format_update(update),
        Err(e) => vec![format!("{COLOR_RED}error:{COLOR_RESET} {e}")],
    }
}

pub fn format_summary(outcomes: &[BatchOutcome]) -> String {
    let failed = outcomes.iter().filter(|o| o.is_err()).count();
    let colors: usize = outcomes
        .iter()
        .filter_map(|o| o.as_ref().ok())
        .map(ColorUpdate::len)
        .sum();
    format!(
        "{COLOR_BOLD}{} requests, {colors} colors, {failed} failed{COLOR_RESET}",
        outcomes.len()
    )
}
