use anyhow::Result;

use hexbot::{config::Config, programs};

/// Many colors per request, snapped to a grid, at 20 requests a second.
fn main() -> Result<()> {
    let config = Config::from_env();
    programs::run_window(&config)
}
