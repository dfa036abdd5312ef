use anyhow::Result;

use hexbot::{config::Config, programs};

/// One color per request, a fixed square anywhere in the window.
fn main() -> Result<()> {
    let config = Config::single_color().with_env_overrides();
    programs::run_window(&config)
}
