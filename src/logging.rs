use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};

const DEFAULT_FILTER: &str = "info";

/// Text-only programs log next to their output.
pub fn init_stderr() {
    Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER)).init();
}

/// The terminal belongs to the canvas while it is open, so logs go to a file.
pub fn init_file(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
        .target(Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}
