use anyhow::Result;

use hexbot::{config::Config, logging, programs};

fn main() -> Result<()> {
    logging::init_stderr();
    println!("Hello HexBot!");

    let config = Config::single_color().with_env_overrides();
    programs::run_once(&config)
}
