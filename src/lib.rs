pub mod colors;
pub mod config;
pub mod display;
pub mod error;
pub mod hexbot;
pub mod limiter;
pub mod logging;
pub mod pool;
pub mod programs;
pub mod shutdown;
pub mod ui;
