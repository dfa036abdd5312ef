use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{HexbotError, HexbotResult};

pub const DEFAULT_ENDPOINT: &str = "https://api.noopschallenge.com/hexbot";
pub const DEFAULT_WINDOW_TITLE: &str = "HexBot!";

/// Every tunable of the four programs. Components receive the pieces they
/// need at construction instead of reading globals.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub min_rect_width: u32,
    pub min_rect_height: u32,
    pub max_rect_width: u32,
    pub max_rect_height: u32,
    /// `None` asks the API for its default single color.
    pub api_color_count: Option<u32>,
    pub snap_to_grid: bool,
    pub grid_interval: u32,
    pub requests_per_second: u32,
    pub worker_count: usize,
    pub batch_size: usize,
    pub queue_capacity: usize,
    pub request_timeout: Duration,
    pub frame_interval: Duration,
    pub snapshot_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            window_title: DEFAULT_WINDOW_TITLE.to_string(),
            window_width: 400,
            window_height: 400,
            min_rect_width: 5,
            min_rect_height: 5,
            max_rect_width: 5,
            max_rect_height: 5,
            api_color_count: Some(200),
            snap_to_grid: true,
            grid_interval: 5,
            requests_per_second: 20,
            worker_count: 50,
            batch_size: 100,
            queue_capacity: 100,
            request_timeout: Duration::from_secs(10),
            frame_interval: Duration::from_millis(16),
            snapshot_path: None,
            log_file: None,
        }
    }
}

impl Config {
    /// One color per request, fixed square, no grid.
    pub fn single_color() -> Self {
        Self {
            min_rect_width: 10,
            min_rect_height: 10,
            max_rect_width: 10,
            max_rect_height: 10,
            api_color_count: None,
            snap_to_grid: false,
            ..Self::default()
        }
    }

    /// Applies `HEXBOT_*` overrides (after loading `.env`) on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        dotenv::dotenv().ok();

        if let Ok(endpoint) = std::env::var("HEXBOT_ENDPOINT") {
            self.endpoint = endpoint;
        }
        override_from_env("HEXBOT_WINDOW_WIDTH", &mut self.window_width);
        override_from_env("HEXBOT_WINDOW_HEIGHT", &mut self.window_height);
        override_from_env("HEXBOT_SNAP_TO_GRID", &mut self.snap_to_grid);
        override_from_env("HEXBOT_GRID_INTERVAL", &mut self.grid_interval);
        override_from_env("HEXBOT_REQUESTS_PER_SECOND", &mut self.requests_per_second);
        override_from_env("HEXBOT_WORKERS", &mut self.worker_count);
        override_from_env("HEXBOT_BATCH_SIZE", &mut self.batch_size);
        override_from_env("HEXBOT_QUEUE_CAPACITY", &mut self.queue_capacity);

        if let Some(count) = parse_env::<u32>("HEXBOT_COLOR_COUNT") {
            // 0 means "let the API pick", which is a single color
            self.api_color_count = (count > 0).then_some(count);
        }
        if let Some(secs) = parse_env::<u64>("HEXBOT_TIMEOUT_SECS") {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(path) = std::env::var("HEXBOT_SNAPSHOT") {
            self.snapshot_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("HEXBOT_LOG_FILE") {
            self.log_file = Some(PathBuf::from(path));
        }

        self
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn validate(&self) -> HexbotResult<()> {
        if self.requests_per_second == 0 {
            return Err(HexbotError::Config(
                "requests_per_second must be at least 1".to_string(),
            ));
        }
        if self.worker_count == 0 {
            return Err(HexbotError::Config(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(HexbotError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(HexbotError::Config(format!(
                "window size {}x{} is empty",
                self.window_width, self.window_height
            )));
        }
        if self.snap_to_grid && self.grid_interval == 0 {
            return Err(HexbotError::Config(
                "grid_interval must be at least 1 when snapping".to_string(),
            ));
        }
        if self.min_rect_width == 0 || self.min_rect_height == 0 {
            return Err(HexbotError::Config(
                "rectangles need a non-zero minimum size".to_string(),
            ));
        }
        if self.min_rect_width > self.max_rect_width || self.min_rect_height > self.max_rect_height
        {
            return Err(HexbotError::Config(format!(
                "rectangle bounds are inverted: min {}x{}, max {}x{}",
                self.min_rect_width,
                self.min_rect_height,
                self.max_rect_width,
                self.max_rect_height
            )));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}

fn override_from_env<T: FromStr>(key: &str, slot: &mut T) {
    if let Some(value) = parse_env(key) {
        *slot = value;
    }
}
