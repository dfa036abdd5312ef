use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::display::{format_outcome, format_summary, format_update};
use crate::hexbot::api::{BlockingHexbotClient, HexbotClient};
use crate::hexbot::{Extraction, FallbackPolicy, UpdateDecoder};
use crate::limiter::RateLimiter;
use crate::logging;
use crate::pool;
use crate::shutdown;
use crate::ui::{self, App};

/// Single color unless the config asks for a `count`.
pub fn extraction_for(config: &Config) -> Extraction {
    match config.api_color_count {
        Some(_) => Extraction::List,
        None => Extraction::Single,
    }
}

/// One blocking request, printed. Any failure ends the program, including
/// a body that is not JSON.
pub fn run_once(config: &Config) -> Result<()> {
    let client = BlockingHexbotClient::new(config)?;
    let decoder = UpdateDecoder::new(extraction_for(config), FallbackPolicy::Fail);

    let body = client.fetch_body().context("calling hexbot")?;
    let update = decoder.decode(&body).context("reading hexbot response")?;

    for line in format_update(&update) {
        println!("{line}");
    }
    Ok(())
}

/// `batch_size` concurrent one-shot requests, printed once all are in.
/// Failed requests print an error line; unparseable bodies print black.
pub async fn run_batch(config: &Config) -> Result<()> {
    config.validate()?;

    let client = Arc::new(HexbotClient::new(config)?);
    let decoder = UpdateDecoder::new(extraction_for(config), FallbackPolicy::Substitute);

    let outcomes =
        pool::run_batch(config.batch_size, config.queue_capacity, client, decoder).await?;

    for outcome in &outcomes {
        for line in format_outcome(outcome) {
            println!("{line}");
        }
    }
    println!("{}", format_summary(&outcomes));
    Ok(())
}

/// The window programs: a rate-limited pool feeding the render loop until
/// the window is closed.
pub fn run_window(config: &Config) -> Result<()> {
    config.validate()?;

    // The canvas owns the terminal; without a log file nothing is logged
    if let Some(log_file) = &config.log_file {
        logging::init_file(log_file)?;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let (trigger, signal) = shutdown::channel();
    let (tx, mut rx) = mpsc::channel(config.queue_capacity);

    let client = Arc::new(HexbotClient::new(config)?);
    let decoder = UpdateDecoder::new(extraction_for(config), FallbackPolicy::Substitute);

    let mut workers = {
        let _guard = runtime.enter();
        let limiter = RateLimiter::start(config.requests_per_second, signal.clone())?;
        log::info!(
            "Polling {} with {} workers, one request every {:?}",
            client.url(),
            config.worker_count,
            limiter.interval()
        );
        pool::spawn_workers(config.worker_count, client, limiter, tx, decoder, signal)
    };

    let mut terminal = ui::setup_terminal()?;
    let mut app = App::new(config);

    let res = ui::run_app(&mut terminal, &mut app, &mut rx, config.frame_interval);

    ui::restore_terminal(&mut terminal)?;

    trigger.trigger();
    // Parked publishers wake up once the queue is gone
    drop(rx);
    runtime.block_on(async {
        let stopped = tokio::time::timeout(Duration::from_secs(2), async {
            while workers.join_next().await.is_some() {}
        })
        .await;
        if stopped.is_err() {
            log::warn!("Workers did not stop in time, aborting them");
            workers.abort_all();
        }
    });
    runtime.shutdown_timeout(Duration::from_secs(1));

    log::info!(
        "Window closed after {} updates, {} colors drawn",
        app.updates_received,
        app.colors_drawn
    );

    if let Some(path) = &config.snapshot_path {
        app.canvas
            .save_png(path)
            .with_context(|| format!("saving snapshot to {}", path.display()))?;
        println!("Saved canvas to {}", path.display());
    }

    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_for() {
        assert_eq!(extraction_for(&Config::default()), Extraction::List);
        assert_eq!(extraction_for(&Config::single_color()), Extraction::Single);
    }

    #[test]
    fn test_run_once_fails_on_unreachable_endpoint() {
        let config = Config {
            endpoint: "http://127.0.0.1:9/hexbot".to_string(),
            request_timeout: Duration::from_secs(2),
            ..Config::single_color()
        };
        let err = run_once(&config).unwrap_err();
        assert!(err.to_string().contains("calling hexbot"));
    }

    #[tokio::test]
    async fn test_run_batch_rejects_invalid_config() {
        let config = Config {
            batch_size: 100,
            queue_capacity: 10,
            ..Config::single_color()
        };
        assert!(run_batch(&config).await.is_err());

        let config = Config {
            worker_count: 0,
            ..Config::single_color()
        };
        assert!(run_batch(&config).await.is_err());
    }
}
