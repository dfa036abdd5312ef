use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{HexbotError, HexbotResult};
use crate::shutdown::ShutdownSignal;

/// Fixed-cadence token source. One token is produced every
/// `1000 / requests_per_second` ms into a single slot. The ticker waits
/// until the slot is free and restarts its period on every handoff, so an
/// idle period banks at most two tokens.
#[derive(Clone)]
pub struct RateLimiter {
    tokens: Arc<Mutex<mpsc::Receiver<Instant>>>,
    interval: Duration,
}

impl RateLimiter {
    /// Spawns the ticker on the current tokio runtime.
    pub fn start(requests_per_second: u32, shutdown: ShutdownSignal) -> HexbotResult<Self> {
        if requests_per_second == 0 {
            return Err(HexbotError::Config(
                "rate limiter needs at least one request per second".to_string(),
            ));
        }
        let interval = Duration::from_millis(1000 / requests_per_second as u64);
        Ok(Self::with_interval(interval, shutdown))
    }

    pub fn with_interval(interval: Duration, shutdown: ShutdownSignal) -> Self {
        // tokio refuses a zero period
        let interval = interval.max(Duration::from_millis(1));
        let (tx, rx) = mpsc::channel(1);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let tick = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    tick = ticker.tick() => tick,
                };
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    sent = tx.send(tick) => {
                        if sent.is_err() {
                            // every limiter handle is gone
                            break;
                        }
                        // No catch-up tick for the time spent blocked
                        ticker.reset();
                    }
                }
            }
            log::debug!("Rate limiter stopped");
        });

        Self {
            tokens: Arc::new(Mutex::new(rx)),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits for the next token. `None` once the ticker has stopped.
    pub async fn acquire(&self) -> Option<Instant> {
        let mut tokens = self.tokens.lock().await;
        tokens.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown;

    #[tokio::test]
    async fn test_zero_rate_rejected() {
        let (_trigger, signal) = shutdown::channel();
        assert!(matches!(
            RateLimiter::start(0, signal),
            Err(HexbotError::Config(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_from_rate() {
        let (_trigger, signal) = shutdown::channel();
        let limiter = RateLimiter::start(20, signal.clone()).unwrap();
        assert_eq!(limiter.interval(), Duration::from_millis(50));

        let limiter = RateLimiter::start(3, signal.clone()).unwrap();
        assert_eq!(limiter.interval(), Duration::from_millis(333));

        // Faster than the clock can tick
        let limiter = RateLimiter::start(5000, signal).unwrap();
        assert_eq!(limiter.interval(), Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_count_bounded_by_rate() {
        let (_trigger, signal) = shutdown::channel();
        let rate = 20;
        let window = Duration::from_secs(2);
        let limiter = RateLimiter::start(rate, signal).unwrap();

        let mut count = 0u64;
        let _ = tokio::time::timeout(window, async {
            while limiter.acquire().await.is_some() {
                count += 1;
            }
        })
        .await;

        let ceiling = rate as u64 * window.as_secs() + 1;
        assert!(count <= ceiling, "{count} tokens exceeds {ceiling}");
        assert!(count >= ceiling - 2, "only {count} tokens in the window");
    }

    #[tokio::test(start_paused = true)]
    async fn test_many_consumers_share_the_rate() {
        let (_trigger, signal) = shutdown::channel();
        let limiter = RateLimiter::start(10, signal).unwrap();
        let counter = Arc::new(std::sync::atomic::AtomicU64::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = limiter.clone();
            let counter = Arc::clone(&counter);
            handles.push(tokio::spawn(async move {
                while limiter.acquire().await.is_some() {
                    counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                }
            }));
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        for handle in handles {
            handle.abort();
        }

        // 8 consumers still cannot beat the cadence
        let total = counter.load(std::sync::atomic::Ordering::SeqCst);
        assert!(total <= 11, "{total} tokens handed out");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_period_keeps_window_bound() {
        let (_trigger, signal) = shutdown::channel();
        let rate = 10;
        let limiter = RateLimiter::start(rate, signal).unwrap();

        // Nobody consumes for a whole second
        tokio::time::sleep(Duration::from_secs(1)).await;

        let mut count = 0u64;
        let _ = tokio::time::timeout(Duration::from_millis(999), async {
            while limiter.acquire().await.is_some() {
                count += 1;
            }
        })
        .await;

        let ceiling = rate as u64 + 1;
        assert!(count <= ceiling, "{count} tokens after idling, bound {ceiling}");
        assert!(count >= rate as u64 - 1, "only {count} tokens after idling");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_burst_is_two_tokens() {
        let (_trigger, signal) = shutdown::channel();
        let limiter = RateLimiter::start(10, signal).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let start = Instant::now();
        limiter.acquire().await.unwrap();
        limiter.acquire().await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);

        // The third waits a full period after the handoff
        limiter.acquire().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_tokens() {
        let (trigger, signal) = shutdown::channel();
        let limiter = RateLimiter::start(50, signal).unwrap();
        assert!(limiter.acquire().await.is_some());

        trigger.trigger();

        let drained = tokio::time::timeout(Duration::from_secs(1), async {
            while limiter.acquire().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok(), "limiter kept ticking after shutdown");
    }
}
