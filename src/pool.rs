use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::{HexbotError, HexbotResult};
use crate::hexbot::api::ColorSource;
use crate::hexbot::{ColorUpdate, UpdateDecoder};
use crate::limiter::RateLimiter;
use crate::shutdown::ShutdownSignal;

/// One slot of a batch run. Transport failures still occupy their slot so
/// the collector can report them.
pub type BatchOutcome = HexbotResult<ColorUpdate>;

/// One request, decoded.
pub async fn fetch_update<S>(source: &S, decoder: &UpdateDecoder) -> HexbotResult<ColorUpdate>
where
    S: ColorSource + ?Sized,
{
    let body = source.fetch_body().await?;
    decoder.decode(&body)
}

/// Starts `count` workers that loop until shutdown:
/// acquire a token, call the API, publish onto `updates`.
///
/// Publishing waits for queue space, so a slow consumer throttles the pool
/// instead of losing colors. Failed calls forfeit their iteration.
pub fn spawn_workers<S>(
    count: usize,
    source: Arc<S>,
    limiter: RateLimiter,
    updates: mpsc::Sender<ColorUpdate>,
    decoder: UpdateDecoder,
    shutdown: ShutdownSignal,
) -> JoinSet<()>
where
    S: ColorSource + ?Sized + 'static,
{
    let mut set = JoinSet::new();
    for id in 0..count {
        set.spawn(run_worker(
            id,
            Arc::clone(&source),
            limiter.clone(),
            updates.clone(),
            decoder,
            shutdown.clone(),
        ));
    }
    log::info!("Started {count} workers");
    set
}

async fn run_worker<S>(
    id: usize,
    source: Arc<S>,
    limiter: RateLimiter,
    updates: mpsc::Sender<ColorUpdate>,
    decoder: UpdateDecoder,
    shutdown: ShutdownSignal,
) where
    S: ColorSource + ?Sized,
{
    loop {
        if shutdown.is_cancelled() {
            break;
        }

        let token = tokio::select! {
            _ = shutdown.cancelled() => break,
            token = limiter.acquire() => token,
        };
        if token.is_none() {
            break;
        }

        let fetched = tokio::select! {
            _ = shutdown.cancelled() => break,
            fetched = fetch_update(source.as_ref(), &decoder) => fetched,
        };
        let update = match fetched {
            Ok(update) => update,
            Err(e) if e.is_transport() => {
                log::debug!("Worker {id}: {e}");
                continue;
            }
            Err(e) => {
                log::warn!("Worker {id}: dropping response: {e}");
                continue;
            }
        };

        tokio::select! {
            _ = shutdown.cancelled() => break,
            sent = updates.send(update) => {
                if sent.is_err() {
                    // consumer is gone
                    break;
                }
            }
        }
    }
    log::debug!("Worker {id} stopped");
}

/// Runs `count` one-shot workers, waits for every one of them, then drains
/// exactly the outcomes they published.
///
/// The queue must be able to hold the whole batch: workers publish before
/// the barrier is released, so a smaller queue would never drain.
pub async fn run_batch<S>(
    count: usize,
    capacity: usize,
    source: Arc<S>,
    decoder: UpdateDecoder,
) -> HexbotResult<Vec<BatchOutcome>>
where
    S: ColorSource + ?Sized + 'static,
{
    if count == 0 {
        return Ok(Vec::new());
    }
    if capacity < count {
        return Err(HexbotError::Config(format!(
            "queue capacity {capacity} cannot hold a batch of {count}"
        )));
    }

    let (tx, mut rx) = mpsc::channel::<BatchOutcome>(capacity);
    let mut set = JoinSet::new();

    for _ in 0..count {
        let source = Arc::clone(&source);
        let tx = tx.clone();
        set.spawn(async move {
            let outcome = fetch_update(source.as_ref(), &decoder).await;
            let _ = tx.send(outcome).await;
        });
    }
    drop(tx);

    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            log::error!("Batch worker did not finish: {e}");
        }
    }

    let mut outcomes = Vec::with_capacity(count);
    while outcomes.len() < count {
        match rx.try_recv() {
            Ok(outcome) => outcomes.push(outcome),
            Err(_) => break,
        }
    }
    log::info!("Collected {} of {count} results", outcomes.len());

    Ok(outcomes)
}
