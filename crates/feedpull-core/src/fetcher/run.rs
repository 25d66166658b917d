//! Curl multi event loop for one batch: perform, wait, messages; retry
//! retryable chunk failures with backoff, enforce the batch deadline, and
//! cancel the remaining transfers on the first fatal error.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::planner::ChunkRange;
use crate::request::RequestConfig;
use crate::retry::RetryDecision;

use super::handler::ChunkHandler;
use super::{chunk_body, classify_chunk, ChunkError, FetchOptions};

/// Runs every range in `batch` concurrently and returns the bodies in batch
/// order. Peak concurrency and buffered memory are both bounded by the batch
/// length. Fails the whole batch on deadline expiry or the first chunk error
/// the retry policy refuses; dropping the multi handle cancels whatever is
/// still in flight.
pub(super) fn run_batch(
    url: &str,
    config: &RequestConfig,
    batch: &[ChunkRange],
    opts: &FetchOptions,
) -> Result<Vec<Vec<u8>>> {
    if batch.is_empty() {
        return Ok(Vec::new());
    }

    let deadline = Instant::now() + opts.batch_deadline;
    let multi = curl::multi::Multi::new();
    let mut slots: Vec<Option<Vec<u8>>> = vec![None; batch.len()];
    let mut active: Vec<(curl::multi::Easy2Handle<ChunkHandler>, usize, u32)> =
        Vec::with_capacity(batch.len());
    let mut retry_after: Vec<(Instant, usize, u32)> = Vec::new();
    let mut first_error: Option<anyhow::Error> = None;

    for (slot, range) in batch.iter().enumerate() {
        let handle = add_chunk_transfer(&multi, url, config, *range, deadline)?;
        active.push((handle, slot, 1));
    }

    while !active.is_empty() || !retry_after.is_empty() {
        if Instant::now() >= deadline {
            first_error = Some(anyhow::anyhow!(
                "batch deadline of {:?} exceeded with {} transfers unfinished",
                opts.batch_deadline,
                active.len() + retry_after.len()
            ));
            break;
        }

        let now = Instant::now();
        while let Some(pos) = retry_after.iter().position(|(t, ..)| now >= *t) {
            let (_, slot, attempt) = retry_after.remove(pos);
            let handle = add_chunk_transfer(&multi, url, config, batch[slot], deadline)?;
            active.push((handle, slot, attempt));
        }
        if active.is_empty() {
            std::thread::sleep(next_retry_wait(&retry_after));
            continue;
        }

        let running = multi
            .perform()
            .map_err(|e| anyhow::anyhow!("curl multi perform: {}", e))?;

        let mut completed: Vec<(usize, Option<curl::Error>)> = Vec::new();
        multi.messages(|msg| {
            for (i, (handle, ..)) in active.iter().enumerate() {
                if let Some(res) = msg.result_for2(handle) {
                    completed.push((i, res.err()));
                    break;
                }
            }
        });
        completed.sort_by(|a, b| b.0.cmp(&a.0));

        for (i, transport_err) in completed {
            let (handle, slot, attempt) = active.remove(i);
            let mut easy = multi
                .remove2(handle)
                .map_err(|e| anyhow::anyhow!("curl multi remove: {}", e))?;
            let range = batch[slot];
            // A write abort comes from the handler rejecting the response;
            // the status code tells the real story, so fall through to it.
            let outcome = match transport_err {
                Some(e) if !e.is_write_error() => Err(ChunkError::Curl(e)),
                _ => {
                    let code = easy.response_code().unwrap_or(0);
                    chunk_body(code, &range, easy.get_mut())
                }
            };
            match outcome {
                Ok(body) => {
                    slots[slot] = Some(body);
                }
                Err(e) => {
                    let kind = classify_chunk(&e);
                    match opts.retry.decide(attempt, kind) {
                        RetryDecision::RetryAfter(delay) => {
                            tracing::debug!(
                                range = %range.header_value(),
                                attempt,
                                error = %e,
                                delay_ms = delay.as_millis() as u64,
                                "retrying chunk"
                            );
                            retry_after.push((Instant::now() + delay, slot, attempt + 1));
                        }
                        RetryDecision::NoRetry => {
                            first_error = Some(
                                anyhow::anyhow!("{}", e)
                                    .context(format!("range {}", range.header_value())),
                            );
                            break;
                        }
                    }
                }
            }
        }
        if first_error.is_some() {
            break;
        }

        if running > 0 {
            multi
                .wait(&mut [], next_retry_wait(&retry_after))
                .map_err(|e| anyhow::anyhow!("curl multi wait: {}", e))?;
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    let mut bodies = Vec::with_capacity(batch.len());
    for (slot, body) in slots.into_iter().enumerate() {
        match body {
            Some(b) => bodies.push(b),
            None => anyhow::bail!("range {} finished without a body", batch[slot].header_value()),
        }
    }
    Ok(bodies)
}

/// Wait until the next queued retry is due, capped at 100ms so the loop
/// keeps servicing active transfers.
fn next_retry_wait(retry_after: &[(Instant, usize, u32)]) -> Duration {
    let now = Instant::now();
    retry_after
        .iter()
        .filter_map(|(t, ..)| t.checked_duration_since(now))
        .min()
        .unwrap_or(Duration::from_millis(100))
        .min(Duration::from_millis(100))
}

/// Configures one Easy2 transfer for `range` and adds it to the multi handle.
fn add_chunk_transfer(
    multi: &curl::multi::Multi,
    url: &str,
    config: &RequestConfig,
    range: ChunkRange,
    deadline: Instant,
) -> Result<curl::multi::Easy2Handle<ChunkHandler>> {
    let mut easy = curl::easy::Easy2::new(ChunkHandler::new(range));
    easy.url(url).map_err(|e| anyhow::anyhow!("curl url: {}", e))?;
    easy.follow_location(true)
        .map_err(|e| anyhow::anyhow!("curl: {}", e))?;
    easy.max_redirections(10)
        .map_err(|e| anyhow::anyhow!("curl: {}", e))?;
    easy.connect_timeout(Duration::from_secs(30))
        .map_err(|e| anyhow::anyhow!("curl: {}", e))?;
    easy.low_speed_limit(1024)
        .map_err(|e| anyhow::anyhow!("curl: {}", e))?;
    easy.low_speed_time(Duration::from_secs(60))
        .map_err(|e| anyhow::anyhow!("curl: {}", e))?;
    // No single transfer may outlive the batch deadline.
    let remaining = deadline
        .saturating_duration_since(Instant::now())
        .max(Duration::from_secs(1));
    easy.timeout(remaining)
        .map_err(|e| anyhow::anyhow!("curl: {}", e))?;
    easy.range(&range.range_value())
        .map_err(|e| anyhow::anyhow!("curl: {}", e))?;
    easy.http_headers(config.header_list()?)
        .map_err(|e| anyhow::anyhow!("curl: {}", e))?;
    multi
        .add2(easy)
        .map_err(|e| anyhow::anyhow!("curl multi add: {}", e))
}
