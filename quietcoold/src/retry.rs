//! Bounded retry for idempotent controller reads

use quietcool_core::Result;
use std::future::Future;
use tracing::debug;

/// Total attempts for a status read, first try included
pub const STATUS_READ_ATTEMPTS: u32 = 5;

/// Run `request_fn` up to `attempts` times.
///
/// Only transient failures (see [`quietcool_core::QuietCoolError::is_transient`])
/// are repeated, immediately and without backoff. Any other error, or the
/// last transient one, is returned as is. Must only wrap reads: a repeated
/// write after an ambiguous failure could apply a state change twice.
pub async fn retry_transient<F, Fut, T>(attempts: u32, operation: &str, mut request_fn: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;

    loop {
        match request_fn().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < attempts => {
                debug!(
                    operation,
                    attempt,
                    attempts,
                    "Transient failure, retrying: {}",
                    e
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
