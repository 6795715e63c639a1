//! Deadline wrapper for awaited external calls (stores, adapters, actions).

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, SteenBotError};

/// Await `fut`, failing with [`SteenBotError::Timeout`] if `limit` elapses first.
/// `None` waits indefinitely.
pub async fn with_timeout<T, F>(operation: &str, limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        None => fut.await,
        Some(after) => match tokio::time::timeout(after, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, ?after, "External call timed out");
                Err(SteenBotError::Timeout {
                    operation: operation.to_string(),
                    after,
                })
            }
        },
    }
}
