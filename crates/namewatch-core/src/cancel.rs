//! Cancellation helpers shared by every blocking point in the engine

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Drive `fut` to completion unless `shutdown` fires first
pub(crate) async fn cancellable<F>(shutdown: &CancellationToken, fut: F) -> Result<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => Err(Error::Cancelled),
        output = fut => Ok(output),
    }
}

/// Sleep for `delay` unless `shutdown` fires first
///
/// A zero delay still yields once, so a loop with no configured delays
/// cannot starve other tasks.
pub(crate) async fn pause(shutdown: &CancellationToken, delay: Duration) -> Result<()> {
    if delay.is_zero() {
        tokio::task::yield_now().await;
        return if shutdown.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        };
    }
    cancellable(shutdown, tokio::time::sleep(delay)).await
}
