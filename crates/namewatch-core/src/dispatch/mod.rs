//! Notification dispatch
//!
//! Delivers committed transitions to the notifier and records newly
//! available identifiers in the availability log.
//!
//! ## Guarantees
//!
//! - Best-effort, at-most-once per edge: a failed delivery is logged and
//!   dropped, never retried
//! - Delivery never rolls back the transition; state is already committed
//!   when dispatch starts
//! - The availability log append for an `Available` event happens whether
//!   or not the webhook accepts the message

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancel::cancellable;
use crate::detector::TransitionEvent;
use crate::error::Result;
use crate::traits::{AvailabilityLog, Notifier};

/// What happened to a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint accepted the message
    Delivered,
    /// Delivery failed; the error was logged and swallowed
    Failed {
        /// Raw error text
        error: String,
    },
}

impl DeliveryOutcome {
    /// Check if the message was accepted
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Turns transition events into notifications and log entries
pub struct Dispatcher {
    notifier: Box<dyn Notifier>,
    log: Box<dyn AvailabilityLog>,
}

impl Dispatcher {
    /// Create a dispatcher
    pub fn new(notifier: Box<dyn Notifier>, log: Box<dyn AvailabilityLog>) -> Self {
        Self { notifier, log }
    }

    /// Dispatch one event
    ///
    /// # Returns
    ///
    /// - `Ok(DeliveryOutcome)`: Whether the notifier accepted the message
    /// - `Err(Error::Cancelled)`: `shutdown` fired during the log append or
    ///   the webhook call
    pub async fn dispatch(
        &self,
        event: &TransitionEvent,
        shutdown: &CancellationToken,
    ) -> Result<DeliveryOutcome> {
        if let TransitionEvent::Available { name, at } = event {
            match cancellable(shutdown, self.log.append(name, *at)).await? {
                Ok(()) => debug!("Recorded {} in availability log", name),
                Err(e) => warn!("Failed to record {} in availability log: {}", name, e),
            }
        }

        let outcome = match cancellable(shutdown, self.notifier.notify(event)).await? {
            Ok(()) => {
                info!(
                    "Notification sent for: {} ({})",
                    event.name(),
                    Self::kind(event)
                );
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                warn!(
                    "Error sending notification via {} for {}: {}",
                    self.notifier.notifier_name(),
                    event.name(),
                    e
                );
                DeliveryOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        Ok(outcome)
    }

    /// Persist pending availability log entries
    pub async fn flush(&self) -> Result<()> {
        self.log.flush().await
    }

    fn kind(event: &TransitionEvent) -> &'static str {
        match event {
            TransitionEvent::Available { .. } => "available",
            TransitionEvent::Claimed { .. } => "claimed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::log::MemoryAvailabilityLog;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingNotifier {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(&self, _event: &TransitionEvent) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::notifier("counting", "HTTP 500"))
            } else {
                Ok(())
            }
        }

        fn notifier_name(&self) -> &'static str {
            "counting"
        }
    }

    fn dispatcher(fail: bool) -> (Dispatcher, Arc<AtomicUsize>, MemoryAvailabilityLog) {
        let calls = Arc::new(AtomicUsize::new(0));
        let log = MemoryAvailabilityLog::new();
        let dispatcher = Dispatcher::new(
            Box::new(CountingNotifier {
                calls: Arc::clone(&calls),
                fail,
            }),
            Box::new(log.clone()),
        );
        (dispatcher, calls, log)
    }

    fn available(name: &str) -> TransitionEvent {
        TransitionEvent::Available {
            name: name.to_string(),
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_available_notifies_and_logs() {
        let (dispatcher, calls, log) = dispatcher(false);

        let outcome = dispatcher
            .dispatch(&available("foo"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.is_delivered());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(log.names().await, vec!["foo".to_string()]);
    }

    #[tokio::test]
    async fn test_claimed_does_not_log() {
        let (dispatcher, calls, log) = dispatcher(false);
        let event = TransitionEvent::Claimed {
            name: "foo".to_string(),
            dwell: Duration::from_secs(5),
            at: Utc::now(),
        };

        dispatcher
            .dispatch(&event, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_delivery_still_logs() {
        let (dispatcher, calls, log) = dispatcher(true);

        let outcome = dispatcher
            .dispatch(&available("foo"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(outcome, DeliveryOutcome::Failed { ref error } if error.contains("HTTP 500")));
        assert_eq!(calls.load(Ordering::SeqCst), 1, "failed delivery is not retried");
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn test_cancelled_dispatch() {
        let (dispatcher, calls, _log) = dispatcher(false);
        let token = CancellationToken::new();
        token.cancel();

        let result = dispatcher.dispatch(&available("foo"), &token).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
