// # Notifier Trait
//
// Defines the interface for delivering transition notifications.
//
// ## Implementations
//
// - Discord-compatible webhooks: `namewatch-webhook-discord` crate

use async_trait::async_trait;

use crate::detector::TransitionEvent;

/// Trait for notifier implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform one HTTP request to the configured endpoint per call
/// - ✅ Build the provider-specific payload
///
/// ## Forbidden Capabilities
/// - ❌ Retry failed deliveries (notifications are at-most-once)
/// - ❌ Touch identifier state (transitions are already committed)
/// - ❌ Spawn tasks or sleep
///
/// Any non-success outcome is returned as `Err`; the dispatcher logs and
/// swallows it.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification for `event`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Endpoint accepted the message (2xx)
    /// - `Err(Error)`: Network failure or non-success status
    async fn notify(&self, event: &TransitionEvent) -> Result<(), crate::Error>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}
