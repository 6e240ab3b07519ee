// # Availability Probe Trait
//
// Defines the interface for a single validation request against the
// external name-validation service.
//
// ## Implementations
//
// - Username validation endpoint: `namewatch-probe-roblox` crate
//
// ## Usage
//
// ```rust,ignore
// use namewatch_core::AvailabilityProbe;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let probe = /* AvailabilityProbe implementation */;
//
//     match probe.check("builderman").await? {
//         ProbeResponse::Answered { message, code } => println!("{code}: {message}"),
//         ProbeResponse::RateLimited => println!("slow down"),
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What the validation service said about one identifier
///
/// This is the raw, un-normalized answer. Deciding whether it means
/// "available", "claimed" or "try again" is owned by
/// [`normalize_response`](crate::prober::normalize_response).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeResponse {
    /// The service answered with a structured body
    Answered {
        /// Human-readable message (e.g. "Username is valid")
        message: String,
        /// Numeric result code
        code: i64,
    },

    /// The service rejected the request at the transport level (HTTP 429)
    RateLimited,
}

impl ProbeResponse {
    /// Convenience constructor for an answered response
    pub fn answered(message: impl Into<String>, code: i64) -> Self {
        Self::Answered {
            message: message.into(),
            code,
        }
    }
}

/// Trait for availability probe implementations
///
/// # Trust Level: Untrusted
///
/// Probes are isolated integrations with the external service.
///
/// ## Allowed Capabilities
/// - ✅ Perform one HTTP request to their endpoint per call
/// - ✅ Parse the service's response body
/// - ✅ Return the raw answer or an error
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off on rate limiting (owned by `Prober`)
/// - ❌ Sleep or spawn tasks (violates shutdown determinism)
/// - ❌ Access the identifier store (owned by the detector)
/// - ❌ Decide what a message means (owned by `normalize_response`)
///
/// ## Errors
///
/// Transport failures, timeouts, unexpected statuses and malformed bodies
/// are returned as `Err`. The engine reports them as a failed probe and
/// leaves state untouched.
#[async_trait]
pub trait AvailabilityProbe: Send + Sync {
    /// Issue one validation request for `name`
    ///
    /// # Returns
    ///
    /// - `Ok(ProbeResponse)`: The service's raw answer
    /// - `Err(Error)`: Network failure or malformed response
    async fn check(&self, name: &str) -> Result<ProbeResponse, crate::Error>;

    /// Get the probe name (for logging/debugging)
    fn probe_name(&self) -> &'static str;
}
