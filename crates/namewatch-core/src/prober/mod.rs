//! Availability prober
//!
//! Turns single-shot [`AvailabilityProbe`] calls into a verdict for one
//! identifier, owning rate-limit recovery.
//!
//! ## Retry Policy
//!
//! A rate-limited answer is not a verdict. The prober waits
//! `rate_limit_delay` and asks again, in a plain loop, until the service
//! answers or (if configured) `max_rate_limit_retries` is exhausted. Retrying
//! never touches the identifier store, so a probe that was rate limited N
//! times yields exactly what an immediate answer would have.
//!
//! ## Failures
//!
//! Network errors, timeouts and malformed bodies become
//! [`Verdict::Failed`]; the detector ignores them and the next cycle tries
//! again naturally.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cancel::{cancellable, pause};
use crate::config::{EngineConfig, ProbeConfig};
use crate::error::{Error, Result};
use crate::traits::{AvailabilityProbe, ProbeResponse};

/// The only message the validation service uses for a free username
///
/// Matched exactly; any other wording counts as claimed.
pub const VALID_MESSAGE: &str = "Username is valid";

/// Outcome of probing one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The identifier can be registered
    Available,
    /// The identifier is taken or otherwise unusable
    Claimed,
    /// No verdict could be obtained this cycle
    Failed {
        /// Raw error text
        reason: String,
    },
}

impl Verdict {
    /// Check if this verdict should leave state untouched
    pub fn is_failed(&self) -> bool {
        matches!(self, Verdict::Failed { .. })
    }
}

/// How a raw response is to be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// The service gave a definitive answer
    Verdict(Verdict),
    /// The service asked us to slow down; retry the same request
    RateLimited,
}

/// Map a raw service response onto a verdict
///
/// This is the single place where the service's wording is interpreted:
///
/// - HTTP-level rate limiting, or `code == rate_limit_code` → retry
/// - `message == "Username is valid"` (exact match) → [`Verdict::Available`]
/// - anything else → [`Verdict::Claimed`]
///
/// Banned words, length violations and similar rejections are all reported
/// as claimed; no further categories are inferred.
pub fn normalize_response(response: &ProbeResponse, rate_limit_code: i64) -> Interpretation {
    match response {
        ProbeResponse::RateLimited => Interpretation::RateLimited,
        ProbeResponse::Answered { code, .. } if *code == rate_limit_code => {
            Interpretation::RateLimited
        }
        ProbeResponse::Answered { message, .. } if message == VALID_MESSAGE => {
            Interpretation::Verdict(Verdict::Available)
        }
        ProbeResponse::Answered { .. } => Interpretation::Verdict(Verdict::Claimed),
    }
}

/// Result of [`Prober::probe`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Raw service message, or the error text for failed probes
    pub message: String,
    /// Normalized verdict
    pub verdict: Verdict,
    /// How many rate-limited answers preceded this outcome
    pub rate_limited_retries: u32,
}

/// Probes identifiers, recovering from rate limiting
pub struct Prober {
    probe: Box<dyn AvailabilityProbe>,
    rate_limit_code: i64,
    retry_delay: Duration,
    max_retries: Option<u32>,
}

impl Prober {
    /// Create a prober around a single-shot probe
    pub fn new(
        probe: Box<dyn AvailabilityProbe>,
        probe_config: &ProbeConfig,
        engine: &EngineConfig,
    ) -> Self {
        Self {
            probe,
            rate_limit_code: probe_config.rate_limit_code,
            retry_delay: engine.rate_limit_delay(),
            max_retries: engine.max_rate_limit_retries,
        }
    }

    /// Name of the underlying probe
    pub fn probe_name(&self) -> &'static str {
        self.probe.probe_name()
    }

    /// Probe `name` until the service gives a verdict
    ///
    /// # Returns
    ///
    /// - `Ok(ProbeOutcome)`: A verdict, possibly [`Verdict::Failed`]
    /// - `Err(Error::Cancelled)`: `shutdown` fired during the request or a
    ///   retry delay
    pub async fn probe(&self, name: &str, shutdown: &CancellationToken) -> Result<ProbeOutcome> {
        let mut retries = 0u32;

        loop {
            let response = match cancellable(shutdown, self.probe.check(name)).await? {
                Ok(response) => response,
                Err(e) => return Ok(Self::failed(e, retries)),
            };

            match normalize_response(&response, self.rate_limit_code) {
                Interpretation::Verdict(verdict) => {
                    let message = match response {
                        ProbeResponse::Answered { message, .. } => message,
                        ProbeResponse::RateLimited => String::new(),
                    };
                    debug!("Probe {} answered for {}: {:?}", self.probe_name(), name, verdict);
                    return Ok(ProbeOutcome {
                        message,
                        verdict,
                        rate_limited_retries: retries,
                    });
                }
                Interpretation::RateLimited => {
                    if let Some(max) = self.max_retries
                        && retries >= max
                    {
                        return Ok(Self::failed(
                            Error::rate_limited(format!(
                                "{} still rate limited after {} retries",
                                name, retries
                            )),
                            retries,
                        ));
                    }

                    retries += 1;
                    warn!(
                        "Rate limited while checking {} (retry {}), waiting {:?}",
                        name, retries, self.retry_delay
                    );
                    pause(shutdown, self.retry_delay).await?;
                }
            }
        }
    }

    fn failed(error: Error, retries: u32) -> ProbeOutcome {
        let reason = error.to_string();
        ProbeOutcome {
            message: reason.clone(),
            verdict: Verdict::Failed { reason },
            rate_limited_retries: retries,
        }
    }
}
