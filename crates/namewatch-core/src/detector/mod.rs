//! Transition detection
//!
//! Compares a freshly probed verdict with the stored state of an identifier
//! and commits a transition when they disagree.
//!
//! ## Transition Table
//!
//! ```text
//! verdict      stored            action
//! ─────────    ───────────────   ─────────────────────────────────────
//! Failed       any               none
//! Available    Unknown/Claimed   → Available(since = now), AvailableEvent
//! Available    Available         none
//! Claimed      Available         → Claimed, ClaimedEvent(now − since)
//! Claimed      Unknown/Claimed   none
//! ```
//!
//! Each unavailable→available edge fires exactly one `Available` event and
//! each available→unavailable edge exactly one `Claimed` event, however many
//! cycles observe the steady state in between.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::prober::Verdict;
use crate::store::{IdentifierStore, ObservedAt, Status};

/// A committed status change for one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEvent {
    /// The identifier became available
    Available {
        /// Identifier name
        name: String,
        /// Wall-clock time of the observation
        at: DateTime<Utc>,
    },

    /// The identifier was claimed after being available
    Claimed {
        /// Identifier name
        name: String,
        /// How long it stayed available
        dwell: Duration,
        /// Wall-clock time of the observation
        at: DateTime<Utc>,
    },
}

impl TransitionEvent {
    /// Identifier this event concerns
    pub fn name(&self) -> &str {
        match self {
            TransitionEvent::Available { name, .. } | TransitionEvent::Claimed { name, .. } => {
                name
            }
        }
    }

    /// Wall-clock time of the observation that triggered the event
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            TransitionEvent::Available { at, .. } | TransitionEvent::Claimed { at, .. } => *at,
        }
    }

    /// Human-readable announcement
    ///
    /// The dwell time is given in seconds with six decimal places.
    pub fn announcement(&self) -> String {
        match self {
            TransitionEvent::Available { name, .. } => {
                format!("Username **{}** is AVAILABLE!", name)
            }
            TransitionEvent::Claimed { name, dwell, .. } => format!(
                "Username **{}** was claimed in {:.6} seconds!",
                name,
                dwell.as_secs_f64()
            ),
        }
    }
}

/// Apply `verdict` to `name`'s stored state at time `now`
///
/// # Returns
///
/// - `Ok(Some(event))`: A transition was committed
/// - `Ok(None)`: Steady state or failed probe, nothing changed
/// - `Err(Error::NotFound)`: `name` is not tracked by the store
pub async fn detect(
    store: &IdentifierStore,
    name: &str,
    verdict: &Verdict,
    now: ObservedAt,
) -> Result<Option<TransitionEvent>> {
    match verdict {
        Verdict::Failed { reason } => {
            if !store.contains(name) {
                return Err(Error::not_found(name.to_string()));
            }
            debug!("Probe for {} failed, leaving state untouched: {}", name, reason);
            Ok(None)
        }
        Verdict::Available => {
            let became_available = store
                .update(name, |state| {
                    if state.status() == Status::Available {
                        false
                    } else {
                        state.mark_available(now);
                        true
                    }
                })
                .await?;

            if !became_available {
                return Ok(None);
            }

            info!("Username '{}' is now available!", name);
            Ok(Some(TransitionEvent::Available {
                name: name.to_string(),
                at: now.wall,
            }))
        }
        Verdict::Claimed => {
            let dwell = store.update(name, |state| state.mark_claimed(now)).await?;

            Ok(dwell.map(|dwell| {
                info!(
                    "Username '{}' was claimed after {:.6} seconds!",
                    name,
                    dwell.as_secs_f64()
                );
                TransitionEvent::Claimed {
                    name: name.to_string(),
                    dwell,
                    at: now.wall,
                }
            }))
        }
    }
}
