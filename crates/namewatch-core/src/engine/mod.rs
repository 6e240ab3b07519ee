//! Poll scheduler
//!
//! The PollEngine is responsible for:
//! - Visiting every tracked identifier, in order, once per cycle
//! - Probing, detecting transitions and dispatching notifications
//! - Pacing outbound requests between identifiers and between cycles
//! - Stopping cleanly when the shutdown signal fires
//!
//! ## Architecture
//!
//! ```text
//!                          ┌──────────────┐
//!                          │  PollEngine  │
//!                          └──────────────┘
//!                                  │ for each identifier
//!         ┌────────────────────────┼────────────────────────┐
//!         │                        │                        │
//!         ▼                        ▼                        ▼
//! ┌──────────────┐        ┌─────────────────┐      ┌──────────────┐
//! │    Prober    │ ─────▶ │ detect (Store)  │ ───▶ │  Dispatcher  │
//! │ (rate limit) │verdict │ (state commit)  │event │ (webhook+log)│
//! └──────────────┘        └─────────────────┘      └──────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Probe the identifier (retrying while rate limited)
//! 2. Commit any transition in the IdentifierStore
//! 3. Dispatch the transition, if any
//! 4. Wait the pacing delay, move to the next identifier
//! 5. After the last identifier, wait the cycle delay and start over
//!
//! ## Cancellation
//!
//! The shutdown token is observed at every blocking point (probe request,
//! rate-limit delay, webhook call, log append, pacing and cycle delays).
//! Identifiers are independent, so abandoning a cycle midway leaves every
//! state pair consistent.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cancel::pause;
use crate::config::NamewatchConfig;
use crate::detector::{TransitionEvent, detect};
use crate::dispatch::{DeliveryOutcome, Dispatcher};
use crate::error::{Error, Result};
use crate::prober::{Prober, Verdict};
use crate::store::{IdentifierStore, ObservedAt};
use crate::traits::{AvailabilityLog, AvailabilityProbe, Notifier};

/// Events emitted by the PollEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        identifiers_count: usize,
    },

    /// A probe produced a verdict
    ProbeCompleted {
        name: String,
        message: String,
        verdict: Verdict,
    },

    /// A probe failed; state was left untouched
    ProbeFailed {
        name: String,
        error: String,
    },

    /// The service rate limited a probe before it was answered
    RateLimited {
        name: String,
        retries: u32,
    },

    /// A transition was committed
    Transition(TransitionEvent),

    /// The notifier accepted a transition notification
    NotificationDelivered {
        name: String,
    },

    /// The notifier rejected a transition notification
    NotificationFailed {
        name: String,
        error: String,
    },

    /// Every identifier was visited
    CycleCompleted {
        cycle: u64,
        identifiers_count: usize,
    },

    /// A cycle was abandoned after an unexpected error
    CycleFailed {
        cycle: u64,
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Core polling engine
///
/// ## Lifecycle
///
/// 1. Create with [`PollEngine::new()`]
/// 2. Start with [`PollEngine::run()`] or [`PollEngine::run_with_shutdown()`]
/// 3. Engine cycles until the shutdown signal fires
/// 4. The availability log is flushed before returning
///
/// ## Threading
///
/// Identifiers are processed strictly one after another on the caller's
/// task. Per-identifier state lives behind its own lock in the
/// [`IdentifierStore`], so readers (status reporting) never block the loop
/// for longer than one state update.
pub struct PollEngine {
    /// Tracked identifiers and their state
    store: Arc<IdentifierStore>,

    /// Probe wrapper owning rate-limit recovery
    prober: Prober,

    /// Webhook + availability log
    dispatcher: Dispatcher,

    /// Delay after each identifier
    pacing_delay: Duration,

    /// Delay after each full cycle
    cycle_delay: Duration,

    /// Pause after an unexpected cycle error
    error_backoff: Duration,

    /// Number of cycles started so far
    cycles: AtomicU64,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl PollEngine {
    /// Create a new polling engine
    ///
    /// # Parameters
    ///
    /// - `store`: Identifiers to track
    /// - `probe`: Single-shot validation probe
    /// - `notifier`: Single-shot notification delivery
    /// - `log`: Availability log
    /// - `config`: namewatch configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        store: Arc<IdentifierStore>,
        probe: Box<dyn AvailabilityProbe>,
        notifier: Box<dyn Notifier>,
        log: Box<dyn AvailabilityLog>,
        config: &NamewatchConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            store,
            prober: Prober::new(probe, &config.probe, &config.engine),
            dispatcher: Dispatcher::new(notifier, log),
            pacing_delay: config.engine.pacing_delay(),
            cycle_delay: config.engine.cycle_delay(),
            error_backoff: config.engine.error_backoff(),
            cycles: AtomicU64::new(0),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Shared handle to the identifier store
    pub fn store(&self) -> &Arc<IdentifierStore> {
        &self.store
    }

    /// Run the engine until Ctrl-C
    ///
    /// Embedders that manage their own shutdown should use
    /// [`PollEngine::run_with_shutdown()`] instead.
    pub async fn run(&self) -> Result<()> {
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
                trigger.cancel();
            }
        });

        let result = self.run_with_shutdown(shutdown).await;
        watcher.abort();
        result
    }

    /// Run the engine until `shutdown` is cancelled
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: The availability log could not be flushed
    ///
    /// A cycle that fails with anything but cancellation, panics included,
    /// emits [`EngineEvent::CycleFailed`] and polling resumes after the
    /// error backoff.
    pub async fn run_with_shutdown(&self, shutdown: CancellationToken) -> Result<()> {
        info!(
            "Starting poll engine with {} identifiers (probe: {})",
            self.store.len(),
            self.prober.probe_name()
        );
        self.emit_event(EngineEvent::Started {
            identifiers_count: self.store.len(),
        });

        loop {
            // A panicking collaborator fails the cycle, not the engine
            let cycle = AssertUnwindSafe(self.run_cycle(&shutdown))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(Error::panicked(payload.as_ref())));

            match cycle {
                Ok(()) => {
                    if pause(&shutdown, self.cycle_delay).await.is_err() {
                        break;
                    }
                }
                Err(Error::Cancelled) => break,
                Err(e) => {
                    error!("Cycle failed: {}", e);
                    self.emit_event(EngineEvent::CycleFailed {
                        cycle: self.cycles.load(Ordering::SeqCst),
                        error: e.to_string(),
                    });
                    // Keep polling
                    if pause(&shutdown, self.error_backoff).await.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Poll loop stopped");
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        // Flush the availability log before exiting
        self.dispatcher.flush().await?;
        info!("Availability log flushed, engine stopped");

        Ok(())
    }

    /// Run exactly one cycle over every identifier
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Every identifier was visited
    /// - `Err(Error::Cancelled)`: `shutdown` fired mid-cycle
    /// - `Err(Error)`: Unexpected failure, the rest of the cycle was skipped
    pub async fn run_cycle(&self, shutdown: &CancellationToken) -> Result<()> {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Starting cycle {}", cycle);

        for name in self.store.names() {
            self.process_identifier(name, shutdown).await?;
            pause(shutdown, self.pacing_delay).await?;
        }

        self.emit_event(EngineEvent::CycleCompleted {
            cycle,
            identifiers_count: self.store.len(),
        });
        Ok(())
    }

    /// Probe, detect and dispatch for one identifier
    async fn process_identifier(&self, name: &str, shutdown: &CancellationToken) -> Result<()> {
        let outcome = self.prober.probe(name, shutdown).await?;
        let now = ObservedAt::now();

        if outcome.rate_limited_retries > 0 {
            self.emit_event(EngineEvent::RateLimited {
                name: name.to_string(),
                retries: outcome.rate_limited_retries,
            });
        }

        match &outcome.verdict {
            Verdict::Failed { reason } => {
                warn!("Checking {}: {}", name, reason);
                self.emit_event(EngineEvent::ProbeFailed {
                    name: name.to_string(),
                    error: reason.clone(),
                });
            }
            verdict => {
                info!("Checking {}: {}", name, outcome.message);
                self.emit_event(EngineEvent::ProbeCompleted {
                    name: name.to_string(),
                    message: outcome.message.clone(),
                    verdict: verdict.clone(),
                });
            }
        }

        let Some(event) = detect(&self.store, name, &outcome.verdict, now).await? else {
            return Ok(());
        };

        self.emit_event(EngineEvent::Transition(event.clone()));

        // State is committed; delivery is best-effort from here on
        match self.dispatcher.dispatch(&event, shutdown).await? {
            DeliveryOutcome::Delivered => {
                self.emit_event(EngineEvent::NotificationDelivered {
                    name: name.to_string(),
                });
            }
            DeliveryOutcome::Failed { error } => {
                self.emit_event(EngineEvent::NotificationFailed {
                    name: name.to_string(),
                    error,
                });
            }
        }

        Ok(())
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        // Dropped when the channel is full so a slow consumer never stalls polling
        if self.event_tx.try_send(event).is_err() {
            warn!(
                "Event channel full, dropping event. Consider increasing event_channel_capacity."
            );
        }
    }
}
