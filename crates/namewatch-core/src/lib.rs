// # namewatch-core
//
// Core library for the namewatch availability polling engine.
//
// ## Architecture Overview
//
// This library tracks a fixed list of identifiers against an external
// name-validation service and reports every claimed ⇄ available edge:
// - **IdentifierStore**: Ordered identifiers plus per-identifier status state
// - **Prober**: One validation check per identifier, owns rate-limit recovery
// - **detect**: Compares a verdict with stored state, emits transition events
// - **Dispatcher**: Webhook notification + available-identifiers log append
// - **PollEngine**: Drives probe → detect → dispatch → pace, cycle after cycle
//
// ## Collaborators
//
// - **AvailabilityProbe**: Single-shot request against the validation endpoint
// - **Notifier**: Single-shot webhook delivery
// - **AvailabilityLog**: Append-only record of discovered identifiers
//
// ## Design Principles
//
// 1. **Core-owned policy**: Retries, pacing and state live here, never in
//    probe or notifier implementations
// 2. **Exactly-once per edge**: Repeated observations of a steady state never
//    re-notify
// 3. **Best-effort delivery**: Notification failures never roll back state
// 4. **Library-first**: The daemon is a thin wiring layer over this crate

mod cancel;
pub mod config;
pub mod detector;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod log;
pub mod prober;
pub mod source;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{AvailabilityLogConfig, EngineConfig, NamewatchConfig, ProbeConfig, WebhookConfig};
pub use detector::{detect, TransitionEvent};
pub use dispatch::{DeliveryOutcome, Dispatcher};
pub use engine::{EngineEvent, PollEngine};
pub use error::{Error, Result};
pub use log::{FileAvailabilityLog, MemoryAvailabilityLog};
pub use prober::{normalize_response, Interpretation, ProbeOutcome, Prober, Verdict, VALID_MESSAGE};
pub use source::load_identifiers;
pub use store::{IdentifierState, IdentifierStore, ObservedAt, Status};
pub use traits::{AvailabilityLog, AvailabilityProbe, Notifier, ProbeResponse};
