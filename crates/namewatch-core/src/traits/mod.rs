//! Collaborator traits for the namewatch system
//!
//! This module defines the abstract interfaces the core engine drives.
//!
//! - [`AvailabilityProbe`]: One validation request for one identifier
//! - [`Notifier`]: Deliver a transition notification
//! - [`AvailabilityLog`]: Durable record of discovered-available identifiers

pub mod availability_log;
pub mod notifier;
pub mod probe;

pub use availability_log::AvailabilityLog;
pub use notifier::Notifier;
pub use probe::{AvailabilityProbe, ProbeResponse};
