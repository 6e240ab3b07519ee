// # Identifier Store
//
// Ordered list of tracked identifiers plus per-identifier status state.
//
// ## Purpose
//
// The store is the only shared mutable state in the system. The identifier
// list is fixed at construction; each identifier carries a
// `(status, available_since)` pair that only the transition detector
// mutates.
//
// ## Locking
//
// - One lock per identifier, never a store-wide lock
// - Locks are held for the read-modify-write step only, never across a
//   network call
// - The pair is always replaced together, so `available_since` is present
//   if and only if the status is `Available`

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{Error, Result};

/// A point in time as seen by the engine
///
/// Dwell times are computed from the monotonic `instant`; `wall` is only
/// used for logs, notification timestamps and the availability log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedAt {
    /// Monotonic clock reading
    pub instant: Instant,
    /// Wall-clock reading taken at the same moment
    pub wall: DateTime<Utc>,
}

impl ObservedAt {
    /// Capture the current time
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Utc::now(),
        }
    }

    /// Elapsed monotonic time since `earlier`, never negative
    pub fn duration_since(&self, earlier: &ObservedAt) -> Duration {
        self.instant.saturating_duration_since(earlier.instant)
    }
}

/// Availability status of one identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Not yet observed as available (initial, never re-entered)
    Unknown,
    /// Last observed as available
    Available,
    /// Observed as taken after having been available
    Claimed,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Unknown => f.write_str("unknown"),
            Status::Available => f.write_str("available"),
            Status::Claimed => f.write_str("claimed"),
        }
    }
}

/// The `(status, available_since)` pair for one identifier
///
/// Fields are private; the only ways to change a state are the two legal
/// transitions below, both crate-internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierState {
    status: Status,
    available_since: Option<ObservedAt>,
}

impl IdentifierState {
    pub(crate) fn new() -> Self {
        Self {
            status: Status::Unknown,
            available_since: None,
        }
    }

    /// Current status
    pub fn status(&self) -> Status {
        self.status
    }

    /// When the identifier became available, if it currently is
    pub fn available_since(&self) -> Option<ObservedAt> {
        self.available_since
    }

    /// Enter `Available` at `at`
    pub(crate) fn mark_available(&mut self, at: ObservedAt) {
        self.status = Status::Available;
        self.available_since = Some(at);
    }

    /// Leave `Available` for `Claimed`, returning the dwell time
    ///
    /// Returns `None` and leaves the state untouched unless the identifier
    /// is currently available.
    pub(crate) fn mark_claimed(&mut self, at: ObservedAt) -> Option<Duration> {
        let since = self.available_since.take()?;
        self.status = Status::Claimed;
        Some(at.duration_since(&since))
    }
}

/// Ordered, fixed set of tracked identifiers
///
/// # Example
///
/// ```rust
/// use namewatch_core::{IdentifierStore, Status};
///
/// #[tokio::main]
/// async fn main() {
///     let store = IdentifierStore::new(["foo", "bar", "foo"]);
///
///     assert_eq!(store.names(), ["foo", "bar"]);
///     let state = store.get("foo").await.unwrap();
///     assert_eq!(state.status(), Status::Unknown);
/// }
/// ```
#[derive(Debug, Default)]
pub struct IdentifierStore {
    order: Vec<String>,
    slots: HashMap<String, Mutex<IdentifierState>>,
}

impl IdentifierStore {
    /// Create a store from identifiers in iteration order
    ///
    /// Surrounding whitespace is trimmed, empty names are skipped and
    /// duplicates collapse onto their first occurrence.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut order = Vec::new();
        let mut slots = HashMap::new();

        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || slots.contains_key(name) {
                continue;
            }
            order.push(name.to_string());
            slots.insert(name.to_string(), Mutex::new(IdentifierState::new()));
        }

        Self { order, slots }
    }

    /// Identifiers in stable iteration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Number of tracked identifiers
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Check if `name` is tracked
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Snapshot of one identifier's state
    pub async fn get(&self, name: &str) -> Option<IdentifierState> {
        match self.slots.get(name) {
            Some(slot) => Some(*slot.lock().await),
            None => None,
        }
    }

    /// Snapshot of every identifier's state, in iteration order
    pub async fn snapshot(&self) -> Vec<(String, IdentifierState)> {
        let mut out = Vec::with_capacity(self.order.len());
        for name in &self.order {
            if let Some(slot) = self.slots.get(name) {
                out.push((name.clone(), *slot.lock().await));
            }
        }
        out
    }

    /// Atomically read and modify one identifier's state pair
    ///
    /// The identifier's lock is held only while `f` runs.
    pub(crate) async fn update<F, R>(&self, name: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut IdentifierState) -> R,
    {
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| Error::not_found(name.to_string()))?;
        let mut guard = slot.lock().await;
        Ok(f(&mut guard))
    }
}
