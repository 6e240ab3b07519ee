// # Availability Log Trait
//
// Defines the interface for the append-only record of identifiers that
// were observed becoming available.
//
// ## Implementations
//
// - File-based: `FileAvailabilityLog` (one `name — timestamp` line per entry)
// - In-memory: `MemoryAvailabilityLog` (testing, embedding)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for availability log implementations
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Implementation Guidelines
///
/// - **Append-only**: Entries are never rewritten or removed
/// - **Async I/O only**: Never block the engine's task
/// - **Explicit flush**: `flush()` must persist all pending appends
/// - **Thread-safe**: All methods must be safe to call concurrently
#[async_trait]
pub trait AvailabilityLog: Send + Sync {
    /// Append one entry
    ///
    /// # Parameters
    ///
    /// - `name`: The identifier that became available
    /// - `at`: Wall-clock time of the observation
    async fn append(&self, name: &str, at: DateTime<Utc>) -> Result<(), crate::Error>;

    /// Persist any pending appends
    async fn flush(&self) -> Result<(), crate::Error>;
}
