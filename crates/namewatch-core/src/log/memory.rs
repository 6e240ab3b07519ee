// # Memory Availability Log
//
// In-memory implementation of AvailabilityLog.
//
// ## Purpose
//
// Keeps entries in a Vec protected by a RwLock. Nothing survives a restart.
// Useful for testing and for embedders that forward events elsewhere.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::AvailabilityLog;

/// In-memory availability log
///
/// Clones share the same entries.
///
/// # Example
///
/// ```rust,no_run
/// use namewatch_core::MemoryAvailabilityLog;
/// use namewatch_core::traits::AvailabilityLog;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let log = MemoryAvailabilityLog::new();
///     log.append("foo", chrono::Utc::now()).await?;
///
///     assert_eq!(log.names().await, vec!["foo".to_string()]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryAvailabilityLog {
    inner: Arc<RwLock<Vec<(String, DateTime<Utc>)>>>,
}

impl MemoryAvailabilityLog {
    /// Create a new empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in append order
    pub async fn entries(&self) -> Vec<(String, DateTime<Utc>)> {
        self.inner.read().await.clone()
    }

    /// Names of all entries in append order
    pub async fn names(&self) -> Vec<String> {
        self.inner
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Number of entries
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the log is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl AvailabilityLog for MemoryAvailabilityLog {
    async fn append(&self, name: &str, at: DateTime<Utc>) -> Result<(), Error> {
        self.inner.write().await.push((name.to_string(), at));
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing buffered
        Ok(())
    }
}
