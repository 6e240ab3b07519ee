// # Availability Log Implementations
//
// This module provides implementations of the AvailabilityLog trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileAvailabilityLog;
pub use memory::MemoryAvailabilityLog;

use crate::config::AvailabilityLogConfig;
use crate::error::Result;
use crate::traits::AvailabilityLog;

/// Create the availability log described by `config`
pub async fn from_config(config: &AvailabilityLogConfig) -> Result<Box<dyn AvailabilityLog>> {
    match config {
        AvailabilityLogConfig::File { path } => Ok(Box::new(FileAvailabilityLog::open(path).await?)),
        AvailabilityLogConfig::Memory => Ok(Box::new(MemoryAvailabilityLog::new())),
    }
}
