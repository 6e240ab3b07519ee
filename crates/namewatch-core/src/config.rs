//! Configuration types for the namewatch system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default username validation endpoint
pub const DEFAULT_PROBE_ENDPOINT: &str = "https://auth.roblox.com/v1/usernames/validate";

/// Placeholder birthdate sent with every validation request
pub const DEFAULT_PROBE_BIRTHDAY: &str = "2000-01-01";

/// Main namewatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamewatchConfig {
    /// Path to the newline-delimited identifier list
    #[serde(default = "default_identifiers_path")]
    pub identifiers_path: PathBuf,

    /// Validation probe configuration
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Webhook delivery configuration
    pub webhook: WebhookConfig,

    /// Where discovered-available identifiers are recorded
    #[serde(default)]
    pub availability_log: AvailabilityLogConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl NamewatchConfig {
    /// Create a new configuration with defaults for the given webhook URL
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            identifiers_path: default_identifiers_path(),
            probe: ProbeConfig::default(),
            webhook: WebhookConfig::new(webhook_url),
            availability_log: AvailabilityLogConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    ///
    /// An empty identifier list is not a configuration error; the engine
    /// simply idles.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.probe.validate()?;
        self.webhook.validate()?;
        self.availability_log.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Validation probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Validation endpoint (without query string)
    #[serde(default = "default_probe_endpoint")]
    pub endpoint: String,

    /// Placeholder birthdate query parameter
    #[serde(default = "default_probe_birthday")]
    pub birthday: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,

    /// Response `code` the service uses to signal rate limiting
    #[serde(default = "default_rate_limit_code")]
    pub rate_limit_code: i64,
}

impl ProbeConfig {
    /// Validate the probe configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_http_url("Probe endpoint", &self.endpoint)?;
        if self.birthday.is_empty() {
            return Err(crate::Error::config("Probe birthday cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Probe timeout must be > 0"));
        }
        Ok(())
    }

    /// Per-request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_probe_endpoint(),
            birthday: default_probe_birthday(),
            timeout_secs: default_probe_timeout_secs(),
            rate_limit_code: default_rate_limit_code(),
        }
    }
}

/// Webhook delivery configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL (treated as a secret, never logged)
    pub url: String,

    /// Recipient IDs mentioned in every message
    #[serde(default)]
    pub mention_user_ids: Vec<String>,

    /// Attach a rich embed to each message
    #[serde(default = "default_embeds")]
    pub embeds: bool,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_webhook_timeout_secs")]
    pub timeout_secs: u64,
}

// The URL embeds the webhook token
impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &"<REDACTED>")
            .field("mention_user_ids", &self.mention_user_ids)
            .field("embeds", &self.embeds)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl WebhookConfig {
    /// Create a webhook configuration with defaults
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mention_user_ids: Vec::new(),
            embeds: default_embeds(),
            timeout_secs: default_webhook_timeout_secs(),
        }
    }

    /// Set the mentioned recipient IDs
    pub fn with_mentions(mut self, ids: Vec<String>) -> Self {
        self.mention_user_ids = ids;
        self
    }

    /// Enable or disable rich embeds
    pub fn with_embeds(mut self, embeds: bool) -> Self {
        self.embeds = embeds;
        self
    }

    /// Validate the webhook configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("Webhook URL cannot be empty"));
        }
        validate_http_url("Webhook URL", &self.url)?;
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Webhook timeout must be > 0"));
        }
        if let Some(id) = self.mention_user_ids.iter().find(|id| id.trim().is_empty()) {
            return Err(crate::Error::config(format!(
                "Mention user ID cannot be blank: '{}'",
                id
            )));
        }
        Ok(())
    }

    /// Per-request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Available-identifiers log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AvailabilityLogConfig {
    /// Append-only text file
    File {
        /// Path to the log file
        path: PathBuf,
    },

    /// In-memory log (not persistent)
    Memory,
}

impl AvailabilityLogConfig {
    /// Validate the log configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            AvailabilityLogConfig::File { path } if path.as_os_str().is_empty() => Err(
                crate::Error::config("Availability log path cannot be empty"),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for AvailabilityLogConfig {
    fn default() -> Self {
        AvailabilityLogConfig::File {
            path: PathBuf::from("available_usernames.txt"),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delay after each identifier before the next one (in milliseconds)
    ///
    /// Paces the outbound request rate; has no bearing on correctness.
    #[serde(default = "default_pacing_delay_ms")]
    pub pacing_delay_ms: u64,

    /// Delay after a full cycle before the next one starts (in seconds)
    #[serde(default = "default_cycle_delay_secs")]
    pub cycle_delay_secs: u64,

    /// Spacing between retries of a rate-limited probe (in milliseconds)
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Cap on rate-limit retries per probe
    ///
    /// `None` retries until the service stops rate limiting.
    #[serde(default)]
    pub max_rate_limit_retries: Option<u32>,

    /// Pause after an unexpected cycle error (in seconds)
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_secs(self.cycle_delay_secs)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pacing_delay_ms: default_pacing_delay_ms(),
            cycle_delay_secs: default_cycle_delay_secs(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            max_rate_limit_retries: None,
            error_backoff_secs: default_error_backoff_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn validate_http_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", what)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme",
            what
        )));
    }
    Ok(())
}

fn default_identifiers_path() -> PathBuf {
    PathBuf::from("usernames.txt")
}

fn default_probe_endpoint() -> String {
    DEFAULT_PROBE_ENDPOINT.to_string()
}

fn default_probe_birthday() -> String {
    DEFAULT_PROBE_BIRTHDAY.to_string()
}

fn default_probe_timeout_secs() -> u64 {
    10
}

fn default_rate_limit_code() -> i64 {
    429
}

fn default_embeds() -> bool {
    true
}

fn default_webhook_timeout_secs() -> u64 {
    10
}

fn default_pacing_delay_ms() -> u64 {
    1000
}

fn default_cycle_delay_secs() -> u64 {
    1
}

fn default_rate_limit_delay_ms() -> u64 {
    1000
}

fn default_error_backoff_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    1000
}
