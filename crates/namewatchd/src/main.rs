// # namewatchd - Username Availability Daemon
//
// ⚠️ ARCHITECTURAL CONSTRAINTS ⚠️
//
// - This is a THIN integration layer ONLY
// - DO NOT add detection, retry or pacing logic here
// - All polling logic MUST be in namewatch-core
// - Configuration is via environment variables ONLY
//
// The namewatchd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Loading the identifier list and wiring probe, notifier and log
// 4. Running the poll engine until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Webhook
// - `NAMEWATCH_WEBHOOK_URL`: Discord webhook URL (required)
// - `NAMEWATCH_MENTION_IDS`: Comma-separated user IDs to mention
// - `NAMEWATCH_EMBEDS`: Attach a rich embed (true/false, default true)
//
// ### Files
// - `NAMEWATCH_IDENTIFIERS_PATH`: Identifier list (default usernames.txt)
// - `NAMEWATCH_LOG_PATH`: Available-identifiers log (default available_usernames.txt)
//
// ### Probe
// - `NAMEWATCH_PROBE_URL`: Validation endpoint
// - `NAMEWATCH_PROBE_BIRTHDAY`: Placeholder birthdate (default 2000-01-01)
// - `NAMEWATCH_PROBE_TIMEOUT_SECS`: Request timeout (default 10)
// - `NAMEWATCH_RATE_LIMIT_CODE`: Rate-limit sentinel code (default 429)
//
// ### Engine
// - `NAMEWATCH_PACING_MS`: Delay between identifiers (default 1000)
// - `NAMEWATCH_CYCLE_DELAY_SECS`: Delay between cycles (default 1)
// - `NAMEWATCH_RATE_LIMIT_DELAY_MS`: Delay between rate-limit retries (default 1000)
// - `NAMEWATCH_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export NAMEWATCH_WEBHOOK_URL=https://discord.com/api/webhooks/...
// export NAMEWATCH_MENTION_IDS=123456789012345678
// echo builderman > usernames.txt
//
// namewatchd
// ```

use anyhow::Result;
use namewatch_core::config::{AvailabilityLogConfig, NamewatchConfig};
use namewatch_core::{EngineEvent, IdentifierStore, PollEngine};
use namewatch_probe_roblox::RobloxProbe;
use namewatch_webhook_discord::DiscordWebhook;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long the engine may take to stop after a signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum NamewatchExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<NamewatchExitCode> for ExitCode {
    fn from(code: NamewatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    webhook_url: String,
    mention_ids: Vec<String>,
    embeds: bool,
    identifiers_path: PathBuf,
    log_path: PathBuf,
    probe_url: Option<String>,
    probe_birthday: Option<String>,
    probe_timeout_secs: Option<u64>,
    rate_limit_code: Option<i64>,
    pacing_ms: Option<u64>,
    cycle_delay_secs: Option<u64>,
    rate_limit_delay_ms: Option<u64>,
    log_level: String,
}

// Custom Debug implementation that hides the webhook URL
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("webhook_url", &"<REDACTED>")
            .field("mention_ids", &self.mention_ids)
            .field("embeds", &self.embeds)
            .field("identifiers_path", &self.identifiers_path)
            .field("log_path", &self.log_path)
            .field("probe_url", &self.probe_url)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            webhook_url: lookup("NAMEWATCH_WEBHOOK_URL").unwrap_or_default(),
            mention_ids: lookup("NAMEWATCH_MENTION_IDS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            embeds: parse_bool("NAMEWATCH_EMBEDS", lookup("NAMEWATCH_EMBEDS"))?.unwrap_or(true),
            identifiers_path: lookup("NAMEWATCH_IDENTIFIERS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("usernames.txt")),
            log_path: lookup("NAMEWATCH_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("available_usernames.txt")),
            probe_url: lookup("NAMEWATCH_PROBE_URL"),
            probe_birthday: lookup("NAMEWATCH_PROBE_BIRTHDAY"),
            probe_timeout_secs: parse_number(
                "NAMEWATCH_PROBE_TIMEOUT_SECS",
                lookup("NAMEWATCH_PROBE_TIMEOUT_SECS"),
            )?,
            rate_limit_code: parse_number(
                "NAMEWATCH_RATE_LIMIT_CODE",
                lookup("NAMEWATCH_RATE_LIMIT_CODE"),
            )?,
            pacing_ms: parse_number("NAMEWATCH_PACING_MS", lookup("NAMEWATCH_PACING_MS"))?,
            cycle_delay_secs: parse_number(
                "NAMEWATCH_CYCLE_DELAY_SECS",
                lookup("NAMEWATCH_CYCLE_DELAY_SECS"),
            )?,
            rate_limit_delay_ms: parse_number(
                "NAMEWATCH_RATE_LIMIT_DELAY_MS",
                lookup("NAMEWATCH_RATE_LIMIT_DELAY_MS"),
            )?,
            log_level: lookup("NAMEWATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.webhook_url.is_empty() {
            anyhow::bail!(
                "NAMEWATCH_WEBHOOK_URL is required. \
                Set it via: export NAMEWATCH_WEBHOOK_URL=https://discord.com/api/webhooks/..."
            );
        }

        // The URL carries the webhook token, so it is never echoed back
        if !self.webhook_url.starts_with("https://") && !self.webhook_url.starts_with("http://")
        {
            anyhow::bail!("NAMEWATCH_WEBHOOK_URL must use HTTP or HTTPS scheme");
        }

        for id in &self.mention_ids {
            if !id.chars().all(|c| c.is_ascii_digit()) {
                anyhow::bail!(
                    "NAMEWATCH_MENTION_IDS must contain numeric user IDs. Got: '{}'",
                    id
                );
            }
        }

        if let Some(ref url) = self.probe_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            anyhow::bail!(
                "NAMEWATCH_PROBE_URL must use HTTP or HTTPS scheme. Got: {}",
                url
            );
        }

        if self.log_path.as_os_str().is_empty() {
            anyhow::bail!("NAMEWATCH_LOG_PATH cannot be empty");
        }

        if let Some(timeout) = self.probe_timeout_secs
            && !(1..=300).contains(&timeout)
        {
            anyhow::bail!(
                "NAMEWATCH_PROBE_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                timeout
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "NAMEWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the library configuration
    fn to_namewatch_config(&self) -> NamewatchConfig {
        let mut config = NamewatchConfig::new(self.webhook_url.clone());
        config.identifiers_path = self.identifiers_path.clone();
        config.webhook = config
            .webhook
            .with_mentions(self.mention_ids.clone())
            .with_embeds(self.embeds);
        config.availability_log = AvailabilityLogConfig::File {
            path: self.log_path.clone(),
        };

        if let Some(ref url) = self.probe_url {
            config.probe.endpoint = url.clone();
        }
        if let Some(ref birthday) = self.probe_birthday {
            config.probe.birthday = birthday.clone();
        }
        if let Some(timeout) = self.probe_timeout_secs {
            config.probe.timeout_secs = timeout;
        }
        if let Some(code) = self.rate_limit_code {
            config.probe.rate_limit_code = code;
        }
        if let Some(pacing) = self.pacing_ms {
            config.engine.pacing_delay_ms = pacing;
        }
        if let Some(delay) = self.cycle_delay_secs {
            config.engine.cycle_delay_secs = delay;
        }
        if let Some(delay) = self.rate_limit_delay_ms {
            config.engine.rate_limit_delay_ms = delay;
        }

        config
    }

    fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn parse_number<T>(key: &str, value: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("{} must be a number. Got: '{}' ({})", key, raw, e))
        })
        .transpose()
}

fn parse_bool(key: &str, value: Option<String>) -> Result<Option<bool>> {
    value
        .map(|raw| match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(anyhow::anyhow!(
                "{} must be true or false. Got: '{}'",
                key,
                raw
            )),
        })
        .transpose()
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return NamewatchExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return NamewatchExitCode::ConfigError.into();
    }

    let namewatch_config = config.to_namewatch_config();
    if let Err(e) = namewatch_config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return NamewatchExitCode::ConfigError.into();
    }

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NamewatchExitCode::ConfigError.into();
    }

    info!("Starting namewatchd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NamewatchExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match build_engine(&namewatch_config).await {
            Ok((engine, events)) => {
                if let Err(e) = run_daemon(engine, events).await {
                    error!("Daemon error: {}", e);
                    NamewatchExitCode::RuntimeError
                } else {
                    NamewatchExitCode::CleanShutdown
                }
            }
            Err(e) => {
                error!("Startup error: {}", e);
                NamewatchExitCode::ConfigError
            }
        }
    });

    result.into()
}

/// Load identifiers and wire the engine's collaborators
async fn build_engine(
    config: &NamewatchConfig,
) -> Result<(PollEngine, mpsc::Receiver<EngineEvent>)> {
    let identifiers = namewatch_core::load_identifiers(&config.identifiers_path).await?;
    let store = Arc::new(IdentifierStore::new(identifiers));
    if store.is_empty() {
        warn!(
            "No identifiers to check; add one per line to {}",
            config.identifiers_path.display()
        );
    }
    info!("Loaded {} username(s)", store.len());

    let probe = RobloxProbe::from_config(&config.probe)?;
    let notifier = DiscordWebhook::from_config(&config.webhook)?;
    let log = namewatch_core::log::from_config(&config.availability_log).await?;

    let (engine, events) =
        PollEngine::new(store, Box::new(probe), Box::new(notifier), log, config)?;
    Ok((engine, events))
}

/// Run the engine until a shutdown signal
async fn run_daemon(engine: PollEngine, events: mpsc::Receiver<EngineEvent>) -> Result<()> {
    let monitor = tokio::spawn(monitor_events(events));

    let shutdown = CancellationToken::new();
    let engine_task = engine.run_with_shutdown(shutdown.clone());
    tokio::pin!(engine_task);

    let result: Result<()> = tokio::select! {
        result = &mut engine_task => result.map_err(Into::into),
        signal = wait_for_shutdown() => match signal {
            Ok(signal) => {
                info!("Received shutdown signal: {}", signal);
                shutdown.cancel();

                match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut engine_task).await {
                    Ok(result) => result.map_err(Into::into),
                    Err(_) => Err(anyhow::anyhow!(
                        "Shutdown timeout after {:?}",
                        SHUTDOWN_TIMEOUT
                    )),
                }
            }
            Err(e) => Err(e),
        }
    };

    monitor.abort();
    result?;
    info!("Shutting down daemon");
    Ok(())
}

/// Log engine events that are not already logged by the engine
async fn monitor_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::CycleCompleted {
                cycle,
                identifiers_count,
            } => debug!("Cycle {} completed ({} usernames)", cycle, identifiers_count),
            EngineEvent::RateLimited { name, retries } => {
                debug!("{} was rate limited {} time(s) before answering", name, retries)
            }
            EngineEvent::Stopped { reason } => info!("Engine stopped: {}", reason),
            other => debug!("Engine event: {:?}", other),
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
