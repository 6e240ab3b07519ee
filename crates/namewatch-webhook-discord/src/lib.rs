// # Discord Webhook Notifier
//
// This crate delivers namewatch transition events to a Discord webhook.
//
// ## Implementation Status
//
// - ✅ Makes one HTTP POST per event (as required by architectural constraints)
// - ✅ Any 2xx status is success, everything else is returned as an error
// - ✅ HTTP timeout configured (10 seconds by default)
// - ✅ Mentions for configured user IDs, optional rich embed
// - ❌ NO retry logic (delivery is best-effort, at-most-once per edge)
// - ❌ NO background tasks (intentionally omitted - violates shutdown determinism)
//
// ## Trust Level: Untrusted (Notifier)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS requests to the configured webhook only
// - ✅ Format the event into a message body
//
// **Forbidden Capabilities** (enforced by code review):
// - ❌ Retry, back off or spawn tasks
// - ❌ Access the identifier store
// - ❌ Write to the availability log (owned by Dispatcher)
//
// ## Security Requirements
//
// - The webhook URL embeds its own credential and NEVER appears in logs
// - The webhook URL MUST be provided via environment variables only
//
// ## API Reference
//
// - Execute webhook: POST `{webhook_url}` with `{ "content": ..., "embeds": [...] }`

use async_trait::async_trait;
use chrono::SecondsFormat;
use namewatch_core::config::WebhookConfig;
use namewatch_core::traits::Notifier;
use namewatch_core::{Error, Result, TransitionEvent};
use serde::Serialize;
use std::time::Duration;

const NOTIFIER_NAME: &str = "discord";

/// Embed color for available identifiers
pub const AVAILABLE_COLOR: u32 = 0x57F287;

/// Embed color for claimed identifiers
pub const CLAIMED_COLOR: u32 = 0xED4245;

/// JSON body posted to the webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    /// Plain-text message, mentions first
    pub content: String,

    /// Rich embeds (omitted when empty)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

/// One rich embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// Build the webhook body for `event`
///
/// `content` is the mention tags joined by spaces, a space, then the
/// announcement. Without mentions it is the announcement alone.
pub fn build_payload(event: &TransitionEvent, mention_user_ids: &[String], embeds: bool) -> WebhookPayload {
    let announcement = event.announcement();

    let mentions = mention_user_ids
        .iter()
        .map(|id| format!("<@{}>", id))
        .collect::<Vec<_>>()
        .join(" ");

    let content = if mentions.is_empty() {
        announcement.clone()
    } else {
        format!("{} {}", mentions, announcement)
    };

    let embeds = if embeds {
        let (title, color) = match event {
            TransitionEvent::Available { .. } => ("Username available", AVAILABLE_COLOR),
            TransitionEvent::Claimed { .. } => ("Username claimed", CLAIMED_COLOR),
        };
        vec![Embed {
            title: title.to_string(),
            description: announcement,
            color,
            timestamp: event.at().to_rfc3339_opts(SecondsFormat::Millis, true),
        }]
    } else {
        Vec::new()
    };

    WebhookPayload { content, embeds }
}

/// Discord webhook notifier
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot. Failures are reported to the Dispatcher,
/// which logs and drops them.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the webhook URL.
pub struct DiscordWebhook {
    /// Webhook URL
    /// ⚠️ NEVER log this value
    url: String,

    /// User IDs to mention in every message
    mention_user_ids: Vec<String>,

    /// Attach a rich embed
    embeds: bool,

    /// HTTP client with the request timeout applied
    client: reqwest::Client,
}

// Custom Debug implementation that hides the webhook URL
impl std::fmt::Debug for DiscordWebhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordWebhook")
            .field("url", &"<REDACTED>")
            .field("mention_user_ids", &self.mention_user_ids)
            .field("embeds", &self.embeds)
            .finish()
    }
}

impl DiscordWebhook {
    /// Create a new webhook notifier
    ///
    /// # Parameters
    ///
    /// - `url`: Discord webhook URL
    /// - `mention_user_ids`: User IDs to mention
    /// - `embeds`: Attach a rich embed to each message
    /// - `timeout`: Per-request timeout
    pub fn new(
        url: impl Into<String>,
        mention_user_ids: Vec<String>,
        embeds: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(Error::config("Webhook URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::notifier(NOTIFIER_NAME, format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            url,
            mention_user_ids,
            embeds,
            client,
        })
    }

    /// Create a notifier from configuration
    pub fn from_config(config: &WebhookConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            &config.url,
            config.mention_user_ids.clone(),
            config.embeds,
            config.timeout(),
        )
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn notify(&self, event: &TransitionEvent) -> Result<()> {
        let payload = build_payload(event, &self.mention_user_ids, self.embeds);

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            // without_url keeps the webhook credential out of the message
            .map_err(|e| Error::notifier(NOTIFIER_NAME, format!("Request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::notifier(
                NOTIFIER_NAME,
                format!("HTTP error: {} - {}", status, body.trim()),
            ));
        }

        tracing::debug!("Webhook accepted message for {} ({})", event.name(), status);
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        NOTIFIER_NAME
    }
}
