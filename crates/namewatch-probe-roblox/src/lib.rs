// # Username Validation Probe
//
// This crate provides the HTTP probe that asks the username validation
// endpoint whether an identifier can be registered.
//
// ## Implementation Status
//
// - ✅ Makes one HTTP GET per check (as required by architectural constraints)
// - ✅ Full error propagation to the engine (engine handles rate-limit retries)
// - ✅ HTTP timeout configured (10 seconds by default)
// - ✅ HTTP 429 reported as `ProbeResponse::RateLimited`
// - ❌ NO retry logic (intentionally omitted - owned by Prober)
// - ❌ NO interpretation of the message (owned by normalize_response)
// - ❌ NO background tasks (intentionally omitted - violates shutdown determinism)
//
// ## Trust Level: Untrusted (Availability Probe)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS requests to the configured endpoint only
// - ✅ Parse the `{ "code": ..., "message": ... }` response body
//
// **Forbidden Capabilities** (enforced by code review):
// - ❌ Sleep, back off or spawn tasks
// - ❌ Access the identifier store
// - ❌ Decide whether a message means available or claimed
//
// ## API Reference
//
// - Validate username: GET `/v1/usernames/validate?Username=...&Birthday=...`
// - Response: `{ "code": 0, "message": "Username is valid" }`

use async_trait::async_trait;
use namewatch_core::config::ProbeConfig;
use namewatch_core::traits::{AvailabilityProbe, ProbeResponse};
use namewatch_core::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

const PROBE_NAME: &str = "roblox";

/// Body returned by the validation endpoint
///
/// Both fields are required. The `{ "errors": [...] }` envelope the service
/// sends on internal failures must not decode into an answer.
#[derive(Debug, Deserialize)]
struct ValidationBody {
    code: i64,
    message: String,
}

/// Username validation probe
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot. Rate-limit recovery, pacing and state are all
/// owned by the engine.
#[derive(Debug)]
pub struct RobloxProbe {
    /// Validation endpoint URL (without query string)
    endpoint: String,

    /// Placeholder birthdate sent with every request
    birthday: String,

    /// HTTP client with the request timeout applied
    client: reqwest::Client,
}

impl RobloxProbe {
    /// Create a new probe
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Validation endpoint URL
    /// - `birthday`: Birthdate query parameter (`YYYY-MM-DD`)
    /// - `timeout`: Per-request timeout
    pub fn new(endpoint: impl Into<String>, birthday: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::probe(PROBE_NAME, format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            birthday: birthday.into(),
            client,
        })
    }

    /// Create a probe from configuration
    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        config.validate()?;
        Self::new(&config.endpoint, &config.birthday, config.timeout())
    }

    /// Endpoint this probe queries
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AvailabilityProbe for RobloxProbe {
    async fn check(&self, name: &str) -> Result<ProbeResponse> {
        tracing::trace!("Validating {} against {}", name, self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("Username", name), ("Birthday", self.birthday.as_str())])
            .send()
            .await
            .map_err(|e| Error::probe(PROBE_NAME, format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 429 {
            tracing::debug!("Validation endpoint rate limited {}", name);
            return Ok(ProbeResponse::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::probe(
                PROBE_NAME,
                format!("HTTP error: {} - {}", status, body.trim()),
            ));
        }

        let body: ValidationBody = response.json().await.map_err(|e| {
            Error::probe(PROBE_NAME, format!("Failed to decode JSON response: {}", e))
        })?;

        Ok(ProbeResponse::Answered {
            message: body.message,
            code: body.code,
        })
    }

    fn probe_name(&self) -> &'static str {
        PROBE_NAME
    }
}
