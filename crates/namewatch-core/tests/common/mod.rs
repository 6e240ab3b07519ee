//! Test doubles and common utilities for architecture contract tests
//!
//! This module provides minimal test doubles that verify architectural
//! constraints without talking to any real service.

#![allow(dead_code)]

use namewatch_core::config::{AvailabilityLogConfig, NamewatchConfig};
use namewatch_core::error::{Error, Result};
use namewatch_core::traits::{Notifier, ProbeResponse};
use namewatch_core::{AvailabilityProbe, EngineEvent, TransitionEvent};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

/// One scripted probe reply; `Err` is a transport failure
pub type Reply = std::result::Result<ProbeResponse, String>;

pub fn valid() -> Reply {
    Ok(ProbeResponse::answered("Username is valid", 0))
}

pub fn taken() -> Reply {
    Ok(ProbeResponse::answered("Username is already in use", 1))
}

pub fn rate_limited() -> Reply {
    Ok(ProbeResponse::RateLimited)
}

pub fn transport_error() -> Reply {
    Err("connection reset by peer".to_string())
}

/// A probe that replays per-identifier scripts
///
/// Once a script runs dry the last reply repeats, so a steady state only
/// needs to be scripted once.
pub struct ScriptedProbe {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Reply>>>>,
    last: Arc<Mutex<HashMap<String, Reply>>>,
    /// Identifiers in the order they were checked
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(Mutex::new(HashMap::new())),
            last: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue replies for `name`
    pub fn script(&self, name: &str, replies: Vec<Reply>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .extend(replies);
    }

    /// Total number of check() calls
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of check() calls for `name`
    pub fn calls_for(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.as_str() == name)
            .count()
    }

    /// Identifiers in check() order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Create a new ScriptedProbe that shares scripts and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            scripts: Arc::clone(&other.scripts),
            last: Arc::clone(&other.last),
            calls: Arc::clone(&other.calls),
        }
    }
}

#[async_trait::async_trait]
impl AvailabilityProbe for ScriptedProbe {
    async fn check(&self, name: &str) -> Result<ProbeResponse> {
        self.calls.lock().unwrap().push(name.to_string());

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(name)
            .and_then(VecDeque::pop_front);

        let reply = match next {
            Some(reply) => {
                self.last
                    .lock()
                    .unwrap()
                    .insert(name.to_string(), reply.clone());
                reply
            }
            None => self
                .last
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .unwrap_or_else(|| Err(format!("no script for {}", name))),
        };

        reply.map_err(|e| Error::probe("scripted", e))
    }

    fn probe_name(&self) -> &'static str {
        "scripted"
    }
}

/// A probe that never answers
pub struct HangingProbe {
    entered: Arc<AtomicUsize>,
}

impl HangingProbe {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of check() calls that started
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            entered: Arc::clone(&other.entered),
        }
    }
}

#[async_trait::async_trait]
impl AvailabilityProbe for HangingProbe {
    async fn check(&self, _name: &str) -> Result<ProbeResponse> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    fn probe_name(&self) -> &'static str {
        "hanging"
    }
}

/// A probe that panics on its first check, then reports every name valid
pub struct PanickingProbe {
    calls: Arc<AtomicUsize>,
}

impl PanickingProbe {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            calls: Arc::clone(&other.calls),
        }
    }
}

#[async_trait::async_trait]
impl AvailabilityProbe for PanickingProbe {
    async fn check(&self, _name: &str) -> Result<ProbeResponse> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("validation client blew up");
        }
        Ok(ProbeResponse::answered("Username is valid", 0))
    }

    fn probe_name(&self) -> &'static str {
        "panicking"
    }
}

/// A notifier that records every event it is asked to deliver
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<TransitionEvent>>>,
    fail: Arc<AtomicBool>,
    hang: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(AtomicBool::new(false)),
            hang: false,
        }
    }

    /// A notifier whose every delivery fails
    pub fn failing() -> Self {
        let notifier = Self::new();
        notifier.set_failing(true);
        notifier
    }

    /// A notifier whose deliveries never complete
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new()
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every event passed to notify(), including failed deliveries
    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            events: Arc::clone(&other.events),
            fail: Arc::clone(&other.fail),
            hang: other.hang,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &TransitionEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());

        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::notifier("recording", "HTTP 500: webhook unavailable"));
        }
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}

/// Configuration with no delays and an in-memory availability log
pub fn minimal_config() -> NamewatchConfig {
    let mut config = NamewatchConfig::new("https://hooks.example.test/webhook");
    config.availability_log = AvailabilityLogConfig::Memory;
    config.engine.pacing_delay_ms = 0;
    config.engine.cycle_delay_secs = 0;
    config.engine.rate_limit_delay_ms = 0;
    config.engine.error_backoff_secs = 0;
    config
}

/// Collect every event currently buffered in the channel
pub async fn drain_events(rx: mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut rx = rx;
    rx.close();
    ReceiverStream::new(rx).collect().await
}

/// Only the transition events, in emission order
pub fn transitions(events: &[EngineEvent]) -> Vec<TransitionEvent> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::Transition(transition) => Some(transition.clone()),
            _ => None,
        })
        .collect()
}
