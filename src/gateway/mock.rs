//! Deterministic, network-free gateway.

use super::{Gateway, GatewayError, GatewayResult, Translation};
use crate::languages::AUTO;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum MockMode {
    /// `"hello"` to `fr` → `"hello_fr"`.
    Suffix,
    /// `(text, target)` → translation, suffix mode for anything unmapped.
    Mappings(HashMap<(String, String), String>),
    /// Every call fails with this error.
    Fail(GatewayError),
}

#[derive(Debug)]
pub struct MockGateway {
    mode: MockMode,
    detected: String,
    delay_by_target: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl MockGateway {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            detected: "en".to_string(),
            delay_by_target: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Language reported as detected for `auto` requests.
    pub fn detecting(mut self, code: &str) -> Self {
        self.detected = code.to_string();
        self
    }

    /// Delays calls targeting `target`.
    pub fn with_delay_for(mut self, target: &str, delay: Duration) -> Self {
        self.delay_by_target.insert(target.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self, text: &str, source: &str, target: &str) -> GatewayResult<Translation> {
        let detected = if source == AUTO { self.detected.clone() } else { source.to_lowercase() };
        let text = match &self.mode {
            MockMode::Suffix => format!("{text}_{target}"),
            MockMode::Mappings(map) => map
                .get(&(text.to_string(), target.to_string()))
                .cloned()
                .unwrap_or_else(|| format!("{text}_{target}")),
            MockMode::Fail(err) => return Err(err.clone()),
        };
        Ok(Translation { text, detected_source_language: detected })
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn translate(&self, text: &str, source: &str, target: &str) -> GatewayResult<Translation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_by_target.get(target).copied().unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.answer(text, source, target)
    }

    fn provider_name(&self) -> &str {
        "Mock"
    }
}
