//! The translation gateway: the boundary the overlay sends text across.
//!
//! The overlay only knows the shape of a request (`text`, `from`, `to`) and of
//! its answer (translated text plus the detected source language, or an
//! error). Which provider answers, and how it is reached, is decided here.

mod deepl;
mod dispatch;
mod google;
mod libre;
pub mod mock;

pub use deepl::DeepL;
pub use dispatch::{Dispatcher, Waker};
pub use google::Google;
pub use libre::LibreTranslate;
pub use mock::{MockGateway, MockMode};

use crate::config::{Config, Provider};
use crate::session::SessionId;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub detected_source_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("HTTP {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: String },
    #[error("unexpected response: {0}")]
    Protocol(String),
    #[error("configuration error: {0}")]
    Config(String),
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() { String::new() } else { format!(": {detail}") }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Protocol(err.to_string())
        } else if let Some(status) = err.status() {
            GatewayError::Status { status: status.as_u16(), detail: String::new() }
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Protocol(err.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[async_trait]
pub trait Gateway: Send + Sync {
    /// `source` may be [`crate::languages::AUTO`].
    async fn translate(&self, text: &str, source: &str, target: &str) -> GatewayResult<Translation>;

    fn provider_name(&self) -> &str;
}

/// One call issued by a session. `generation` identifies which of the
/// session's calls this is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub session: SessionId,
    pub generation: u64,
    pub text: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationReply {
    pub session: SessionId,
    pub generation: u64,
    pub outcome: GatewayResult<Translation>,
}

impl TranslationReply {
    pub fn to(request: &TranslationRequest, outcome: GatewayResult<Translation>) -> Self {
        Self { session: request.session, generation: request.generation, outcome }
    }
}

/// Where the overlay sends requests. Submitting never blocks; the reply comes
/// back later through whatever channel the sink was built with.
pub trait RequestSink {
    fn submit(&self, request: TranslationRequest);
}

/// Builds the provider named in the configuration.
pub fn from_config(cfg: &Config) -> GatewayResult<Arc<dyn Gateway>> {
    let timeout = Duration::from_secs(cfg.request_timeout_secs);
    let gateway: Arc<dyn Gateway> = match cfg.provider {
        Provider::DeepL => Arc::new(DeepL::new(&cfg.deepl_api_key, &cfg.deepl_endpoint, timeout)?),
        Provider::Google => Arc::new(Google::new(timeout)?),
        Provider::LibreTranslate => Arc::new(LibreTranslate::new(&cfg.libretranslate_url, timeout)?),
    };
    Ok(gateway)
}

pub(crate) fn http_client(timeout: Duration) -> GatewayResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("noctis/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))
}

/// Turns a non-success response into [`GatewayError::Status`], keeping a
/// short excerpt of the body as detail.
pub(crate) async fn check_status(resp: reqwest::Response) -> GatewayResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail: String = body.trim().chars().take(200).collect();
    Err(GatewayError::Status { status: status.as_u16(), detail })
}
