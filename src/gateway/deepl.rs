use super::{check_status, http_client, Gateway, GatewayError, GatewayResult, Translation};
use crate::languages::AUTO;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct DeepLRequest<'a> {
    text: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<&'a str>,
    target_lang: &'a str,
}

#[derive(Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Deserialize)]
struct DeepLTranslation {
    text: String,
    #[serde(default)]
    detected_source_language: String,
}

/// DeepL v2 `translate` endpoint.
pub struct DeepL {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl DeepL {
    pub fn new(api_key: &str, endpoint: &str, timeout: Duration) -> GatewayResult<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(GatewayError::Config("DeepL API key is not set".to_string()));
        }
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

fn request_body<'a>(text: &'a str, source: &'a str, target: &'a str) -> DeepLRequest<'a> {
    DeepLRequest {
        text: [text],
        source_lang: (source != AUTO).then_some(source),
        target_lang: target,
    }
}

fn into_translation(parsed: DeepLResponse) -> GatewayResult<Translation> {
    let first = parsed
        .translations
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::Protocol("no translations in DeepL response".to_string()))?;
    Ok(Translation {
        text: first.text,
        detected_source_language: first.detected_source_language.to_lowercase(),
    })
}

#[async_trait]
impl Gateway for DeepL {
    async fn translate(&self, text: &str, source: &str, target: &str) -> GatewayResult<Translation> {
        let resp = self
            .client
            .post(format!("{}/v2/translate", self.endpoint))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&request_body(text, source, target))
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let parsed: DeepLResponse = resp.json().await?;
        into_translation(parsed)
    }

    fn provider_name(&self) -> &str {
        "DeepL"
    }
}
