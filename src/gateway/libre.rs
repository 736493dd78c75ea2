use super::{check_status, http_client, Gateway, GatewayResult, Translation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
    #[serde(rename = "detectedLanguage", default)]
    detected_language: Option<DetectedLanguage>,
}

#[derive(Deserialize)]
struct DetectedLanguage {
    language: String,
}

/// A LibreTranslate instance (`POST {url}/translate`).
pub struct LibreTranslate {
    client: reqwest::Client,
    url: String,
}

impl LibreTranslate {
    pub fn new(url: &str, timeout: Duration) -> GatewayResult<Self> {
        Ok(Self { client: http_client(timeout)?, url: url.trim_end_matches('/').to_string() })
    }
}

/// Instances only report a detection for `auto` requests; otherwise the
/// requested source stands in for it.
fn into_translation(parsed: LibreResponse, source: &str) -> Translation {
    let detected = parsed
        .detected_language
        .map(|d| d.language)
        .unwrap_or_else(|| source.to_string());
    Translation { text: parsed.translated_text, detected_source_language: detected.to_lowercase() }
}

#[async_trait]
impl Gateway for LibreTranslate {
    async fn translate(&self, text: &str, source: &str, target: &str) -> GatewayResult<Translation> {
        let req = LibreRequest { q: text, source, target, format: "text" };
        let resp = self.client.post(format!("{}/translate", self.url)).json(&req).send().await?;
        let resp = check_status(resp).await?;
        let parsed: LibreResponse = resp.json().await?;
        Ok(into_translation(parsed, source))
    }

    fn provider_name(&self) -> &str {
        "LibreTranslate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_detected_language_when_present() {
        let parsed: LibreResponse = serde_json::from_value(json!({
            "translatedText": "Hello",
            "detectedLanguage": { "confidence": 90.0, "language": "fr" }
        }))
        .unwrap();
        let t = into_translation(parsed, "auto");
        assert_eq!(t.text, "Hello");
        assert_eq!(t.detected_source_language, "fr");
    }

    #[test]
    fn falls_back_to_requested_source() {
        let parsed: LibreResponse = serde_json::from_value(json!({ "translatedText": "Hallo" })).unwrap();
        assert_eq!(into_translation(parsed, "EN").detected_source_language, "en");
    }

    #[test]
    fn missing_text_fails_to_parse() {
        assert!(serde_json::from_value::<LibreResponse>(json!({ "error": "bad" })).is_err());
    }
}
