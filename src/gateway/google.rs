use super::{check_status, http_client, Gateway, GatewayError, GatewayResult, Translation};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// The keyless `gtx` web endpoint.
pub struct Google {
    client: reqwest::Client,
}

impl Google {
    pub fn new(timeout: Duration) -> GatewayResult<Self> {
        Ok(Self { client: http_client(timeout)? })
    }
}

/// The body is a nested array: `data[0]` holds `[translated, original, ..]`
/// segments, `data[2]` the detected source language.
fn parse_body(data: &Value) -> GatewayResult<Translation> {
    let segments = data
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| GatewayError::Protocol("missing translation segments".to_string()))?;
    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect();
    let detected = data.get(2).and_then(Value::as_str).unwrap_or_default();
    Ok(Translation { text, detected_source_language: detected.to_lowercase() })
}

#[async_trait]
impl Gateway for Google {
    async fn translate(&self, text: &str, source: &str, target: &str) -> GatewayResult<Translation> {
        let resp = self
            .client
            .get(ENDPOINT)
            .query(&[("client", "gtx"), ("sl", source), ("tl", target), ("dt", "t"), ("q", text)])
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let data: Value = resp.json().await?;
        parse_body(&data)
    }

    fn provider_name(&self) -> &str {
        "Google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_segments_and_reads_detection() {
        let body = json!([
            [["Hello. ", "Bonjour. ", null, null, 10], ["How are you?", "Ça va ?", null, null, 3]],
            null,
            "fr"
        ]);
        let t = parse_body(&body).unwrap();
        assert_eq!(t.text, "Hello. How are you?");
        assert_eq!(t.detected_source_language, "fr");
    }

    #[test]
    fn missing_segments_is_a_protocol_error() {
        assert!(matches!(parse_body(&json!({ "error": "x" })), Err(GatewayError::Protocol(_))));
        assert!(matches!(parse_body(&json!([null])), Err(GatewayError::Protocol(_))));
    }
}
