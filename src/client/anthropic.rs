//! Anthropic-protocol messages client. Several judge vendors expose an
//! Anthropic-compatible endpoint, so text extraction tolerates both
//! plain text blocks and thinking blocks.

use std::time::Duration;

use serde_json::Value;

use crate::client::ChatMessage;
use crate::error::TransportError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug)]
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(base_url: String, api_key: String, model: String, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        AnthropicClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String, TransportError> {
        let request_body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api { status, body });
        }

        let response_json: Value = response.json().await?;
        extract_text(&response_json)
    }
}

/// Concatenate the text of all content blocks, accepting `text` and
/// `thinking` block shapes.
fn extract_text(response: &Value) -> Result<String, TransportError> {
    let blocks = response
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| TransportError::MalformedResponse("missing content array".to_string()))?;

    let mut parts = Vec::new();
    for block in blocks {
        if let Some(text) = block.get("text").and_then(Value::as_str) {
            parts.push(text);
        } else if let Some(text) = block.get("thinking").and_then(Value::as_str) {
            parts.push(text);
        }
    }

    if parts.is_empty() {
        return Err(TransportError::MalformedResponse(
            "no text blocks in content".to_string(),
        ));
    }
    Ok(parts.concat())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_blocks() {
        let response = serde_json::json!({
            "content": [
                {"type": "text", "text": "Hello "},
                {"type": "text", "text": "world"}
            ]
        });
        assert_eq!(extract_text(&response).unwrap(), "Hello world");
    }

    #[test]
    fn test_extract_thinking_blocks() {
        let response = serde_json::json!({
            "content": [
                {"type": "thinking", "thinking": "step by step"},
                {"type": "text", "text": " answer"}
            ]
        });
        assert_eq!(extract_text(&response).unwrap(), "step by step answer");
    }

    #[test]
    fn test_extract_missing_content_is_error() {
        let response = serde_json::json!({"id": "msg_1"});
        assert!(extract_text(&response).is_err());
    }
}
