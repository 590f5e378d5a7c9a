//! Chat clients bound to judge endpoints.
//!
//! Every judge speaks one of a small set of wire protocols; the concrete
//! client is selected by a factory keyed on the configured judge type.
//! The only contract a judge has is "return text when given a prompt";
//! any transport failure makes that judge unavailable for the request.

pub mod anthropic;
pub mod mock;
pub mod openai;

use serde::Serialize;
use tracing::warn;

use crate::error::{ConfigError, TransportError};
use crate::judge::types::JudgeConfig;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A judge's bound chat client, one variant per wire protocol.
#[derive(Debug)]
pub enum JudgeClient {
    OpenAi(openai::OpenAiClient),
    Anthropic(anthropic::AnthropicClient),
    Mock(mock::MockClient),
}

impl JudgeClient {
    /// Build the client for a judge from its configuration. A judge whose
    /// API key environment variable is unset is skipped with a warning
    /// (Ok(None)) rather than failing the run; an unknown type is a
    /// configuration error.
    pub fn from_config(cfg: &JudgeConfig) -> Result<Option<Self>, ConfigError> {
        match cfg.kind.as_str() {
            "openai" => match std::env::var(&cfg.api_key_env) {
                Ok(api_key) => {
                    let base_url = cfg
                        .base_url
                        .clone()
                        .unwrap_or_else(|| "https://api.openai.com".to_string());
                    Ok(Some(JudgeClient::OpenAi(openai::OpenAiClient::new(
                        base_url,
                        api_key,
                        cfg.model.clone(),
                        cfg.timeout_secs,
                    ))))
                }
                Err(_) => {
                    warn!(judge = %cfg.name, env = %cfg.api_key_env, "API key not set, skipping judge");
                    Ok(None)
                }
            },
            "anthropic" => match std::env::var(&cfg.api_key_env) {
                Ok(api_key) => {
                    let base_url = cfg
                        .base_url
                        .clone()
                        .unwrap_or_else(|| "https://api.anthropic.com".to_string());
                    Ok(Some(JudgeClient::Anthropic(anthropic::AnthropicClient::new(
                        base_url,
                        api_key,
                        cfg.model.clone(),
                        cfg.timeout_secs,
                    ))))
                }
                Err(_) => {
                    warn!(judge = %cfg.name, env = %cfg.api_key_env, "API key not set, skipping judge");
                    Ok(None)
                }
            },
            "mock" => Ok(Some(JudgeClient::Mock(mock::MockClient::returning("")))),
            other => Err(ConfigError::UnknownJudgeType {
                judge: cfg.name.clone(),
                kind: other.to_string(),
            }),
        }
    }

    /// Execute one chat completion and return the reply text.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String, TransportError> {
        match self {
            JudgeClient::OpenAi(c) => c.chat(messages, max_tokens, temperature).await,
            JudgeClient::Anthropic(c) => c.chat(messages, max_tokens, temperature).await,
            JudgeClient::Mock(c) => c.chat(messages, max_tokens, temperature).await,
        }
    }
}
