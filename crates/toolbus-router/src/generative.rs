//! Generative proxy with deterministic fallback.
//!
//! Generation commands are total: every request resolves to a well-formed
//! result envelope. A provider-side failure (non-2xx, malformed body) and a
//! transport failure (timeout, refused connection, DNS) both resolve to a
//! synthetic success envelope whose `data.provider` field is `"fallback"`, so
//! a stalled provider never blocks the creative workflow while downstream
//! tooling can still tell real content from synthetic.

use crate::config::AiConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use toolbus_common::{CommandEnvelope, Error, ResultEnvelope};
use tracing::{debug, warn};

/// Marker stored in `data.provider` on synthesized responses.
pub const FALLBACK_PROVIDER: &str = "fallback";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Wraps the external text-generation provider.
pub struct GenerativeProxy {
    config: AiConfig,
    http: reqwest::Client,
}

impl GenerativeProxy {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Resolve a generation command to a result envelope. Never errors.
    pub async fn generate(&self, envelope: &CommandEnvelope) -> ResultEnvelope {
        let prompt = envelope
            .params
            .get("prompt")
            .and_then(Value::as_str)
            .unwrap_or(&envelope.command)
            .to_string();
        let content_type = envelope
            .params
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("text");

        let Some(api_key) = self.config.api_key.clone() else {
            debug!("no provider API key configured, serving fallback content");
            return self.fallback(&prompt, "no API key configured");
        };

        match self.call_provider(&api_key, &prompt, content_type).await {
            Ok(content) => {
                let mut data = Map::new();
                data.insert("content".to_string(), json!(content));
                data.insert("provider".to_string(), json!(self.config.provider));
                data.insert("model".to_string(), json!(self.config.model));
                ResultEnvelope::success("content generated", data)
            }
            Err(e) => {
                warn!("generative provider call failed, serving fallback: {}", e);
                self.fallback(&prompt, &e.to_string())
            }
        }
    }

    async fn call_provider(
        &self,
        api_key: &str,
        prompt: &str,
        content_type: &str,
    ) -> Result<String, Error> {
        let system = format!(
            "You are an expert game development assistant. \
             Generate {} based on the user's request.",
            content_type
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.7,
            max_tokens: 2048,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.config.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::transport(format!(
                        "provider request timed out after {:?}",
                        self.config.request_timeout
                    ))
                } else {
                    Error::transport(format!("connection failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Provider(format!("provider answered HTTP {}", status)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("malformed provider response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::Provider("provider returned no content".to_string()))
    }

    /// Deterministic synthetic response echoing the prompt.
    fn fallback(&self, prompt: &str, reason: &str) -> ResultEnvelope {
        let mut data = Map::new();
        data.insert(
            "content".to_string(),
            json!(format!("This is a placeholder response for: {}", prompt)),
        );
        data.insert("provider".to_string(), json!(FALLBACK_PROVIDER));
        data.insert("model".to_string(), json!(self.config.model));
        ResultEnvelope::success(format!("content generated (fallback: {})", reason), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map as JsonMap;

    fn envelope_with_prompt(prompt: &str) -> CommandEnvelope {
        let mut params = JsonMap::new();
        params.insert("prompt".to_string(), json!(prompt));
        CommandEnvelope::new("generate_content", params)
    }

    #[tokio::test]
    async fn test_missing_api_key_serves_fallback() {
        let proxy = GenerativeProxy::new(AiConfig::default());
        let result = proxy.generate(&envelope_with_prompt("rusty barrel")).await;

        assert!(result.is_success());
        assert_eq!(result.data["provider"], json!(FALLBACK_PROVIDER));
        assert!(result.data["content"]
            .as_str()
            .unwrap()
            .contains("rusty barrel"));
    }

    #[tokio::test]
    async fn test_missing_prompt_still_yields_content() {
        let proxy = GenerativeProxy::new(AiConfig::default());
        let result = proxy
            .generate(&CommandEnvelope::new("generate_texture", JsonMap::new()))
            .await;

        assert!(result.is_success());
        assert!(!result.data["content"].as_str().unwrap().is_empty());
    }
}
