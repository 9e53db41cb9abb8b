//! Local Ollama backend

use crate::*;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, trace};

pub struct OllamaProvider {
    client: Client,
    api_base: String,
    default_model: String,
}

impl OllamaProvider {
    pub fn new(api_base: impl Into<String>, default_model: impl Into<String>) -> Self {
        let api_base: String = api_base.into();
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            default_model: default_model.into(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let model = if params.model.is_empty() {
            self.default_model.clone()
        } else {
            params.model.clone()
        };

        let mut body = json!({
            "model": model,
            "messages": params.messages,
            "stream": false,
            "options": {
                "temperature": params.temperature,
                "num_predict": params.max_tokens,
            },
        });

        if params.response_format == ResponseFormat::Json {
            body["format"] = json!("json");
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        let message = json
            .get("message")
            .filter(|m| m.is_object())
            .ok_or(ProviderError::InvalidResponse)?;
        let content = message["content"].as_str().map(|s| s.to_string());
        let finish_reason = json["done_reason"].as_str().unwrap_or("stop").to_string();

        let prompt_tokens = json["prompt_eval_count"].as_u64().unwrap_or(0) as u32;
        let completion_tokens = json["eval_count"].as_u64().unwrap_or(0) as u32;

        Ok(ChatResponse {
            content,
            finish_reason,
            usage: Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
        })
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        trace!("◆ Sending {} turns to {}", params.messages.len(), self.api_base);

        let url = format!("{}/api/chat", self.api_base);
        let body = self.build_request(&params);

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let json: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let error = json["error"].as_str().unwrap_or("unknown error").to_string();
            return Err(ProviderError::Api(error));
        }

        let reply = self.parse_response(json)?;
        debug!(
            "◆ Ollama replied ({} tokens, finish: {})",
            reply.usage.total_tokens, reply.finish_reason
        );
        Ok(reply)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_base.is_empty()
    }
}
