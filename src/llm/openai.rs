//! Chat-completion backend for prompt nodes, enabled by the `openai` cargo
//! feature. Reads its configuration from the environment so deployed boards
//! need nothing beyond an `.env` file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{PromptClient, PromptError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible chat completion client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Build from `BREADBOARD_OPENAI_API_KEY` (falling back to
    /// `OPENAI_API_KEY`), with optional `BREADBOARD_OPENAI_MODEL` and
    /// `BREADBOARD_OPENAI_BASE_URL` overrides.
    pub fn from_env() -> Result<Self, PromptError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("BREADBOARD_OPENAI_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| PromptError::Unavailable {
                message: "no OpenAI API key in environment".to_string(),
            })?;
        let mut client = Self::new(api_key);
        if let Ok(model) = std::env::var("BREADBOARD_OPENAI_MODEL") {
            client.model = model;
        }
        if let Ok(base) = std::env::var("BREADBOARD_OPENAI_BASE_URL") {
            client.base_url = base.trim_end_matches('/').to_string();
        }
        Ok(client)
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
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
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

#[async_trait]
impl PromptClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, PromptError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.model, "sending chat completion request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| PromptError::Unavailable {
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PromptError::Failed {
                message: format!("{status}: {detail}"),
            });
        }

        let parsed: ChatResponse =
            response.json().await.map_err(|err| PromptError::Failed {
                message: format!("malformed completion response: {err}"),
            })?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PromptError::Failed {
                message: "completion response had no choices".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn completes_against_mock_server() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer test-key")
                    .json_body_partial(r#"{"model": "test-model"}"#);
                then.status(200).json_body(serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": "a bright three"}}]
                }));
            })
            .await;

        let client = OpenAiClient::new("test-key")
            .with_model("test-model")
            .with_base_url(server.base_url());
        let reply = client.complete("describe the number 3").await.unwrap();
        assert_eq!(reply, "a bright three");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn surfaces_api_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).body("rate limited");
            })
            .await;

        let client = OpenAiClient::new("test-key").with_base_url(server.base_url());
        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, PromptError::Failed { .. }));
    }
}
