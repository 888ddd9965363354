//! HTTP client for the completion API.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{instrument, warn};

use crate::config::AiConfig;

use super::error::{AiError, ErrorResponse};
use super::types::{ChatRequest, ChatResponse, Message};

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Completion API client.
#[derive(Clone)]
pub struct AiClient {
    inner: Arc<AiClientInner>,
}

struct AiClientInner {
    client: reqwest::Client,
    model: String,
    api_url: String,
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("model", &self.inner.model)
            .field("api_url", &self.inner.api_url)
            .finish_non_exhaustive()
    }
}

impl AiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `AiError::InvalidKey` if the key contains characters not
    /// allowed in a header, or `AiError::Http` if the client cannot be built.
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let mut key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|_| AiError::InvalidKey)?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(AiClientInner {
                client,
                model: config.model.clone(),
                api_url: config.api_url.clone(),
            }),
        })
    }

    /// Send a conversation and return the completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider answers with
    /// an error status.
    #[instrument(skip(self, messages, system), fields(model = %self.inner.model))]
    pub async fn chat(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
    ) -> Result<ChatResponse, AiError> {
        let request = ChatRequest {
            model: self.inner.model.clone(),
            max_tokens: MAX_TOKENS,
            messages,
            system,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.api_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_status(status, response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| AiError::Parse(format!("Failed to parse response: {e}")))
    }

    /// One-shot question with a system prompt; returns the reply text.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Empty` if the completion has no text, or any error
    /// from [`AiClient::chat`].
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError> {
        let response = self
            .chat(vec![Message::user(prompt)], Some(system.to_string()))
            .await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(AiError::Empty);
        }
        Ok(text)
    }
}

async fn error_from_status(status: reqwest::StatusCode, response: reqwest::Response) -> AiError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return AiError::RateLimited(retry_after);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return AiError::Unauthorized("Invalid API key".to_string());
    }

    match response.text().await {
        Ok(body) => match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) => AiError::Api {
                error_type: parsed.error.error_type,
                message: parsed.error.message,
            },
            Err(_) => {
                warn!(status = %status, "Unrecognized AI error body");
                AiError::Api {
                    error_type: "unknown".to_string(),
                    message: body,
                }
            }
        },
        Err(e) => AiError::Http(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer) -> AiClient {
        AiClient::new(&AiConfig {
            api_key: SecretString::from("sk-test-9f8e7d6c5b4a"),
            model: "test-model".to_string(),
            api_url: server.url("/v1/messages"),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_sends_headers_and_system_prompt() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("x-api-key", "sk-test-9f8e7d6c5b4a")
                .header("anthropic-version", API_VERSION)
                .body_includes("\"system\":\"be brief\"");
            then.status(200).json_body(json!({
                "id": "msg_1",
                "content": [{"type": "text", "text": "Có, chúng tôi mở cửa đến 22h."}]
            }));
        });

        let reply = client_for(&server)
            .complete("be brief", "Mấy giờ đóng cửa?")
            .await
            .unwrap();
        mock.assert();
        assert_eq!(reply, "Có, chúng tôi mở cửa đến 22h.");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).body_includes("rate");
            then.status(429).header("Retry-After", "12");
        });
        server.mock(|when, then| {
            when.method(POST).body_includes("broken");
            then.status(400).json_body(json!({
                "type": "error",
                "error": {"type": "invalid_request_error", "message": "nope"}
            }));
        });

        let client = client_for(&server);
        assert!(matches!(
            client.complete("s", "rate").await,
            Err(AiError::RateLimited(12))
        ));
        assert!(matches!(
            client.complete("s", "broken").await,
            Err(AiError::Api { ref error_type, .. }) if error_type == "invalid_request_error"
        ));
    }

    #[tokio::test]
    async fn test_empty_completion() {
        let server = MockServer::start_async().await;
        server.mock(|_, then| {
            then.status(200).json_body(json!({"id": "msg_2", "content": []}));
        });

        assert!(matches!(
            client_for(&server).complete("s", "hi").await,
            Err(AiError::Empty)
        ));
    }
}
