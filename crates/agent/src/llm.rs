use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use concierge_core::config::LlmConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// A chat completion that must come back as a single JSON object.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f64,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("could not build model client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("model request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("model endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response could not be decoded: {0}")]
    Decode(String),
    #[error("model response contained no content")]
    EmptyContent,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the raw content of the first choice.
    async fn complete_json(&self, request: &ChatRequest) -> Result<String, ModelError>;
}

/// The remote model as seen by the reply generator: either a usable client or
/// nothing at all.
#[derive(Clone)]
pub enum ModelCapability {
    Available(Arc<dyn ChatModel>),
    Unavailable,
}

impl std::fmt::Debug for ModelCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mode())
    }
}

impl ModelCapability {
    /// Builds the OpenAI-compatible client when a usable API key is configured.
    /// A missing key is not an error; it yields `Unavailable`.
    pub fn from_config(llm: &LlmConfig) -> Result<Self, ModelError> {
        let Some(api_key) = llm.usable_api_key() else {
            return Ok(Self::Unavailable);
        };

        let client = OpenAiChatModel::new(
            api_key,
            &llm.base_url,
            Duration::from_secs(llm.timeout_secs.max(1)),
        )?;
        Ok(Self::Available(Arc::new(client)))
    }

    pub fn available<M>(model: M) -> Self
    where
        M: ChatModel + 'static,
    {
        Self::Available(Arc::new(model))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Available(_) => "model",
            Self::Unavailable => "fallback_only",
        }
    }
}

/// Chat-completions client for OpenAI and API-compatible endpoints.
pub struct OpenAiChatModel {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
}

impl OpenAiChatModel {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, ModelError> {
        let client =
            reqwest::Client::builder().timeout(timeout).build().map_err(ModelError::Client)?;

        Ok(Self {
            client,
            api_key: api_key.to_string().into(),
            endpoint: format!("{}/chat/completions", base_url.trim().trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete_json(&self, request: &ChatRequest) -> Result<String, ModelError> {
        let body = CompletionRequest {
            model: &request.model,
            temperature: request.temperature,
            response_format: ResponseFormat { kind: "json_object" },
            messages: &request.messages,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(ModelError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status { status: status.as_u16(), body: truncate(&body, 512) });
        }

        let completion: CompletionResponse =
            response.json().await.map_err(|error| ModelError::Decode(error.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ModelError::EmptyContent)
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f64,
    response_format: ResponseFormat,
    messages: &'a [ChatMessage],
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use concierge_core::config::AppConfig;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{ChatMessage, ChatModel, ChatRequest, ModelCapability, ModelError, OpenAiChatModel};

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.5,
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
        }
    }

    #[test]
    fn capability_is_unavailable_without_usable_key() {
        let mut config = AppConfig::default();
        let capability = ModelCapability::from_config(&config.llm).expect("no error");
        assert!(!capability.is_available());
        assert_eq!(capability.mode(), "fallback_only");

        config.llm.api_key = Some("abc".to_string().into());
        let capability = ModelCapability::from_config(&config.llm).expect("no error");
        assert!(!capability.is_available());

        config.llm.api_key = Some("sk-live-credential".to_string().into());
        let capability = ModelCapability::from_config(&config.llm).expect("client builds");
        assert!(capability.is_available());
        assert_eq!(capability.mode(), "model");
    }

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let model = OpenAiChatModel::new(
            "sk-test-key",
            "https://api.example.com/v1/",
            Duration::from_secs(5),
        )
        .expect("client builds");
        assert_eq!(model.endpoint(), "https://api.example.com/v1/chat/completions");
    }

    #[tokio::test]
    async fn posts_json_mode_request_and_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "response_format": {"type": "json_object"},
                "messages": [{"role": "system", "content": "be brief"}, {"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "{\"reply\":\"hello\"}"}},
                    {"message": {"role": "assistant", "content": "ignored"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = OpenAiChatModel::new(
            "sk-test-key",
            &format!("{}/v1", server.uri()),
            Duration::from_secs(5),
        )
        .expect("client builds");

        let content = model.complete_json(&request()).await.expect("completion succeeds");
        assert_eq!(content, "{\"reply\":\"hello\"}");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let model = OpenAiChatModel::new("sk-test-key", &server.uri(), Duration::from_secs(5))
            .expect("client builds");

        let error = model.complete_json(&request()).await.expect_err("should fail");
        assert!(matches!(error, ModelError::Status { status: 429, ref body } if body == "rate limited"));
    }

    #[tokio::test]
    async fn missing_choice_is_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let model = OpenAiChatModel::new("sk-test-key", &server.uri(), Duration::from_secs(5))
            .expect("client builds");

        let error = model.complete_json(&request()).await.expect_err("should fail");
        assert!(matches!(error, ModelError::EmptyContent));
    }

    #[tokio::test]
    async fn slow_endpoint_is_a_transport_error_after_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"choices": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let model = OpenAiChatModel::new("sk-test-key", &server.uri(), Duration::from_secs(1))
            .expect("client builds");

        let error = model.complete_json(&request()).await.expect_err("should time out");
        assert!(matches!(error, ModelError::Transport(ref source) if source.is_timeout()), "{error:?}");
    }
}
