//! Remote generation over an OpenAI-compatible chat-completions endpoint,
//! such as a LiteLLM proxy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::LlmError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// One chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Body of a chat-completions call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Empty means the client's default model.
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// A single user turn with the sampling settings of `config`.
    pub fn from_prompt(prompt: impl Into<String>, config: &ModelConfig) -> Self {
        Self {
            model: config.model_name.clone(),
            messages: vec![Message::user(prompt)],
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
        }
    }
}

/// Text of the first completion and the model that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResponse {
    pub model: String,
    pub content: String,
}

/// Anything that can answer a [`GenerationRequest`].
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}

/// HTTP client for the completions endpoint.
pub struct LiteLlmClient {
    endpoint: String,
    api_key: Option<String>,
    default_model: String,
    http_client: Client,
}

impl std::fmt::Debug for LiteLlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiteLlmClient")
            .field("endpoint", &self.endpoint)
            .field("default_model", &self.default_model)
            .finish_non_exhaustive()
    }
}

impl LiteLlmClient {
    /// Creates a client posting to `<api_base>/chat/completions`.
    pub fn new(
        api_base: &str,
        api_key: Option<String>,
        default_model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key,
            default_model: default_model.into(),
            http_client,
        })
    }

    /// Creates a client from the model section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiBase` if no endpoint is configured.
    pub fn from_config(config: &ModelConfig) -> Result<Self, LlmError> {
        let api_base = config.api_base.as_deref().ok_or(LlmError::MissingApiBase)?;
        Self::new(api_base, config.api_key.clone(), config.model_name.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl ChatCompletion {
    fn into_response(self, requested_model: String) -> Result<GenerationResponse, LlmError> {
        let model = if self.model.is_empty() {
            requested_model
        } else {
            self.model
        };
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::EmptyResponse(model.clone()))?;
        Ok(GenerationResponse { model, content })
    }
}

fn error_for_status(status: StatusCode, body: String) -> LlmError {
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|parsed| parsed.error.message)
        .unwrap_or(body);
    if status == StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited(message)
    } else {
        LlmError::ApiError {
            code: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl LlmProvider for LiteLlmClient {
    async fn generate(
        &self,
        mut request: GenerationRequest,
    ) -> Result<GenerationResponse, LlmError> {
        if request.model.is_empty() {
            request.model = self.default_model.clone();
        }

        let mut http_request = self
            .http_client
            .post(&self.endpoint)
            .header("X-Title", "climate-concierge")
            .json(&request);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let http_response = http_request
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        if !status.is_success() {
            let body = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(error_for_status(status, body));
        }

        let completion: ChatCompletion = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;
        tracing::debug!(model = %request.model, "Completion received");
        completion.into_response(request.model)
    }
}
