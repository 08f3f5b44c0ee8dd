//! The generation capability handed to agents.
//!
//! [`TextGenerator::generate`] never fails. A provider error or an empty
//! completion is turned into the offline response for the calling agent,
//! and the returned [`Generation`] says which path produced the text so
//! callers can record the substitution.

use std::sync::Arc;

use crate::agents::AgentKind;
use crate::config::{ConciergeConfig, ConfigError, ModelConfig};

use super::litellm::{GenerationRequest, LiteLlmClient, LlmProvider};
use super::offline::offline_response;

/// Where the text of a [`Generation`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationSource {
    /// The configured model produced the text.
    Model { model: String },
    /// The offline responder substituted for the model.
    Fallback { reason: String },
}

/// Outcome of a generation call.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub source: GenerationSource,
}

impl Generation {
    /// Whether the offline responder produced this text.
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, GenerationSource::Fallback { .. })
    }

    /// Reason for the fallback, if one happened.
    pub fn fallback_reason(&self) -> Option<&str> {
        match &self.source {
            GenerationSource::Fallback { reason } => Some(reason),
            GenerationSource::Model { .. } => None,
        }
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Text generation backed by an optional model provider.
pub struct TextGenerator {
    provider: Option<Arc<dyn LlmProvider>>,
    model: ModelConfig,
}

impl std::fmt::Debug for TextGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextGenerator")
            .field("model", &self.model.model_name)
            .field("offline", &self.provider.is_none())
            .finish_non_exhaustive()
    }
}

impl TextGenerator {
    /// A generator that always answers from the offline responder.
    pub fn offline() -> Self {
        Self {
            provider: None,
            model: ModelConfig::default(),
        }
    }

    /// A generator backed by `provider`, falling back offline on failure.
    pub fn with_provider(provider: Arc<dyn LlmProvider>, config: &ModelConfig) -> Self {
        Self {
            provider: Some(provider),
            model: config.clone(),
        }
    }

    /// Builds the generator described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoGenerationBackend` when no endpoint is
    /// configured and the offline fallback is not allowed.
    pub fn from_config(config: &ConciergeConfig) -> Result<Self, ConfigError> {
        if config.model.api_base.is_none() {
            if !config.allow_stub_llm {
                return Err(ConfigError::NoGenerationBackend);
            }
            tracing::info!("No model endpoint configured; using offline responder");
            return Ok(Self::offline());
        }

        match LiteLlmClient::from_config(&config.model) {
            Ok(client) => Ok(Self::with_provider(Arc::new(client), &config.model)),
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to offline responder due to client init failure");
                Ok(Self::offline())
            }
        }
    }

    /// Whether every call is answered offline.
    pub fn is_offline(&self) -> bool {
        self.provider.is_none()
    }

    /// Generates text for `agent`. Never fails.
    pub async fn generate(&self, prompt: &str, agent: AgentKind) -> Generation {
        let Some(provider) = &self.provider else {
            return Self::fallback(agent, "offline mode");
        };

        let request = GenerationRequest::from_prompt(prompt, &self.model);

        match provider.generate(request).await {
            Ok(response) => match response.content.trim() {
                text if !text.is_empty() => Generation {
                    text: text.to_string(),
                    source: GenerationSource::Model {
                        model: response.model.clone(),
                    },
                },
                _ => {
                    tracing::warn!(agent = %agent, "Model returned empty completion; falling back to stub");
                    Self::fallback(agent, "empty completion")
                }
            },
            Err(e) => {
                tracing::warn!(agent = %agent, error = %e, "Model generation failed; falling back to stub");
                Self::fallback(agent, &e.to_string())
            }
        }
    }

    fn fallback(agent: AgentKind, reason: &str) -> Generation {
        Generation {
            text: offline_response(agent),
            source: GenerationSource::Fallback {
                reason: reason.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::GenerationResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Mock LLM provider for testing.
    struct MockLlmProvider {
        response: Mutex<String>,
    }

    impl MockLlmProvider {
        fn new(response: impl Into<String>) -> Self {
            Self {
                response: Mutex::new(response.into()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            let content = self.response.lock().expect("lock not poisoned").clone();
            Ok(GenerationResponse {
                model: "mock-model".to_string(),
                content,
            })
        }
    }

    struct FailingLlmProvider;

    #[async_trait]
    impl LlmProvider for FailingLlmProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            Err(LlmError::RequestFailed("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_model_text_is_returned() {
        let generator = TextGenerator::with_provider(
            Arc::new(MockLlmProvider::new("  A plan.  ")),
            &ModelConfig::default(),
        );

        let generation = generator.generate("prompt", AgentKind::ActionPlanner).await;

        assert!(!generation.is_fallback());
        assert_eq!(generation.text, "A plan.");
        assert_eq!(
            generation.source,
            GenerationSource::Model {
                model: "mock-model".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let generator =
            TextGenerator::with_provider(Arc::new(FailingLlmProvider), &ModelConfig::default());

        let generation = generator.generate("prompt", AgentKind::FundingScout).await;

        assert!(generation.is_fallback());
        assert!(generation
            .fallback_reason()
            .is_some_and(|r| r.contains("connection refused")));
        assert_eq!(generation.text, offline_response(AgentKind::FundingScout));
    }

    #[tokio::test]
    async fn test_empty_completion_falls_back() {
        let generator = TextGenerator::with_provider(
            Arc::new(MockLlmProvider::new("   ")),
            &ModelConfig::default(),
        );

        let generation = generator.generate("prompt", AgentKind::Evaluator).await;

        assert_eq!(generation.fallback_reason(), Some("empty completion"));
    }

    #[tokio::test]
    async fn test_offline_generator() {
        let generator = TextGenerator::offline();
        assert!(generator.is_offline());

        let generation = generator.generate("prompt", AgentKind::PolicyResearcher).await;
        assert_eq!(generation.fallback_reason(), Some("offline mode"));
    }

    #[test]
    fn test_from_config_without_backend_is_a_configuration_fault() {
        let config = ConciergeConfig::default();
        assert!(matches!(
            TextGenerator::from_config(&config),
            Err(ConfigError::NoGenerationBackend)
        ));
    }

    #[test]
    fn test_from_config_allows_stub() {
        let config = ConciergeConfig::default().with_allow_stub_llm(true);
        let generator = TextGenerator::from_config(&config).expect("stub allowed");
        assert!(generator.is_offline());
    }

    #[test]
    fn test_from_config_with_endpoint() {
        let config = ConciergeConfig::default().with_api_base("http://localhost:4000");
        let generator = TextGenerator::from_config(&config).expect("endpoint configured");
        assert!(!generator.is_offline());
    }
}
