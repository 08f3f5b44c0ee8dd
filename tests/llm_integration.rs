//! Integration tests against a live OpenAI-compatible endpoint.
//!
//! Run with: LITELLM_API_BASE=http://localhost:4000 cargo test --test llm_integration -- --ignored

use climate_concierge::agents::AgentKind;
use climate_concierge::config::ModelConfig;
use climate_concierge::llm::{GenerationRequest, LiteLlmClient, LlmProvider, TextGenerator};
use std::sync::Arc;

fn model_config() -> ModelConfig {
    let api_base = std::env::var("LITELLM_API_BASE")
        .expect("LITELLM_API_BASE environment variable must be set for integration tests");
    ModelConfig {
        api_base: Some(api_base),
        api_key: std::env::var("LITELLM_API_KEY").ok(),
        ..ModelConfig::default()
    }
}

#[tokio::test]
#[ignore] // Run with: cargo test --test llm_integration -- --ignored
async fn test_simple_generation() {
    let config = model_config();
    let client = LiteLlmClient::from_config(&config).expect("client builds");

    let mut request = GenerationRequest::from_prompt(
        "What is 2 + 2? Reply with just the number.",
        &config,
    );
    request.temperature = 0.0;
    request.max_tokens = 10;

    let response = client.generate(request).await;
    assert!(response.is_ok(), "Generation failed: {:?}", response.err());

    let response = response.expect("Should have response");
    assert!(
        response.content.contains('4'),
        "Response should contain '4', got: {}",
        response.content
    );
}

#[tokio::test]
#[ignore]
async fn test_generator_uses_endpoint_for_agents() {
    let config = model_config();
    let provider = Arc::new(LiteLlmClient::from_config(&config).expect("client builds"));
    let generator = TextGenerator::with_provider(provider, &config);

    let generation = generator
        .generate(
            "Summarize in one sentence why rooftop solar helps a neighborhood.",
            AgentKind::PolicyResearcher,
        )
        .await;

    assert!(
        generation.fallback_reason().is_none(),
        "Endpoint call fell back: {:?}",
        generation.fallback_reason()
    );
    assert!(!generation.into_text().trim().is_empty());
}
