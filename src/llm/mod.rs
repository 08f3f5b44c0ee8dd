//! Text generation for the concierge agents.
//!
//! Agents never talk to a model directly. They receive a [`TextGenerator`]
//! through the run context, which wraps an optional [`LlmProvider`] and
//! substitutes a deterministic offline response whenever the provider is
//! missing or fails.
//!
//! ```ignore
//! use climate_concierge::llm::{LiteLlmClient, TextGenerator};
//! use climate_concierge::config::ModelConfig;
//! use std::sync::Arc;
//!
//! let config = ModelConfig { api_base: Some("http://localhost:4000".into()), ..Default::default() };
//! let client = LiteLlmClient::from_config(&config)?;
//! let generator = TextGenerator::with_provider(Arc::new(client), &config);
//!
//! let generation = generator.generate("Summarize...", AgentKind::PolicyResearcher).await;
//! if generation.is_fallback() {
//!     println!("offline text used");
//! }
//! ```

pub mod generator;
pub mod litellm;
pub mod offline;

pub use generator::{Generation, GenerationSource, TextGenerator};
pub use litellm::{GenerationRequest, GenerationResponse, LiteLlmClient, LlmProvider, Message};
pub use offline::offline_response;
