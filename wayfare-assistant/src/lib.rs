pub mod catalog;
pub mod error;
pub mod openai;
pub mod rules;

use std::sync::Arc;

use wayfare_core::assistant::TravelAssistant;
use wayfare_store::app_config::AssistantConfig;

pub use error::AssistantError;
pub use openai::OpenAiCompatibleAssistant;
pub use rules::RuleBasedAssistant;

/// Picks the LLM-backed concierge when an endpoint is configured, the
/// rule-based one otherwise.
pub fn build_assistant(config: &AssistantConfig) -> Result<Arc<dyn TravelAssistant>, AssistantError> {
    match config.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(base_url) => {
            tracing::info!("Concierge using OpenAI-compatible endpoint {} ({})", base_url, config.model);
            Ok(Arc::new(OpenAiCompatibleAssistant::new(base_url, config)?))
        }
        None => {
            tracing::info!("No LLM endpoint configured, concierge is rule-based");
            Ok(Arc::new(RuleBasedAssistant::new()))
        }
    }
}
