use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;
use wayfare_core::assistant::{
    ChatMessage, ChatRole, Recommendation, RecommendationRequest, TravelAssistant, TripContext,
};
use wayfare_core::CoreResult;
use wayfare_store::app_config::AssistantConfig;

use crate::error::AssistantError;
use crate::rules::{RuleBasedAssistant, MAX_RECOMMENDATIONS};

const CONCIERGE_PROMPT: &str = "You are a friendly travel concierge. Give concise, practical \
answers about flights, hotels, budgets and things to do. Never invent prices or availability.";

const RECOMMEND_PROMPT: &str = "Suggest travel destinations. Answer with a JSON array only, each \
item {\"name\", \"iata\", \"country\", \"reason\", \"score\"} where iata is the 3-letter city \
code and score is between 0 and 10.";

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Delay before retry number `attempt` (1-based): 1s, 2s, 4s, ... capped at a minute.
fn backoff(attempt: u32) -> Duration {
    let secs = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Concierge backed by any endpoint speaking the OpenAI chat completions API.
pub struct OpenAiCompatibleAssistant {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_retries: u32,
    fallback: RuleBasedAssistant,
}

impl OpenAiCompatibleAssistant {
    pub fn new(base_url: &str, config: &AssistantConfig) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            fallback: RuleBasedAssistant::new(),
        })
    }

    /// Sends a completion request, retrying transient failures with
    /// exponential backoff (1s, 2s, 4s, ...).
    async fn complete(&self, messages: Vec<WireMessage>) -> Result<String, AssistantError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let mut attempt = 0;
        loop {
            match self.try_complete(&request).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "LLM request failed (attempt {}/{}): {}, retrying",
                        attempt,
                        self.max_retries + 1,
                        e
                    );
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_complete(&self, request: &ChatCompletionRequest<'_>) -> Result<String, AssistantError> {
        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(AssistantError::EmptyResponse)
    }

    fn system_message(trip: Option<&TripContext>) -> WireMessage {
        let mut content = CONCIERGE_PROMPT.to_string();
        if let Some(trip) = trip {
            if let Ok(json) = serde_json::to_string(trip) {
                content.push_str("\nThe traveller's current trip: ");
                content.push_str(&json);
            }
        }
        WireMessage {
            role: ChatRole::System.to_string(),
            content,
        }
    }
}

/// Extracts the recommendation list from a model answer, tolerating prose or
/// code fences around the JSON array.
pub fn parse_recommendations(answer: &str) -> Option<Vec<Recommendation>> {
    let start = answer.find('[')?;
    let end = answer.rfind(']')?;
    if end <= start {
        return None;
    }
    let mut recs: Vec<Recommendation> = serde_json::from_str(&answer[start..=end]).ok()?;
    recs.retain(|r| r.iata.len() == 3);
    for r in recs.iter_mut() {
        r.iata = r.iata.to_ascii_uppercase();
    }
    recs.truncate(MAX_RECOMMENDATIONS);
    if recs.is_empty() {
        None
    } else {
        Some(recs)
    }
}

#[async_trait]
impl TravelAssistant for OpenAiCompatibleAssistant {
    fn provider(&self) -> &str {
        "openai-compatible"
    }

    async fn chat(&self, messages: &[ChatMessage], trip: Option<&TripContext>) -> CoreResult<String> {
        let mut wire = vec![Self::system_message(trip)];
        wire.extend(
            messages
                .iter()
                .filter(|m| m.role != ChatRole::System)
                .map(|m| WireMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                }),
        );
        Ok(self.complete(wire).await?)
    }

    async fn recommend(&self, request: &RecommendationRequest) -> CoreResult<Vec<Recommendation>> {
        let ask = serde_json::to_string(request).unwrap_or_default();
        let wire = vec![
            WireMessage {
                role: ChatRole::System.to_string(),
                content: RECOMMEND_PROMPT.to_string(),
            },
            WireMessage {
                role: ChatRole::User.to_string(),
                content: ask,
            },
        ];

        let answer = self.complete(wire).await?;
        match parse_recommendations(&answer) {
            Some(recs) => Ok(recs),
            None => {
                warn!("LLM recommendations were not valid JSON, using catalog ranking");
                Ok(self.fallback.recommendations(request))
            }
        }
    }
}
