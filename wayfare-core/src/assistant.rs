use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::iata::normalize_optional_code;
use crate::{CoreError, CoreResult};

pub const MAX_CHAT_MESSAGES: usize = 40;
pub const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::System => write!(f, "system"),
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Trip details the concierge can ground its answers in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripContext {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub adults: Option<u32>,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub origin: Option<String>,
    pub budget: Option<f64>,
    #[serde(default)]
    pub interests: Vec<String>,
    /// 1-12
    pub month: Option<u32>,
}

impl RecommendationRequest {
    /// Canonical form, so equivalent requests share a cache entry.
    pub fn normalized(mut self) -> CoreResult<Self> {
        self.origin = normalize_optional_code("origin", self.origin.as_deref())?;
        if let Some(budget) = self.budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err(CoreError::validation("budget must be a positive amount"));
            }
        }
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(CoreError::validation("month must be between 1 and 12"));
            }
        }
        let mut interests: Vec<String> = self
            .interests
            .iter()
            .map(|i| i.trim().to_lowercase())
            .filter(|i| !i.is_empty())
            .collect();
        interests.sort();
        interests.dedup();
        self.interests = interests;
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub iata: String,
    pub country: String,
    pub reason: String,
    pub score: f64,
}

/// Drops blank messages and enforces the conversation limits. The most recent
/// messages are kept when the history is too long.
pub fn sanitize_conversation(messages: Vec<ChatMessage>) -> CoreResult<Vec<ChatMessage>> {
    let mut kept: Vec<ChatMessage> = messages
        .into_iter()
        .filter(|m| !m.content.trim().is_empty())
        .collect();
    if !kept.iter().any(|m| m.role == ChatRole::User) {
        return Err(CoreError::validation("conversation needs at least one user message"));
    }
    if kept.iter().any(|m| m.content.chars().count() > MAX_MESSAGE_CHARS) {
        return Err(CoreError::validation(format!(
            "messages are limited to {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    if kept.len() > MAX_CHAT_MESSAGES {
        let excess = kept.len() - MAX_CHAT_MESSAGES;
        kept.drain(..excess);
    }
    Ok(kept)
}

#[async_trait]
pub trait TravelAssistant: Send + Sync {
    fn provider(&self) -> &str;

    async fn chat(&self, messages: &[ChatMessage], trip: Option<&TripContext>) -> CoreResult<String>;

    async fn recommend(&self, request: &RecommendationRequest) -> CoreResult<Vec<Recommendation>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_user_message() {
        let msgs = vec![ChatMessage::new(ChatRole::Assistant, "Hi!")];
        assert!(sanitize_conversation(msgs).is_err());
        assert!(sanitize_conversation(vec![]).is_err());
    }

    #[test]
    fn test_keeps_latest_messages() {
        let msgs: Vec<ChatMessage> = (0..50)
            .map(|i| ChatMessage::new(ChatRole::User, format!("message {}", i)))
            .collect();
        let kept = sanitize_conversation(msgs).unwrap();
        assert_eq!(kept.len(), MAX_CHAT_MESSAGES);
        assert_eq!(kept[0].content, "message 10");
        assert_eq!(kept.last().unwrap().content, "message 49");
    }

    #[test]
    fn test_recommendation_request_normalized() {
        let request = RecommendationRequest {
            origin: Some(" lis ".into()),
            budget: Some(900.0),
            interests: vec!["Food".into(), "beach".into(), "food ".into(), "".into()],
            month: Some(6),
        }
        .normalized()
        .unwrap();
        assert_eq!(request.origin.as_deref(), Some("LIS"));
        assert_eq!(request.interests, vec!["beach", "food"]);

        let bad_month = RecommendationRequest {
            month: Some(13),
            ..Default::default()
        };
        assert!(bad_month.normalized().is_err());
        let bad_budget = RecommendationRequest {
            budget: Some(-1.0),
            ..Default::default()
        };
        assert!(bad_budget.normalized().is_err());
    }

    #[test]
    fn test_role_wire_format() {
        let msg: ChatMessage = serde_json::from_str(r#"{"role":"user","content":"hello"}"#).unwrap();
        assert_eq!(msg.role, ChatRole::User);
        assert_eq!(msg.role.to_string(), "user");
    }
}
