use async_trait::async_trait;
use chrono::Month;
use wayfare_core::assistant::{
    ChatMessage, ChatRole, Recommendation, RecommendationRequest, TravelAssistant, TripContext,
};
use wayfare_core::CoreResult;

use crate::catalog::{find_by_iata, Destination, DESTINATIONS};

pub const MAX_RECOMMENDATIONS: usize = 5;

const INTEREST_WEIGHT: f64 = 2.0;
const SEASON_WEIGHT: f64 = 1.5;
const BUDGET_FIT_WEIGHT: f64 = 1.0;
const OVER_BUDGET_PENALTY: f64 = 2.0;
/// Up to this share over budget is tolerated without penalty.
const BUDGET_SLACK: f64 = 1.25;

fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_else(|| format!("month {}", month))
}

fn matches_interest(tag: &str, interest: &str) -> bool {
    tag.starts_with(interest) || interest.starts_with(tag)
}

/// Deterministic concierge working from the built-in destination catalog.
#[derive(Debug, Default, Clone)]
pub struct RuleBasedAssistant;

impl RuleBasedAssistant {
    pub fn new() -> Self {
        Self
    }

    fn score(&self, destination: &Destination, request: &RecommendationRequest) -> (f64, Vec<String>) {
        let mut score = 0.0;
        let mut reasons = Vec::new();

        let matched: Vec<&str> = request
            .interests
            .iter()
            .map(|i| i.trim().to_lowercase())
            .filter(|i| !i.is_empty())
            .filter_map(|interest| {
                destination
                    .tags
                    .iter()
                    .find(|tag| matches_interest(tag, &interest))
                    .copied()
            })
            .collect();
        if !matched.is_empty() {
            score += INTEREST_WEIGHT * matched.len() as f64;
            reasons.push(format!("known for {}", matched.join(", ")));
        }

        if let Some(month) = request.month {
            if destination.best_months.contains(&month) {
                score += SEASON_WEIGHT;
                reasons.push(format!("at its best in {}", month_name(month)));
            }
        }

        if let Some(budget) = request.budget {
            if destination.weekly_cost <= budget {
                score += BUDGET_FIT_WEIGHT;
                reasons.push(format!("a week costs around {:.0} EUR", destination.weekly_cost));
            } else if destination.weekly_cost > budget * BUDGET_SLACK {
                score -= OVER_BUDGET_PENALTY;
            }
        }

        (score, reasons)
    }

    pub fn recommendations(&self, request: &RecommendationRequest) -> Vec<Recommendation> {
        let origin = request.origin.as_deref().map(str::to_ascii_uppercase);

        let mut scored: Vec<Recommendation> = DESTINATIONS
            .iter()
            .filter(|d| origin.as_deref() != Some(d.iata))
            .map(|d| {
                let (score, reasons) = self.score(d, request);
                let reason = if reasons.is_empty() {
                    format!("A popular choice in {}", d.country)
                } else {
                    let mut text = reasons.join("; ");
                    if let Some(first) = text.get(..1) {
                        text = first.to_uppercase() + &text[1..];
                    }
                    text
                };
                Recommendation {
                    name: d.name.to_string(),
                    iata: d.iata.to_string(),
                    country: d.country.to_string(),
                    reason,
                    score: (score * 100.0).round() / 100.0,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        scored.truncate(MAX_RECOMMENDATIONS);
        scored
    }

    pub fn reply(&self, messages: &[ChatMessage], trip: Option<&TripContext>) -> String {
        let question = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.to_lowercase())
            .unwrap_or_default();
        let has = |words: &[&str]| words.iter().any(|w| question.contains(w));

        let trip = trip.cloned().unwrap_or_default();
        let place = trip
            .destination
            .as_deref()
            .and_then(find_by_iata)
            .map(|d| d.name.to_string())
            .or_else(|| trip.destination.clone())
            .unwrap_or_else(|| "your destination".to_string());
        let nights = match (trip.start_date, trip.end_date) {
            (Some(start), Some(end)) if end > start => Some((end - start).num_days()),
            _ => None,
        };

        if has(&["flight", "fly", "airline", "plane"]) {
            let from = trip.origin.as_deref().unwrap_or("your home airport");
            return format!(
                "Search flights from {} to {} on the Flights page. Fares tend to be lowest when booked \
                 six to eight weeks ahead, and midweek departures are usually cheaper.",
                from, place
            );
        }

        if has(&["hotel", "stay", "accommodation", "room"]) {
            let length = nights
                .map(|n| format!(" for your {} nights", n))
                .unwrap_or_default();
            return format!(
                "Compare hotel offers in {}{} on the Hotels page. Offers close to the check-in date \
                 change quickly, so confirm the price before you finalize.",
                place, length
            );
        }

        if has(&["budget", "cost", "price", "cheap", "expensive", "afford"]) {
            let estimate = trip.destination.as_deref().and_then(find_by_iata).map(|d| {
                let days = nights.unwrap_or(7) as f64;
                let travellers = trip.adults.unwrap_or(1).max(1) as f64;
                d.weekly_cost * days / 7.0 * travellers
            });
            return match (estimate, trip.budget) {
                (Some(cost), Some(budget)) if cost > budget => format!(
                    "Expect roughly {:.0} EUR on the ground in {}, above your {:.0} budget. \
                     Fewer nights or a cheaper neighbourhood would close the gap.",
                    cost, place, budget
                ),
                (Some(cost), _) => format!(
                    "Expect roughly {:.0} EUR on the ground in {}, flights excluded.",
                    cost, place
                ),
                (None, _) => format!(
                    "Set a destination on your trip and I can estimate daily costs for {}.",
                    place
                ),
            };
        }

        if has(&["when", "weather", "season", "best time", "month"]) {
            return match trip.destination.as_deref().and_then(find_by_iata) {
                Some(d) => {
                    let months: Vec<String> = d.best_months.iter().map(|m| month_name(*m)).collect();
                    format!("{} is most pleasant in {}.", d.name, months.join(", "))
                }
                None => "Tell me where you are heading and I will suggest the best season.".to_string(),
            };
        }

        if has(&["where", "recommend", "suggest", "idea", "inspire"]) {
            let request = RecommendationRequest {
                origin: trip.origin.clone(),
                budget: trip.budget,
                interests: trip.interests.clone(),
                month: trip.start_date.map(|d| chrono::Datelike::month(&d)),
            };
            let picks: Vec<String> = self
                .recommendations(&request)
                .into_iter()
                .take(3)
                .map(|r| format!("{} ({})", r.name, r.reason.to_lowercase()))
                .collect();
            return format!("You might enjoy {}.", picks.join("; "));
        }

        format!(
            "I can help with flights, hotels, budgets and timing for {}. What would you like to plan first?",
            place
        )
    }
}

#[async_trait]
impl TravelAssistant for RuleBasedAssistant {
    fn provider(&self) -> &str {
        "rules"
    }

    async fn chat(&self, messages: &[ChatMessage], trip: Option<&TripContext>) -> CoreResult<String> {
        Ok(self.reply(messages, trip))
    }

    async fn recommend(&self, request: &RecommendationRequest) -> CoreResult<Vec<Recommendation>> {
        Ok(self.recommendations(request))
    }
}
