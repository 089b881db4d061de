use serde::Deserialize;
use std::env;
use std::time::Duration;

pub const DEV_JWT_SECRET: &str = "wayfare-dev-secret-change-me";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub amadeus: AmadeusConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
    pub assistant: AssistantConfig,
    pub rate_limit: RateLimitConfig,
    pub resiliency: ResiliencyConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AmadeusConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_seconds: u64,
}

impl Default for AmadeusConfig {
    fn default() -> Self {
        Self {
            base_url: "https://test.api.amadeus.com".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_seconds: 15,
        }
    }
}

impl AmadeusConfig {
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RedisConfig {
    /// Unset or empty means in-process storage only.
    pub url: Option<String>,
}

impl RedisConfig {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiration_seconds: 7 * 24 * 3600,
        }
    }
}

/// Freshness of cached upstream responses, in seconds. Hotel offers are not
/// listed: their lifetime depends on the check-in date.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub flight_offers_seconds: u64,
    pub hotel_list_seconds: u64,
    pub locations_seconds: u64,
    pub inspiration_seconds: u64,
    pub recommendations_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            flight_offers_seconds: 5 * 60,
            hotel_list_seconds: 24 * 3600,
            locations_seconds: 24 * 3600,
            inspiration_seconds: 3600,
            recommendations_seconds: 10 * 60,
            sweep_interval_seconds: 60,
        }
    }
}

impl CacheConfig {
    pub fn flight_offers_ttl(&self) -> Duration {
        Duration::from_secs(self.flight_offers_seconds)
    }

    pub fn hotel_list_ttl(&self) -> Duration {
        Duration::from_secs(self.hotel_list_seconds)
    }

    pub fn locations_ttl(&self) -> Duration {
        Duration::from_secs(self.locations_seconds)
    }

    pub fn inspiration_ttl(&self) -> Duration {
        Duration::from_secs(self.inspiration_seconds)
    }

    pub fn recommendations_ttl(&self) -> Duration {
        Duration::from_secs(self.recommendations_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AssistantConfig {
    /// OpenAI-compatible endpoint, e.g. `https://api.openai.com/v1`. Without
    /// it the rule-based concierge answers.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub temperature: f32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_window: i64,
    pub window_seconds: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 100,
            window_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ResiliencyConfig {
    pub failure_threshold: usize,
    pub reset_timeout_seconds: u64,
}

impl Default for ResiliencyConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_seconds: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // WAYFARE__AMADEUS__CLIENT_ID=... sets amadeus.client_id
            .add_source(config::Environment::with_prefix("WAYFARE").separator("__"))
            // Plain variables used by existing deployments win over everything else
            .set_override_option("amadeus.base_url", env::var("AMADEUS_BASE").ok())?
            .set_override_option("amadeus.client_id", env::var("AMADEUS_CLIENT_ID").ok())?
            .set_override_option("amadeus.client_secret", env::var("AMADEUS_CLIENT_SECRET").ok())?
            .set_override_option("redis.url", env::var("REDIS_URL").ok())?
            .set_override_option("assistant.api_key", env::var("LLM_API_KEY").ok())?
            .set_override_option("assistant.base_url", env::var("LLM_BASE_URL").ok())?
            .set_override_option("assistant.model", env::var("LLM_MODEL").ok())?
            .build()?;

        s.try_deserialize()
    }
}
