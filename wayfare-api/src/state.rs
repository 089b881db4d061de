use std::sync::Arc;

use wayfare_amadeus::AmadeusClient;
use wayfare_core::assistant::TravelAssistant;
use wayfare_core::repository::{TripRepository, UserRepository};
use wayfare_core::supplier::TravelSupplier;
use wayfare_store::app_config::{CacheConfig, Config, RateLimitConfig, DEV_JWT_SECRET};
use wayfare_store::{
    InMemoryTripRepository, InMemoryUserRepository, MemoryStore, RedisClient, RedisStore,
    RedisTripRepository, RedisUserRepository, ResponseCache,
};

use crate::metrics::Metrics;
use crate::middleware::resiliency::Resiliency;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub supplier: Arc<dyn TravelSupplier>,
    pub assistant: Arc<dyn TravelAssistant>,
    pub cache: ResponseCache,
    pub trips: Arc<dyn TripRepository>,
    pub users: Arc<dyn UserRepository>,
    /// Present only when Redis is configured; enables rate limiting.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub cache_ttls: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub resiliency: Arc<Resiliency>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Process-local state with default settings, used by tests and by
    /// deployments without Redis.
    pub fn in_memory(
        supplier: Arc<dyn TravelSupplier>,
        assistant: Arc<dyn TravelAssistant>,
    ) -> anyhow::Result<Self> {
        let config = Config::default();
        Ok(Self {
            supplier,
            assistant,
            cache: ResponseCache::memory(),
            trips: Arc::new(InMemoryTripRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
            redis: None,
            auth: AuthConfig {
                secret: DEV_JWT_SECRET.to_string(),
                expiration: config.auth.jwt_expiration_seconds,
            },
            cache_ttls: config.cache,
            rate_limit: config.rate_limit,
            resiliency: Arc::new(Resiliency::new(&config.resiliency)),
            metrics: Arc::new(Metrics::new()?),
        })
    }

    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        if !config.amadeus.has_credentials() {
            tracing::warn!("Amadeus credentials are not configured, searches will fail");
        }
        let supplier: Arc<dyn TravelSupplier> = Arc::new(AmadeusClient::new(&config.amadeus)?);
        tracing::info!("Travel supplier: {} at {}", supplier.name(), config.amadeus.base_url);
        let assistant = wayfare_assistant::build_assistant(&config.assistant)?;
        tracing::info!("Travel assistant provider: {}", assistant.provider());

        // 1. Storage backends: Redis when configured, process memory otherwise
        let (cache, trips, users, redis): (
            ResponseCache,
            Arc<dyn TripRepository>,
            Arc<dyn UserRepository>,
            Option<Arc<RedisClient>>,
        ) = match config.redis.url() {
            Some(url) => {
                let client = Arc::new(RedisClient::new(url).await?);
                client.ping().await?;
                (
                    ResponseCache::new(Arc::new(RedisStore::new(client.clone()))),
                    Arc::new(RedisTripRepository::new(client.clone())),
                    Arc::new(RedisUserRepository::new(client.clone())),
                    Some(client),
                )
            }
            None => {
                tracing::info!("REDIS_URL not set, using in-memory cache and storage");
                let store = Arc::new(MemoryStore::new());
                store.clone().spawn_sweeper(config.cache.sweep_interval());
                (
                    ResponseCache::new(store),
                    Arc::new(InMemoryTripRepository::new()),
                    Arc::new(InMemoryUserRepository::new()),
                    None,
                )
            }
        };

        // 2. Everything else comes straight from configuration
        Ok(Self {
            supplier,
            assistant,
            cache,
            trips,
            users,
            redis,
            auth: AuthConfig {
                secret: config.auth.jwt_secret.clone(),
                expiration: config.auth.jwt_expiration_seconds,
            },
            cache_ttls: config.cache.clone(),
            rate_limit: config.rate_limit.clone(),
            resiliency: Arc::new(Resiliency::new(&config.resiliency)),
            metrics: Arc::new(Metrics::new()?),
        })
    }
}
