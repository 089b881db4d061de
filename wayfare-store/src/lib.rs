pub mod app_config;
pub mod cache;
pub mod error;
pub mod redis_repo;
pub mod trip_repo;
pub mod user_repo;

pub use cache::{CacheStore, MemoryStore, RedisStore, ResponseCache};
pub use error::{StoreError, StoreResult};
pub use redis_repo::RedisClient;
pub use trip_repo::{InMemoryTripRepository, RedisTripRepository};
pub use user_repo::{InMemoryUserRepository, RedisUserRepository};
