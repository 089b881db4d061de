use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use wayfare_store::app_config::ResiliencyConfig;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,   // Normal operation
    Open,     // Failure detected, failing fast
    HalfOpen, // Testing if upstream is back
}

pub struct CircuitBreaker {
    pub name: String,
    pub state: RwLock<CircuitState>,
    pub failure_count: AtomicUsize,
    pub failure_threshold: usize,
    pub reset_timeout: Duration,
    pub last_failure: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(name: &str, threshold: usize, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicUsize::new(0),
            failure_threshold: threshold.max(1),
            reset_timeout: timeout,
            last_failure: RwLock::new(None),
        }
    }

    pub async fn current(&self) -> CircuitState {
        *self.state.read().await
    }

    /// Whether a request may go upstream. Once the open period has passed,
    /// exactly one caller is admitted as the half-open trial; everyone else
    /// keeps failing fast until that trial settles the state.
    pub async fn check(&self) -> bool {
        if *self.state.read().await == CircuitState::Closed {
            return true;
        }

        let mut state = self.state.write().await;
        let mut last = self.last_failure.write().await;
        match *state {
            CircuitState::Closed => true,
            CircuitState::Open | CircuitState::HalfOpen => {
                // A trial that never reported back is replaced after another timeout
                let due = last.map_or(true, |instant| instant.elapsed() >= self.reset_timeout);
                if !due {
                    return false;
                }
                if *state == CircuitState::Open {
                    tracing::info!("Circuit Breaker [{}] moving to Half-Open", self.name);
                }
                *state = CircuitState::HalfOpen;
                *last = Some(Instant::now());
                true
            }
        }
    }

    pub async fn record_success(&self) {
        let mut state = self.state.write().await;
        if *state == CircuitState::HalfOpen {
            *state = CircuitState::Closed;
            self.failure_count.store(0, Ordering::SeqCst);
            tracing::info!("Circuit Breaker [{}] recovered to Closed", self.name);
        } else if *state == CircuitState::Closed {
            self.failure_count.store(0, Ordering::SeqCst);
        }
    }

    pub async fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;

        if count >= self.failure_threshold || *state == CircuitState::HalfOpen {
            *state = CircuitState::Open;
            let mut last = self.last_failure.write().await;
            *last = Some(Instant::now());
            tracing::error!("Circuit Breaker [{}] TRIPPED to Open. Failures: {}", self.name, count);
        }
    }
}

/// One breaker per upstream provider.
pub struct Resiliency {
    pub amadeus_cb: CircuitBreaker,
    pub assistant_cb: CircuitBreaker,
}

impl Resiliency {
    pub fn new(config: &ResiliencyConfig) -> Self {
        let timeout = Duration::from_secs(config.reset_timeout_seconds);
        Self {
            amadeus_cb: CircuitBreaker::new("amadeus", config.failure_threshold, timeout),
            assistant_cb: CircuitBreaker::new("assistant", config.failure_threshold, timeout),
        }
    }

    fn for_path(&self, path: &str) -> Option<&CircuitBreaker> {
        if path.starts_with("/api/flights")
            || path.starts_with("/api/hotels")
            || path.starts_with("/api/destinations")
        {
            Some(&self.amadeus_cb)
        } else if path.starts_with("/api/ai") {
            Some(&self.assistant_cb)
        } else {
            None
        }
    }
}

pub async fn circuit_breaker_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(cb) = state.resiliency.for_path(req.uri().path()) else {
        return next.run(req).await;
    };

    if !cb.check().await {
        return AppError::ServiceUnavailable(format!(
            "Circuit Breaker [{}] is OPEN",
            cb.name
        ))
        .into_response();
    }

    let response = next.run(req).await;

    if response.status().is_server_error() {
        cb.record_failure().await;
    } else {
        cb.record_success().await;
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_opens_after_threshold_and_recovers() {
        let cb = CircuitBreaker::new("test", 3, Duration::from_secs(30));

        for _ in 0..2 {
            cb.record_failure().await;
        }
        assert!(cb.check().await);
        cb.record_failure().await;
        assert_eq!(cb.current().await, CircuitState::Open);
        assert!(!cb.check().await);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(cb.check().await);
        assert_eq!(cb.current().await, CircuitState::HalfOpen);

        cb.record_success().await;
        assert_eq!(cb.current().await, CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens() {
        let cb = CircuitBreaker::new("test", 1, Duration::from_secs(10));
        cb.record_failure().await;
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(cb.check().await);

        cb.record_failure().await;
        assert_eq!(cb.current().await, CircuitState::Open);
        assert!(!cb.check().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_admits_a_single_trial() {
        let cb = CircuitBreaker::new("test", 1, Duration::from_secs(30));
        cb.record_failure().await;
        tokio::time::advance(Duration::from_secs(30)).await;

        assert!(cb.check().await);
        assert!(!cb.check().await);
        assert!(!cb.check().await);
        assert_eq!(cb.current().await, CircuitState::HalfOpen);

        cb.record_success().await;
        assert!(cb.check().await);
        assert!(cb.check().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_trial_is_replaced_after_timeout() {
        let cb = CircuitBreaker::new("test", 1, Duration::from_secs(30));
        cb.record_failure().await;
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(cb.check().await);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(!cb.check().await);
        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(cb.check().await);
    }

    #[tokio::test]
    async fn test_success_resets_failure_streak() {
        let cb = CircuitBreaker::new("test", 2, Duration::from_secs(10));
        cb.record_failure().await;
        cb.record_success().await;
        cb.record_failure().await;
        assert_eq!(cb.current().await, CircuitState::Closed);
    }

    #[test]
    fn test_paths_map_to_breakers() {
        let resiliency = Resiliency::new(&ResiliencyConfig::default());
        let name = |p: &str| resiliency.for_path(p).map(|cb| cb.name.as_str());
        assert_eq!(name("/api/hotels/search"), Some("amadeus"));
        assert_eq!(name("/api/destinations/airports"), Some("amadeus"));
        assert_eq!(name("/api/ai/chat"), Some("assistant"));
        assert_eq!(name("/api/trips"), None);
    }
}
