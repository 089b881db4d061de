use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    cache_lookups: IntCounterVec,
    upstream_requests: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let cache_lookups = IntCounterVec::new(
            Opts::new("wayfare_cache_lookups_total", "Response cache lookups by key prefix"),
            &["prefix", "outcome"],
        )?;
        let upstream_requests = IntCounterVec::new(
            Opts::new("wayfare_upstream_requests_total", "Calls to upstream providers"),
            &["operation", "outcome"],
        )?;

        registry.register(Box::new(cache_lookups.clone()))?;
        registry.register(Box::new(upstream_requests.clone()))?;

        Ok(Self {
            registry,
            cache_lookups,
            upstream_requests,
        })
    }

    pub fn record_cache(&self, prefix: &str, hit: bool) {
        let outcome = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[prefix, outcome]).inc();
    }

    pub fn record_upstream(&self, operation: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        self.upstream_requests.with_label_values(&[operation, outcome]).inc();
    }

    pub fn cache_count(&self, prefix: &str, hit: bool) -> u64 {
        let outcome = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[prefix, outcome]).get()
    }

    /// Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
