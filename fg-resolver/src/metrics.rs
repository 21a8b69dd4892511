use std::ops::Deref;
use std::sync::Arc;

use prometheus::{IntCounterVec, Opts, Registry};

pub struct Inner {
    hits: IntCounterVec,
    misses: IntCounterVec,
}

/// Per-cache-layer hit/miss counters (C8), following the teacher's
/// `Arc`-wrapped, explicitly-registered handle pattern.
#[derive(Clone)]
pub struct CacheMetrics(Arc<Inner>);

impl Deref for CacheMetrics {
    type Target = Inner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl CacheMetrics {
    pub fn register(registry: &Registry) -> Self {
        let hits = IntCounterVec::new(
            Opts::new("fg_resolver_cache_hits_total", "cache hits, by layer"),
            &["layer"],
        )
        .expect("valid counter vec opts");
        let misses = IntCounterVec::new(
            Opts::new("fg_resolver_cache_misses_total", "cache misses, by layer"),
            &["layer"],
        )
        .expect("valid counter vec opts");

        let _ = registry.register(Box::new(hits.clone()));
        let _ = registry.register(Box::new(misses.clone()));

        Self(Arc::new(Inner { hits, misses }))
    }

    pub fn noop() -> Self {
        Self::register(&Registry::new())
    }

    pub fn hit(&self, layer: &str) {
        self.hits.with_label_values(&[layer]).inc();
    }

    pub fn miss(&self, layer: &str) {
        self.misses.with_label_values(&[layer]).inc();
    }
}
