use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};

pub struct Inner {
    read_time: Histogram,
    write_time: Histogram,
    read_bytes: IntCounter,
}

/// Per-store timing/volume metrics, following the teacher's `DbMetrics`
/// shape in `app/src/metrics.rs`: an `Arc`-wrapped inner struct registered
/// once against an explicit `Registry` rather than a global singleton
/// (spec.md §9).
#[derive(Clone)]
pub struct DbMetrics(Arc<Inner>);

impl Deref for DbMetrics {
    type Target = Inner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DbMetrics {
    pub fn register(registry: &Registry, store_name: &str) -> Self {
        let read_time = Histogram::with_opts(
            HistogramOpts::new(
                format!("fg_store_{store_name}_read_seconds"),
                "time spent servicing a read from this store",
            ),
        )
        .expect("valid histogram opts");
        let write_time = Histogram::with_opts(HistogramOpts::new(
            format!("fg_store_{store_name}_write_seconds"),
            "time spent servicing a write to this store",
        ))
        .expect("valid histogram opts");
        let read_bytes = IntCounter::new(
            format!("fg_store_{store_name}_read_bytes_total"),
            "cumulative bytes read from this store",
        )
        .expect("valid counter opts");

        let _ = registry.register(Box::new(read_time.clone()));
        let _ = registry.register(Box::new(write_time.clone()));
        let _ = registry.register(Box::new(read_bytes.clone()));

        Self(Arc::new(Inner {
            read_time,
            write_time,
            read_bytes,
        }))
    }

    /// A metrics handle with nothing registered, for tests and standalone
    /// tools that don't need a live registry.
    pub fn noop() -> Self {
        Self::register(&Registry::new(), "noop")
    }

    pub fn observe_read_time(&self, elapsed: Duration) {
        self.read_time.observe(elapsed.as_secs_f64());
    }

    pub fn observe_write_time(&self, elapsed: Duration) {
        self.write_time.observe(elapsed.as_secs_f64());
    }

    pub fn add_read_bytes(&self, bytes: u64) {
        self.read_bytes.inc_by(bytes);
    }
}
