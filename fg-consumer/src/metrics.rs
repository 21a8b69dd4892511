use std::ops::Deref;
use std::sync::Arc;

use prometheus::{Gauge, Histogram, HistogramOpts, Opts, Registry};

pub struct Inner {
    gas_balance: Gauge,
    gas_used: Histogram,
}

/// Gas-balance/usage metrics recorded after every broadcast (spec.md §2 C5),
/// following the teacher's `Arc`-wrapped, explicitly-registered handle
/// pattern rather than a global Prometheus singleton.
#[derive(Clone)]
pub struct GasMetrics(Arc<Inner>);

impl Deref for GasMetrics {
    type Target = Inner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl GasMetrics {
    pub fn register(registry: &Registry) -> Self {
        let gas_balance = Gauge::with_opts(Opts::new(
            "fg_consumer_signer_balance",
            "signer account balance observed after the last broadcast",
        ))
        .expect("valid gauge opts");
        let gas_used = Histogram::with_opts(HistogramOpts::new(
            "fg_consumer_gas_used",
            "gas used by the last broadcast tx",
        ))
        .expect("valid histogram opts");

        let _ = registry.register(Box::new(gas_balance.clone()));
        let _ = registry.register(Box::new(gas_used.clone()));

        Self(Arc::new(Inner {
            gas_balance,
            gas_used,
        }))
    }

    pub fn noop() -> Self {
        Self::register(&Registry::new())
    }

    pub fn observe_balance(&self, balance: u64) {
        self.gas_balance.set(balance as f64);
    }

    pub fn observe_gas_used(&self, gas_used: u64) {
        self.gas_used.observe(gas_used as f64);
    }
}
