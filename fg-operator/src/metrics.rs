use std::ops::Deref;
use std::sync::Arc;

use prometheus::{IntCounter, Opts, Registry};

pub struct Inner {
    votes_submitted: IntCounter,
    votes_skipped: IntCounter,
    commits_submitted: IntCounter,
    critical_errors: IntCounter,
    status_by_fp: IntGaugeVecHandle,
}

/// A label-keyed `IntGaugeVec` wrapper, kept deliberately thin: it exists so
/// `FpInstance` can `set` a single FP's status gauge without holding a label
/// vector reference itself.
struct IntGaugeVecHandle(prometheus::IntGaugeVec);

impl IntGaugeVecHandle {
    fn set(&self, fp_pk_hex: &str, status: i64) {
        self.0.with_label_values(&[fp_pk_hex]).set(status);
    }
}

/// Per-FP-instance operational metrics (C6/C7), following the teacher's
/// `Arc`-wrapped, explicitly-registered handle pattern.
#[derive(Clone)]
pub struct OperatorMetrics(Arc<Inner>);

impl Deref for OperatorMetrics {
    type Target = Inner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl OperatorMetrics {
    pub fn register(registry: &Registry) -> Self {
        let votes_submitted = IntCounter::new(
            "fg_operator_votes_submitted_total",
            "finality votes successfully submitted",
        )
        .expect("valid counter opts");
        let votes_skipped = IntCounter::new(
            "fg_operator_votes_skipped_total",
            "blocks skipped by the signature loop (no power, already voted, jailed)",
        )
        .expect("valid counter opts");
        let commits_submitted = IntCounter::new(
            "fg_operator_commits_submitted_total",
            "public-randomness commitments successfully submitted",
        )
        .expect("valid counter opts");
        let critical_errors = IntCounter::new(
            "fg_operator_critical_errors_total",
            "unrecoverable errors raised by an FP instance",
        )
        .expect("valid counter opts");
        let status_by_fp = prometheus::IntGaugeVec::new(
            Opts::new("fg_operator_fp_status", "current FpStatus as an integer code, by fp_pk"),
            &["fp_pk"],
        )
        .expect("valid gauge vec opts");

        let _ = registry.register(Box::new(votes_submitted.clone()));
        let _ = registry.register(Box::new(votes_skipped.clone()));
        let _ = registry.register(Box::new(commits_submitted.clone()));
        let _ = registry.register(Box::new(critical_errors.clone()));
        let _ = registry.register(Box::new(status_by_fp.clone()));

        Self(Arc::new(Inner {
            votes_submitted,
            votes_skipped,
            commits_submitted,
            critical_errors,
            status_by_fp: IntGaugeVecHandle(status_by_fp),
        }))
    }

    pub fn noop() -> Self {
        Self::register(&Registry::new())
    }

    pub fn inc_votes_submitted(&self, n: u64) {
        self.votes_submitted.inc_by(n);
    }

    pub fn inc_votes_skipped(&self, n: u64) {
        self.votes_skipped.inc_by(n);
    }

    pub fn inc_commits_submitted(&self) {
        self.commits_submitted.inc();
    }

    pub fn inc_critical_errors(&self) {
        self.critical_errors.inc();
    }

    pub fn set_status(&self, fp_pk_hex: &str, status: fg_types::FpStatus) {
        let code = match status {
            fg_types::FpStatus::Registered => 0,
            fg_types::FpStatus::Active => 1,
            fg_types::FpStatus::Inactive => 2,
            fg_types::FpStatus::Jailed => 3,
            fg_types::FpStatus::Slashed => 4,
        };
        self.status_by_fp.set(fp_pk_hex, code);
    }
}
