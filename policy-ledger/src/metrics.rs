//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `ledger_transactions_total` - Transactions accepted into the pending buffer
//! - `ledger_transactions_rejected_total` - Submissions rejected by validation
//! - `ledger_blocks_total` - Blocks sealed after genesis
//! - `ledger_integrity_checks_total` - Chain integrity checks run
//! - `ledger_integrity_failures_total` - Integrity checks that found a defect
//! - `ledger_chain_length` - Current number of sealed blocks

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Accepted transactions
    pub transactions_total: IntCounter,

    /// Rejected submissions
    pub transactions_rejected: IntCounter,

    /// Sealed blocks
    pub blocks_total: IntCounter,

    /// Integrity checks run
    pub integrity_checks: IntCounter,

    /// Integrity checks that failed
    pub integrity_failures: IntCounter,

    /// Current chain length
    pub chain_length: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_total = IntCounter::new(
            "ledger_transactions_total",
            "Transactions accepted into the pending buffer",
        )?;
        registry.register(Box::new(transactions_total.clone()))?;

        let transactions_rejected = IntCounter::new(
            "ledger_transactions_rejected_total",
            "Transaction submissions rejected by validation",
        )?;
        registry.register(Box::new(transactions_rejected.clone()))?;

        let blocks_total = IntCounter::new("ledger_blocks_total", "Total number of sealed blocks")?;
        registry.register(Box::new(blocks_total.clone()))?;

        let integrity_checks = IntCounter::new(
            "ledger_integrity_checks_total",
            "Chain integrity checks run",
        )?;
        registry.register(Box::new(integrity_checks.clone()))?;

        let integrity_failures = IntCounter::new(
            "ledger_integrity_failures_total",
            "Chain integrity checks that found a defect",
        )?;
        registry.register(Box::new(integrity_failures.clone()))?;

        let chain_length = IntGauge::new("ledger_chain_length", "Current number of sealed blocks")?;
        registry.register(Box::new(chain_length.clone()))?;

        Ok(Self {
            transactions_total,
            transactions_rejected,
            blocks_total,
            integrity_checks,
            integrity_failures,
            chain_length,
            registry,
        })
    }

    /// Record an accepted or rejected submission
    pub fn record_submission(&self, accepted: bool) {
        if accepted {
            self.transactions_total.inc();
        } else {
            self.transactions_rejected.inc();
        }
    }

    /// Record block sealing
    pub fn record_block_sealed(&self, chain_length: usize) {
        self.blocks_total.inc();
        self.chain_length.set(chain_length as i64);
    }

    /// Record an integrity check outcome
    pub fn record_integrity_check(&self, valid: bool) {
        self.integrity_checks.inc();
        if !valid {
            self.integrity_failures.inc();
        }
    }

    /// Update chain length after a reset
    pub fn set_chain_length(&self, chain_length: usize) {
        self.chain_length.set(chain_length as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> crate::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        exposition_text(buffer)
    }
}

fn exposition_text(buffer: Vec<u8>) -> crate::Result<String> {
    String::from_utf8(buffer).map_err(|e| {
        crate::Error::Metrics(prometheus::Error::Msg(format!(
            "Metrics output is not UTF-8: {}",
            e
        )))
    })
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("transactions_total", &self.transactions_total.get())
            .field("transactions_rejected", &self.transactions_rejected.get())
            .field("blocks_total", &self.blocks_total.get())
            .field("integrity_checks", &self.integrity_checks.get())
            .field("integrity_failures", &self.integrity_failures.get())
            .field("chain_length", &self.chain_length.get())
            .finish_non_exhaustive()
    }
}
