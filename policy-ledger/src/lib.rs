//! Policy Ledger
//!
//! Append-only, hash-linked ledger of insurance policy transactions.
//!
//! # Architecture
//!
//! - **Pending buffer**: transactions are staged until the next block is sealed
//! - **Hash linkage**: every block records the SHA-256 digest of its predecessor
//! - **Canonical bytes**: fixed field order and sorted keys make digests stable
//! - **Single Writer**: one actor task owns the ledger when callers share it
//!
//! # Invariants
//!
//! - The chain is never empty: genesis (index 1, previous hash `"1"`) is sealed at construction
//! - Block indices increase by exactly one
//! - Sealed blocks are never modified; tampering is detected, not repaired

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod canonical;
pub mod crypto;
pub mod ledger;
pub mod actor;
pub mod view;
pub mod error;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{
    AccountId, Block, PolicyDetails, PolicyStatus, PolicyType, Transaction,
    GENESIS_PREVIOUS_HASH,
};
pub use ledger::{audit_chain, verify_chain, ChainAudit, ChainDefect, Ledger};
pub use actor::{spawn_ledger_actor, LedgerHandle, Submission};
pub use config::Config;
