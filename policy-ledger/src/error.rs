//! Error types for the ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// A failed integrity check is not an error: it is reported as a
/// [`ChainAudit`](crate::ledger::ChainAudit) or a `false` from
/// [`Ledger::validate_chain`](crate::Ledger::validate_chain).
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected transaction submission (empty party, negative amount, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Last block requested before the genesis block exists
    #[error("Chain is empty: genesis block has not been created")]
    EmptyChain,

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by caller input rather than ledger state
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
