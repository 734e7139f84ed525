//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic hashing (fixed field order, sorted policy details)
//! - Immutability once sealed (private fields, read-only accessors)
//! - Exact arithmetic (Decimal for premiums and amounts)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// `previous_hash` recorded on the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Proof recorded on the genesis block unless configured otherwise
pub const DEFAULT_GENESIS_PROOF: u64 = 100;

/// Free-form policy metadata, kept sorted by key
pub type PolicyDetails = BTreeMap<String, String>;

/// Party identifier (insurer vault, policy holder, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace-only identifiers are not usable as a party
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Policy categories offered at issuance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyType {
    /// Flight delay cover
    FlightDelay,
    /// Crop insurance
    CropInsurance,
    /// Crypto theft cover
    CryptoTheft,
}

impl PolicyType {
    /// Label stored in the `type` policy detail
    pub fn label(&self) -> &'static str {
        match self {
            PolicyType::FlightDelay => "Flight Delay",
            PolicyType::CropInsurance => "Crop Insurance",
            PolicyType::CryptoTheft => "Crypto Theft",
        }
    }

    /// Parse from a stored label
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "Flight Delay" => Some(PolicyType::FlightDelay),
            "Crop Insurance" => Some(PolicyType::CropInsurance),
            "Crypto Theft" => Some(PolicyType::CryptoTheft),
            _ => None,
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Policy lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyStatus {
    /// Newly issued
    Active,
}

impl PolicyStatus {
    /// Label stored in the `status` policy detail
    pub fn label(&self) -> &'static str {
        match self {
            PolicyStatus::Active => "Active",
        }
    }
}

/// Build the `{type, status}` details recorded for an issued policy
pub fn policy_details(policy_type: PolicyType, status: PolicyStatus) -> PolicyDetails {
    let mut details = PolicyDetails::new();
    details.insert("type".to_string(), policy_type.label().to_string());
    details.insert("status".to_string(), status.label().to_string());
    details
}

/// A single value transfer with attached policy metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    sender: AccountId,
    receiver: AccountId,
    amount: Decimal,
    policy_details: PolicyDetails,
}

impl Transaction {
    /// Validate and build a transaction
    pub(crate) fn new(
        sender: AccountId,
        receiver: AccountId,
        amount: Decimal,
        policy_details: PolicyDetails,
    ) -> crate::Result<Self> {
        if sender.is_blank() {
            return Err(crate::Error::Validation(
                "Sender must not be empty".to_string(),
            ));
        }
        if receiver.is_blank() {
            return Err(crate::Error::Validation(
                "Receiver must not be empty".to_string(),
            ));
        }
        if amount < Decimal::ZERO {
            return Err(crate::Error::Validation(format!(
                "Amount must be non-negative, got {}",
                amount
            )));
        }

        Ok(Self {
            sender,
            receiver,
            amount,
            policy_details,
        })
    }

    /// Sending party
    pub fn sender(&self) -> &AccountId {
        &self.sender
    }

    /// Receiving party
    pub fn receiver(&self) -> &AccountId {
        &self.receiver
    }

    /// Transferred amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Policy metadata, sorted by key
    pub fn policy_details(&self) -> &PolicyDetails {
        &self.policy_details
    }
}

/// Sealed block of transactions linked to its predecessor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    timestamp: DateTime<Utc>,
    transactions: Vec<Transaction>,
    proof: u64,
    previous_hash: String,
}

impl Block {
    /// Assemble a block record.
    ///
    /// Only [`Ledger`](crate::Ledger) appends blocks to a chain; a block built
    /// here is a hypothetical value that can be hashed or audited.
    pub fn new(
        index: u64,
        timestamp: DateTime<Utc>,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self {
            index,
            timestamp,
            transactions,
            proof,
            previous_hash: previous_hash.into(),
        }
    }

    /// 1-based position in the chain
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Creation time
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Transactions in insertion order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Opaque proof marker
    pub fn proof(&self) -> u64 {
        self.proof
    }

    /// Digest of the preceding block, or the genesis sentinel
    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    /// True for a block carrying the genesis sentinel at index 1
    pub fn is_genesis(&self) -> bool {
        self.index == 1 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// Hex SHA-256 digest of this block's canonical bytes
    pub fn digest(&self) -> String {
        crate::crypto::hash_block(self)
    }
}
