//! Main ledger orchestration layer
//!
//! The [`Ledger`] owns the sealed chain and the pending-transaction buffer.
//! Every operation is synchronous and runs to completion; callers that need
//! shared access go through [`crate::actor`].
//!
//! # Example
//!
//! ```
//! use policy_ledger::Ledger;
//! use rust_decimal::Decimal;
//!
//! let mut ledger = Ledger::new();
//! ledger
//!     .add_transaction("Insurance_Vault", "Alice", Decimal::from(100), Default::default())
//!     .unwrap();
//!
//! // Caller-side protocol: link to the current tip, then seal.
//! let previous_hash = Ledger::hash(ledger.last_block().unwrap());
//! ledger.create_block(200, previous_hash);
//!
//! assert_eq!(ledger.len(), 2);
//! assert!(ledger.validate_chain());
//! ```

use crate::{
    crypto::hash_block,
    types::{
        AccountId, Block, PolicyDetails, Transaction, DEFAULT_GENESIS_PROOF,
        GENESIS_PREVIOUS_HASH,
    },
    Config, Error, Result,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Append-only, hash-linked chain of blocks plus the pending buffer
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Sealed blocks, never empty after construction
    chain: Vec<Block>,

    /// Transactions waiting for the next block
    pending: Vec<Transaction>,

    /// Proof recorded on the genesis block (reused by `reset`)
    genesis_proof: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Initialize a ledger with the default genesis proof
    pub fn new() -> Self {
        Self::with_genesis_proof(DEFAULT_GENESIS_PROOF)
    }

    /// Initialize a ledger and seal its genesis block
    pub fn with_genesis_proof(genesis_proof: u64) -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pending: Vec::new(),
            genesis_proof,
        };
        ledger.create_block(genesis_proof, GENESIS_PREVIOUS_HASH);
        ledger
    }

    /// Initialize a ledger from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::with_genesis_proof(config.ledger.genesis_proof)
    }

    /// Stage a transaction for the next block.
    ///
    /// Returns the index the next sealed block will receive. Fails with
    /// [`Error::Validation`] when a party is empty or the amount is negative;
    /// the pending buffer is left untouched in that case.
    pub fn add_transaction(
        &mut self,
        sender: impl Into<AccountId>,
        receiver: impl Into<AccountId>,
        amount: Decimal,
        policy_details: PolicyDetails,
    ) -> Result<u64> {
        let tx = Transaction::new(sender.into(), receiver.into(), amount, policy_details)?;

        tracing::debug!(
            sender = %tx.sender(),
            receiver = %tx.receiver(),
            amount = %tx.amount(),
            "Transaction staged"
        );

        self.pending.push(tx);
        Ok(self.next_index())
    }

    /// Seal the pending buffer into a new block linked to `previous_hash`.
    ///
    /// The whole buffer moves into the block and the buffer is left empty.
    /// The supplied hash is recorded as given: a stale link is logged but
    /// still sealed, and later surfaces through [`Ledger::validate_chain`].
    pub fn create_block(&mut self, proof: u64, previous_hash: impl Into<String>) -> &Block {
        let previous_hash = previous_hash.into();
        let index = self.next_index();

        // Wall-clock steps backwards must not reorder block timestamps
        let mut timestamp = Utc::now();
        if let Some(last) = self.chain.last() {
            if last.timestamp() > timestamp {
                timestamp = last.timestamp();
            }
            if hash_block(last) != previous_hash {
                tracing::warn!(index, %previous_hash, "Sealing block with stale previous hash");
            }
        }

        let transactions = std::mem::take(&mut self.pending);
        let block = Block::new(index, timestamp, transactions, proof, previous_hash);

        tracing::info!(
            index,
            transactions = block.transactions().len(),
            proof,
            "Block sealed"
        );

        self.chain.push(block);
        &self.chain[self.chain.len() - 1]
    }

    /// Seal the pending buffer, linking to the digest of the current tip
    pub fn seal_block(&mut self, proof: u64) -> Result<&Block> {
        let previous_hash = hash_block(self.last_block()?);
        Ok(self.create_block(proof, previous_hash))
    }

    /// Deterministic hex digest of a block
    pub fn hash(block: &Block) -> String {
        hash_block(block)
    }

    /// Check every `previous_hash` link from the second block onward
    pub fn validate_chain(&self) -> bool {
        let valid = verify_chain(&self.chain);
        if !valid {
            tracing::warn!(length = self.chain.len(), "Chain integrity check failed");
        }
        valid
    }

    /// Full integrity report for this ledger's chain
    pub fn audit(&self) -> ChainAudit {
        audit_chain(&self.chain)
    }

    /// Most recently sealed block
    pub fn last_block(&self) -> Result<&Block> {
        self.chain.last().ok_or(Error::EmptyChain)
    }

    /// Block at a 1-based index
    pub fn block(&self, index: u64) -> Option<&Block> {
        let position = usize::try_from(index.checked_sub(1)?).ok()?;
        self.chain.get(position)
    }

    /// Sealed blocks in chain order
    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    /// Transactions not yet sealed
    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Number of sealed blocks
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false once initialized
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Proof recorded on the genesis block
    pub fn genesis_proof(&self) -> u64 {
        self.genesis_proof
    }

    /// Discard every block and pending transaction and seal a fresh genesis
    pub fn reset(&mut self) {
        tracing::info!(discarded_blocks = self.chain.len(), "Ledger reset");
        *self = Self::with_genesis_proof(self.genesis_proof);
    }

    fn next_index(&self) -> u64 {
        self.chain.len() as u64 + 1
    }
}

/// Check `previous_hash` linkage of an arbitrary block sequence.
///
/// Stops at the first mismatch. Empty and single-block sequences are valid.
pub fn verify_chain(blocks: &[Block]) -> bool {
    blocks
        .windows(2)
        .all(|pair| pair[1].previous_hash() == hash_block(&pair[0]))
}

/// A single problem found by [`audit_chain`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainDefect {
    /// `previous_hash` does not match the digest of the preceding block
    BrokenLink {
        /// Index of the block carrying the bad link
        index: u64,
        /// Digest of the preceding block as it is now
        expected: String,
        /// Link recorded on the block
        recorded: String,
    },

    /// Block index does not follow its predecessor
    IndexGap {
        /// 0-based position in the sequence
        position: usize,
        /// Index the block should carry
        expected: u64,
        /// Index it carries
        found: u64,
    },

    /// First block does not carry the genesis sentinel
    MissingGenesisSentinel {
        /// `previous_hash` recorded on the first block
        recorded: String,
    },
}

impl fmt::Display for ChainDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainDefect::BrokenLink { index, .. } => {
                write!(f, "block {} previous_hash mismatch", index)
            }
            ChainDefect::IndexGap {
                position,
                expected,
                found,
            } => write!(
                f,
                "block at position {} has index {}, expected {}",
                position, found, expected
            ),
            ChainDefect::MissingGenesisSentinel { recorded } => write!(
                f,
                "genesis previous_hash should be {:?}, found {:?}",
                GENESIS_PREVIOUS_HASH, recorded
            ),
        }
    }
}

/// Result of a full chain scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainAudit {
    /// Number of blocks scanned
    pub length: usize,

    /// Every defect found, in chain order
    pub defects: Vec<ChainDefect>,
}

impl ChainAudit {
    /// No defects of any kind
    pub fn is_valid(&self) -> bool {
        self.defects.is_empty()
    }

    /// True when every `previous_hash` link matches
    pub fn links_intact(&self) -> bool {
        self.first_broken_link().is_none()
    }

    /// Index of the first block whose link does not match
    pub fn first_broken_link(&self) -> Option<u64> {
        self.defects.iter().find_map(|defect| match defect {
            ChainDefect::BrokenLink { index, .. } => Some(*index),
            _ => None,
        })
    }
}

/// Scan a block sequence and report every linkage and structural defect
pub fn audit_chain(blocks: &[Block]) -> ChainAudit {
    let mut defects = Vec::new();

    if let Some(first) = blocks.first() {
        if first.previous_hash() != GENESIS_PREVIOUS_HASH {
            defects.push(ChainDefect::MissingGenesisSentinel {
                recorded: first.previous_hash().to_string(),
            });
        }
    }

    for (position, block) in blocks.iter().enumerate() {
        let expected_index = position as u64 + 1;
        if block.index() != expected_index {
            defects.push(ChainDefect::IndexGap {
                position,
                expected: expected_index,
                found: block.index(),
            });
        }

        if position > 0 {
            let expected = hash_block(&blocks[position - 1]);
            if block.previous_hash() != expected {
                defects.push(ChainDefect::BrokenLink {
                    index: block.index(),
                    expected,
                    recorded: block.previous_hash().to_string(),
                });
            }
        }
    }

    ChainAudit {
        length: blocks.len(),
        defects,
    }
}
