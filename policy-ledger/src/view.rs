//! Read-only presentation of the chain
//!
//! Blocks are listed newest first. Digests are shown as a
//! [`DISPLAY_PREFIX_LEN`]-character prefix, which is for people only.

use crate::crypto::{hash_block, short_hash, DISPLAY_PREFIX_LEN};
use crate::ledger::ChainAudit;
use crate::types::{Block, Transaction};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// One block as shown in a chain listing
#[derive(Debug, Clone, Serialize)]
pub struct BlockView {
    /// Block index
    pub index: u64,
    /// Full hex digest
    pub hash: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Recorded link to the predecessor
    pub previous_hash: String,
    /// Sealed transactions
    pub transactions: Vec<Transaction>,
}

impl From<&Block> for BlockView {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index(),
            hash: hash_block(block),
            timestamp: block.timestamp(),
            previous_hash: block.previous_hash().to_string(),
            transactions: block.transactions().to_vec(),
        }
    }
}

impl fmt::Display for BlockView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Block #{} (Hash: {}...)",
            self.index,
            short_hash(&self.hash, DISPLAY_PREFIX_LEN)
        )?;
        writeln!(f, "  Timestamp: {}", self.timestamp.to_rfc3339())?;
        writeln!(f, "  Prev Hash: {}", self.previous_hash)?;

        if self.transactions.is_empty() {
            return writeln!(f, "  Data: no transactions");
        }

        writeln!(f, "  Data:")?;
        for tx in &self.transactions {
            let details = tx
                .policy_details()
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                f,
                "    {} -> {} : {} [{}]",
                tx.sender(),
                tx.receiver(),
                tx.amount(),
                details
            )?;
        }
        Ok(())
    }
}

/// Whole-chain listing, newest block first
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ChainView {
    blocks: Vec<BlockView>,
}

impl ChainView {
    /// Build a listing from blocks in chain order
    pub fn from_blocks(blocks: &[Block]) -> Self {
        Self {
            blocks: blocks.iter().rev().map(BlockView::from).collect(),
        }
    }

    /// Listed blocks, newest first
    pub fn blocks(&self) -> &[BlockView] {
        &self.blocks
    }
}

impl fmt::Display for ChainView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}

impl fmt::Display for ChainAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(
                f,
                "INTEGRITY VERIFIED: all {} block(s) match their predecessors",
                self.length
            );
        }

        write!(
            f,
            "ALERT: data inconsistency detected, the chain has been tampered with"
        )?;
        for defect in &self.defects {
            write!(f, "\n  - {}", defect)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{policy_details, PolicyStatus, PolicyType};
    use crate::Ledger;
    use rust_decimal::Decimal;

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger
            .add_transaction(
                "Insurance_Vault",
                "Alice",
                Decimal::new(2500, 2),
                policy_details(PolicyType::FlightDelay, PolicyStatus::Active),
            )
            .unwrap();
        ledger.seal_block(200).unwrap();
        ledger
    }

    #[test]
    fn test_newest_first() {
        let ledger = sample_ledger();
        let view = ChainView::from_blocks(ledger.blocks());
        let indices: Vec<u64> = view.blocks().iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![2, 1]);
    }

    #[test]
    fn test_render_listing() {
        let ledger = sample_ledger();
        let genesis_hash = Ledger::hash(&ledger.blocks()[0]);
        let text = ChainView::from_blocks(ledger.blocks()).to_string();

        assert!(text.contains(&format!("Block #1 (Hash: {}...)", &genesis_hash[..16])));
        assert!(text.contains("Data: no transactions"));
        assert!(text.contains("Insurance_Vault -> Alice : 25.00 [status=Active, type=Flight Delay]"));
        assert!(text.contains(&format!("Prev Hash: {}", genesis_hash)));
        // Newest block is rendered first
        assert!(text.find("Block #2").unwrap() < text.find("Block #1").unwrap());
    }

    #[test]
    fn test_json_listing() {
        let ledger = sample_ledger();
        let json = serde_json::to_value(ChainView::from_blocks(ledger.blocks())).unwrap();
        let blocks = json.as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["index"], 2);
        assert_eq!(blocks[1]["previous_hash"], "1");
        assert_eq!(blocks[0]["transactions"][0]["receiver"], "Alice");
    }

    #[test]
    fn test_render_audit() {
        let ledger = sample_ledger();
        let text = ledger.audit().to_string();
        assert!(text.starts_with("INTEGRITY VERIFIED"));
    }
}
