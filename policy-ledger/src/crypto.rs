//! Cryptographic operations for the ledger
//!
//! This module provides:
//! - SHA-256 hashing for arbitrary bytes and blocks
//! - Lowercase hex rendering of digests
//! - Shortened digests for human display

use crate::types::Block;
use sha2::{Digest, Sha256};

/// Number of hex characters shown when a digest is displayed to a person
pub const DISPLAY_PREFIX_LEN: usize = 16;

/// Hash arbitrary bytes using SHA-256
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash a block using SHA-256
///
/// Digest of the block's canonical bytes (index, timestamp, transactions,
/// proof, previous hash) as a lowercase hex string. Pure: works on sealed
/// and hypothetical blocks alike.
pub fn hash_block(block: &Block) -> String {
    hex::encode(block.canonical_hash())
}

/// Leading `len` characters of a hex digest, for display only.
///
/// Never compare shortened digests; use the full value.
pub fn short_hash(digest: &str, len: usize) -> &str {
    match digest.char_indices().nth(len) {
        Some((end, _)) => &digest[..end],
        None => digest,
    }
}
