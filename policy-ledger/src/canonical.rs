//! Canonical serialization for block hashing
//!
//! Ensures deterministic byte representation for digests.
//! Uses fixed field order, normalized decimals, and sorted policy details.

use crate::types::{Block, Transaction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Canonical serializer
#[derive(Debug, Default)]
pub struct CanonicalSerializer {
    buffer: Vec<u8>,
}

impl CanonicalSerializer {
    /// Create new serializer
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Write string (length-prefixed)
    fn write_string(&mut self, s: &str) {
        let bytes = s.as_bytes();
        self.write_u32(bytes.len() as u32);
        self.write_bytes(bytes);
    }

    /// Write u32 (big-endian)
    fn write_u32(&mut self, n: u32) {
        self.write_bytes(&n.to_be_bytes());
    }

    /// Write u64 (big-endian)
    fn write_u64(&mut self, n: u64) {
        self.write_bytes(&n.to_be_bytes());
    }

    /// Write i64 (big-endian)
    fn write_i64(&mut self, n: i64) {
        self.write_bytes(&n.to_be_bytes());
    }

    /// Write decimal in normalized form, so 100 and 100.00 encode alike
    fn write_decimal(&mut self, d: &Decimal) {
        self.write_string(&d.normalize().to_string());
    }

    /// Write timestamp as whole seconds plus sub-second nanos
    fn write_timestamp(&mut self, ts: &DateTime<Utc>) {
        self.write_i64(ts.timestamp());
        self.write_u32(ts.timestamp_subsec_nanos());
    }

    /// Finalize and return bytes
    pub fn finalize(self) -> Vec<u8> {
        self.buffer
    }

    /// Compute SHA-256 hash
    pub fn hash(self) -> [u8; 32] {
        Sha256::digest(&self.buffer).into()
    }
}

impl Transaction {
    fn write_canonical(&self, ser: &mut CanonicalSerializer) {
        ser.write_string(self.sender().as_str());
        ser.write_string(self.receiver().as_str());
        ser.write_decimal(&self.amount());

        // BTreeMap iterates in ascending key order
        let details = self.policy_details();
        ser.write_u32(details.len() as u32);
        for (key, value) in details {
            ser.write_string(key);
            ser.write_string(value);
        }
    }

    /// Serialize to canonical bytes
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut ser = CanonicalSerializer::new();
        self.write_canonical(&mut ser);
        ser.finalize()
    }
}

impl Block {
    fn write_canonical(&self, ser: &mut CanonicalSerializer) {
        ser.write_u64(self.index());
        ser.write_timestamp(&self.timestamp());

        ser.write_u32(self.transactions().len() as u32);
        for tx in self.transactions() {
            tx.write_canonical(ser);
        }

        ser.write_u64(self.proof());
        ser.write_string(self.previous_hash());
    }

    /// Serialize to canonical bytes (input to the block digest)
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut ser = CanonicalSerializer::new();
        self.write_canonical(&mut ser);
        ser.finalize()
    }

    /// Raw SHA-256 of the canonical bytes
    pub fn canonical_hash(&self) -> [u8; 32] {
        let mut ser = CanonicalSerializer::new();
        self.write_canonical(&mut ser);
        ser.hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountId, PolicyDetails};
    use chrono::TimeZone;

    fn tx(details: &[(&str, &str)], amount: Decimal) -> Transaction {
        let details: PolicyDetails = details
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Transaction::new(
            AccountId::new("Insurance_Vault"),
            AccountId::new("Alice"),
            amount,
            details,
        )
        .unwrap()
    }

    #[test]
    fn test_detail_insertion_order_irrelevant() {
        let a = tx(&[("type", "Health"), ("status", "Active")], Decimal::from(100));
        let b = tx(&[("status", "Active"), ("type", "Health")], Decimal::from(100));
        assert_eq!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn test_decimal_scale_irrelevant() {
        let a = tx(&[], Decimal::new(100, 0));
        let b = tx(&[], Decimal::new(10000, 2));
        assert_eq!(a.canonical_bytes(), b.canonical_bytes());

        let c = tx(&[], Decimal::new(10001, 2));
        assert_ne!(a.canonical_bytes(), c.canonical_bytes());
    }

    #[test]
    fn test_block_layout() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let block = Block::new(1, ts, vec![], 100, "1");
        let bytes = block.canonical_bytes();

        // index(8) + secs(8) + nanos(4) + tx count(4) + proof(8) + len(4) + "1"
        assert_eq!(bytes.len(), 8 + 8 + 4 + 4 + 8 + 4 + 1);
        assert_eq!(&bytes[..8], &1u64.to_be_bytes());
        assert_eq!(*bytes.last().unwrap(), b'1');
    }

    #[test]
    fn test_string_boundaries_are_prefixed() {
        // "ab" + "c" must not collide with "a" + "bc"
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let left = Transaction::new(
            AccountId::new("ab"),
            AccountId::new("c"),
            Decimal::ONE,
            PolicyDetails::new(),
        )
        .unwrap();
        let right = Transaction::new(
            AccountId::new("a"),
            AccountId::new("bc"),
            Decimal::ONE,
            PolicyDetails::new(),
        )
        .unwrap();

        let b1 = Block::new(2, ts, vec![left], 200, "x");
        let b2 = Block::new(2, ts, vec![right], 200, "x");
        assert_ne!(b1.canonical_hash(), b2.canonical_hash());
    }
}
