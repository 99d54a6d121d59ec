//! Block and transaction records
//!
//! A [`Block`] is one hash-sealed unit of the ledger. Its `hash` is the
//! SHA-256 digest of the text concatenation of `index`, `timestamp`,
//! `prev_hash` and `nonce`; transactions are stored in the block but do not
//! enter the digest. Both types are plain data; the miner is the only
//! producer of sealed blocks and the codec the only other constructor.

use serde::{Deserialize, Serialize};

/// An opaque provenance record stored inside a block. The signature is a
/// stored string, not verified by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub item_id: i32,
    pub description: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 0-based position in the chain.
    pub index: i32,
    /// Seconds since the Unix epoch, fractional.
    pub timestamp: f64,
    pub prev_hash: String,
    /// Hex-encoded SHA-256 digest satisfying the proof-of-work prefix.
    pub hash: String,
    pub nonce: i32,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// UTF-8 text the proof-of-work digest is computed over.
    pub fn seal_input(&self) -> String {
        pow_input(self.index, self.timestamp, &self.prev_hash, self.nonce)
    }

    pub fn is_full(&self, max_transactions: usize) -> bool {
        self.transactions.len() >= max_transactions
    }
}

/// Text concatenation hashed during mining. The timestamp uses Rust's
/// shortest round-trip `f64` formatting, which is stable for a given value.
pub fn pow_input(index: i32, timestamp: f64, prev_hash: &str, nonce: i32) -> String {
    format!("{}{}{}{}", index, timestamp, prev_hash, nonce)
}
