//! Proof-of-work mining
//!
//! Brute-force nonce search over `SHA256(index ++ timestamp ++ prev_hash ++
//! nonce)`. Expected attempts are `16^difficulty`, but there is no upper
//! bound and therefore no termination guarantee, so every search takes a
//! [`StopSignal`] and bails out cooperatively. Cancellation is an abort, not
//! an error: the search returns `None`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::block::{pow_input, Block};
use crate::config::ChainParams;

/// Cooperative cancellation flag shared with a mining loop.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Hex-encoded SHA-256 digest of a text input.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Mines the next block on top of `chain` using the wall clock.
pub fn mine_block(chain: &[Block], params: &ChainParams, stop: &StopSignal) -> Option<Block> {
    mine_block_at(chain, params, unix_now(), stop)
}

/// Nonce search with a caller-supplied timestamp; tests pin the clock here.
pub fn mine_block_at(
    chain: &[Block],
    params: &ChainParams,
    timestamp: f64,
    stop: &StopSignal,
) -> Option<Block> {
    let index = chain.len() as i32;
    let prev_hash = chain
        .last()
        .map(|tip| tip.hash.clone())
        .unwrap_or_else(|| params.genesis_prev_hash());
    let target = params.difficulty_prefix();

    let mut nonce: i32 = 0;
    loop {
        if stop.is_triggered() {
            return None;
        }

        let hash = sha256_hex(&pow_input(index, timestamp, &prev_hash, nonce));
        if hash.starts_with(&target) {
            info!("Mined block {} (nonce = {}, hash = {})", index, nonce, hash);
            return Some(Block {
                index,
                timestamp,
                prev_hash,
                hash,
                nonce,
                transactions: Vec::new(),
            });
        }
        // Wrap instead of overflowing; with the timestamp fixed the search
        // space is the full i32 range and only the stop flag ends it.
        nonce = nonce.wrapping_add(1);
    }
}

/// Seconds since the Unix epoch, fractional.
fn unix_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
