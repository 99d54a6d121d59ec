//! Configuration management for provchain

use serde::Deserialize;
use std::fs;

use crate::error::{LedgerError, Result};

/// Immutable chain parameters threaded into the codec, store and miner.
///
/// The defaults reproduce the legacy ledger format: five transactions per
/// block, four leading zero hex characters of proof-of-work, 64-byte hash
/// fields and 256-byte text fields. Tests shrink these to keep mining cheap.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainParams {
    #[serde(default = "default_max_transactions")]
    pub max_transactions: usize,
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    #[serde(default = "default_hash_width")]
    pub hash_width: usize,
    #[serde(default = "default_text_width")]
    pub text_width: usize,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            max_transactions: default_max_transactions(),
            difficulty: default_difficulty(),
            hash_width: default_hash_width(),
            text_width: default_text_width(),
        }
    }
}

impl ChainParams {
    /// The `prev_hash` of the genesis block, sized to the full hash field
    /// so the first real linkage comparison is byte-for-byte exact.
    pub fn genesis_prev_hash(&self) -> String {
        "0".repeat(self.hash_width)
    }

    /// Hex prefix a sealed block hash must carry.
    pub fn difficulty_prefix(&self) -> String {
        "0".repeat(self.difficulty)
    }

    /// Fixed size of an encoded block record, transactions excluded.
    pub fn block_record_size(&self) -> usize {
        // index:i32, timestamp:f64, prev_hash, hash, nonce:i32, count:i32
        4 + 8 + self.hash_width + self.hash_width + 4 + 4
    }

    /// Fixed size of an encoded transaction record.
    pub fn transaction_record_size(&self) -> usize {
        // item_id:i32, description, signature
        4 + self.text_width + self.text_width
    }

    fn validate(&self) -> Result<()> {
        if self.max_transactions == 0 {
            return Err(LedgerError::Config(
                "chain.max_transactions must be at least 1".to_string(),
            ));
        }
        if self.difficulty > self.hash_width {
            return Err(LedgerError::Config(format!(
                "chain.difficulty ({}) cannot exceed the hash width ({})",
                self.difficulty, self.hash_width
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub chain: ChainParams,
}

#[derive(Debug, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_path")]
    pub path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

pub fn load_config() -> Result<Config> {
    let config_str = fs::read_to_string("config.toml").unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        // Sane defaults when config.toml is absent
        Config {
            ledger: LedgerConfig::default(),
            chain: ChainParams::default(),
        }
    } else {
        toml::from_str(&config_str)
            .map_err(|e| LedgerError::Config(format!("Failed to parse config.toml: {}", e)))?
    };

    // Validate critical values
    if config.ledger.path.is_empty() {
        return Err(LedgerError::Config(
            "ledger.path must be set in config.toml".to_string(),
        ));
    }
    config.chain.validate()?;

    Ok(config)
}

fn default_max_transactions() -> usize {
    5
}

fn default_difficulty() -> usize {
    4
}

fn default_hash_width() -> usize {
    64
}

fn default_text_width() -> usize {
    256
}

fn default_ledger_path() -> String {
    "blockchain.dat".to_string()
}
