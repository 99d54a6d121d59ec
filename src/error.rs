//! Error types for provchain

use std::fmt;

#[derive(Debug, Clone)]
pub enum LedgerError {
    Format(String),
    Capacity {
        field: &'static str,
        len: usize,
        max: usize,
    },
    BlockFull,
    EmptyChain,
    Persist(String),
    Config(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LedgerError::Format(msg) => write!(f, "Malformed record: {}", msg),
            LedgerError::Capacity { field, len, max } => write!(
                f,
                "Field '{}' is {} bytes but its capacity is {}",
                field, len, max
            ),
            LedgerError::BlockFull => write!(f, "Block is full; mine a new block first"),
            LedgerError::EmptyChain => write!(f, "No blocks exist yet; mine a block first"),
            LedgerError::Persist(msg) => write!(f, "Persistence error: {}", msg),
            LedgerError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Persist(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
