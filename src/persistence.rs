//! Ledger persistence and the single-writer service
//!
//! The on-disk ledger is a headerless run of fixed-width records (see
//! [`crate::codec`]). Every mutation rewrites the whole file through a
//! temporary file followed by an atomic rename, so a crash mid-write can
//! never leave a truncated ledger behind. The rewrite is O(chain) per
//! mutation, which is a scalability limit of the format, not of this module.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::block::{Block, Transaction};
use crate::codec::Codec;
use crate::config::ChainParams;
use crate::error::{LedgerError, Result};
use crate::miner::{mine_block, StopSignal};
use crate::validator::{validate, Validity};

/// Abstraction for storage backends holding the block sequence.
pub trait Store: Send + Sync {
    fn load(&self) -> Result<Vec<Block>>;
    fn persist(&self, chain: &[Block]) -> Result<()>;
}

/// Flat-file backend using the fixed-width codec.
pub struct FileStore {
    path: PathBuf,
    codec: Codec,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, params: ChainParams) -> Self {
        FileStore {
            path: path.into(),
            codec: Codec::new(params),
        }
    }
}

impl Store for FileStore {
    /// Reads the file start-to-end. A missing file is an empty chain. A
    /// record that fails to decode ends the load at the valid prefix: the
    /// corrupt tail is logged and discarded, never raised to the caller.
    fn load(&self) -> Result<Vec<Block>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LedgerError::Persist(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let mut chain = Vec::new();
        let mut at = 0;
        while at < bytes.len() {
            match self.codec.decode_block(&bytes[at..]) {
                Ok((block, used)) => {
                    chain.push(block);
                    at += used;
                }
                Err(e) => {
                    warn!(
                        "Discarding corrupt ledger tail at byte {} of {}: {}",
                        at,
                        self.path.display(),
                        e
                    );
                    break;
                }
            }
        }
        Ok(chain)
    }

    fn persist(&self, chain: &[Block]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| {
            LedgerError::Persist(format!("Failed to create temp file in {}: {}", dir.display(), e))
        })?;

        for block in chain {
            let bytes = self.codec.encode_block(block)?;
            tmp.write_all(&bytes)
                .map_err(|e| LedgerError::Persist(format!("Failed to write ledger: {}", e)))?;
        }
        tmp.flush()
            .map_err(|e| LedgerError::Persist(format!("Failed to flush ledger: {}", e)))?;

        tmp.persist(&self.path).map_err(|e| {
            LedgerError::Persist(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

/// In-memory backend for tests and ephemeral runs.
#[derive(Default)]
pub struct MemStore {
    chain: Mutex<Vec<Block>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemStore {
    fn load(&self) -> Result<Vec<Block>> {
        Ok(self.chain.lock().clone())
    }

    fn persist(&self, chain: &[Block]) -> Result<()> {
        *self.chain.lock() = chain.to_vec();
        Ok(())
    }
}

/// Single-writer handle over a [`Store`].
///
/// Mutations serialize behind `gate`; the committed chain sits behind its
/// own lock so readers keep seeing the last persisted snapshot while a
/// mutation (including an unbounded mine) is in flight. Persistence happens
/// before the in-memory snapshot is replaced, so a failed write leaves both
/// the file and the snapshot untouched.
pub struct Ledger {
    store: Box<dyn Store>,
    params: ChainParams,
    chain: RwLock<Vec<Block>>,
    gate: Mutex<()>,
}

impl Ledger {
    /// Opens (or starts) a file-backed ledger at `path`.
    pub fn open(path: impl Into<PathBuf>, params: ChainParams) -> Result<Self> {
        Self::with_store(Box::new(FileStore::new(path, params.clone())), params)
    }

    pub fn with_store(store: Box<dyn Store>, params: ChainParams) -> Result<Self> {
        let chain = store.load()?;
        info!("Loaded ledger with {} block(s)", chain.len());
        Ok(Ledger {
            store,
            params,
            chain: RwLock::new(chain),
            gate: Mutex::new(()),
        })
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Snapshot of the last committed chain.
    pub fn chain(&self) -> Vec<Block> {
        self.chain.read().clone()
    }

    pub fn height(&self) -> usize {
        self.chain.read().len()
    }

    /// Appends `tx` to the latest block and persists the chain. Fails with
    /// `EmptyChain` when nothing has been mined yet and `BlockFull` when the
    /// tip is at capacity.
    pub fn append_transaction(&self, tx: Transaction) -> Result<()> {
        let _writer = self.gate.lock();

        let mut next = self.chain.read().clone();
        let tip = next.last_mut().ok_or(LedgerError::EmptyChain)?;
        if tip.is_full(self.params.max_transactions) {
            return Err(LedgerError::BlockFull);
        }
        tip.transactions.push(tx);

        self.store.persist(&next)?;
        *self.chain.write() = next;
        Ok(())
    }

    /// Mines the next block, appends it and persists the chain. Returns
    /// `Ok(None)` when the stop signal cancels the search. The mined block
    /// always starts with an empty transaction list; pending transactions
    /// are only ever added to the new tip afterwards.
    pub fn mine_and_append(&self, stop: &StopSignal) -> Result<Option<Block>> {
        let _writer = self.gate.lock();

        // The gate serializes mutations, so the tip cannot move while the
        // search runs; readers stay unblocked on the committed snapshot.
        let mut next = self.chain.read().clone();
        let block = match mine_block(&next, &self.params, stop) {
            Some(block) => block,
            None => return Ok(None),
        };
        next.push(block.clone());

        self.store.persist(&next)?;
        *self.chain.write() = next;
        Ok(Some(block))
    }

    /// Linkage check over the committed chain.
    pub fn validate(&self) -> Validity {
        validate(&self.chain.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> ChainParams {
        ChainParams {
            difficulty: 1,
            ..ChainParams::default()
        }
    }

    fn test_tx(item_id: i32) -> Transaction {
        Transaction {
            item_id,
            description: format!("crate {}", item_id),
            signature: "sig".to_string(),
        }
    }

    #[test]
    fn append_on_empty_chain_is_rejected() {
        let ledger = Ledger::with_store(Box::new(MemStore::new()), fast_params()).unwrap();
        assert!(matches!(
            ledger.append_transaction(test_tx(1)),
            Err(LedgerError::EmptyChain)
        ));
    }

    #[test]
    fn tip_fills_up_to_capacity_then_rejects() {
        let ledger = Ledger::with_store(Box::new(MemStore::new()), fast_params()).unwrap();
        ledger.mine_and_append(&StopSignal::new()).unwrap().unwrap();

        for i in 0..5 {
            ledger.append_transaction(test_tx(i)).unwrap();
        }
        assert!(matches!(
            ledger.append_transaction(test_tx(5)),
            Err(LedgerError::BlockFull)
        ));
        assert_eq!(ledger.chain().last().unwrap().transactions.len(), 5);
    }

    #[test]
    fn mining_onto_a_full_tip_opens_fresh_capacity() {
        let ledger = Ledger::with_store(Box::new(MemStore::new()), fast_params()).unwrap();
        ledger.mine_and_append(&StopSignal::new()).unwrap().unwrap();
        for i in 0..5 {
            ledger.append_transaction(test_tx(i)).unwrap();
        }

        let tip = ledger.mine_and_append(&StopSignal::new()).unwrap().unwrap();
        assert!(tip.transactions.is_empty());
        ledger.append_transaction(test_tx(6)).unwrap();
        assert_eq!(ledger.height(), 2);
    }

    #[test]
    fn cancelled_mine_leaves_the_chain_untouched() {
        let ledger = Ledger::with_store(Box::new(MemStore::new()), fast_params()).unwrap();
        let stop = StopSignal::new();
        stop.trigger();
        assert_eq!(ledger.mine_and_append(&stop).unwrap(), None);
        assert_eq!(ledger.height(), 0);
    }

    #[test]
    fn failed_persist_does_not_commit_the_mutation() {
        struct FailingStore;
        impl Store for FailingStore {
            fn load(&self) -> Result<Vec<Block>> {
                Ok(Vec::new())
            }
            fn persist(&self, _chain: &[Block]) -> Result<()> {
                Err(LedgerError::Persist("disk on fire".to_string()))
            }
        }

        let ledger = Ledger::with_store(Box::new(FailingStore), fast_params()).unwrap();
        assert!(matches!(
            ledger.mine_and_append(&StopSignal::new()),
            Err(LedgerError::Persist(_))
        ));
        assert_eq!(ledger.height(), 0);
    }
}
