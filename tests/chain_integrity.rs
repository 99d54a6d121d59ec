//! Integration tests for linkage validation over persisted chains

use std::path::PathBuf;

use tempfile::TempDir;

use provchain::config::ChainParams;
use provchain::miner::{sha256_hex, StopSignal};
use provchain::persistence::{FileStore, Ledger, Store};
use provchain::validator::Validity;

fn ledger_path(dir: &TempDir) -> PathBuf {
    dir.path().join("blockchain.dat")
}

fn fast_params() -> ChainParams {
    ChainParams {
        difficulty: 1,
        ..ChainParams::default()
    }
}

/// Mines a valid chain of `len` blocks into the given file.
fn mined_ledger(path: &PathBuf, len: usize) -> Result<Ledger, Box<dyn std::error::Error>> {
    let ledger = Ledger::open(path, fast_params())?;
    for _ in 0..len {
        ledger.mine_and_append(&StopSignal::new())?.unwrap();
    }
    Ok(ledger)
}

#[test]
fn test_mined_chains_validate_after_reload() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = ledger_path(&dir);
    mined_ledger(&path, 4)?;

    let reloaded = Ledger::open(&path, fast_params())?;
    assert_eq!(reloaded.validate(), Validity::Valid);

    Ok(())
}

#[test]
fn test_broken_linkage_is_reported_at_the_first_bad_index(
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = ledger_path(&dir);
    let ledger = mined_ledger(&path, 3)?;

    let mut chain = ledger.chain();
    chain[2].prev_hash = "1".repeat(64);
    drop(ledger);
    FileStore::new(&path, fast_params()).persist(&chain)?;

    let reloaded = Ledger::open(&path, fast_params())?;
    assert_eq!(reloaded.validate(), Validity::Invalid { at: 2 });

    Ok(())
}

#[test]
fn test_consistent_hash_rewrite_passes_the_linkage_walk(
) -> Result<(), Box<dyn std::error::Error>> {
    // The documented weakness: rewrite a middle block's stored hash and
    // patch its successor's prev_hash to match, persist, and the linkage
    // walk still reports Valid. Only recomputing the digest from the
    // block's own fields exposes the forgery.
    let dir = TempDir::new()?;
    let path = ledger_path(&dir);
    let ledger = mined_ledger(&path, 3)?;

    let mut chain = ledger.chain();
    let forged = "0".to_string() + &"f".repeat(63);
    chain[1].hash = forged.clone();
    chain[2].prev_hash = forged;
    drop(ledger);
    FileStore::new(&path, fast_params()).persist(&chain)?;

    let reloaded = Ledger::open(&path, fast_params())?;
    assert_eq!(reloaded.validate(), Validity::Valid);

    let tampered = &reloaded.chain()[1];
    assert_ne!(sha256_hex(&tampered.seal_input()), tampered.hash);

    Ok(())
}

#[test]
fn test_empty_and_single_block_ledgers_are_valid() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = ledger_path(&dir);

    let empty = Ledger::open(&path, fast_params())?;
    assert_eq!(empty.validate(), Validity::Valid);

    empty.mine_and_append(&StopSignal::new())?.unwrap();
    assert_eq!(empty.validate(), Validity::Valid);

    Ok(())
}
