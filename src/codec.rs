//! Fixed-width binary codec for ledger records
//!
//! The on-disk format is a headerless run of packed little-endian records
//! (the legacy file used native order and struct padding, which was not
//! portable; this layout is declared explicitly instead):
//!
//! ```text
//! block:       index:i32  timestamp:f64  prev_hash:64B  hash:64B  nonce:i32  count:i32
//! transaction: item_id:i32  description:256B  signature:256B
//! ```
//!
//! Each block record is followed by `count` transaction records. Text fields
//! are null-padded to capacity on encode and right-stripped on decode;
//! over-capacity input is rejected, never truncated. Field widths come from
//! [`ChainParams`] so tests can shrink them.

use crate::block::{Block, Transaction};
use crate::config::ChainParams;
use crate::error::{LedgerError, Result};

#[derive(Debug, Clone)]
pub struct Codec {
    params: ChainParams,
}

impl Codec {
    pub fn new(params: ChainParams) -> Self {
        Codec { params }
    }

    /// Serializes a block followed by its transaction records.
    pub fn encode_block(&self, block: &Block) -> Result<Vec<u8>> {
        if block.transactions.len() > self.params.max_transactions {
            return Err(LedgerError::BlockFull);
        }

        let size = self.params.block_record_size()
            + block.transactions.len() * self.params.transaction_record_size();
        let mut buf = Vec::with_capacity(size);

        buf.extend_from_slice(&block.index.to_le_bytes());
        buf.extend_from_slice(&block.timestamp.to_le_bytes());
        put_text(&mut buf, "prev_hash", &block.prev_hash, self.params.hash_width)?;
        put_text(&mut buf, "hash", &block.hash, self.params.hash_width)?;
        buf.extend_from_slice(&block.nonce.to_le_bytes());
        buf.extend_from_slice(&(block.transactions.len() as i32).to_le_bytes());

        for tx in &block.transactions {
            self.encode_transaction_into(&mut buf, tx)?;
        }
        Ok(buf)
    }

    pub fn encode_transaction(&self, tx: &Transaction) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.params.transaction_record_size());
        self.encode_transaction_into(&mut buf, tx)?;
        Ok(buf)
    }

    fn encode_transaction_into(&self, buf: &mut Vec<u8>, tx: &Transaction) -> Result<()> {
        buf.extend_from_slice(&tx.item_id.to_le_bytes());
        put_text(buf, "description", &tx.description, self.params.text_width)?;
        put_text(buf, "signature", &tx.signature, self.params.text_width)?;
        Ok(())
    }

    /// Decodes one block record (and its transactions) from the front of
    /// `bytes`, returning the block and the number of bytes consumed.
    pub fn decode_block(&self, bytes: &[u8]) -> Result<(Block, usize)> {
        let header = self.params.block_record_size();
        if bytes.len() < header {
            return Err(LedgerError::Format(format!(
                "block record needs {} bytes, got {}",
                header,
                bytes.len()
            )));
        }

        let mut at = 0;
        let index = read_i32(&bytes[at..]);
        at += 4;
        let timestamp = read_f64(&bytes[at..]);
        at += 8;
        let prev_hash = read_text(&bytes[at..at + self.params.hash_width], "prev_hash")?;
        at += self.params.hash_width;
        let hash = read_text(&bytes[at..at + self.params.hash_width], "hash")?;
        at += self.params.hash_width;
        let nonce = read_i32(&bytes[at..]);
        at += 4;
        let count = read_i32(&bytes[at..]);
        at += 4;

        if count < 0 || count as usize > self.params.max_transactions {
            return Err(LedgerError::Format(format!(
                "transaction count {} is out of range (max {})",
                count, self.params.max_transactions
            )));
        }

        let mut transactions = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let (tx, used) = self.decode_transaction(&bytes[at..])?;
            transactions.push(tx);
            at += used;
        }

        Ok((
            Block {
                index,
                timestamp,
                prev_hash,
                hash,
                nonce,
                transactions,
            },
            at,
        ))
    }

    pub fn decode_transaction(&self, bytes: &[u8]) -> Result<(Transaction, usize)> {
        let size = self.params.transaction_record_size();
        if bytes.len() < size {
            return Err(LedgerError::Format(format!(
                "transaction record needs {} bytes, got {}",
                size,
                bytes.len()
            )));
        }

        let item_id = read_i32(bytes);
        let mut at = 4;
        let description = read_text(&bytes[at..at + self.params.text_width], "description")?;
        at += self.params.text_width;
        let signature = read_text(&bytes[at..at + self.params.text_width], "signature")?;
        at += self.params.text_width;

        Ok((
            Transaction {
                item_id,
                description,
                signature,
            },
            at,
        ))
    }
}

fn put_text(buf: &mut Vec<u8>, field: &'static str, value: &str, width: usize) -> Result<()> {
    let raw = value.as_bytes();
    if raw.len() > width {
        return Err(LedgerError::Capacity {
            field,
            len: raw.len(),
            max: width,
        });
    }
    buf.extend_from_slice(raw);
    buf.resize(buf.len() + (width - raw.len()), 0);
    Ok(())
}

fn read_text(bytes: &[u8], field: &str) -> Result<String> {
    // Right-strip the null padding; interior bytes are kept as stored.
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8(bytes[..end].to_vec())
        .map_err(|_| LedgerError::Format(format!("{} is not valid UTF-8", field)))
}

fn read_i32(bytes: &[u8]) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    i32::from_le_bytes(raw)
}

fn read_f64(bytes: &[u8]) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[..8]);
    f64::from_le_bytes(raw)
}
