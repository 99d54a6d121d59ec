//! Chain linkage validation

use crate::block::Block;

/// Outcome of a linkage walk. `Invalid` carries the first offending index.
/// An invalid chain is a normal result here, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid { at: usize },
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}

/// Walks the chain and checks that every block's `prev_hash` matches its
/// predecessor's `hash`, short-circuiting at the first mismatch. Empty and
/// single-block chains are trivially valid.
///
/// This checks linkage only. It does not recompute each block's digest from
/// its fields, so a rewritten `hash` whose successor's `prev_hash` was
/// patched to match goes undetected.
pub fn validate(chain: &[Block]) -> Validity {
    for i in 1..chain.len() {
        if chain[i].prev_hash != chain[i - 1].hash {
            return Validity::Invalid { at: i };
        }
    }
    Validity::Valid
}
