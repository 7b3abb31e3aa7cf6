//! Payload Mempool (L9, spec.md §4.11).
//!
//! Holds validated payloads that have cleared `Check`/`Validate` against
//! mempool-time context but have not yet been committed in a block. On
//! block connect, the committed subset is removed (`CommitRIMempool`); on
//! disconnect, payloads from the disconnected block are re-admitted with
//! `back_to_mempool = true` so the engine can skip the registration-state
//! checks that would otherwise reject a transaction re-entering the pool
//! it only just left.

use crate::types::payload::Payload;
use crate::types::{Height, KindTag, Time, TxHash};
use std::collections::HashMap;

/// One pending payload (spec.md §3 "Payload mempool row").
#[derive(Clone, Debug)]
pub struct MempoolRow {
    pub tx_hash: TxHash,
    pub kind: KindTag,
    pub root_tx_hash: Option<TxHash>,
    pub payload: Payload,
    pub admitted_time: Time,
    /// `true` if this row was re-admitted after a rollback rather than
    /// freshly validated (spec.md §4.11).
    pub back_to_mempool: bool,
}

/// Errors the mempool itself can raise, distinct from a consensus
/// rejection (which the caller decides before ever calling `admit`).
#[derive(Debug, PartialEq, Eq)]
pub enum MempoolError {
    Full,
    AlreadyPresent,
}

impl std::fmt::Display for MempoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MempoolError::Full => write!(f, "payload mempool at capacity"),
            MempoolError::AlreadyPresent => write!(f, "payload already in mempool"),
        }
    }
}

impl std::error::Error for MempoolError {}

/// The Payload Mempool itself: an in-memory bound queue, independent of
/// the durable Payload Store (spec.md §5: "the mempool is volatile, never
/// persisted").
pub struct PayloadMempool {
    rows: HashMap<TxHash, MempoolRow>,
    capacity: usize,
}

impl PayloadMempool {
    pub fn new(capacity: usize) -> Self {
        Self { rows: HashMap::new(), capacity }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, tx_hash: &TxHash) -> bool {
        self.rows.contains_key(tx_hash)
    }

    /// Admits a row that has already passed `Check`/`Validate`.
    pub fn admit(&mut self, row: MempoolRow) -> Result<(), MempoolError> {
        if self.rows.contains_key(&row.tx_hash) {
            return Err(MempoolError::AlreadyPresent);
        }
        if self.rows.len() >= self.capacity {
            return Err(MempoolError::Full);
        }
        self.rows.insert(row.tx_hash, row);
        Ok(())
    }

    /// `CommitRIMempool` (spec.md §4.11): drops every row the just-connected
    /// block committed.
    pub fn commit(&mut self, committed: &[TxHash]) {
        for tx_hash in committed {
            self.rows.remove(tx_hash);
        }
    }

    /// Re-admits payloads from a disconnected block, flagging each row
    /// `back_to_mempool = true` (spec.md §4.11).
    pub fn readmit_after_rollback(&mut self, rows: Vec<MempoolRow>) {
        for mut row in rows {
            row.back_to_mempool = true;
            self.rows.insert(row.tx_hash, row);
        }
    }

    pub fn get(&self, tx_hash: &TxHash) -> Option<&MempoolRow> {
        self.rows.get(tx_hash)
    }

    pub fn rows(&self) -> impl Iterator<Item = &MempoolRow> {
        self.rows.values()
    }
}
