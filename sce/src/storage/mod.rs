//! Payload Store (L0) and Rating Store (L1) traits, plus in-memory and
//! SQLite-backed implementations (spec.md §4.1, §4.2, §6).

pub mod mem;
pub mod sqlite;

use crate::types::payload::Payload;
use crate::types::rating::RatingRow;
use crate::types::{Address, Height, KindTag, Time, TxHash};
use std::fmt;

/// Errors surfaced by a storage backend. `NotFound` is a first-class
/// variant rather than an `Option` return from every call so callers that
/// need to distinguish "absent" from "backend failure" can (spec.md §4.1:
/// "row not found -> NotFound").
#[derive(Debug)]
pub enum StorageError {
    NotFound,
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound => write!(f, "row not found"),
            StorageError::Backend(msg) => write!(f, "storage backend error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

/// One row of the Payload Store, keyed by `txHash` (spec.md §4.1).
#[derive(Clone, Debug)]
pub struct PayloadRow {
    pub tx_hash: TxHash,
    pub kind: KindTag,
    pub payload: Payload,
    /// Identity across edits; equals `tx_hash` for the first version.
    pub root_tx_hash: TxHash,
    /// `Some` once committed to a block; `None` while only in the payload
    /// mempool (L9).
    pub height: Option<Height>,
    pub sequence: Option<u64>,
    /// Comment-only "last wins" flag (spec.md §4.1 `commitLast`).
    pub last: bool,
    /// Wall-clock commit time of the carrier tx, Unix seconds. Needed
    /// alongside `height` for the age-window checks in `reputation` and
    /// `ScoreData.content_time`/`score_time`.
    pub commit_time: Time,
}

/// Contract for the Payload Store (L0), spec.md §4.1.
pub trait PayloadStore {
    /// Insert, idempotent by `tx_hash`. For editable kinds the previous
    /// active row must already have been copied into history by the
    /// caller before this is invoked (the post-processor does that, see
    /// `engine::post_processor`).
    fn put(&mut self, row: PayloadRow) -> Result<(), StorageError>;

    /// Look up the active row. For Post-family kinds this also resolves
    /// by `editTxHash` at the call site in the post-processor; the store
    /// itself only indexes by its own primary key.
    fn get(&self, tx_hash: &TxHash) -> Result<Option<PayloadRow>, StorageError>;

    /// Chronological prior versions of an editable row, oldest first.
    fn history(&self, root_tx_hash: &TxHash) -> Result<Vec<PayloadRow>, StorageError>;

    fn exists_by_hash(&self, tx_hash: &TxHash) -> Result<bool, StorageError>;

    /// Push the currently active row for `root_tx_hash` into history, then
    /// let the caller `put` its replacement. Used for both ordinary edits
    /// and comment "last wins" semantics.
    fn archive_active(&mut self, root_tx_hash: &TxHash, at_height: Height) -> Result<(), StorageError>;

    /// Comment-only replacement: flips `last` off on any prior row sharing
    /// `root_tx_hash`, then inserts `row` with `last = true` (spec.md
    /// §4.1 `commitLast`).
    fn commit_last(&mut self, row: PayloadRow) -> Result<(), StorageError>;

    /// Rollback support: drop every row committed above `h`, restoring the
    /// most recent surviving history row to active (spec.md §2 "L6
    /// restores previous versions in L0 from history").
    fn delete_above_height(&mut self, h: Height) -> Result<(), StorageError>;

    /// Every currently active row, in no particular order. Used by the
    /// engine to rebuild its in-memory secondary indices after a rollback
    /// rather than maintaining a separate undo log for each one.
    fn all_active(&self) -> Result<Vec<PayloadRow>, StorageError>;
}

/// `(scoreTx, scoreAddress, scoreValue, scoreTime, contentTx,
/// contentAddress, contentType, contentTime, contentId, contentAddressId)`
/// (spec.md §4.2 `getScoreData`).
#[derive(Clone, Debug)]
pub struct ScoreData {
    pub score_tx: TxHash,
    pub score_address: Address,
    pub score_value: i8,
    pub score_time: Time,
    pub content_tx: TxHash,
    pub content_address: Address,
    pub content_type: KindTag,
    pub content_time: Time,
    pub content_id: i64,
    pub content_address_id: i64,
}

/// Contract for the Rating Store (L1), spec.md §4.2.
pub trait RatingStore {
    /// Atomic append of every delta computed for height `h`.
    fn insert_deltas(&mut self, height: Height, rows: Vec<RatingRow>) -> Result<(), StorageError>;

    /// Rollback support: drop every delta recorded above `h`.
    fn delete_above_height(&mut self, h: Height) -> Result<(), StorageError>;

    /// Effective signed integer at scale x10 (spec.md §4.2: "stored 213 =
    /// 21.3").
    fn account_reputation_at(&self, address: &Address, h: Height) -> Result<i64, StorageError>;

    /// `(sum, count, reputation)` for scored content.
    fn content_rating_at(&self, content_tx: &TxHash, h: Height) -> Result<(i64, i64, i64), StorageError>;

    /// `(up, down, reputation)` for comments.
    fn comment_rating_at(&self, comment_tx: &TxHash, h: Height) -> Result<(i64, i64, i64), StorageError>;

    fn likers_count_at(&self, address: &Address, rating_type: crate::types::rating::RatingType, h: Height) -> Result<i64, StorageError>;

    /// For every score tx committed at `height`, the joined data the
    /// post-processor needs to drive reputation updates (spec.md §4.2).
    fn get_score_data(&self, height: Height, depth_seconds: i64) -> Result<Vec<ScoreData>, StorageError>;

    /// Persists the `ScoreData` join rows a block's scores produced, so a
    /// later `get_score_data` call (or an external indexer) can read them
    /// back (spec.md §4.2).
    fn record_score_data(&mut self, height: Height, rows: Vec<ScoreData>) -> Result<(), StorageError>;
}
