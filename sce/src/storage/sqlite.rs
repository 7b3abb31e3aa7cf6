//! SQLite-backed Payload Store and Rating Store (spec.md §6: "Two
//! SQLite-style databases named `main` and `web`... WAL journaling").
//!
//! Mirrors the teacher's durable-backend shape (a thin wrapper struct
//! around a connection, encode/decode helpers, the same trait impl as the
//! in-memory backend) with RocksDB column families replaced by SQLite
//! tables, since the persisted layout spec.md §6 names is a SQLite one.

use super::{PayloadRow, PayloadStore, RatingStore, ScoreData, StorageError};
use crate::types::payload::Payload;
use crate::types::rating::{RatingRow, RatingSubject, RatingType};
use crate::types::{Address, Height, KindTag, Time, TxHash};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

fn kind_tag_to_i64(k: KindTag) -> i64 {
    k as i64
}

fn kind_tag_from_i64(v: i64) -> Result<KindTag, StorageError> {
    Ok(match v {
        1 => KindTag::User,
        2 => KindTag::Post,
        3 => KindTag::Video,
        4 => KindTag::Article,
        5 => KindTag::Comment,
        6 => KindTag::ScorePost,
        7 => KindTag::ScoreComment,
        8 => KindTag::Subscribe,
        9 => KindTag::SubscribePrivate,
        10 => KindTag::Unsubscribe,
        11 => KindTag::Block,
        12 => KindTag::Unblock,
        13 => KindTag::Complaint,
        14 => KindTag::ModerationFlag,
        15 => KindTag::ModerationVote,
        other => return Err(StorageError::Backend(format!("unknown kind tag {other}"))),
    })
}

fn rating_type_to_i64(t: RatingType) -> i64 {
    match t {
        RatingType::Account => 0,
        RatingType::Content => 1,
        RatingType::Comment => 2,
        RatingType::LikersPost => 3,
        RatingType::LikersCommentRoot => 4,
        RatingType::LikersCommentAnswer => 5,
        RatingType::AccountLast => 6,
        RatingType::ContentLast => 7,
        RatingType::CommentLast => 8,
        RatingType::LikersPostLast => 9,
        RatingType::LikersCommentRootLast => 10,
        RatingType::LikersCommentAnswerLast => 11,
    }
}

fn rating_type_from_i64(v: i64) -> Result<RatingType, StorageError> {
    Ok(match v {
        0 => RatingType::Account,
        1 => RatingType::Content,
        2 => RatingType::Comment,
        3 => RatingType::LikersPost,
        4 => RatingType::LikersCommentRoot,
        5 => RatingType::LikersCommentAnswer,
        6 => RatingType::AccountLast,
        7 => RatingType::ContentLast,
        8 => RatingType::CommentLast,
        9 => RatingType::LikersPostLast,
        10 => RatingType::LikersCommentRootLast,
        11 => RatingType::LikersCommentAnswerLast,
        other => return Err(StorageError::Backend(format!("unknown rating type {other}"))),
    })
}

fn subject_to_json(s: &RatingSubject) -> String {
    serde_json::to_string(s).expect("RatingSubject serializes")
}

fn subject_from_json(s: &str) -> Result<RatingSubject, StorageError> {
    serde_json::from_str(s).map_err(|e| StorageError::Backend(e.to_string()))
}

/// Opens a connection with the WAL journal mode spec.md §6 requires.
fn open_wal(path: &Path) -> Result<Connection, StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::Backend(e.to_string()))?;
    }
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

/// SQLite-backed Payload Store (L0), one instance per attached database
/// (`main` or `web`, spec.md §6).
pub struct SqlitePayloadStore {
    conn: Connection,
}

impl SqlitePayloadStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = open_wal(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS payload_active (
                tx_hash TEXT PRIMARY KEY,
                kind INTEGER NOT NULL,
                root_tx_hash TEXT NOT NULL,
                height INTEGER,
                sequence INTEGER,
                last INTEGER NOT NULL,
                commit_time INTEGER NOT NULL,
                payload_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS payload_history (
                root_tx_hash TEXT NOT NULL,
                seq INTEGER NOT NULL,
                tx_hash TEXT NOT NULL,
                kind INTEGER NOT NULL,
                height INTEGER,
                commit_time INTEGER NOT NULL,
                payload_json TEXT NOT NULL,
                PRIMARY KEY (root_tx_hash, seq)
            );",
        )?;
        Ok(Self { conn })
    }

    fn row_from_db(
        tx_hash: String,
        kind: i64,
        root_tx_hash: String,
        height: Option<i64>,
        sequence: Option<i64>,
        last: i64,
        commit_time: i64,
        payload_json: String,
    ) -> Result<PayloadRow, StorageError> {
        Ok(PayloadRow {
            tx_hash: TxHash(crate::types::Hash256::from_hex(&tx_hash).map_err(|e| StorageError::Backend(e.to_string()))?),
            kind: kind_tag_from_i64(kind)?,
            payload: serde_json::from_str::<Payload>(&payload_json).map_err(|e| StorageError::Backend(e.to_string()))?,
            root_tx_hash: TxHash(crate::types::Hash256::from_hex(&root_tx_hash).map_err(|e| StorageError::Backend(e.to_string()))?),
            height: height.map(|h| h as Height),
            sequence: sequence.map(|s| s as u64),
            last: last != 0,
            commit_time,
        })
    }
}

impl PayloadStore for SqlitePayloadStore {
    fn put(&mut self, row: PayloadRow) -> Result<(), StorageError> {
        let payload_json = serde_json::to_string(&row.payload).map_err(|e| StorageError::Backend(e.to_string()))?;
        self.conn.execute(
            "INSERT OR IGNORE INTO payload_active
                (tx_hash, kind, root_tx_hash, height, sequence, last, commit_time, payload_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.tx_hash.0.to_hex(),
                kind_tag_to_i64(row.kind),
                row.root_tx_hash.0.to_hex(),
                row.height.map(|h| h as i64),
                row.sequence.map(|s| s as i64),
                row.last as i64,
                row.commit_time,
                payload_json,
            ],
        )?;
        Ok(())
    }

    fn get(&self, tx_hash: &TxHash) -> Result<Option<PayloadRow>, StorageError> {
        self.conn
            .query_row(
                "SELECT tx_hash, kind, root_tx_hash, height, sequence, last, commit_time, payload_json
                 FROM payload_active WHERE tx_hash = ?1",
                params![tx_hash.0.to_hex()],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, i64>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, Option<i64>>(3)?,
                        r.get::<_, Option<i64>>(4)?,
                        r.get::<_, i64>(5)?,
                        r.get::<_, i64>(6)?,
                        r.get::<_, String>(7)?,
                    ))
                },
            )
            .optional()?
            .map(|(a, b, c, d, e, f, g, h)| Self::row_from_db(a, b, c, d, e, f, g, h))
            .transpose()
    }

    fn history(&self, root_tx_hash: &TxHash) -> Result<Vec<PayloadRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT tx_hash, kind, root_tx_hash, height, commit_time, payload_json
             FROM payload_history WHERE root_tx_hash = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![root_tx_hash.0.to_hex()], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Option<i64>>(3)?,
                r.get::<_, i64>(4)?,
                r.get::<_, String>(5)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (tx_hash, kind, root, height, commit_time, payload_json) = row?;
            out.push(Self::row_from_db(tx_hash, kind, root, height, None, 0, commit_time, payload_json)?);
        }
        Ok(out)
    }

    fn exists_by_hash(&self, tx_hash: &TxHash) -> Result<bool, StorageError> {
        Ok(self.get(tx_hash)?.is_some())
    }

    fn archive_active(&mut self, root_tx_hash: &TxHash, _at_height: Height) -> Result<(), StorageError> {
        if let Some(current) = self.get(root_tx_hash)? {
            let next_seq: i64 = self.conn.query_row(
                "SELECT COALESCE(MAX(seq), -1) + 1 FROM payload_history WHERE root_tx_hash = ?1",
                params![root_tx_hash.0.to_hex()],
                |r| r.get(0),
            )?;
            let payload_json = serde_json::to_string(&current.payload).map_err(|e| StorageError::Backend(e.to_string()))?;
            self.conn.execute(
                "INSERT INTO payload_history (root_tx_hash, seq, tx_hash, kind, height, commit_time, payload_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    root_tx_hash.0.to_hex(),
                    next_seq,
                    current.tx_hash.0.to_hex(),
                    kind_tag_to_i64(current.kind),
                    current.height.map(|h| h as i64),
                    current.commit_time,
                    payload_json,
                ],
            )?;
            self.conn.execute(
                "DELETE FROM payload_active WHERE tx_hash = ?1",
                params![current.tx_hash.0.to_hex()],
            )?;
        }
        Ok(())
    }

    fn commit_last(&mut self, row: PayloadRow) -> Result<(), StorageError> {
        self.archive_active(&row.root_tx_hash, row.height.unwrap_or(0))?;
        let mut row = row;
        row.last = true;
        self.put(row)
    }

    fn delete_above_height(&mut self, h: Height) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM payload_active WHERE height IS NOT NULL AND height > ?1", params![h as i64])?;
        self.conn
            .execute("DELETE FROM payload_history WHERE height IS NOT NULL AND height > ?1", params![h as i64])?;
        Ok(())
    }

    fn all_active(&self) -> Result<Vec<PayloadRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT tx_hash, kind, root_tx_hash, height, sequence, last, commit_time, payload_json FROM payload_active",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Option<i64>>(3)?,
                r.get::<_, Option<i64>>(4)?,
                r.get::<_, i64>(5)?,
                r.get::<_, i64>(6)?,
                r.get::<_, String>(7)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (a, b, c, d, e, f, g, h) = row?;
            out.push(Self::row_from_db(a, b, c, d, e, f, g, h)?);
        }
        Ok(out)
    }
}

/// SQLite-backed Rating Store (L1).
pub struct SqliteRatingStore {
    conn: Connection,
}

impl SqliteRatingStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = open_wal(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS rating_rows (
                rating_type INTEGER NOT NULL,
                subject TEXT NOT NULL,
                height INTEGER NOT NULL,
                delta INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_rating_subject ON rating_rows (rating_type, subject, height);
            CREATE TABLE IF NOT EXISTS score_data (
                height INTEGER NOT NULL,
                score_tx TEXT NOT NULL,
                score_address TEXT NOT NULL,
                score_value INTEGER NOT NULL,
                score_time INTEGER NOT NULL,
                content_tx TEXT NOT NULL,
                content_address TEXT NOT NULL,
                content_type INTEGER NOT NULL,
                content_time INTEGER NOT NULL,
                content_id INTEGER NOT NULL,
                content_address_id INTEGER NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    fn sum_deltas(&self, rating_type: RatingType, subject: &RatingSubject, h: Height) -> Result<i64, StorageError> {
        let sum: Option<i64> = self.conn.query_row(
            "SELECT SUM(delta) FROM rating_rows WHERE rating_type = ?1 AND subject = ?2 AND height <= ?3",
            params![rating_type_to_i64(rating_type), subject_to_json(subject), h as i64],
            |r| r.get(0),
        )?;
        Ok(sum.unwrap_or(0))
    }
}

impl RatingStore for SqliteRatingStore {
    fn insert_deltas(&mut self, height: Height, rows: Vec<RatingRow>) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        for row in rows {
            tx.execute(
                "INSERT INTO rating_rows (rating_type, subject, height, delta) VALUES (?1, ?2, ?3, ?4)",
                params![
                    rating_type_to_i64(row.rating_type),
                    subject_to_json(&row.subject),
                    height as i64,
                    row.delta,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_above_height(&mut self, h: Height) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM rating_rows WHERE height > ?1", params![h as i64])?;
        self.conn.execute("DELETE FROM score_data WHERE height > ?1", params![h as i64])?;
        Ok(())
    }

    fn account_reputation_at(&self, address: &Address, h: Height) -> Result<i64, StorageError> {
        self.sum_deltas(RatingType::Account, &RatingSubject::Account(address.clone()), h)
    }

    fn content_rating_at(&self, content_tx: &TxHash, h: Height) -> Result<(i64, i64, i64), StorageError> {
        let subject = RatingSubject::Content(*content_tx);
        let reputation = self.sum_deltas(RatingType::Content, &subject, h)?;
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM rating_rows WHERE rating_type = ?1 AND subject = ?2 AND height <= ?3",
            params![rating_type_to_i64(RatingType::Content), subject_to_json(&subject), h as i64],
            |r| r.get(0),
        )?;
        Ok((reputation, count, reputation))
    }

    fn comment_rating_at(&self, comment_tx: &TxHash, h: Height) -> Result<(i64, i64, i64), StorageError> {
        let subject = RatingSubject::Comment(*comment_tx);
        let mut stmt = self.conn.prepare(
            "SELECT delta FROM rating_rows WHERE rating_type = ?1 AND subject = ?2 AND height <= ?3",
        )?;
        let deltas: Vec<i64> = stmt
            .query_map(params![rating_type_to_i64(RatingType::Comment), subject_to_json(&subject), h as i64], |r| r.get(0))?
            .collect::<Result<_, _>>()?;
        let up = deltas.iter().filter(|d| **d > 0).count() as i64;
        let down = deltas.iter().filter(|d| **d < 0).count() as i64;
        let reputation = deltas.iter().sum();
        Ok((up, down, reputation))
    }

    fn likers_count_at(&self, address: &Address, rating_type: RatingType, h: Height) -> Result<i64, StorageError> {
        self.sum_deltas(rating_type, &RatingSubject::Account(address.clone()), h)
    }

    fn get_score_data(&self, height: Height, _depth_seconds: Time) -> Result<Vec<ScoreData>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT score_tx, score_address, score_value, score_time, content_tx, content_address,
                    content_type, content_time, content_id, content_address_id
             FROM score_data WHERE height = ?1",
        )?;
        let rows = stmt.query_map(params![height as i64], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, i64>(2)?,
                r.get::<_, i64>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, i64>(6)?,
                r.get::<_, i64>(7)?,
                r.get::<_, i64>(8)?,
                r.get::<_, i64>(9)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (score_tx, score_address, score_value, score_time, content_tx, content_address, content_type, content_time, content_id, content_address_id) = row?;
            out.push(ScoreData {
                score_tx: TxHash(crate::types::Hash256::from_hex(&score_tx).map_err(|e| StorageError::Backend(e.to_string()))?),
                score_address: Address(score_address),
                score_value: score_value as i8,
                score_time,
                content_tx: TxHash(crate::types::Hash256::from_hex(&content_tx).map_err(|e| StorageError::Backend(e.to_string()))?),
                content_address: Address(content_address),
                content_type: kind_tag_from_i64(content_type)?,
                content_time,
                content_id,
                content_address_id,
            });
        }
        Ok(out)
    }

    fn record_score_data(&mut self, height: Height, rows: Vec<ScoreData>) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        for row in rows {
            tx.execute(
                "INSERT INTO score_data
                    (height, score_tx, score_address, score_value, score_time, content_tx,
                     content_address, content_type, content_time, content_id, content_address_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    height as i64,
                    row.score_tx.0.to_hex(),
                    row.score_address.0,
                    row.score_value as i64,
                    row.score_time,
                    row.content_tx.0.to_hex(),
                    row.content_address.0,
                    kind_tag_to_i64(row.content_type),
                    row.content_time,
                    row.content_id,
                    row.content_address_id,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::payload::{AccountPayload, Payload};
    use crate::types::Hash256;
    use tempfile::TempDir;

    fn dummy_row(tx_hash: TxHash) -> PayloadRow {
        PayloadRow {
            tx_hash,
            kind: KindTag::User,
            payload: Payload::User(AccountPayload {
                address: Address::from("ADDR_A"),
                name: "alice".into(),
                avatar: String::new(),
                about: String::new(),
                lang: "en".into(),
                url: String::new(),
                donations: String::new(),
                pubkey: String::new(),
                referrer: None,
            }),
            root_tx_hash: tx_hash,
            height: Some(10),
            sequence: None,
            last: false,
            commit_time: 0,
        }
    }

    #[test]
    fn sqlite_payload_store_put_then_get() {
        let dir = TempDir::new().unwrap();
        let mut store = SqlitePayloadStore::open(&dir.path().join("main.sqlite3")).unwrap();
        let tx = TxHash(Hash256::sha256(b"tx1"));
        store.put(dummy_row(tx)).unwrap();
        let fetched = store.get(&tx).unwrap().unwrap();
        assert_eq!(fetched.tx_hash, tx);
    }

    #[test]
    fn sqlite_rating_store_sums_deltas() {
        let dir = TempDir::new().unwrap();
        let mut store = SqliteRatingStore::open(&dir.path().join("web.sqlite3")).unwrap();
        let addr = Address::from("ADDR_A");
        store
            .insert_deltas(
                10,
                vec![RatingRow {
                    rating_type: RatingType::Account,
                    subject: RatingSubject::Account(addr.clone()),
                    height: 10,
                    delta: 15,
                }],
            )
            .unwrap();
        assert_eq!(store.account_reputation_at(&addr, 10).unwrap(), 15);
    }
}
