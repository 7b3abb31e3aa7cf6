//! In-memory backends, used for unit tests and anywhere a durable handle
//! isn't needed (mirrors the teacher's `InMemoryBlockStore`).

use super::{PayloadRow, PayloadStore, RatingStore, ScoreData, StorageError};
use crate::types::rating::{RatingRow, RatingSubject, RatingType};
use crate::types::{Address, Height, TxHash};
use std::collections::HashMap;

#[derive(Default)]
pub struct InMemoryPayloadStore {
    active: HashMap<TxHash, PayloadRow>,
    history: HashMap<TxHash, Vec<PayloadRow>>,
}

impl InMemoryPayloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl PayloadStore for InMemoryPayloadStore {
    fn put(&mut self, row: PayloadRow) -> Result<(), StorageError> {
        self.active.entry(row.tx_hash).or_insert(row);
        Ok(())
    }

    fn get(&self, tx_hash: &TxHash) -> Result<Option<PayloadRow>, StorageError> {
        Ok(self.active.get(tx_hash).cloned())
    }

    fn history(&self, root_tx_hash: &TxHash) -> Result<Vec<PayloadRow>, StorageError> {
        Ok(self.history.get(root_tx_hash).cloned().unwrap_or_default())
    }

    fn exists_by_hash(&self, tx_hash: &TxHash) -> Result<bool, StorageError> {
        Ok(self.active.contains_key(tx_hash))
    }

    fn archive_active(&mut self, root_tx_hash: &TxHash, _at_height: Height) -> Result<(), StorageError> {
        if let Some(current) = self.active.remove(root_tx_hash) {
            self.history.entry(*root_tx_hash).or_default().push(current);
        }
        Ok(())
    }

    fn commit_last(&mut self, row: PayloadRow) -> Result<(), StorageError> {
        if let Some(mut prior) = self.active.remove(&row.root_tx_hash) {
            prior.last = false;
            self.history.entry(row.root_tx_hash).or_default().push(prior);
        }
        let mut row = row;
        row.last = true;
        self.active.insert(row.tx_hash, row);
        Ok(())
    }

    fn delete_above_height(&mut self, h: Height) -> Result<(), StorageError> {
        let evicted: Vec<TxHash> = self
            .active
            .iter()
            .filter(|(_, row)| row.height.is_some_and(|rh| rh > h))
            .map(|(k, _)| *k)
            .collect();
        for tx in evicted {
            self.active.remove(&tx);
            if let Some(versions) = self.history.get_mut(&tx) {
                if let Some(restored) = versions.pop() {
                    self.active.insert(restored.tx_hash, restored);
                }
            }
        }
        for versions in self.history.values_mut() {
            versions.retain(|row| row.height.is_none_or(|rh| rh <= h));
        }
        Ok(())
    }

    fn all_active(&self) -> Result<Vec<PayloadRow>, StorageError> {
        Ok(self.active.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryRatingStore {
    rows: Vec<RatingRow>,
    score_data: HashMap<Height, Vec<ScoreData>>,
}

impl InMemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sum_deltas(&self, rating_type: RatingType, subject: &RatingSubject, h: Height) -> i64 {
        self.rows
            .iter()
            .filter(|r| r.rating_type == rating_type && &r.subject == subject && r.height <= h)
            .map(|r| r.delta)
            .sum()
    }
}

impl RatingStore for InMemoryRatingStore {
    fn insert_deltas(&mut self, height: Height, rows: Vec<RatingRow>) -> Result<(), StorageError> {
        for row in rows {
            debug_assert_eq!(row.height, height);
            self.rows.push(row);
        }
        Ok(())
    }

    fn delete_above_height(&mut self, h: Height) -> Result<(), StorageError> {
        self.rows.retain(|r| r.height <= h);
        self.score_data.retain(|height, _| *height <= h);
        Ok(())
    }

    fn account_reputation_at(&self, address: &Address, h: Height) -> Result<i64, StorageError> {
        Ok(self.sum_deltas(RatingType::Account, &RatingSubject::Account(address.clone()), h))
    }

    fn content_rating_at(&self, content_tx: &TxHash, h: Height) -> Result<(i64, i64, i64), StorageError> {
        let subject = RatingSubject::Content(*content_tx);
        let reputation = self.sum_deltas(RatingType::Content, &subject, h);
        let count = self
            .rows
            .iter()
            .filter(|r| r.rating_type == RatingType::Content && r.subject == subject && r.height <= h)
            .count() as i64;
        Ok((reputation, count, reputation))
    }

    fn comment_rating_at(&self, comment_tx: &TxHash, h: Height) -> Result<(i64, i64, i64), StorageError> {
        let subject = RatingSubject::Comment(*comment_tx);
        let rows: Vec<&RatingRow> = self
            .rows
            .iter()
            .filter(|r| r.rating_type == RatingType::Comment && r.subject == subject && r.height <= h)
            .collect();
        let up = rows.iter().filter(|r| r.delta > 0).count() as i64;
        let down = rows.iter().filter(|r| r.delta < 0).count() as i64;
        let reputation = rows.iter().map(|r| r.delta).sum();
        Ok((up, down, reputation))
    }

    fn likers_count_at(&self, address: &Address, rating_type: RatingType, h: Height) -> Result<i64, StorageError> {
        Ok(self.sum_deltas(rating_type, &RatingSubject::Account(address.clone()), h))
    }

    fn get_score_data(&self, height: Height, _depth_seconds: i64) -> Result<Vec<ScoreData>, StorageError> {
        Ok(self.score_data.get(&height).cloned().unwrap_or_default())
    }

    fn record_score_data(&mut self, height: Height, rows: Vec<ScoreData>) -> Result<(), StorageError> {
        self.score_data.entry(height).or_default().extend(rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::payload::{AccountPayload, Payload};
    use crate::types::{Hash256, KindTag};

    fn dummy_row(tx_hash: TxHash, root: TxHash, height: Option<Height>) -> PayloadRow {
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
            root_tx_hash: root,
            height,
            sequence: None,
            last: false,
            commit_time: 0,
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let mut store = InMemoryPayloadStore::new();
        let tx = TxHash(Hash256::sha256(b"tx1"));
        store.put(dummy_row(tx, tx, Some(10))).unwrap();
        assert!(store.get(&tx).unwrap().is_some());
        assert!(store.exists_by_hash(&tx).unwrap());
    }

    #[test]
    fn delete_above_height_restores_prior_version() {
        let mut store = InMemoryPayloadStore::new();
        let root = TxHash(Hash256::sha256(b"root"));
        let v1 = dummy_row(root, root, Some(100));
        let v2_hash = TxHash(Hash256::sha256(b"v2"));
        store.put(v1).unwrap();
        store.archive_active(&root, 100).unwrap();
        store.put(dummy_row(v2_hash, root, Some(200))).unwrap();

        store.delete_above_height(150).unwrap();
        assert!(store.get(&v2_hash).unwrap().is_none());
        assert!(store.exists_by_hash(&root).unwrap());
    }

    #[test]
    fn rating_store_sums_deltas_up_to_height() {
        let mut store = InMemoryRatingStore::new();
        let addr = Address::from("ADDR_A");
        store
            .insert_deltas(
                10,
                vec![RatingRow {
                    rating_type: RatingType::Account,
                    subject: RatingSubject::Account(addr.clone()),
                    height: 10,
                    delta: 20,
                }],
            )
            .unwrap();
        store
            .insert_deltas(
                20,
                vec![RatingRow {
                    rating_type: RatingType::Account,
                    subject: RatingSubject::Account(addr.clone()),
                    height: 20,
                    delta: -5,
                }],
            )
            .unwrap();

        assert_eq!(store.account_reputation_at(&addr, 15).unwrap(), 20);
        assert_eq!(store.account_reputation_at(&addr, 20).unwrap(), 15);
    }

    #[test]
    fn rating_store_delete_above_height_is_rollback() {
        let mut store = InMemoryRatingStore::new();
        let addr = Address::from("ADDR_A");
        store
            .insert_deltas(
                20,
                vec![RatingRow {
                    rating_type: RatingType::Account,
                    subject: RatingSubject::Account(addr.clone()),
                    height: 20,
                    delta: 20,
                }],
            )
            .unwrap();
        store.delete_above_height(10).unwrap();
        assert_eq!(store.account_reputation_at(&addr, 20).unwrap(), 0);
    }
}
