//! Chain Post-Processor (L6, spec.md §4.8): the pipeline that turns one
//! committed block's carrier transactions into everything the downstream
//! layers (L1 Rating Store, L5 Reputation Consensus, L7 State Hash)
//! consume. Everything here runs only for transactions that have already
//! cleared `Check`/`Validate` at admission time; a bad OP_RETURN hash or
//! an unresolved payload is still possible for a block built by another
//! node, so this module re-checks the hash commitment itself rather than
//! trusting the caller.

use super::{Engine, EngineError};
use crate::consensus::common::check_payload_hash;
use crate::jury::{self, BanRow, JuryRow};
use crate::rating::{self, ScoreCommentContext, ScorePostContext};
use crate::reputation::{self, ModifyReputationFacts};
use crate::statehash;
use crate::storage::{PayloadRow, PayloadStore, RatingStore, ScoreData};
use crate::types::block::BlockContext;
use crate::types::payload::Payload;
use crate::types::rating::RatingRow;
use crate::types::{Hash256, Height, KindTag, TxHash};

/// Resolves a carrier transaction's application payload by its hash. The
/// engine never parses OP_RETURN bytes itself (that's the indexer feeding
/// it); this is the seam a caller plugs a mempool, a wallet's relay, or a
/// replay-from-storage source into.
pub trait PayloadSource {
    fn resolve(&self, tx_hash: &TxHash) -> Option<Payload>;
}

/// Summary of one `index_block` call, returned to the caller for logging
/// and metrics rather than forcing it to re-derive what happened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub height: Height,
    pub txs_seen: usize,
    pub indexed: usize,
    pub rejected: usize,
    pub unresolved: usize,
    pub rating_rows_written: usize,
    pub juries_opened: usize,
    pub bans_imposed: usize,
    pub badges_recomputed: usize,
}

/// Picks the root identity a row is filed under: for editable content this
/// is the original version's tx hash; everything else roots at itself.
fn root_tx_hash_for(payload: &Payload, tx_hash: TxHash) -> TxHash {
    payload.root_tx_hash().unwrap_or(tx_hash)
}

/// Which of the eight frozen state-hash tables (spec.md §6) a kind's rows
/// belong to. Moderation kinds carry no rating delta of their own (see
/// `consensus::rules::moderation`) and aren't one of the frozen tables, so
/// they fold into none of them.
fn table_bucket(kind: KindTag) -> Option<usize> {
    match kind {
        KindTag::User => Some(0),
        KindTag::Post | KindTag::Video | KindTag::Article => Some(1),
        KindTag::Comment => Some(2),
        KindTag::ScorePost | KindTag::ScoreComment => Some(3),
        KindTag::Subscribe | KindTag::SubscribePrivate | KindTag::Unsubscribe => Some(4),
        KindTag::Block | KindTag::Unblock => Some(5),
        KindTag::Complaint => Some(6),
        KindTag::ModerationFlag | KindTag::ModerationVote => None,
    }
}

const RATINGS_BUCKET: usize = 7;

/// Writes one committed payload into the Payload Store, respecting the
/// per-kind edit semantics: Comment uses `commitLast` (spec.md §4.1),
/// Post/Video/Article archive their previous version on a genuine edit,
/// everything else is append-only.
fn store_payload_row<P: PayloadStore>(store: &mut P, row: PayloadRow) -> Result<(), EngineError> {
    let is_first_version = row.root_tx_hash == row.tx_hash;
    if row.kind.is_last_wins() {
        store.commit_last(row)?;
    } else if row.kind.is_editable_content() && !is_first_version {
        store.archive_active(&row.root_tx_hash, row.height.unwrap_or(0))?;
        store.put(row)?;
    } else {
        store.put(row)?;
    }
    Ok(())
}

/// Runs the full L6 pipeline for `block`: admits each carrier tx in order,
/// writes accepted payloads, folds deltas into the Rating Store, runs the
/// jury/ban and badge cadences, and chains the state hash (spec.md §4.8).
pub fn process_block<P: PayloadStore, R: RatingStore>(
    engine: &mut Engine<P, R>,
    block: &BlockContext,
    payloads: &dyn PayloadSource,
) -> Result<IndexReport, EngineError> {
    let network = engine.network();
    let height = block.height;

    let mut report = IndexReport { height, ..Default::default() };
    let mut committed: Vec<TxHash> = Vec::new();
    let mut rating_rows: Vec<RatingRow> = Vec::new();
    let mut score_data_rows: Vec<ScoreData> = Vec::new();
    let mut table_rows: [Vec<Hash256>; 8] = std::array::from_fn(|_| Vec::new());

    for tx in block.ordered_txs() {
        report.txs_seen += 1;

        let Some(op) = &tx.op_return else {
            report.unresolved += 1;
            continue;
        };
        let Some(payload) = payloads.resolve(&tx.tx_hash) else {
            report.unresolved += 1;
            continue;
        };
        if payload.kind_tag() != op.kind_tag {
            report.rejected += 1;
            continue;
        }

        let with_referrer = payload.payload_hash(true);
        let computed = if with_referrer == op.payload_hash { with_referrer } else { payload.payload_hash(false) };
        if check_payload_hash(computed, op.payload_hash, tx.tx_hash, op.kind_tag, &engine.legacy).is_err() {
            report.rejected += 1;
            continue;
        }

        let kind = payload.kind_tag();
        let root_tx_hash = root_tx_hash_for(&payload, tx.tx_hash);
        let row = PayloadRow {
            tx_hash: tx.tx_hash,
            kind,
            payload: payload.clone(),
            root_tx_hash,
            height: Some(height),
            sequence: None,
            last: kind.is_last_wins(),
            commit_time: tx.time,
        };

        if let Some(bucket) = table_bucket(kind) {
            table_rows[bucket].push(statehash::row_hash(&payload.canonical_fields(true)));
        }

        engine.indices.apply(&row);
        store_payload_row(&mut engine.payload_store, row)?;
        committed.push(tx.tx_hash);
        report.indexed += 1;

        match &payload {
            Payload::ScorePost(p) => {
                let Some(content_row) = engine.payload_store.get(&p.content_tx_hash)? else {
                    continue;
                };
                let content_author = super::sender_of(&content_row.payload);
                let post_author_likers =
                    engine.rating_store.likers_count_at(&content_author, crate::types::rating::RatingType::LikersPost, height)?;
                let score_address_likers =
                    engine.rating_store.likers_count_at(&p.address, crate::types::rating::RatingType::LikersPost, height)?;
                let facts = ModifyReputationFacts {
                    post_author_likers,
                    score_address_likers,
                    age_seconds: p.time - content_row.commit_time,
                };
                let ctx = ScorePostContext {
                    voter: p.address.clone(),
                    content_author: content_author.clone(),
                    content_tx: p.content_tx_hash,
                    value: p.value,
                    modify: facts,
                };
                rating_rows.extend(rating::score_post_rows(&ctx, height, network, &engine.limits));
                score_data_rows.push(ScoreData {
                    score_tx: tx.tx_hash,
                    score_address: p.address.clone(),
                    score_value: p.value,
                    score_time: p.time,
                    content_tx: p.content_tx_hash,
                    content_address: content_author,
                    content_type: content_row.kind,
                    content_time: content_row.commit_time,
                    content_id: 0,
                    content_address_id: 0,
                });
            }
            Payload::ScoreComment(p) => {
                let Some(comment_row) = engine.payload_store.get(&p.content_tx_hash)? else {
                    continue;
                };
                let comment_author = super::sender_of(&comment_row.payload);
                let root_post_tx = match &comment_row.payload {
                    Payload::Comment(c) => c.post_id,
                    _ => continue,
                };
                let ctx = ScoreCommentContext {
                    voter: p.address.clone(),
                    comment_author: comment_author.clone(),
                    comment_tx: p.content_tx_hash,
                    root_post_tx,
                    value: p.value,
                };
                rating_rows.extend(rating::score_comment_rows(&ctx, height));
                score_data_rows.push(ScoreData {
                    score_tx: tx.tx_hash,
                    score_address: p.address.clone(),
                    score_value: p.value,
                    score_time: p.time,
                    content_tx: p.content_tx_hash,
                    content_address: comment_author,
                    content_type: comment_row.kind,
                    content_time: comment_row.commit_time,
                    content_id: 0,
                    content_address_id: 0,
                });
            }
            Payload::ModerationFlag(p) => {
                let likers = engine.rating_store.likers_count_at(&p.target, crate::types::rating::RatingType::LikersPost, height)?;
                let category = jury::category_for_likers(likers);
                let depth = engine.limits.lookup(crate::limits::LimitId::ModerationJuryFlagDepth, network, height);
                // `apply()` already folded this flag in above, so the count below includes it.
                let flag_count = engine
                    .indices
                    .flags_by_target
                    .get(&p.target)
                    .map(|flags| flags.iter().filter(|(_, h)| (height - *h) as i64 <= depth).count() as i64)
                    .unwrap_or(0);
                if !engine.indices.juries_by_target.contains_key(&p.target)
                    && jury::should_open_jury(flag_count, category, network, height, &engine.limits)
                {
                    let row = JuryRow { id: tx.tx_hash, target: p.target.clone(), category, opened_height: height };
                    engine.indices.juries_by_target.insert(p.target.clone(), tx.tx_hash);
                    engine.indices.open_juries.insert(tx.tx_hash, row);
                    report.juries_opened += 1;
                }
            }
            Payload::ModerationVote(p) => {
                // `apply()` already folded this vote in above.
                let vote_count = engine.indices.votes_by_jury.get(&p.jury_id).map(|v| v.len()).unwrap_or(0) as i64;
                if let Some(jury_row) = engine.indices.open_juries.get(&p.jury_id).cloned() {
                    if jury::should_impose_ban(vote_count, jury_row.category, network, height, &engine.limits) {
                        let prior_bans = engine.indices.ban_count.get(&jury_row.target).copied().unwrap_or(0);
                        let ban: BanRow = jury::impose_ban(jury_row.target.clone(), jury_row.id, prior_bans, height, network, &engine.limits);
                        engine.indices.ban_count.insert(jury_row.target.clone(), prior_bans + 1);
                        engine.indices.juries_by_target.remove(&jury_row.target);
                        engine.indices.open_juries.remove(&p.jury_id);
                        engine.indices.active_ban.insert(jury_row.target.clone(), ban);
                        report.bans_imposed += 1;
                    }
                }
            }
            _ => {}
        }
    }

    let rating_rows: Vec<RatingRow> = rating_rows
        .into_iter()
        .filter(|r| r.delta != 0 || r.rating_type.is_last_variant())
        .collect();
    for row in &rating_rows {
        let bucket = format!("{:?}-{:?}-{}-{}", row.rating_type, row.subject, row.height, row.delta);
        table_rows[RATINGS_BUCKET].push(statehash::row_hash(&bucket));
    }
    report.rating_rows_written = rating_rows.len();
    engine.rating_store.insert_deltas(height, rating_rows)?;
    engine.rating_store.record_score_data(height, score_data_rows)?;

    if reputation::is_badge_recompute_height(height, network) {
        report.badges_recomputed = engine
            .indices
            .registered
            .keys()
            .filter(|addr| {
                let likers = engine
                    .rating_store
                    .likers_count_at(addr, crate::types::rating::RatingType::LikersPost, height)
                    .unwrap_or(0);
                reputation::badge_for_likers(likers, height, network, &engine.limits).is_some()
            })
            .count();
    }

    engine.mempool.commit(&committed);

    let table_hashes: [Hash256; 8] = std::array::from_fn(|i| statehash::table_hash(&table_rows[i]));
    let new_state_hash = statehash::chain_block_state_hash(engine.state_hash, &table_hashes);
    engine.state_hash = new_state_hash;
    engine.state_hash_history.insert(height, new_state_hash);

    Ok(report)
}
