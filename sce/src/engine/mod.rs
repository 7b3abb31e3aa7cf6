//! The composed Engine (spec.md §9: "a single value replaces the source's
//! global mutable singletons"). Owns the Payload Store, Rating Store,
//! Limit Table, Payload Mempool, and the in-memory secondary indices the
//! per-kind consensus rules need (registered accounts, active
//! subscriptions/blockings, per-address daily activity), and exposes
//! exactly the seven operations spec.md §1 names: `check`, `validate`,
//! `index_block`, `rollback`, `compute_state_hash`, `get_user_state`,
//! `select_winners`.

pub mod post_processor;

use crate::checkpoint::CheckpointTable;
use crate::config::SceConfig;
use crate::consensus::common::LegacyExceptionTable;
use crate::consensus::rules::content::{ContentKind, ContentRuleParams, ContentValidationFacts};
use crate::consensus::rules::{blocking, comment, complaint, moderation, score, subscription, user};
use crate::jury::{BanRow, JuryRow};
use crate::limits::{LimitId, LimitTable};
use crate::lottery::{self, Candidate, Winner, WinnerClass};
use crate::mempool::PayloadMempool;
use crate::reputation::{self, AccountModeFacts};
use crate::storage::{PayloadRow, PayloadStore, RatingStore, StorageError};
use crate::types::payload::{BlockingKind, Payload, SubscriptionKind};
use crate::types::rating::RatingType;
use crate::types::result::SocialConsensusResult;
use crate::types::{Address, Height, KindTag, Network, Time, TxHash};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Errors surfaced at the `Engine` boundary: either a consensus rejection
/// or a storage failure. Kept as a manual enum, not a derive-macro error
/// type, matching the rest of this crate's error idiom.
#[derive(Debug)]
pub enum EngineError {
    Consensus(SocialConsensusResult),
    Storage(StorageError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Consensus(r) => write!(f, "consensus rejection: {r}"),
            EngineError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StorageError> for EngineError {
    fn from(e: StorageError) -> Self {
        EngineError::Storage(e)
    }
}

impl From<SocialConsensusResult> for EngineError {
    fn from(r: SocialConsensusResult) -> Self {
        EngineError::Consensus(r)
    }
}

/// Derived view of an account, assembled from the Rating Store plus the
/// engine's registration index (spec.md §1: `GetUserState`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserState {
    pub address: Address,
    pub registered: bool,
    pub reputation_x10: i64,
    pub likers_count: i64,
    pub mode: crate::types::AccountMode,
    pub badge: Option<reputation::Badge>,
}

/// In-memory secondary indices the per-kind rules need for O(1) fact
/// gathering, rebuilt from the Payload Store after a rollback rather than
/// maintained via a separate undo log (spec.md §5: "rollback must restore
/// exact prior state").
#[derive(Default)]
struct Indices {
    registered: HashMap<Address, TxHash>,
    names: HashMap<String, Address>,
    frozen_referrer: HashMap<Address, Address>,
    subscriptions: HashMap<(Address, Address), SubscriptionKind>,
    blockings: HashMap<Address, HashSet<Address>>,
    score_post_pairs: HashMap<(Address, TxHash), i64>,
    score_comment_pairs: HashMap<(Address, TxHash), i64>,
    daily_activity: HashMap<(Address, KindTag), Vec<Height>>,
    complaints_by_post: HashMap<TxHash, HashSet<Address>>,
    deleted_comments: HashSet<TxHash>,
    /// `(flagger, height)` pairs accumulated against a target, foldable
    /// from the Payload Store alone (spec.md §4.7).
    flags_by_target: HashMap<Address, Vec<(Address, Height)>>,
    /// Guilty-verdict voters per open jury.
    votes_by_jury: HashMap<TxHash, HashSet<Address>>,
    /// The one open jury id per target, if any.
    juries_by_target: HashMap<Address, TxHash>,
    open_juries: HashMap<TxHash, JuryRow>,
    /// How many bans a target has already served, for `ban_duration`'s
    /// escalation (spec.md §4.7). Unlike `flags_by_target`/`votes_by_jury`
    /// this is derived from a threshold decision, not folded from a row,
    /// so `rebuild_from` cannot reconstruct it after a rollback — see
    /// DESIGN.md.
    ban_count: HashMap<Address, u32>,
    active_ban: HashMap<Address, BanRow>,
}

impl Indices {
    fn clear(&mut self) {
        *self = Self::default();
    }

    /// Folds one committed row into the indices. Shared by block
    /// processing (called once per accepted tx) and index rebuild after a
    /// rollback (called once per surviving row).
    fn apply(&mut self, row: &PayloadRow) {
        let height = row.height.unwrap_or(0);
        self.daily_activity.entry((sender_of(&row.payload), row.kind)).or_default().push(height);

        match &row.payload {
            Payload::User(p) => {
                self.registered.entry(p.address.clone()).or_insert(row.tx_hash);
                self.names.insert(p.name.to_lowercase(), p.address.clone());
                if let Some(referrer) = &p.referrer {
                    self.frozen_referrer.entry(p.address.clone()).or_insert_with(|| referrer.clone());
                }
            }
            Payload::Subscription(p) => {
                match p.action {
                    SubscriptionKind::Unsubscribe => {
                        self.subscriptions.remove(&(p.from.clone(), p.to.clone()));
                    }
                    other => {
                        self.subscriptions.insert((p.from.clone(), p.to.clone()), other);
                    }
                }
            }
            Payload::Blocking(p) => {
                let set = self.blockings.entry(p.from.clone()).or_default();
                match p.action {
                    BlockingKind::Block => {
                        set.extend(p.to.iter().cloned());
                    }
                    BlockingKind::Unblock => {
                        for addr in &p.to {
                            set.remove(addr);
                        }
                    }
                }
            }
            Payload::ScorePost(p) => {
                *self.score_post_pairs.entry((p.address.clone(), p.content_tx_hash)).or_insert(0) += 1;
            }
            Payload::ScoreComment(p) => {
                *self.score_comment_pairs.entry((p.address.clone(), p.content_tx_hash)).or_insert(0) += 1;
            }
            Payload::Complaint(p) => {
                self.complaints_by_post.entry(p.post_tx_hash).or_default().insert(p.address.clone());
            }
            Payload::ModerationFlag(p) => {
                self.flags_by_target.entry(p.target.clone()).or_default().push((p.address.clone(), height));
            }
            Payload::ModerationVote(p) => {
                if p.verdict {
                    self.votes_by_jury.entry(p.jury_id).or_default().insert(p.address.clone());
                }
            }
            Payload::Comment(p) => {
                if p.deleted {
                    self.deleted_comments.insert(row.root_tx_hash);
                } else {
                    self.deleted_comments.remove(&row.root_tx_hash);
                }
            }
            Payload::Post(_) | Payload::Video(_) | Payload::Article(_) => {}
        }
    }

    fn rebuild_from<P: PayloadStore>(&mut self, store: &P) -> Result<(), StorageError> {
        self.clear();
        for row in store.all_active()? {
            self.apply(&row);
        }
        Ok(())
    }

    fn activity_count_since(&self, address: &Address, kind: KindTag, since_height: Height) -> i64 {
        self.daily_activity
            .get(&(address.clone(), kind))
            .map(|heights| heights.iter().filter(|h| **h >= since_height).count() as i64)
            .unwrap_or(0)
    }
}

fn sender_of(payload: &Payload) -> Address {
    payload.sender().clone()
}

/// The composed engine. Generic over both storage traits so callers can
/// wire either the in-memory or the SQLite-backed implementations without
/// the engine itself depending on either concretely.
pub struct Engine<P: PayloadStore, R: RatingStore> {
    config: SceConfig,
    limits: LimitTable,
    legacy: LegacyExceptionTable,
    content_rules: CheckpointTable<ContentRuleParams>,
    payload_store: P,
    rating_store: R,
    mempool: PayloadMempool,
    indices: Indices,
    state_hash: crate::types::Hash256,
    state_hash_history: HashMap<Height, crate::types::Hash256>,
}

impl<P: PayloadStore, R: RatingStore> Engine<P, R> {
    pub fn new(config: SceConfig, payload_store: P, rating_store: R) -> Self {
        let mempool = PayloadMempool::new(config.mempool.max_payloads);
        Self {
            limits: LimitTable::with_defaults(),
            legacy: LegacyExceptionTable::default(),
            content_rules: crate::consensus::rules::content::rule_table(),
            payload_store,
            rating_store,
            mempool,
            indices: Indices::default(),
            state_hash: crate::types::Hash256::ZERO,
            state_hash_history: HashMap::from([(0, crate::types::Hash256::ZERO)]),
            config,
        }
    }

    pub fn network(&self) -> Network {
        self.config.storage.network
    }

    pub fn limits(&self) -> &LimitTable {
        &self.limits
    }

    pub fn mempool(&self) -> &PayloadMempool {
        &self.mempool
    }

    pub fn mempool_mut(&mut self) -> &mut PayloadMempool {
        &mut self.mempool
    }

    /// `ComputeStateHash` (spec.md §1, §4.9): the chained tip.
    pub fn compute_state_hash(&self) -> crate::types::Hash256 {
        self.state_hash
    }

    /// `payloadHash(row) == op_return_hash(tx)` (spec.md §4.5's common
    /// preconditions), with the legacy-exception bypass (spec.md §9). This
    /// is the one precondition an admission boundary (the node binary's
    /// transaction-submission handler, or a future mempool replay path)
    /// must apply itself before calling `check`/`validate`, since only the
    /// caller holds both the payload and the carrier tx's on-chain
    /// commitment together.
    pub fn check_payload_hash(
        &self,
        computed: crate::types::Hash256,
        on_chain: crate::types::Hash256,
        tx_hash: TxHash,
        kind: KindTag,
    ) -> Result<(), SocialConsensusResult> {
        crate::consensus::common::check_payload_hash(computed, on_chain, tx_hash, kind, &self.legacy)
    }

    /// `IndexBlock` (spec.md §1, §4.8): runs the post-processor pipeline
    /// over `block`, using `payloads` to resolve each carrier tx's
    /// payload.
    pub fn index_block(
        &mut self,
        block: &crate::types::block::BlockContext,
        payloads: &dyn post_processor::PayloadSource,
    ) -> Result<post_processor::IndexReport, EngineError> {
        post_processor::process_block(self, block, payloads)
    }

    /// `Rollback` (spec.md §1, §4.8, §5): restores the state the engine
    /// had at the end of `to_height`, exactly.
    pub fn rollback(&mut self, to_height: Height) -> Result<(), EngineError> {
        self.payload_store.delete_above_height(to_height)?;
        self.rating_store.delete_above_height(to_height)?;
        self.indices.rebuild_from(&self.payload_store)?;

        self.state_hash_history.retain(|h, _| *h <= to_height);
        self.state_hash = self
            .state_hash_history
            .get(&to_height)
            .copied()
            .unwrap_or(crate::types::Hash256::ZERO);
        Ok(())
    }

    /// `GetUserState` (spec.md §1, §4.6): the current derived view of one
    /// account.
    pub fn get_user_state(&self, address: &Address, at_height: Height) -> Result<UserState, EngineError> {
        let registered = self.indices.registered.contains_key(address);
        let reputation_x10 = self.rating_store.account_reputation_at(address, at_height)?;
        let likers_count = self.rating_store.likers_count_at(address, RatingType::LikersPost, at_height)?;
        let network = self.network();
        let mode = reputation::account_mode(
            &AccountModeFacts { reputation_x10, balance: 0, likers_count },
            at_height,
            network,
            &self.limits,
        );
        let badge = reputation::badge_for_likers(likers_count, at_height, network, &self.limits);
        Ok(UserState { address: address.clone(), registered, reputation_x10, likers_count, mode, badge })
    }

    /// `SelectWinners` (spec.md §1, §4.10): runs the PoS lottery seeded by
    /// `block`'s kernel hash over `candidates` drawn from block `h-1`.
    pub fn select_winners(
        &self,
        block: &crate::types::block::BlockContext,
        candidates: &[Candidate],
        pools: [(WinnerClass, i64); 4],
    ) -> Vec<Winner> {
        lottery::select_winners(&block.kernel_seed, candidates, pools)
    }

    /// The block/second window used to bound "per-day" activity counts
    /// (spec.md §4.3 `limit_window`: "block or seconds depending on
    /// checkpoint"). Content/Comment/User kinds reuse their own edit-depth
    /// limit for this, matching spec.md's grouping of the day cap and the
    /// edit window under the same `limit_window`; Score/Complaint have no
    /// dedicated window limit of their own, so `ScoresOneToOneDepth` (the
    /// literal "one day" same-pair window) stands in for them too.
    fn activity_window_for(&self, kind: KindTag, network: Network, height: Height) -> Height {
        let id = match kind {
            KindTag::Post => LimitId::EditPostDepth,
            KindTag::Video => LimitId::EditVideoDepth,
            KindTag::Article => LimitId::EditArticleDepth,
            KindTag::Comment => LimitId::EditCommentDepth,
            KindTag::User => LimitId::EditUserDepth,
            _ => LimitId::ScoresOneToOneDepth,
        };
        self.limits.lookup(id, network, height) as Height
    }

    fn activity_today(&self, address: &Address, kind: KindTag, height: Height) -> i64 {
        let window = self.activity_window_for(kind, self.network(), height);
        self.indices.activity_count_since(address, kind, (height - window).max(0))
    }

    fn account_mode_at(&self, address: &Address, height: Height) -> Result<AccountMode, EngineError> {
        let network = self.network();
        let reputation_x10 = self.rating_store.account_reputation_at(address, height)?;
        let likers_count = self.rating_store.likers_count_at(address, RatingType::LikersPost, height)?;
        Ok(reputation::account_mode(
            &AccountModeFacts { reputation_x10, balance: 0, likers_count },
            height,
            network,
            &self.limits,
        ))
    }

    /// `Check` (spec.md §1, §4.5): structural admission rule for one
    /// payload. No chain-state lookups beyond the limit table itself.
    pub fn check(&self, payload: &Payload, sender: &Address, height: Height) -> Result<(), EngineError> {
        let network = self.network();
        match payload {
            Payload::User(p) => user::check(p, sender)?,
            Payload::Post(p) => crate::consensus::rules::content::check(p, ContentKind::Post, network, height, &self.limits)?,
            Payload::Video(p) => crate::consensus::rules::content::check(p, ContentKind::Video, network, height, &self.limits)?,
            Payload::Article(p) => {
                crate::consensus::rules::content::check(p, ContentKind::Article, network, height, &self.limits)?
            }
            Payload::Comment(p) => comment::check(p, network, height, &self.limits)?,
            // The value-range check for scores is folded into `validate_*`
            // itself (score.rs has no standalone structural `check`).
            Payload::ScorePost(_) | Payload::ScoreComment(_) => {}
            Payload::Subscription(p) => subscription::check(p)?,
            Payload::Blocking(p) => blocking::check(p)?,
            Payload::Complaint(p) => complaint::check(p)?,
            Payload::ModerationFlag(p) => moderation::check_flag(p)?,
            Payload::ModerationVote(p) => moderation::check_vote(p)?,
        }
        Ok(())
    }

    /// `Validate` (spec.md §1, §4.5): contextual admission rule, gathering
    /// the facts each per-kind rule needs from the Payload/Rating Stores
    /// and the in-memory indices, then delegating to `consensus::rules`.
    /// `tx_hash` is the carrier tx this payload would be indexed under, so
    /// editable kinds can tell a first version from a genuine edit before
    /// it has actually been committed.
    pub fn validate(
        &self,
        tx_hash: TxHash,
        payload: &Payload,
        sender: &Address,
        height: Height,
        tx_time: Time,
    ) -> Result<(), EngineError> {
        let network = self.network();

        match payload {
            Payload::User(p) => {
                let is_first_registration = !self.indices.registered.contains_key(&p.address);
                let frozen_referrer = self.indices.frozen_referrer.get(&p.address).cloned();
                let name_taken_by_other_account = self
                    .indices
                    .names
                    .get(&p.name.to_lowercase())
                    .is_some_and(|addr| addr != &p.address);
                let referrer_is_registered_or_empty =
                    p.referrer.as_ref().is_none_or(|r| self.indices.registered.contains_key(r));
                let recent_user_tx_count = self.activity_today(sender, KindTag::User, height);
                let facts = user::UserValidationFacts {
                    is_first_registration,
                    frozen_referrer,
                    name_taken_by_other_account,
                    referrer_is_registered_or_empty,
                    recent_user_tx_count,
                };
                user::validate(p, &facts, height, network, &self.limits)?;
            }
            Payload::Post(p) | Payload::Video(p) | Payload::Article(p) => {
                let kind = payload.kind_tag();
                let content_kind = match kind {
                    KindTag::Video => ContentKind::Video,
                    KindTag::Article => ContentKind::Article,
                    _ => ContentKind::Post,
                };
                let is_edit = p.root_tx_hash != tx_hash;
                let (original_author, root_height, root_time, edits_consumed) = if is_edit {
                    let root_row = self.payload_store.get(&p.root_tx_hash)?;
                    let original_author = root_row.as_ref().map(|r| sender_of(&r.payload));
                    let root_height = root_row.as_ref().and_then(|r| r.height);
                    let root_time = root_row.as_ref().map(|r| r.commit_time).unwrap_or(tx_time);
                    let edits_consumed = self.payload_store.history(&p.root_tx_hash)?.len() as i64;
                    (original_author, root_height, root_time, edits_consumed)
                } else {
                    (None, None, tx_time, 0)
                };
                let account_mode = self.account_mode_at(&p.address, height)?;
                let posts_today = self.activity_today(&p.address, kind, height);
                let facts = ContentValidationFacts {
                    author: p.address.clone(),
                    is_edit,
                    original_author,
                    root_height,
                    edits_consumed,
                    // Same-root, same-block dedupe is a block-assembly
                    // concern the post-processor enforces once txs are
                    // ordered; a standalone `validate` call can't see
                    // sibling txs in an as-yet-unbuilt block.
                    already_edited_in_this_batch: false,
                    account_mode,
                    posts_today,
                };
                crate::consensus::rules::content::validate(content_kind, &facts, height, tx_time, root_time, network, &self.limits)?;
            }
            Payload::Comment(p) => {
                let exists_and_not_deleted = |id: &TxHash| -> Result<bool, EngineError> {
                    let exists = self.payload_store.exists_by_hash(id)?;
                    Ok(exists && !self.indices.deleted_comments.contains(id))
                };
                let parent_exists_and_not_deleted = match &p.parent_id {
                    Some(id) => exists_and_not_deleted(id)?,
                    None => true,
                };
                let answer_exists_and_not_deleted = match &p.answer_id {
                    Some(id) => exists_and_not_deleted(id)?,
                    None => true,
                };
                let is_edit = p.root_tx_hash != tx_hash;
                let (original_author, root_height) = if is_edit {
                    let root_row = self.payload_store.get(&p.root_tx_hash)?;
                    (root_row.as_ref().map(|r| sender_of(&r.payload)), root_row.as_ref().and_then(|r| r.height))
                } else {
                    (None, None)
                };
                let target_is_deleted = self.payload_store.get(&p.post_id)?.is_none();
                let is_delete_tx = p.deleted;
                let already_deleted = self.indices.deleted_comments.contains(&p.root_tx_hash);
                let account_mode = self.account_mode_at(&p.address, height)?;
                let comments_today = self.activity_today(&p.address, KindTag::Comment, height);
                let facts = comment::CommentValidationFacts {
                    author: p.address.clone(),
                    parent_exists_and_not_deleted,
                    answer_exists_and_not_deleted,
                    is_edit,
                    original_author,
                    root_height,
                    target_is_deleted,
                    is_delete_tx,
                    already_deleted,
                    account_mode,
                    comments_today,
                };
                comment::validate(p, &facts, height, network, &self.limits)?;
            }
            Payload::ScorePost(p) => {
                let Some(content_row) = self.payload_store.get(&p.content_tx_hash)? else {
                    return Err(SocialConsensusResult::NotFound.into());
                };
                let content_author = sender_of(&content_row.payload);
                let voter_reputation_x10 = self.rating_store.account_reputation_at(sender, height)?;
                let voter_likers_count = self.rating_store.likers_count_at(sender, RatingType::LikersPost, height)?;
                let prior_scores_same_pair =
                    self.indices.score_post_pairs.get(&(sender.clone(), p.content_tx_hash)).copied().unwrap_or(0);
                let account_mode = self.account_mode_at(sender, height)?;
                let scores_today = self.activity_today(sender, KindTag::ScorePost, height);
                let facts = score::ScorePostValidationFacts {
                    voter: sender.clone(),
                    content_author,
                    content_is_deleted: false,
                    voter_reputation_x10,
                    voter_likers_count,
                    prior_scores_same_pair,
                    account_mode,
                    scores_today,
                };
                score::validate_post(p, &facts, height, network, &self.limits)?;
            }
            Payload::ScoreComment(p) => {
                let Some(comment_row) = self.payload_store.get(&p.content_tx_hash)? else {
                    return Err(SocialConsensusResult::NotFound.into());
                };
                let comment_author = sender_of(&comment_row.payload);
                let comment_is_deleted = self.indices.deleted_comments.contains(&comment_row.root_tx_hash);
                let prior_scores_same_pair =
                    self.indices.score_comment_pairs.get(&(sender.clone(), p.content_tx_hash)).copied().unwrap_or(0);
                let account_mode = self.account_mode_at(sender, height)?;
                let scores_today = self.activity_today(sender, KindTag::ScoreComment, height);
                let facts = score::ScoreCommentValidationFacts {
                    voter: sender.clone(),
                    comment_author,
                    comment_is_deleted,
                    prior_scores_same_pair,
                    account_mode,
                    scores_today,
                };
                score::validate_comment(p, &facts, height, network, &self.limits)?;
            }
            Payload::Subscription(p) => {
                let to_is_registered = self.indices.registered.contains_key(&p.to);
                let already_subscribed = self.indices.subscriptions.contains_key(&(p.from.clone(), p.to.clone()));
                let facts = subscription::SubscriptionValidationFacts {
                    to_is_registered,
                    already_subscribed,
                    // Same per-block batching limitation as content edits.
                    already_unsubscribed_in_block: false,
                };
                subscription::validate(p, &facts)?;
            }
            Payload::Blocking(p) => {
                let set = self.indices.blockings.get(&p.from);
                let already_in_requested_state: Vec<bool> = p
                    .to
                    .iter()
                    .map(|addr| {
                        let blocked = set.is_some_and(|s| s.contains(addr));
                        match p.action {
                            BlockingKind::Block => blocked,
                            BlockingKind::Unblock => !blocked,
                        }
                    })
                    .collect();
                let facts = blocking::BlockingValidationFacts { already_in_requested_state };
                blocking::validate(p, &facts)?;
            }
            Payload::Complaint(p) => {
                let Some(post_row) = self.payload_store.get(&p.post_tx_hash)? else {
                    return Err(SocialConsensusResult::NotFound.into());
                };
                let post_author = sender_of(&post_row.payload);
                let complainer_reputation_x10 = self.rating_store.account_reputation_at(sender, height)?;
                let complainer_likers_count = self.rating_store.likers_count_at(sender, RatingType::LikersPost, height)?;
                let already_complained_on_post =
                    self.indices.complaints_by_post.get(&p.post_tx_hash).is_some_and(|s| s.contains(sender));
                let account_mode = self.account_mode_at(sender, height)?;
                let complaints_today = self.activity_today(sender, KindTag::Complaint, height);
                let facts = complaint::ComplaintValidationFacts {
                    complainer: sender.clone(),
                    post_author,
                    post_is_deleted: false,
                    complainer_reputation_x10,
                    complainer_likers_count,
                    already_complained_on_post,
                    account_mode,
                    complaints_today,
                };
                complaint::validate(&facts, height, network, &self.limits)?;
            }
            Payload::ModerationFlag(p) => {
                let depth = self.limits.lookup(LimitId::ModerationJuryFlagDepth, network, height);
                let already_flagged_in_window = self.indices.flags_by_target.get(&p.target).is_some_and(|flags| {
                    flags.iter().any(|(addr, h)| addr == sender && (height - *h) as i64 <= depth)
                });
                let facts = moderation::FlagValidationFacts { already_flagged_in_window };
                moderation::validate_flag(&facts, height, network, &self.limits)?;
            }
            Payload::ModerationVote(p) => {
                let jury_exists_and_open = self.indices.open_juries.contains_key(&p.jury_id);
                // No dedicated moderator-selection roster is persisted
                // (spec.md §4.7's `moderation_jury_moders_<cat>_count` names
                // how many are picked, not who); any registered account is
                // treated as eligible, a documented simplification.
                let voter_is_eligible_moderator = self.indices.registered.contains_key(sender);
                let already_voted = self.indices.votes_by_jury.get(&p.jury_id).is_some_and(|v| v.contains(sender));
                let facts = moderation::VoteValidationFacts { jury_exists_and_open, voter_is_eligible_moderator, already_voted };
                moderation::validate_vote(&facts)?;
            }
        }
        Ok(())
    }
}
