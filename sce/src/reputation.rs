//! Reputation Consensus (L5, spec.md §4.6).
//!
//! Translates a committed ScorePost/ScoreComment into signed reputation
//! deltas, decides whether a delta is actually allowed to apply (the
//! `AllowModifyReputation` family), computes account mode from the
//! resulting aggregates, and derives the periodic likers-count badges.

use crate::limits::{LimitId, LimitTable};
use crate::types::{AccountMode, Height, Network};

/// Which address's likers count gates a reputation change — spec.md §9's
/// Open Question. The original `AllowModifyReputationOverPost` checked the
/// post author's likers count; a later fix switched it to the scoring
/// address's likers count. Both behaviours are kept, selected by height,
/// rather than resolving the ambiguity away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LikersCheckSubject {
    PostAddress,
    ScoreAddress,
}

/// `fix_ratings_height` (`LimitId::FixRatingsHeight`) is the literal
/// height-gated switch spec.md §9 calls out: below it, gate on the post
/// author's likers; at or above it, gate on the scoring address's likers.
pub fn likers_check_subject(height: Height, network: Network, limits: &LimitTable) -> LikersCheckSubject {
    let fix_height = limits.lookup(LimitId::FixRatingsHeight, network, height);
    if (height as i64) < fix_height {
        LikersCheckSubject::PostAddress
    } else {
        LikersCheckSubject::ScoreAddress
    }
}

/// Facts the engine gathers to decide whether a ScorePost's reputation
/// delta is allowed to apply.
pub struct ModifyReputationFacts {
    pub post_author_likers: i64,
    pub score_address_likers: i64,
    /// Seconds between the scored content's commit time and the score tx.
    pub age_seconds: i64,
}

/// `AllowModifyReputationOverPost` (spec.md §4.6): a score only moves
/// reputation if it lands within `scores_depth_modify_reputation` of the
/// content's commit time and the gated address clears
/// `threshold_likers_count`.
pub fn allow_modify_reputation_over_post(
    facts: &ModifyReputationFacts,
    height: Height,
    network: Network,
    limits: &LimitTable,
) -> bool {
    let depth = limits.lookup(LimitId::ScoresDepthModifyReputation, network, height);
    if facts.age_seconds > depth {
        return false;
    }
    let threshold = limits.lookup(LimitId::ThresholdLikersCount, network, height);
    let likers = match likers_check_subject(height, network, limits) {
        LikersCheckSubject::PostAddress => facts.post_author_likers,
        LikersCheckSubject::ScoreAddress => facts.score_address_likers,
    };
    likers >= threshold
}

/// `AllowModifyReputationOverComment` (spec.md §4.6): comment scores are
/// unconditional once the underlying ScoreComment tx is committed — the
/// original applies no age/likers gate for comments, only for posts.
pub fn allow_modify_reputation_over_comment() -> bool {
    true
}

/// ScorePost reputation deltas (spec.md §4.6): `value - 3` to the
/// author's account reputation at scale x10, `value - 3` as-is to the
/// content's own aggregate (no scaling — only the account-reputation side
/// is x10).
pub fn score_post_deltas(value: i8) -> (i64, i64) {
    let raw = value as i64 - 3;
    (raw * 10, raw)
}

/// ScoreComment reputation deltas (spec.md §4.6): `sign(value)` (±1) to
/// the comment author's account, the raw `value` to the comment's own
/// aggregate — neither side is scaled for comments.
pub fn score_comment_deltas(value: i8) -> (i64, i64) {
    let author_delta = value.signum() as i64;
    let comment_delta = value as i64;
    (author_delta, comment_delta)
}

/// Whether a ScorePost value counts its voter toward the target's
/// "likers" set (spec.md §4.6, §4.10: values 4 and 5 are the lottery's
/// `OR_SCORE` threshold too).
pub fn is_liker_score(value: i8) -> bool {
    value >= 4
}

/// Facts needed to compute an account's mode (spec.md §4.6).
pub struct AccountModeFacts {
    pub reputation_x10: i64,
    pub balance: i64,
    pub likers_count: i64,
}

/// `GetAccountMode`: Trial unless reputation, balance, or likers clear the
/// Full bar; Pro additionally requires the Pro balance bar.
pub fn account_mode(facts: &AccountModeFacts, height: Height, network: Network, limits: &LimitTable) -> AccountMode {
    let rep_full = limits.lookup(LimitId::ThresholdReputationFull, network, height);
    let bal_full = limits.lookup(LimitId::ThresholdBalanceFull, network, height);
    let bal_pro = limits.lookup(LimitId::ThresholdBalancePro, network, height);
    let likers_full = limits.lookup(LimitId::ThresholdLikersCount, network, height);

    let clears_full =
        facts.reputation_x10 >= rep_full || facts.balance >= bal_full || facts.likers_count >= likers_full;
    if !clears_full {
        return AccountMode::Trial;
    }
    if facts.balance >= bal_pro {
        AccountMode::Pro
    } else {
        AccountMode::Full
    }
}

/// The periodic likers-count badges (spec.md §4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Badge {
    Shark,
    Whale,
}

/// `true` on heights where badges are recomputed, spaced by
/// `Network::badge_period` (spec.md §4.6).
pub fn is_badge_recompute_height(height: Height, network: Network) -> bool {
    height % network.badge_period() == 0
}

/// The badge implied by a likers count, if any — whale outranks shark.
pub fn badge_for_likers(likers_count: i64, height: Height, network: Network, limits: &LimitTable) -> Option<Badge> {
    let whale = limits.lookup(LimitId::BadgeWhaleLikersThreshold, network, height);
    let shark = limits.lookup(LimitId::BadgeSharkLikersThreshold, network, height);
    if likers_count >= whale {
        Some(Badge::Whale)
    } else if likers_count >= shark {
        Some(Badge::Shark)
    } else {
        None
    }
}
