//! Jury & Ban (spec.md §4.7).
//!
//! ModerationFlag/ModerationVote transactions themselves carry no rating
//! delta (see [`crate::consensus::rules::moderation`]); this module turns
//! their accumulated counts into jury and ban rows once a threshold is
//! crossed. The category (0..=3) is selected by the target's likers count,
//! coarser categories getting a harsher bar (spec.md §4.7).

use crate::limits::{LimitId, LimitTable};
use crate::types::{Address, Height, Network, TxHash};

/// Four likers-count buckets, each with its own flag/vote thresholds and
/// ban durations (spec.md §4.7).
pub fn category_for_likers(likers_count: i64) -> u8 {
    match likers_count {
        0..=99 => 0,
        100..=999 => 1,
        1000..=9999 => 2,
        _ => 3,
    }
}

/// A jury opened against `target` once its flag count for `category`
/// clears `ModerationJuryFlagCount(category)` within
/// `ModerationJuryFlagDepth`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JuryRow {
    pub id: TxHash,
    pub target: Address,
    pub category: u8,
    pub opened_height: Height,
}

/// `true` once accumulated flags against `target` warrant opening a jury.
pub fn should_open_jury(flag_count: i64, category: u8, network: Network, height: Height, limits: &LimitTable) -> bool {
    let threshold = limits.lookup(LimitId::ModerationJuryFlagCount(category), network, height);
    flag_count >= threshold
}

/// A ban applied to `target` once a jury's vote count clears
/// `ModerationJuryVoteCount(category)`. Spec.md §4.7: three escalating
/// expiry heights, `Ban1Time`/`Ban2Time`/`Ban3Time`, selected by how many
/// prior bans the target has already served.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BanRow {
    pub target: Address,
    pub jury_id: TxHash,
    pub imposed_height: Height,
    pub expires_height: Height,
}

/// `true` once accumulated guilty votes on an open jury warrant a ban.
pub fn should_impose_ban(vote_count: i64, category: u8, network: Network, height: Height, limits: &LimitTable) -> bool {
    let threshold = limits.lookup(LimitId::ModerationJuryVoteCount(category), network, height);
    vote_count >= threshold
}

/// Picks the ban duration from how many prior bans `target` has served,
/// capping at the third tier (spec.md §4.7).
pub fn ban_duration(prior_ban_count: u32, network: Network, height: Height, limits: &LimitTable) -> i64 {
    let id = match prior_ban_count {
        0 => LimitId::Ban1Time,
        1 => LimitId::Ban2Time,
        _ => LimitId::Ban3Time,
    };
    limits.lookup(id, network, height)
}

/// Builds the ban row for a jury whose vote count just crossed the
/// threshold.
pub fn impose_ban(
    target: Address,
    jury_id: TxHash,
    prior_ban_count: u32,
    height: Height,
    network: Network,
    limits: &LimitTable,
) -> BanRow {
    let duration = ban_duration(prior_ban_count, network, height, limits);
    BanRow { target, jury_id, imposed_height: height, expires_height: height + duration as Height }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hash256;

    #[test]
    fn category_buckets_match_likers_ranges() {
        assert_eq!(category_for_likers(0), 0);
        assert_eq!(category_for_likers(500), 1);
        assert_eq!(category_for_likers(5000), 2);
        assert_eq!(category_for_likers(50_000), 3);
    }

    #[test]
    fn jury_opens_once_flag_threshold_crossed() {
        let limits = LimitTable::with_defaults();
        assert!(!should_open_jury(1, 0, Network::Main, 10, &limits));
        assert!(should_open_jury(2, 0, Network::Main, 10, &limits));
    }

    #[test]
    fn ban_duration_escalates_per_prior_ban() {
        let limits = LimitTable::with_defaults();
        let first = ban_duration(0, Network::Main, 10, &limits);
        let second = ban_duration(1, Network::Main, 10, &limits);
        let third = ban_duration(5, Network::Main, 10, &limits);
        assert!(first < second);
        assert!(second < third);
    }

    #[test]
    fn impose_ban_sets_expiry_from_imposed_height() {
        let limits = LimitTable::with_defaults();
        let row = impose_ban(
            Address::from("ADDR_A"),
            TxHash(Hash256::sha256(b"jury")),
            0,
            1000,
            Network::Main,
            &limits,
        );
        assert_eq!(row.imposed_height, 1000);
        assert_eq!(row.expires_height, 1000 + 1440);
    }
}
