//! Limit Table (L2, spec.md §4.3): a height-indexed piecewise-constant
//! function `(limitId, network, height) -> value`, the source of every
//! social-consensus magic number.

use crate::types::{Height, Network};
use std::collections::HashMap;

/// Every limit id named in spec.md §4.3. Grouped by the rule family that
/// consumes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LimitId {
    // per-account-mode daily caps, per kind
    TrialPost,
    FullPost,
    ProPost,
    TrialVideo,
    FullVideo,
    ProVideo,
    TrialArticle,
    FullArticle,
    ProArticle,
    TrialScore,
    FullScore,
    ProScore,
    TrialComplain,
    FullComplain,
    ProComplain,
    TrialComment,
    FullComment,
    TrialCommentScore,
    FullCommentScore,

    // windows, expressed in blocks or seconds depending on checkpoint
    EditPostDepth,
    EditPostCount,
    EditVideoDepth,
    EditVideoCount,
    EditArticleDepth,
    EditArticleCount,
    EditCommentDepth,
    EditUserDepth,
    EditUserDailyCount,

    // reputation gates
    ThresholdReputationScore,
    ThresholdReputationComplain,
    ThresholdLikersCount,
    ScoresOneToOne,
    ScoresOneToOneDepth,
    ScoresOneToOneOverComment,
    ScoresDepthModifyReputation,
    ThresholdReputationFull,
    ThresholdBalanceFull,
    ThresholdBalancePro,
    BadReputationCutoff,

    // moderation (spec.md §4.7), per likers category 0..=3
    ModerationJuryFlagCount(u8),
    ModerationJuryFlagDepth,
    ModerationJuryModersCount(u8),
    ModerationJuryVoteCount(u8),
    Ban1Time,
    Ban2Time,
    Ban3Time,

    // badges (spec.md §4.6)
    BadgeSharkLikersThreshold,
    BadgeWhaleLikersThreshold,

    // sizing
    ContentSizeMax,

    // spec.md §9 Open Question switch height
    FixRatingsHeight,
}

/// A piecewise-constant series for one `(limit, network)` pair: ascending
/// `(activation_height, value)` pairs.
type Series = Vec<(Height, i64)>;

/// The Limit Table. Immutable at runtime once built (spec.md §5: "The
/// Limit Table is pure and read-only after init").
pub struct LimitTable {
    series: HashMap<(LimitId, Network), Series>,
}

impl LimitTable {
    pub fn new() -> Self {
        Self { series: HashMap::new() }
    }

    /// Registers a piecewise-constant series for `id` on `network`. Later
    /// calls for the same key overwrite the series; entries need not be
    /// pre-sorted, `lookup` sorts at query time.
    pub fn set_series(&mut self, id: LimitId, network: Network, mut entries: Series) {
        entries.sort_by_key(|(h, _)| *h);
        self.series.insert((id, network), entries);
    }

    /// Convenience for a limit that never changes across checkpoints.
    pub fn set_constant(&mut self, id: LimitId, network: Network, value: i64) {
        self.set_series(id, network, vec![(0, value)]);
    }

    /// `limit(id, network, height)`: the largest value whose activation
    /// height is `<= height`. Panics if `id` has no series registered for
    /// `network` — every limit the consensus rules consult must have a
    /// default populated at construction.
    pub fn lookup(&self, id: LimitId, network: Network, height: Height) -> i64 {
        let series = self
            .series
            .get(&(id, network))
            .unwrap_or_else(|| panic!("no limit series registered for {id:?} on {network:?}"));
        let height = height.max(0);
        let idx = series.partition_point(|(h, _)| *h <= height).saturating_sub(1);
        series[idx].1
    }

    /// The default table, reproducing the concrete numbers spec.md's
    /// scenarios (§8 S1/S4/S6) depend on, with the same value replicated
    /// across all three networks unless the scenario requires otherwise.
    pub fn with_defaults() -> Self {
        let mut t = Self::new();
        for network in [Network::Main, Network::Test, Network::Regtest] {
            t.set_constant(LimitId::TrialPost, network, 15);
            t.set_constant(LimitId::FullPost, network, 30);
            t.set_constant(LimitId::ProPost, network, 60);
            t.set_constant(LimitId::TrialVideo, network, 15);
            t.set_constant(LimitId::FullVideo, network, 30);
            t.set_constant(LimitId::ProVideo, network, 60);
            t.set_constant(LimitId::TrialArticle, network, 15);
            t.set_constant(LimitId::FullArticle, network, 30);
            t.set_constant(LimitId::ProArticle, network, 60);
            t.set_constant(LimitId::TrialScore, network, 200);
            t.set_constant(LimitId::FullScore, network, 400);
            t.set_constant(LimitId::ProScore, network, 800);
            t.set_constant(LimitId::TrialComplain, network, 5);
            t.set_constant(LimitId::FullComplain, network, 10);
            t.set_constant(LimitId::ProComplain, network, 20);
            t.set_constant(LimitId::TrialComment, network, 150);
            t.set_constant(LimitId::FullComment, network, 300);
            t.set_constant(LimitId::TrialCommentScore, network, 300);
            t.set_constant(LimitId::FullCommentScore, network, 600);

            t.set_constant(LimitId::EditPostDepth, network, 1440);
            t.set_constant(LimitId::EditPostCount, network, 5);
            t.set_constant(LimitId::EditVideoDepth, network, 1440);
            t.set_constant(LimitId::EditVideoCount, network, 5);
            t.set_constant(LimitId::EditArticleDepth, network, 1440);
            t.set_constant(LimitId::EditArticleCount, network, 5);
            t.set_constant(LimitId::EditCommentDepth, network, 1440);
            t.set_constant(LimitId::EditUserDepth, network, 1440);
            t.set_constant(LimitId::EditUserDailyCount, network, 10);

            t.set_constant(LimitId::ThresholdReputationScore, network, 500);
            t.set_constant(LimitId::ThresholdReputationComplain, network, 500);
            t.set_constant(LimitId::ThresholdLikersCount, network, 100);
            t.set_constant(LimitId::ScoresOneToOne, network, 2);
            t.set_constant(LimitId::ScoresOneToOneDepth, network, 86400);
            t.set_constant(LimitId::ScoresOneToOneOverComment, network, 1);
            t.set_constant(LimitId::ScoresDepthModifyReputation, network, 30 * 86400);
            t.set_constant(LimitId::ThresholdReputationFull, network, 1000);
            t.set_constant(LimitId::ThresholdBalanceFull, network, 10_000_000_000);
            t.set_constant(LimitId::ThresholdBalancePro, network, 100_000_000_000);
            t.set_constant(LimitId::BadReputationCutoff, network, -500);

            for cat in 0u8..4 {
                t.set_constant(LimitId::ModerationJuryFlagCount(cat), network, 2 + cat as i64);
                t.set_constant(LimitId::ModerationJuryModersCount(cat), network, 5 + cat as i64);
                t.set_constant(LimitId::ModerationJuryVoteCount(cat), network, 3 + cat as i64);
            }
            t.set_constant(LimitId::ModerationJuryFlagDepth, network, 86400);
            t.set_constant(LimitId::Ban1Time, network, 1440);
            t.set_constant(LimitId::Ban2Time, network, 14400);
            t.set_constant(LimitId::Ban3Time, network, 144000);

            t.set_constant(LimitId::BadgeSharkLikersThreshold, network, 1000);
            t.set_constant(LimitId::BadgeWhaleLikersThreshold, network, 10_000);

            t.set_constant(LimitId::ContentSizeMax, network, 40_000);

            t.set_constant(LimitId::FixRatingsHeight, network, 1180000);
        }
        t
    }
}

impl Default for LimitTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
