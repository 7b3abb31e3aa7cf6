//! ScorePost / ScoreComment consensus (spec.md §4.5).

use crate::limits::{LimitId, LimitTable};
use crate::types::payload::{ScoreCommentPayload, ScorePostPayload};
use crate::types::result::SocialConsensusResult;
use crate::types::{AccountMode, Address, Height, Network};

/// Facts gathered by the engine before calling `validate_post`.
pub struct ScorePostValidationFacts {
    pub voter: Address,
    pub content_author: Address,
    pub content_is_deleted: bool,
    pub voter_reputation_x10: i64,
    pub voter_likers_count: i64,
    pub prior_scores_same_pair: i64,
    pub account_mode: AccountMode,
    pub scores_today: i64,
}

/// `Validate` for ScorePost (spec.md §4.5 "ScorePost").
pub fn validate_post(
    payload: &ScorePostPayload,
    facts: &ScorePostValidationFacts,
    height: Height,
    network: Network,
    limits: &LimitTable,
) -> Result<(), SocialConsensusResult> {
    if !(1..=5).contains(&payload.value) {
        return Err(SocialConsensusResult::BadPayload);
    }
    if facts.voter == facts.content_author {
        return Err(SocialConsensusResult::SelfScore);
    }
    if facts.content_is_deleted {
        return Err(SocialConsensusResult::ScoreDeletedContent);
    }

    let threshold_rep = limits.lookup(LimitId::ThresholdReputationScore, network, height);
    let threshold_likers = limits.lookup(LimitId::ThresholdLikersCount, network, height);
    if facts.voter_reputation_x10 < threshold_rep || facts.voter_likers_count < threshold_likers {
        return Err(SocialConsensusResult::ScoreLowReputation);
    }

    let one_to_one = limits.lookup(LimitId::ScoresOneToOne, network, height);
    if facts.prior_scores_same_pair >= one_to_one {
        return Err(SocialConsensusResult::DoubleScore);
    }

    let cap = match facts.account_mode {
        AccountMode::Trial => limits.lookup(LimitId::TrialScore, network, height),
        AccountMode::Full | AccountMode::Pro => limits.lookup(LimitId::FullScore, network, height),
    };
    if facts.scores_today >= cap {
        return Err(SocialConsensusResult::ScoreLimit);
    }

    Ok(())
}

/// Facts gathered by the engine before calling `validate_comment`.
pub struct ScoreCommentValidationFacts {
    pub voter: Address,
    pub comment_author: Address,
    pub comment_is_deleted: bool,
    pub prior_scores_same_pair: i64,
    pub account_mode: AccountMode,
    pub scores_today: i64,
}

/// `Validate` for ScoreComment (spec.md §4.5 "ScoreComment" — "analogous
/// with `scores_one_to_one_over_comment`").
pub fn validate_comment(
    payload: &ScoreCommentPayload,
    facts: &ScoreCommentValidationFacts,
    height: Height,
    network: Network,
    limits: &LimitTable,
) -> Result<(), SocialConsensusResult> {
    if payload.value != -1 && payload.value != 1 {
        return Err(SocialConsensusResult::BadPayload);
    }
    if facts.voter == facts.comment_author {
        return Err(SocialConsensusResult::SelfCommentScore);
    }
    if facts.comment_is_deleted {
        return Err(SocialConsensusResult::ScoreDeletedContent);
    }

    let one_to_one = limits.lookup(LimitId::ScoresOneToOneOverComment, network, height);
    if facts.prior_scores_same_pair >= one_to_one {
        return Err(SocialConsensusResult::DoubleCommentScore);
    }

    let cap = match facts.account_mode {
        AccountMode::Trial => limits.lookup(LimitId::TrialCommentScore, network, height),
        AccountMode::Full | AccountMode::Pro => limits.lookup(LimitId::FullCommentScore, network, height),
    };
    if facts.scores_today >= cap {
        return Err(SocialConsensusResult::CommentScoreLimit);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Hash256, TxHash};

    fn dummy_post_payload(value: i8) -> ScorePostPayload {
        ScorePostPayload {
            address: Address::from("ADDR_A"),
            content_tx_hash: TxHash(Hash256::sha256(b"content")),
            value,
            time: 0,
        }
    }

    /// spec.md §8 S2: a self-score is rejected with SelfScore.
    #[test]
    fn s2_rejects_self_score() {
        let limits = LimitTable::with_defaults();
        let payload = dummy_post_payload(5);
        let facts = ScorePostValidationFacts {
            voter: Address::from("ADDR_A"),
            content_author: Address::from("ADDR_A"),
            content_is_deleted: false,
            voter_reputation_x10: 10_000,
            voter_likers_count: 1000,
            prior_scores_same_pair: 0,
            account_mode: AccountMode::Full,
            scores_today: 0,
        };
        assert_eq!(
            validate_post(&payload, &facts, 20, Network::Main, &limits),
            Err(SocialConsensusResult::SelfScore)
        );
    }

    #[test]
    fn rejects_low_reputation_voter() {
        let limits = LimitTable::with_defaults();
        let payload = dummy_post_payload(5);
        let facts = ScorePostValidationFacts {
            voter: Address::from("ADDR_C"),
            content_author: Address::from("ADDR_A"),
            content_is_deleted: false,
            voter_reputation_x10: 0,
            voter_likers_count: 0,
            prior_scores_same_pair: 0,
            account_mode: AccountMode::Trial,
            scores_today: 0,
        };
        assert_eq!(
            validate_post(&payload, &facts, 400, Network::Main, &limits),
            Err(SocialConsensusResult::ScoreLowReputation)
        );
    }

    /// spec.md §8 S6: a reputable voter with sufficient likers passes.
    #[test]
    fn s6_accepts_well_reputed_score() {
        let limits = LimitTable::with_defaults();
        let payload = dummy_post_payload(5);
        let facts = ScorePostValidationFacts {
            voter: Address::from("ADDR_C"),
            content_author: Address::from("ADDR_A"),
            content_is_deleted: false,
            voter_reputation_x10: 1500,
            voter_likers_count: 100,
            prior_scores_same_pair: 0,
            account_mode: AccountMode::Full,
            scores_today: 0,
        };
        assert!(validate_post(&payload, &facts, 400, Network::Main, &limits).is_ok());
    }

    #[test]
    fn rejects_score_on_deleted_comment() {
        let limits = LimitTable::with_defaults();
        let payload = ScoreCommentPayload {
            address: Address::from("ADDR_A"),
            content_tx_hash: TxHash(Hash256::sha256(b"comment")),
            value: 1,
            time: 0,
        };
        let facts = ScoreCommentValidationFacts {
            voter: Address::from("ADDR_A"),
            comment_author: Address::from("ADDR_B"),
            comment_is_deleted: true,
            prior_scores_same_pair: 0,
            account_mode: AccountMode::Trial,
            scores_today: 0,
        };
        assert_eq!(
            validate_comment(&payload, &facts, 10, Network::Main, &limits),
            Err(SocialConsensusResult::ScoreDeletedContent)
        );
    }
}
