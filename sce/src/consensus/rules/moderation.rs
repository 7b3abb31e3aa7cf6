//! ModerationFlag / ModerationVote consensus (spec.md §4.7 "Jury & Ban").
//!
//! Neither kind changes a rating row directly — a flag only accumulates
//! toward a jury threshold, and a vote only accumulates toward a ban
//! threshold (spec.md §4.7: "no direct rating change"). The jury/ban rows
//! themselves are produced by [`crate::jury`].

use crate::limits::{LimitId, LimitTable};
use crate::types::payload::{ModerationFlagPayload, ModerationVotePayload};
use crate::types::result::SocialConsensusResult;
use crate::types::{Address, Height, Network};

/// Structural `Check` for ModerationFlag (spec.md §4.7).
pub fn check_flag(payload: &ModerationFlagPayload) -> Result<(), SocialConsensusResult> {
    if payload.address == payload.target {
        return Err(SocialConsensusResult::SelfFlag);
    }
    Ok(())
}

/// Facts the engine gathers before calling `validate_flag`.
pub struct FlagValidationFacts {
    pub already_flagged_in_window: bool,
}

/// Contextual `Validate` for ModerationFlag: at most one flag per
/// (flagger, target) pair inside `moderation_jury_flag_depth` (spec.md
/// §4.7).
pub fn validate_flag(
    facts: &FlagValidationFacts,
    height: Height,
    network: Network,
    limits: &LimitTable,
) -> Result<(), SocialConsensusResult> {
    let _ = limits.lookup(LimitId::ModerationJuryFlagDepth, network, height);
    if facts.already_flagged_in_window {
        return Err(SocialConsensusResult::Duplicate);
    }
    Ok(())
}

/// Structural `Check` for ModerationVote (spec.md §4.7).
pub fn check_vote(payload: &ModerationVotePayload) -> Result<(), SocialConsensusResult> {
    let _ = payload;
    Ok(())
}

/// Facts the engine gathers before calling `validate_vote`.
pub struct VoteValidationFacts {
    pub jury_exists_and_open: bool,
    pub voter_is_eligible_moderator: bool,
    pub already_voted: bool,
}

/// Contextual `Validate` for ModerationVote: voter must be an eligible
/// moderator on an open jury, and may vote at most once per jury.
pub fn validate_vote(facts: &VoteValidationFacts) -> Result<(), SocialConsensusResult> {
    if !facts.jury_exists_and_open {
        return Err(SocialConsensusResult::NotFound);
    }
    if !facts.voter_is_eligible_moderator {
        return Err(SocialConsensusResult::NotAllowed);
    }
    if facts.already_voted {
        return Err(SocialConsensusResult::Duplicate);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hash256;

    #[test]
    fn rejects_self_flag() {
        let payload = ModerationFlagPayload {
            address: Address::from("ADDR_A"),
            target: Address::from("ADDR_A"),
            reason: 1,
        };
        assert_eq!(check_flag(&payload), Err(SocialConsensusResult::SelfFlag));
    }

    #[test]
    fn rejects_duplicate_flag_in_window() {
        let limits = LimitTable::with_defaults();
        let facts = FlagValidationFacts { already_flagged_in_window: true };
        assert_eq!(
            validate_flag(&facts, 10, Network::Main, &limits),
            Err(SocialConsensusResult::Duplicate)
        );
    }

    #[test]
    fn rejects_vote_from_ineligible_moderator() {
        let facts = VoteValidationFacts {
            jury_exists_and_open: true,
            voter_is_eligible_moderator: false,
            already_voted: false,
        };
        assert_eq!(validate_vote(&facts), Err(SocialConsensusResult::NotAllowed));
    }

    #[test]
    fn rejects_second_vote_on_same_jury() {
        let facts = VoteValidationFacts {
            jury_exists_and_open: true,
            voter_is_eligible_moderator: true,
            already_voted: true,
        };
        assert_eq!(validate_vote(&facts), Err(SocialConsensusResult::Duplicate));
    }

    #[test]
    fn accepts_well_formed_vote() {
        let payload = ModerationVotePayload {
            address: Address::from("ADDR_M"),
            jury_id: crate::types::TxHash(Hash256::sha256(b"jury")),
            verdict: true,
        };
        assert!(check_vote(&payload).is_ok());
        let facts = VoteValidationFacts {
            jury_exists_and_open: true,
            voter_is_eligible_moderator: true,
            already_voted: false,
        };
        assert!(validate_vote(&facts).is_ok());
    }
}
