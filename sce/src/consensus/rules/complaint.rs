//! Complaint consensus (spec.md §4.5 "Complaint").

use crate::limits::{LimitId, LimitTable};
use crate::types::payload::ComplaintPayload;
use crate::types::result::SocialConsensusResult;
use crate::types::{AccountMode, Address, Height, Network};

/// Structural `Check` (spec.md §4.5): shape only.
pub fn check(payload: &ComplaintPayload) -> Result<(), SocialConsensusResult> {
    if payload.reason < 0 {
        return Err(SocialConsensusResult::BadPayload);
    }
    Ok(())
}

/// Facts the engine gathers before calling `validate`.
pub struct ComplaintValidationFacts {
    pub complainer: Address,
    pub post_author: Address,
    pub post_is_deleted: bool,
    pub complainer_reputation_x10: i64,
    pub complainer_likers_count: i64,
    pub already_complained_on_post: bool,
    pub account_mode: AccountMode,
    pub complaints_today: i64,
}

/// Contextual `Validate` (spec.md §4.5 "Complaint").
pub fn validate(
    facts: &ComplaintValidationFacts,
    height: Height,
    network: Network,
    limits: &LimitTable,
) -> Result<(), SocialConsensusResult> {
    if facts.complainer == facts.post_author {
        return Err(SocialConsensusResult::SelfComplain);
    }
    if facts.post_is_deleted {
        return Err(SocialConsensusResult::ComplainDeletedContent);
    }
    if facts.already_complained_on_post {
        return Err(SocialConsensusResult::DoubleComplain);
    }

    let threshold_rep = limits.lookup(LimitId::ThresholdReputationComplain, network, height);
    if facts.complainer_reputation_x10 < threshold_rep {
        return Err(SocialConsensusResult::ComplainLowReputation);
    }
    let threshold_likers = limits.lookup(LimitId::ThresholdLikersCount, network, height);
    if facts.complainer_likers_count < threshold_likers {
        return Err(SocialConsensusResult::ComplainLowReputation);
    }

    let cap = match facts.account_mode {
        AccountMode::Trial => limits.lookup(LimitId::TrialComplain, network, height),
        AccountMode::Full => limits.lookup(LimitId::FullComplain, network, height),
        AccountMode::Pro => limits.lookup(LimitId::ProComplain, network, height),
    };
    if facts.complaints_today >= cap {
        return Err(SocialConsensusResult::ComplainLimit);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_facts() -> ComplaintValidationFacts {
        ComplaintValidationFacts {
            complainer: Address::from("ADDR_C"),
            post_author: Address::from("ADDR_A"),
            post_is_deleted: false,
            complainer_reputation_x10: 1000,
            complainer_likers_count: 200,
            already_complained_on_post: false,
            account_mode: AccountMode::Full,
            complaints_today: 0,
        }
    }

    #[test]
    fn rejects_self_complaint() {
        let limits = LimitTable::with_defaults();
        let mut facts = base_facts();
        facts.post_author = facts.complainer.clone();
        assert_eq!(
            validate(&facts, 10, Network::Main, &limits),
            Err(SocialConsensusResult::SelfComplain)
        );
    }

    #[test]
    fn rejects_complaint_on_deleted_post() {
        let limits = LimitTable::with_defaults();
        let mut facts = base_facts();
        facts.post_is_deleted = true;
        assert_eq!(
            validate(&facts, 10, Network::Main, &limits),
            Err(SocialConsensusResult::ComplainDeletedContent)
        );
    }

    #[test]
    fn rejects_double_complaint() {
        let limits = LimitTable::with_defaults();
        let mut facts = base_facts();
        facts.already_complained_on_post = true;
        assert_eq!(
            validate(&facts, 10, Network::Main, &limits),
            Err(SocialConsensusResult::DoubleComplain)
        );
    }

    #[test]
    fn rejects_low_reputation_complainer() {
        let limits = LimitTable::with_defaults();
        let mut facts = base_facts();
        facts.complainer_reputation_x10 = 0;
        assert_eq!(
            validate(&facts, 10, Network::Main, &limits),
            Err(SocialConsensusResult::ComplainLowReputation)
        );
    }

    #[test]
    fn accepts_well_formed_complaint() {
        let limits = LimitTable::with_defaults();
        let facts = base_facts();
        assert!(validate(&facts, 10, Network::Main, &limits).is_ok());
    }
}
