//! Subscribe / SubscribePrivate / Unsubscribe consensus (spec.md §4.5
//! "Subscription").

use crate::types::payload::{SubscriptionKind, SubscriptionPayload};
use crate::types::result::SocialConsensusResult;
use crate::types::Address;

/// Structural `Check` (spec.md §4.5): shape only.
pub fn check(payload: &SubscriptionPayload) -> Result<(), SocialConsensusResult> {
    if payload.from == payload.to {
        return Err(SocialConsensusResult::SelfSubscribe);
    }
    Ok(())
}

/// Facts the engine gathers before calling `validate`.
pub struct SubscriptionValidationFacts {
    pub to_is_registered: bool,
    /// `true` if `from` already holds an active (Subscribe or
    /// SubscribePrivate) edge to `to`.
    pub already_subscribed: bool,
    /// `true` if `from` already issued an Unsubscribe to `to` earlier in
    /// this same block — spec.md §8 invariant: a same-block
    /// Subscribe-after-Unsubscribe sequence is allowed, so this only
    /// matters for rejecting a duplicate Unsubscribe.
    pub already_unsubscribed_in_block: bool,
}

/// Contextual `Validate` (spec.md §4.5 "Subscription").
pub fn validate(
    payload: &SubscriptionPayload,
    facts: &SubscriptionValidationFacts,
) -> Result<(), SocialConsensusResult> {
    if !facts.to_is_registered {
        return Err(SocialConsensusResult::NotRegistered);
    }

    match payload.action {
        SubscriptionKind::Subscribe | SubscriptionKind::SubscribePrivate => {
            if facts.already_subscribed {
                return Err(SocialConsensusResult::DoubleSubscribe);
            }
        }
        SubscriptionKind::Unsubscribe => {
            if !facts.already_subscribed || facts.already_unsubscribed_in_block {
                return Err(SocialConsensusResult::DoubleSubscribe);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_payload(kind: SubscriptionKind) -> SubscriptionPayload {
        SubscriptionPayload { from: Address::from("ADDR_A"), to: Address::from("ADDR_B"), action: kind }
    }

    #[test]
    fn rejects_self_subscribe() {
        let payload = SubscriptionPayload {
            from: Address::from("ADDR_A"),
            to: Address::from("ADDR_A"),
            action: SubscriptionKind::Subscribe,
        };
        assert_eq!(check(&payload), Err(SocialConsensusResult::SelfSubscribe));
    }

    /// spec.md §8 S3: a second Subscribe to the same target is rejected
    /// with DoubleSubscribe.
    #[test]
    fn s3_rejects_double_subscribe() {
        let payload = dummy_payload(SubscriptionKind::Subscribe);
        let facts = SubscriptionValidationFacts {
            to_is_registered: true,
            already_subscribed: true,
            already_unsubscribed_in_block: false,
        };
        assert_eq!(validate(&payload, &facts), Err(SocialConsensusResult::DoubleSubscribe));
    }

    #[test]
    fn accepts_first_subscribe() {
        let payload = dummy_payload(SubscriptionKind::Subscribe);
        let facts = SubscriptionValidationFacts {
            to_is_registered: true,
            already_subscribed: false,
            already_unsubscribed_in_block: false,
        };
        assert!(validate(&payload, &facts).is_ok());
    }

    #[test]
    fn allows_subscribe_after_unsubscribe_in_same_block() {
        let payload = dummy_payload(SubscriptionKind::Subscribe);
        let facts = SubscriptionValidationFacts {
            to_is_registered: true,
            already_subscribed: false,
            already_unsubscribed_in_block: true,
        };
        assert!(validate(&payload, &facts).is_ok());
    }

    #[test]
    fn rejects_unsubscribe_without_active_subscription() {
        let payload = dummy_payload(SubscriptionKind::Unsubscribe);
        let facts = SubscriptionValidationFacts {
            to_is_registered: true,
            already_subscribed: false,
            already_unsubscribed_in_block: false,
        };
        assert_eq!(validate(&payload, &facts), Err(SocialConsensusResult::DoubleSubscribe));
    }

    #[test]
    fn rejects_subscription_to_unregistered_account() {
        let payload = dummy_payload(SubscriptionKind::Subscribe);
        let facts = SubscriptionValidationFacts {
            to_is_registered: false,
            already_subscribed: false,
            already_unsubscribed_in_block: false,
        };
        assert_eq!(validate(&payload, &facts), Err(SocialConsensusResult::NotRegistered));
    }
}
