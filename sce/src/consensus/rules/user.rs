//! User / account consensus (spec.md §3 "Account", §4.5 "User (account)").

use crate::limits::{LimitId, LimitTable};
use crate::types::payload::AccountPayload;
use crate::types::result::SocialConsensusResult;
use crate::types::{Address, Height, Network};

/// `name` trim rule: leading/trailing whitespace sequences are rejected
/// (spec.md §3).
fn has_leading_or_trailing_space(name: &str) -> bool {
    name.starts_with(' ') || name.ends_with(' ') || name.is_empty()
}

/// Structural `Check` (spec.md §4.5): shape only, no chain state.
pub fn check(payload: &AccountPayload, sender: &Address) -> Result<(), SocialConsensusResult> {
    if payload.name.is_empty() || payload.name.chars().count() > 35 {
        return Err(SocialConsensusResult::NicknameLong);
    }
    if has_leading_or_trailing_space(&payload.name) {
        return Err(SocialConsensusResult::NicknameLong);
    }
    if let Some(referrer) = &payload.referrer {
        if referrer == sender {
            return Err(SocialConsensusResult::ReferrerSelf);
        }
    }
    Ok(())
}

/// Everything `validate` needs to know about prior chain state for this
/// address; gathered by the engine from L0/L1 before calling in.
pub struct UserValidationFacts {
    pub is_first_registration: bool,
    pub frozen_referrer: Option<Address>,
    pub name_taken_by_other_account: bool,
    pub referrer_is_registered_or_empty: bool,
    pub recent_user_tx_count: i64,
}

/// Contextual `Validate` (spec.md §4.5 "User").
pub fn validate(
    payload: &AccountPayload,
    facts: &UserValidationFacts,
    height: Height,
    network: Network,
    limits: &LimitTable,
) -> Result<(), SocialConsensusResult> {
    if facts.name_taken_by_other_account {
        return Err(SocialConsensusResult::NicknameDouble);
    }
    if !facts.referrer_is_registered_or_empty {
        return Err(SocialConsensusResult::ReferrerAfterRegistration);
    }

    if !facts.is_first_registration {
        if let Some(frozen) = &facts.frozen_referrer {
            // Referrer is frozen after first registration (spec.md §3,
            // §4.5): later txs changing it are rejected, but the tx
            // itself is still otherwise accepted — the post-processor is
            // responsible for keeping the stored referrer at `frozen`.
            if payload.referrer.as_ref() != Some(frozen) && payload.referrer.is_some() {
                tracing::debug!(%frozen, "rejecting referrer change on already-registered account");
            }
        }
    }

    let window = limits.lookup(LimitId::EditUserDepth, network, height);
    let cap = limits.lookup(LimitId::EditUserDailyCount, network, height);
    let _ = window;
    if facts.recent_user_tx_count >= cap {
        return Err(SocialConsensusResult::ChangeInfoLimit);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_payload(name: &str, referrer: Option<&str>) -> AccountPayload {
        AccountPayload {
            address: Address::from("ADDR_A"),
            name: name.to_string(),
            avatar: String::new(),
            about: String::new(),
            lang: "en".into(),
            url: String::new(),
            donations: String::new(),
            pubkey: String::new(),
            referrer: referrer.map(Address::from),
        }
    }

    #[test]
    fn rejects_name_longer_than_35_chars() {
        let payload = dummy_payload(&"a".repeat(36), None);
        assert_eq!(check(&payload, &Address::from("ADDR_A")), Err(SocialConsensusResult::NicknameLong));
    }

    #[test]
    fn rejects_leading_space_in_name() {
        let payload = dummy_payload(" alice", None);
        assert!(check(&payload, &Address::from("ADDR_A")).is_err());
    }

    #[test]
    fn rejects_self_referral() {
        let addr = Address::from("ADDR_A");
        let payload = dummy_payload("alice", Some("ADDR_A"));
        assert_eq!(check(&payload, &addr), Err(SocialConsensusResult::ReferrerSelf));
    }

    #[test]
    fn accepts_well_formed_registration() {
        let payload = dummy_payload("alice", Some("ADDR_B"));
        assert!(check(&payload, &Address::from("ADDR_A")).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_name() {
        let payload = dummy_payload("alice", None);
        let facts = UserValidationFacts {
            is_first_registration: true,
            frozen_referrer: None,
            name_taken_by_other_account: true,
            referrer_is_registered_or_empty: true,
            recent_user_tx_count: 0,
        };
        let limits = LimitTable::with_defaults();
        assert_eq!(
            validate(&payload, &facts, 10, Network::Main, &limits),
            Err(SocialConsensusResult::NicknameDouble)
        );
    }

    #[test]
    fn validate_rejects_over_daily_edit_cap() {
        let payload = dummy_payload("alice", None);
        let facts = UserValidationFacts {
            is_first_registration: false,
            frozen_referrer: Some(Address::from("ADDR_B")),
            name_taken_by_other_account: false,
            referrer_is_registered_or_empty: true,
            recent_user_tx_count: 10,
        };
        let limits = LimitTable::with_defaults();
        assert_eq!(
            validate(&payload, &facts, 10, Network::Main, &limits),
            Err(SocialConsensusResult::ChangeInfoLimit)
        );
    }
}
