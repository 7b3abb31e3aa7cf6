//! Comment consensus (spec.md §4.5 "Comment").

use crate::limits::{LimitId, LimitTable};
use crate::types::payload::CommentPayload;
use crate::types::result::SocialConsensusResult;
use crate::types::{AccountMode, Address, Height, Network};

/// Structural `Check` (spec.md §4.5).
pub fn check(payload: &CommentPayload, network: Network, height: Height, limits: &LimitTable) -> Result<(), SocialConsensusResult> {
    let cap = limits.lookup(LimitId::ContentSizeMax, network, height) as usize;
    if payload.message.len() > cap {
        return Err(SocialConsensusResult::ContentSizeLimit);
    }
    Ok(())
}

/// Facts the engine gathers before calling `validate`.
pub struct CommentValidationFacts {
    pub author: Address,
    pub parent_exists_and_not_deleted: bool,
    pub answer_exists_and_not_deleted: bool,
    pub is_edit: bool,
    pub original_author: Option<Address>,
    pub root_height: Option<Height>,
    pub target_is_deleted: bool,
    pub is_delete_tx: bool,
    pub already_deleted: bool,
    pub account_mode: AccountMode,
    pub comments_today: i64,
}

/// Contextual `Validate` (spec.md §4.5 "Comment").
pub fn validate(
    payload: &CommentPayload,
    facts: &CommentValidationFacts,
    height: Height,
    network: Network,
    limits: &LimitTable,
) -> Result<(), SocialConsensusResult> {
    if payload.parent_id.is_some() && !facts.parent_exists_and_not_deleted {
        return Err(SocialConsensusResult::InvalidParentComment);
    }
    if payload.answer_id.is_some() && !facts.answer_exists_and_not_deleted {
        return Err(SocialConsensusResult::InvalidAnswerComment);
    }

    if facts.is_delete_tx {
        if facts.already_deleted {
            return Err(SocialConsensusResult::DoubleCommentDelete);
        }
        return Ok(());
    }

    if facts.target_is_deleted {
        return Err(SocialConsensusResult::CommentDeletedContent);
    }

    if facts.is_edit {
        let Some(original_author) = &facts.original_author else {
            return Err(SocialConsensusResult::NotFound);
        };
        if original_author != &facts.author {
            return Err(SocialConsensusResult::ContentEditUnauthorized);
        }
        let Some(root_height) = facts.root_height else {
            return Err(SocialConsensusResult::NotFound);
        };
        let depth = limits.lookup(LimitId::EditCommentDepth, network, height);
        if height - root_height > depth {
            return Err(SocialConsensusResult::CommentEditLimit);
        }
        return Ok(());
    }

    let cap = match facts.account_mode {
        AccountMode::Trial => limits.lookup(LimitId::TrialComment, network, height),
        AccountMode::Full | AccountMode::Pro => limits.lookup(LimitId::FullComment, network, height),
    };
    if facts.comments_today >= cap {
        return Err(SocialConsensusResult::CommentLimit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Hash256, TxHash};

    fn dummy_payload() -> CommentPayload {
        CommentPayload {
            root_tx_hash: TxHash(Hash256::sha256(b"root")),
            address: Address::from("ADDR_A"),
            post_id: TxHash(Hash256::sha256(b"post")),
            parent_id: None,
            answer_id: None,
            message: "hi".into(),
            deleted: false,
        }
    }

    fn base_facts() -> CommentValidationFacts {
        CommentValidationFacts {
            author: Address::from("ADDR_A"),
            parent_exists_and_not_deleted: true,
            answer_exists_and_not_deleted: true,
            is_edit: false,
            original_author: None,
            root_height: None,
            target_is_deleted: false,
            is_delete_tx: false,
            already_deleted: false,
            account_mode: AccountMode::Trial,
            comments_today: 0,
        }
    }

    /// spec.md §8 invariant 6: a score on a comment marked deleted is
    /// rejected — here exercised for the analogous "edit a deleted
    /// comment" path, with the score-side check covered in score.rs.
    #[test]
    fn rejects_edit_of_deleted_comment() {
        let limits = LimitTable::with_defaults();
        let payload = dummy_payload();
        let mut facts = base_facts();
        facts.target_is_deleted = true;
        assert_eq!(
            validate(&payload, &facts, 10, Network::Main, &limits),
            Err(SocialConsensusResult::CommentDeletedContent)
        );
    }

    #[test]
    fn rejects_double_delete() {
        let limits = LimitTable::with_defaults();
        let payload = dummy_payload();
        let mut facts = base_facts();
        facts.is_delete_tx = true;
        facts.already_deleted = true;
        assert_eq!(
            validate(&payload, &facts, 10, Network::Main, &limits),
            Err(SocialConsensusResult::DoubleCommentDelete)
        );
    }

    #[test]
    fn rejects_missing_parent() {
        let limits = LimitTable::with_defaults();
        let mut payload = dummy_payload();
        payload.parent_id = Some(TxHash(Hash256::sha256(b"missing")));
        let mut facts = base_facts();
        facts.parent_exists_and_not_deleted = false;
        assert_eq!(
            validate(&payload, &facts, 10, Network::Main, &limits),
            Err(SocialConsensusResult::InvalidParentComment)
        );
    }
}
