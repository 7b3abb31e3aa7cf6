//! Post / Video / Article consensus (spec.md §4.5 "Post / Video /
//! Article"), including the checkpointed edit-window behaviour spec.md §9
//! calls out ("Deep inheritance of consensus rules") — grounded on the
//! original `PostConsensusT` checkpoint chain, which switches the edit
//! window from a seconds-based value to a blocks-based one at a later
//! checkpoint.

use crate::checkpoint::{Checkpoint, CheckpointTable};
use crate::limits::{LimitId, LimitTable};
use crate::types::payload::ContentPayload;
use crate::types::result::SocialConsensusResult;
use crate::types::{AccountMode, Address, Height, Network, Time};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentKind {
    Post,
    Video,
    Article,
}

impl ContentKind {
    fn limit_ids(self) -> (LimitId, LimitId, LimitId, LimitId, LimitId) {
        match self {
            ContentKind::Post => (
                LimitId::TrialPost,
                LimitId::FullPost,
                LimitId::ProPost,
                LimitId::EditPostDepth,
                LimitId::EditPostCount,
            ),
            ContentKind::Video => (
                LimitId::TrialVideo,
                LimitId::FullVideo,
                LimitId::ProVideo,
                LimitId::EditVideoDepth,
                LimitId::EditVideoCount,
            ),
            ContentKind::Article => (
                LimitId::TrialArticle,
                LimitId::FullArticle,
                LimitId::ProArticle,
                LimitId::EditArticleDepth,
                LimitId::EditArticleCount,
            ),
        }
    }

    fn daily_cap(self, mode: AccountMode, network: Network, height: Height, limits: &LimitTable) -> i64 {
        let (trial, full, pro, _, _) = self.limit_ids();
        let id = match mode {
            AccountMode::Trial => trial,
            AccountMode::Full => full,
            AccountMode::Pro => pro,
        };
        limits.lookup(id, network, height)
    }

    fn edit_depth(self, network: Network, height: Height, limits: &LimitTable) -> i64 {
        let (_, _, _, depth, _) = self.limit_ids();
        limits.lookup(depth, network, height)
    }

    fn edit_count_cap(self, network: Network, height: Height, limits: &LimitTable) -> i64 {
        let (_, _, _, _, count) = self.limit_ids();
        limits.lookup(count, network, height)
    }
}

/// Whether the edit window is measured in blocks or wall-clock seconds —
/// the dimension the original `PostConsensusT` checkpoint chain flips at
/// height 1180000.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowUnit {
    Seconds,
    Blocks,
}

/// The checkpoint-selected behaviour for content edit rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentRuleParams {
    pub window_unit: WindowUnit,
    /// Whether a same-block edit must additionally satisfy a block-time
    /// ordering predicate (the original's `AllowBlockLimitTime`).
    pub allow_block_limit_time: bool,
}

fn genesis_params(_height: Height) -> ContentRuleParams {
    ContentRuleParams { window_unit: WindowUnit::Seconds, allow_block_limit_time: false }
}

fn checkpoint_1180000(_height: Height) -> ContentRuleParams {
    ContentRuleParams { window_unit: WindowUnit::Blocks, allow_block_limit_time: true }
}

pub fn rule_table() -> CheckpointTable<ContentRuleParams> {
    CheckpointTable::new(vec![
        Checkpoint { main_height: 0, test_height: 0, regtest_height: 0, factory: genesis_params },
        Checkpoint { main_height: 1180000, test_height: 1180000, regtest_height: 1180000, factory: checkpoint_1180000 },
    ])
}

/// Structural `Check` (spec.md §4.5): shape only.
pub fn check(
    payload: &ContentPayload,
    kind: ContentKind,
    network: Network,
    height: Height,
    limits: &LimitTable,
) -> Result<(), SocialConsensusResult> {
    let _ = kind;
    let size = payload.url.len() + payload.caption.len() + payload.message.len();
    let cap = limits.lookup(LimitId::ContentSizeMax, network, height) as usize;
    if size > cap {
        return Err(SocialConsensusResult::ContentSizeLimit);
    }
    Ok(())
}

/// Facts the engine gathers from L0/L1 before calling `validate`.
pub struct ContentValidationFacts {
    pub author: Address,
    pub is_edit: bool,
    pub original_author: Option<Address>,
    pub root_height: Option<Height>,
    pub edits_consumed: i64,
    pub already_edited_in_this_batch: bool,
    pub account_mode: AccountMode,
    pub posts_today: i64,
}

/// Contextual `Validate` (spec.md §4.5 "Post / Video / Article").
pub fn validate(
    kind: ContentKind,
    facts: &ContentValidationFacts,
    height: Height,
    tx_time: Time,
    root_time: Time,
    network: Network,
    limits: &LimitTable,
) -> Result<(), SocialConsensusResult> {
    let params = rule_table().instance(network, height);

    if facts.is_edit {
        let Some(original_author) = &facts.original_author else {
            return Err(SocialConsensusResult::NotFound);
        };
        if original_author != &facts.author {
            return Err(SocialConsensusResult::ContentEditUnauthorized);
        }
        if facts.already_edited_in_this_batch {
            return Err(SocialConsensusResult::DoubleContentEdit);
        }

        let depth = kind.edit_depth(network, height, limits);
        let Some(root_height) = facts.root_height else {
            return Err(SocialConsensusResult::NotFound);
        };
        let within_window = match params.window_unit {
            WindowUnit::Blocks => height - root_height <= depth,
            WindowUnit::Seconds => tx_time - root_time <= depth,
        };
        if !within_window {
            return Err(SocialConsensusResult::ContentEditLimit);
        }

        let edit_cap = kind.edit_count_cap(network, height, limits);
        if facts.edits_consumed >= edit_cap {
            return Err(SocialConsensusResult::ContentEditLimit);
        }
        if params.allow_block_limit_time && tx_time < root_time {
            return Err(SocialConsensusResult::ContentEditLimit);
        }
        return Ok(());
    }

    let cap = kind.daily_cap(facts.account_mode, network, height, limits);
    if facts.posts_today >= cap {
        return Err(SocialConsensusResult::ContentLimit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(posts_today: i64, mode: AccountMode) -> ContentValidationFacts {
        ContentValidationFacts {
            author: Address::from("ADDR_A"),
            is_edit: false,
            original_author: None,
            root_height: None,
            edits_consumed: 0,
            already_edited_in_this_batch: false,
            account_mode: mode,
            posts_today,
        }
    }

    /// spec.md §8 S1: at most trial_post=15 posts per edit_post_depth=1440
    /// blocks; the 16th returns ContentLimit.
    #[test]
    fn s1_trial_cap_is_fifteen() {
        let limits = LimitTable::with_defaults();
        let within_cap = facts(14, AccountMode::Trial);
        assert!(validate(ContentKind::Post, &within_cap, 12, 0, 0, Network::Main, &limits).is_ok());

        let at_cap = facts(15, AccountMode::Trial);
        assert_eq!(
            validate(ContentKind::Post, &at_cap, 12, 0, 0, Network::Main, &limits),
            Err(SocialConsensusResult::ContentLimit)
        );
    }

    /// spec.md §8 S4: post root at height 100, edit_post_depth=1440;
    /// edits at 1539/1540 accepted, rejected once the window closes.
    #[test]
    fn s4_edit_window_closes_after_depth_blocks() {
        let limits = LimitTable::with_defaults();
        let mut edit_facts = ContentValidationFacts {
            author: Address::from("ADDR_A"),
            is_edit: true,
            original_author: Some(Address::from("ADDR_A")),
            root_height: Some(100),
            edits_consumed: 0,
            already_edited_in_this_batch: false,
            account_mode: AccountMode::Trial,
            posts_today: 0,
        };
        assert!(validate(ContentKind::Post, &edit_facts, 1539, 0, 0, Network::Main, &limits).is_ok());
        edit_facts.edits_consumed = 0;
        assert_eq!(
            validate(ContentKind::Post, &edit_facts, 1541, 0, 0, Network::Main, &limits),
            Err(SocialConsensusResult::ContentEditLimit)
        );
    }

    #[test]
    fn rejects_edit_by_different_author() {
        let limits = LimitTable::with_defaults();
        let edit_facts = ContentValidationFacts {
            author: Address::from("ADDR_A"),
            is_edit: true,
            original_author: Some(Address::from("ADDR_B")),
            root_height: Some(100),
            edits_consumed: 0,
            already_edited_in_this_batch: false,
            account_mode: AccountMode::Trial,
            posts_today: 0,
        };
        assert_eq!(
            validate(ContentKind::Post, &edit_facts, 200, 0, 0, Network::Main, &limits),
            Err(SocialConsensusResult::ContentEditUnauthorized)
        );
    }

    #[test]
    fn rejects_second_edit_of_same_root_in_one_block() {
        let limits = LimitTable::with_defaults();
        let edit_facts = ContentValidationFacts {
            author: Address::from("ADDR_A"),
            is_edit: true,
            original_author: Some(Address::from("ADDR_A")),
            root_height: Some(100),
            edits_consumed: 0,
            already_edited_in_this_batch: true,
            account_mode: AccountMode::Trial,
            posts_today: 0,
        };
        assert_eq!(
            validate(ContentKind::Post, &edit_facts, 200, 0, 0, Network::Main, &limits),
            Err(SocialConsensusResult::DoubleContentEdit)
        );
    }
}
