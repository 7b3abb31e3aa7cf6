//! Append-only rating rows (spec.md §3 "Rating rows", §1 step 4).

use super::{Address, Height, TxHash};
use serde::{Deserialize, Serialize};

/// The id half of a rating row's `(type, id, height)` key. Distinguishes
/// which entity a delta is about.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingSubject {
    Account(Address),
    Content(TxHash),
    Comment(TxHash),
}

/// Every rating kind named in spec.md §3, including the `_LAST`
/// counterparts used for O(1) consensus comparisons (spec.md §4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingType {
    Account,
    Content,
    Comment,
    LikersPost,
    LikersCommentRoot,
    LikersCommentAnswer,
    AccountLast,
    ContentLast,
    CommentLast,
    LikersPostLast,
    LikersCommentRootLast,
    LikersCommentAnswerLast,
}

impl RatingType {
    /// `_LAST` rows must be recorded even at zero delta to mark a revision
    /// (spec.md §4.8 step 6); every other row is skipped when its delta is
    /// zero.
    pub fn is_last_variant(self) -> bool {
        matches!(
            self,
            RatingType::AccountLast
                | RatingType::ContentLast
                | RatingType::CommentLast
                | RatingType::LikersPostLast
                | RatingType::LikersCommentRootLast
                | RatingType::LikersCommentAnswerLast
        )
    }
}

/// One append-only delta row, keyed by `(type, id, height)` (spec.md §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RatingRow {
    pub rating_type: RatingType,
    pub subject: RatingSubject,
    pub height: Height,
    pub delta: i64,
}
