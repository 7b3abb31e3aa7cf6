//! Rating row assembly (L1, spec.md §4.2): turns a committed ScorePost or
//! ScoreComment, plus the gating decisions made in [`crate::reputation`],
//! into the concrete [`crate::types::rating::RatingRow`] values the
//! post-processor appends to the Rating Store.
//!
//! Kept apart from [`crate::types::rating`], which only defines the row
//! shape — this module is the business logic that decides which rows a
//! given score produces.

use crate::reputation::{allow_modify_reputation_over_post, is_liker_score, ModifyReputationFacts};
use crate::types::rating::{RatingRow, RatingSubject, RatingType};
use crate::types::{Address, Height, Network, TxHash};
use crate::{limits::LimitTable, reputation};

/// Everything needed to turn one committed ScorePost into its rating rows.
pub struct ScorePostContext {
    pub voter: Address,
    pub content_author: Address,
    pub content_tx: TxHash,
    pub value: i8,
    pub modify: ModifyReputationFacts,
}

/// Builds the rating rows for a committed ScorePost at `height` (spec.md
/// §4.2, §4.6): the content's own aggregate always moves; the author's
/// account reputation only moves if `allow_modify_reputation_over_post`
/// passes, and a `_LAST` marker row is always appended regardless so
/// consumers can detect "this height touched this subject" in O(1).
pub fn score_post_rows(ctx: &ScorePostContext, height: Height, network: Network, limits: &LimitTable) -> Vec<RatingRow> {
    let (author_delta, content_delta) = reputation::score_post_deltas(ctx.value);
    let mut rows = Vec::new();

    rows.push(RatingRow {
        rating_type: RatingType::Content,
        subject: RatingSubject::Content(ctx.content_tx),
        height,
        delta: content_delta,
    });
    rows.push(RatingRow {
        rating_type: RatingType::ContentLast,
        subject: RatingSubject::Content(ctx.content_tx),
        height,
        delta: content_delta,
    });

    if allow_modify_reputation_over_post(&ctx.modify, height, network, limits) {
        rows.push(RatingRow {
            rating_type: RatingType::Account,
            subject: RatingSubject::Account(ctx.content_author.clone()),
            height,
            delta: author_delta,
        });
    }
    rows.push(RatingRow {
        rating_type: RatingType::AccountLast,
        subject: RatingSubject::Account(ctx.content_author.clone()),
        height,
        delta: if allow_modify_reputation_over_post(&ctx.modify, height, network, limits) { author_delta } else { 0 },
    });

    if is_liker_score(ctx.value) {
        rows.push(RatingRow {
            rating_type: RatingType::LikersPost,
            subject: RatingSubject::Account(ctx.content_author.clone()),
            height,
            delta: 1,
        });
        rows.push(RatingRow {
            rating_type: RatingType::LikersPostLast,
            subject: RatingSubject::Account(ctx.content_author.clone()),
            height,
            delta: 1,
        });
    }

    let _ = &ctx.voter;
    rows
}

/// Everything needed to turn one committed ScoreComment into its rating
/// rows. Comment scores are unconditional (spec.md §4.6:
/// `allow_modify_reputation_over_comment` never blocks), unlike post
/// scores.
pub struct ScoreCommentContext {
    pub voter: Address,
    pub comment_author: Address,
    pub comment_tx: TxHash,
    pub root_post_tx: TxHash,
    pub value: i8,
}

/// Builds the rating rows for a committed ScoreComment at `height`
/// (spec.md §4.2, §4.6).
pub fn score_comment_rows(ctx: &ScoreCommentContext, height: Height) -> Vec<RatingRow> {
    let (author_delta, comment_delta) = reputation::score_comment_deltas(ctx.value);
    let mut rows = vec![
        RatingRow {
            rating_type: RatingType::Comment,
            subject: RatingSubject::Comment(ctx.comment_tx),
            height,
            delta: comment_delta,
        },
        RatingRow {
            rating_type: RatingType::CommentLast,
            subject: RatingSubject::Comment(ctx.comment_tx),
            height,
            delta: comment_delta,
        },
        RatingRow {
            rating_type: RatingType::Account,
            subject: RatingSubject::Account(ctx.comment_author.clone()),
            height,
            delta: author_delta,
        },
        RatingRow {
            rating_type: RatingType::AccountLast,
            subject: RatingSubject::Account(ctx.comment_author.clone()),
            height,
            delta: author_delta,
        },
    ];

    if ctx.value > 0 {
        rows.push(RatingRow {
            rating_type: RatingType::LikersCommentRoot,
            subject: RatingSubject::Content(ctx.root_post_tx),
            height,
            delta: 1,
        });
        rows.push(RatingRow {
            rating_type: RatingType::LikersCommentRootLast,
            subject: RatingSubject::Content(ctx.root_post_tx),
            height,
            delta: 1,
        });
    }

    let _ = &ctx.voter;
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hash256;

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    fn tx(tag: &str) -> TxHash {
        TxHash(Hash256::sha256(tag.as_bytes()))
    }

    #[test]
    fn score_post_always_moves_content_rating() {
        let limits = LimitTable::with_defaults();
        let ctx = ScorePostContext {
            voter: addr("ADDR_C"),
            content_author: addr("ADDR_A"),
            content_tx: tx("post"),
            value: 5,
            modify: ModifyReputationFacts { post_author_likers: 0, score_address_likers: 0, age_seconds: 1_000_000_000 },
        };
        let rows = score_post_rows(&ctx, 400, Network::Main, &limits);
        let content_row = rows.iter().find(|r| r.rating_type == RatingType::Content).unwrap();
        assert_eq!(content_row.delta, 2);
    }

    #[test]
    fn score_post_skips_account_delta_when_gate_fails_but_still_marks_last() {
        let limits = LimitTable::with_defaults();
        let ctx = ScorePostContext {
            voter: addr("ADDR_C"),
            content_author: addr("ADDR_A"),
            content_tx: tx("post"),
            value: 5,
            modify: ModifyReputationFacts { post_author_likers: 0, score_address_likers: 0, age_seconds: 1_000_000_000 },
        };
        let rows = score_post_rows(&ctx, 400, Network::Main, &limits);
        assert!(rows.iter().all(|r| r.rating_type != RatingType::Account));
        let last_row = rows.iter().find(|r| r.rating_type == RatingType::AccountLast).unwrap();
        assert_eq!(last_row.delta, 0);
    }

    #[test]
    fn high_value_score_post_adds_likers_row() {
        let limits = LimitTable::with_defaults();
        let ctx = ScorePostContext {
            voter: addr("ADDR_C"),
            content_author: addr("ADDR_A"),
            content_tx: tx("post"),
            value: 5,
            modify: ModifyReputationFacts { post_author_likers: 500, score_address_likers: 500, age_seconds: 10 },
        };
        let rows = score_post_rows(&ctx, 400, Network::Main, &limits);
        assert!(rows.iter().any(|r| r.rating_type == RatingType::LikersPost));
    }

    #[test]
    fn score_comment_adds_likers_row_only_for_positive_value() {
        let ctx = ScoreCommentContext {
            voter: addr("ADDR_C"),
            comment_author: addr("ADDR_B"),
            comment_tx: tx("comment"),
            root_post_tx: tx("post"),
            value: -1,
        };
        let rows = score_comment_rows(&ctx, 10);
        assert!(rows.iter().all(|r| r.rating_type != RatingType::LikersCommentRoot));
    }
}
