//! PoS Lottery (L8, spec.md §4.10), grounded on the original `Lottery`
//! class: winners are drawn from block `h-1`'s qualifying ScorePost /
//! ScoreComment transactions, seeded by the PoS kernel hash so the
//! selection is deterministic and reproducible from chain data alone.

use crate::reputation::is_liker_score;
use crate::types::{Address, Height, TxHash};
use sha2::{Digest, Sha256};

/// Reward classes a winner can fall into (spec.md §4.10).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WinnerClass {
    PostWinner,
    CommentWinner,
    PostReferrerWinner,
    CommentReferrerWinner,
}

/// Maximum number of winners drawn per class, per block (spec.md §4.10,
/// grounded on the original's `RATINGS_PAYOUT_MAX`).
pub const RATINGS_PAYOUT_MAX: usize = 25;

/// A qualifying score from the previous block, eligible to enter the
/// lottery for its class.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub score_tx: TxHash,
    /// The address credited if this candidate wins: the content/comment
    /// author for a `*Winner` class, or their registered referrer for a
    /// `*ReferrerWinner` class.
    pub recipient: Address,
    pub class: WinnerClass,
}

/// One drawn winner and its share of the class's reward pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Winner {
    pub recipient: Address,
    pub class: WinnerClass,
    pub amount: i64,
}

/// `true` if a ScorePost value qualifies its tx for the post-winner draw
/// (spec.md §4.10: values 4 and 5, same bar as the likers count).
pub fn post_score_qualifies(value: i8) -> bool {
    is_liker_score(value)
}

/// `true` if a ScoreComment value qualifies its tx for the comment-winner
/// draw (spec.md §4.10: a positive comment score).
pub fn comment_score_qualifies(value: i8) -> bool {
    value > 0
}

/// Deterministic draw order: candidates are ranked by
/// `SHA256(kernelSeed ‖ scoreTxHash)`, ascending, and the first
/// `RATINGS_PAYOUT_MAX` of each class win (spec.md §4.10).
fn draw_key(kernel_seed: &[u8; 32], score_tx: &TxHash) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(kernel_seed);
    hasher.update(score_tx.0.as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Selects winners for one class and splits `pool` evenly among them,
/// crediting any remainder to the last-ranked winner (spec.md §4.10:
/// "equal split, residue to the last recipient").
fn select_class(kernel_seed: &[u8; 32], class: WinnerClass, candidates: &[Candidate], pool: i64) -> Vec<Winner> {
    let mut in_class: Vec<&Candidate> = candidates.iter().filter(|c| c.class == class).collect();
    in_class.sort_by_key(|c| draw_key(kernel_seed, &c.score_tx));
    in_class.truncate(RATINGS_PAYOUT_MAX);

    if in_class.is_empty() {
        return Vec::new();
    }
    let share = pool / in_class.len() as i64;
    let remainder = pool - share * in_class.len() as i64;

    in_class
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let amount = if i + 1 == in_class.len() { share + remainder } else { share };
            Winner { recipient: c.recipient.clone(), class, amount }
        })
        .collect()
}

/// Runs the lottery for all four classes against block `h-1`'s candidate
/// list, given each class's reward pool for this block.
pub fn select_winners(
    kernel_seed: &[u8; 32],
    candidates: &[Candidate],
    pools: [(WinnerClass, i64); 4],
) -> Vec<Winner> {
    pools
        .iter()
        .flat_map(|(class, pool)| select_class(kernel_seed, *class, candidates, *pool))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hash256;

    fn candidate(tag: &str, recipient: &str, class: WinnerClass) -> Candidate {
        Candidate {
            score_tx: TxHash(Hash256::sha256(tag.as_bytes())),
            recipient: Address::from(recipient),
            class,
        }
    }

    #[test]
    fn post_score_qualifies_matches_likers_bar() {
        assert!(post_score_qualifies(4));
        assert!(post_score_qualifies(5));
        assert!(!post_score_qualifies(3));
    }

    #[test]
    fn selection_caps_at_payout_max() {
        let seed = [7u8; 32];
        let candidates: Vec<Candidate> = (0..40)
            .map(|i| candidate(&format!("tx{i}"), "ADDR_A", WinnerClass::PostWinner))
            .collect();
        let winners = select_class(&seed, WinnerClass::PostWinner, &candidates, 2500);
        assert_eq!(winners.len(), RATINGS_PAYOUT_MAX);
    }

    #[test]
    fn selection_splits_pool_with_remainder_on_last() {
        let seed = [1u8; 32];
        let candidates = vec![
            candidate("a", "ADDR_A", WinnerClass::CommentWinner),
            candidate("b", "ADDR_B", WinnerClass::CommentWinner),
            candidate("c", "ADDR_C", WinnerClass::CommentWinner),
        ];
        let winners = select_class(&seed, WinnerClass::CommentWinner, &candidates, 10);
        let total: i64 = winners.iter().map(|w| w.amount).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn selection_is_deterministic_given_same_seed() {
        let seed = [3u8; 32];
        let candidates = vec![
            candidate("a", "ADDR_A", WinnerClass::PostWinner),
            candidate("b", "ADDR_B", WinnerClass::PostWinner),
        ];
        let first = select_class(&seed, WinnerClass::PostWinner, &candidates, 100);
        let second = select_class(&seed, WinnerClass::PostWinner, &candidates, 100);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_candidate_list_yields_no_winners() {
        let seed = [0u8; 32];
        let winners = select_class(&seed, WinnerClass::PostReferrerWinner, &[], 100);
        assert!(winners.is_empty());
    }
}
