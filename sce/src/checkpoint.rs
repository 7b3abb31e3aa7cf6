//! Generic checkpoint dispatch (L3, spec.md §4.4 and §9).
//!
//! Every per-kind consensus rule family is an ordered, append-only table of
//! `(main_height, test_height, factory)` entries. `instance(network,
//! height)` returns the rule object whose activation height is the largest
//! value `<= height` on the active network — the same `upper_bound`-then-
//! step-back lookup the checkpointed rule factories in the original source
//! perform, generalised here once instead of being re-implemented per kind.

use crate::types::{Height, Network};

/// One entry in a checkpoint table: the height (per network) at which
/// `factory` becomes the active rule.
pub struct Checkpoint<R> {
    pub main_height: Height,
    pub test_height: Height,
    pub regtest_height: Height,
    pub factory: fn(Height) -> R,
}

impl<R> Checkpoint<R> {
    pub fn height(&self, network: Network) -> Height {
        match network {
            Network::Main => self.main_height,
            Network::Test => self.test_height,
            Network::Regtest => self.regtest_height,
        }
    }
}

/// An ordered, append-only changelog of rule checkpoints for one
/// transaction kind. Entries must be supplied in ascending main-network
/// height order; this is a precondition of the caller, not enforced at
/// runtime, matching the source table's hand-maintained ordering.
pub struct CheckpointTable<R> {
    entries: Vec<Checkpoint<R>>,
}

impl<R> CheckpointTable<R> {
    pub fn new(entries: Vec<Checkpoint<R>>) -> Self {
        assert!(!entries.is_empty(), "checkpoint table must have a genesis entry");
        Self { entries }
    }

    /// Selects the rule object active at `height` on `network`: the last
    /// entry whose height is `<= height`.
    pub fn instance(&self, network: Network, height: Height) -> R {
        let height = height.max(0);
        let idx = self
            .entries
            .partition_point(|cp| cp.height(network) <= height)
            .saturating_sub(1);
        (self.entries[idx].factory)(height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Rule {
        height: Height,
        limit: i64,
    }

    fn genesis(h: Height) -> Rule {
        Rule { height: h, limit: 15 }
    }

    fn fork_a(h: Height) -> Rule {
        Rule { height: h, limit: 30 }
    }

    fn table() -> CheckpointTable<Rule> {
        CheckpointTable::new(vec![
            Checkpoint { main_height: 0, test_height: 0, regtest_height: 0, factory: genesis },
            Checkpoint { main_height: 1000, test_height: 500, regtest_height: 50, factory: fork_a },
        ])
    }

    #[test]
    fn picks_genesis_before_fork_height() {
        let t = table();
        assert_eq!(t.instance(Network::Main, 999).limit, 15);
    }

    #[test]
    fn picks_fork_at_exact_activation_height() {
        let t = table();
        assert_eq!(t.instance(Network::Main, 1000).limit, 30);
    }

    #[test]
    fn networks_activate_independently() {
        let t = table();
        assert_eq!(t.instance(Network::Test, 500).limit, 30);
        assert_eq!(t.instance(Network::Regtest, 50).limit, 30);
        assert_eq!(t.instance(Network::Regtest, 49).limit, 15);
    }

    #[test]
    fn negative_height_clamps_to_zero() {
        let t = table();
        assert_eq!(t.instance(Network::Main, -5).limit, 15);
    }
}
