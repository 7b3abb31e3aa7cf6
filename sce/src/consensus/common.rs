//! Preconditions shared by every kind's `Validate` (spec.md §4.5 "Common
//! preconditions") and the legacy OP_RETURN exception table (spec.md §9).

use crate::types::result::SocialConsensusResult;
use crate::types::{Address, KindTag, Time, TxHash};
use std::collections::HashMap;

/// A transaction already seen earlier in the same admission unit (same
/// block, in block-index order, or the current mempool) — the "prior
/// transactions" spec.md §4.5 says every kind's `Validate` walks.
#[derive(Clone, Copy, Debug)]
pub struct PrecedingTx {
    pub tx_hash: TxHash,
    pub sender: Address,
    pub kind: KindTag,
    pub time: Time,
    pub block_index: u32,
}

/// Whether a `Validate` call is being run against a block (preceding txs
/// are the same block's earlier transactions) or the mempool (preceding
/// txs are whatever else currently sits in the mempool). spec.md §4.5:
/// "Block validation distinguishes from mempool validation only by the
/// source of prior transactions."
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionSource {
    Block,
    Mempool,
}

/// Checks `tx.time` against the admission-time bound (spec.md §4.5:
/// "`tx.time <= now + driftWindow` at mempool admission; `tx.time <=
/// blockTime` at block admission").
pub fn check_time_bound(
    source: AdmissionSource,
    tx_time: Time,
    reference_time: Time,
    drift_window: Time,
) -> Result<(), SocialConsensusResult> {
    let bound = match source {
        AdmissionSource::Block => reference_time,
        AdmissionSource::Mempool => reference_time + drift_window,
    };
    if tx_time > bound {
        return Err(SocialConsensusResult::Failed);
    }
    Ok(())
}

/// A small, construction-time-only table of `(txHash, kind)` pairs whose
/// on-chain commitment is known to disagree with its payload hash due to a
/// historical encoder bug (spec.md §9: "no new exceptions may be added").
/// Empty by default; populate at construction from a fixed list if one is
/// ever needed for this network.
#[derive(Default)]
pub struct LegacyExceptionTable {
    exceptions: HashMap<(TxHash, KindTag), SocialConsensusResult>,
}

impl LegacyExceptionTable {
    pub fn new(entries: Vec<(TxHash, KindTag, SocialConsensusResult)>) -> Self {
        let mut exceptions = HashMap::new();
        for (tx, kind, result) in entries {
            exceptions.insert((tx, kind), result);
        }
        Self { exceptions }
    }

    pub fn lookup(&self, tx_hash: TxHash, kind: KindTag) -> Option<SocialConsensusResult> {
        self.exceptions.get(&(tx_hash, kind)).copied()
    }
}

/// `payloadHash(row) == op_return_hash(tx)` precondition (spec.md §4.5),
/// with the legacy-exception bypass (spec.md §9).
pub fn check_payload_hash(
    computed: crate::types::Hash256,
    on_chain: crate::types::Hash256,
    tx_hash: TxHash,
    kind: KindTag,
    legacy: &LegacyExceptionTable,
) -> Result<(), SocialConsensusResult> {
    if computed == on_chain {
        return Ok(());
    }
    if let Some(allowed) = legacy.lookup(tx_hash, kind) {
        tracing::warn!(%tx_hash, ?kind, "admitting tx via legacy OP_RETURN exception");
        if allowed.is_success() {
            return Ok(());
        }
        return Err(allowed);
    }
    Err(SocialConsensusResult::FailedOpReturn)
}

/// Registration precondition (spec.md §4.5): the sender must already be
/// registered, unless the registering User tx for that address is itself
/// present earlier in this same admission unit.
pub fn check_registered(
    address: &Address,
    already_registered: bool,
    preceding: &[PrecedingTx],
) -> Result<(), SocialConsensusResult> {
    if already_registered {
        return Ok(());
    }
    let registers_intra_block = preceding
        .iter()
        .any(|tx| tx.kind == KindTag::User && &tx.sender == address);
    if registers_intra_block {
        return Ok(());
    }
    Err(SocialConsensusResult::NotRegistered)
}

/// Ties within a block/mempool batch are broken by `(blockIndex, time,
/// txHash)` (spec.md §4.5).
pub fn order_key(tx: &PrecedingTx) -> (u32, Time, TxHash) {
    (tx.block_index, tx.time, tx.tx_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hash256;

    #[test]
    fn time_bound_allows_exact_block_time() {
        assert!(check_time_bound(AdmissionSource::Block, 100, 100, 0).is_ok());
        assert!(check_time_bound(AdmissionSource::Block, 101, 100, 0).is_err());
    }

    #[test]
    fn time_bound_allows_drift_in_mempool() {
        assert!(check_time_bound(AdmissionSource::Mempool, 105, 100, 10).is_ok());
        assert!(check_time_bound(AdmissionSource::Mempool, 111, 100, 10).is_err());
    }

    #[test]
    fn legacy_exception_bypasses_hash_mismatch() {
        let tx = TxHash(Hash256::sha256(b"legacy"));
        let legacy = LegacyExceptionTable::new(vec![(tx, KindTag::Post, SocialConsensusResult::Success)]);
        let result = check_payload_hash(Hash256::sha256(b"a"), Hash256::sha256(b"b"), tx, KindTag::Post, &legacy);
        assert!(result.is_ok());
    }

    #[test]
    fn unknown_hash_mismatch_is_rejected() {
        let legacy = LegacyExceptionTable::default();
        let tx = TxHash(Hash256::sha256(b"unknown"));
        let result = check_payload_hash(Hash256::sha256(b"a"), Hash256::sha256(b"b"), tx, KindTag::Post, &legacy);
        assert_eq!(result, Err(SocialConsensusResult::FailedOpReturn));
    }

    #[test]
    fn registration_allows_intra_block_registration() {
        let addr = Address::from("ADDR_A");
        let preceding = vec![PrecedingTx {
            tx_hash: TxHash(Hash256::sha256(b"reg")),
            sender: addr.clone(),
            kind: KindTag::User,
            time: 0,
            block_index: 0,
        }];
        assert!(check_registered(&addr, false, &preceding).is_ok());
    }

    #[test]
    fn registration_rejects_unregistered_address() {
        let addr = Address::from("ADDR_A");
        assert_eq!(
            check_registered(&addr, false, &[]),
            Err(SocialConsensusResult::NotRegistered)
        );
    }
}
