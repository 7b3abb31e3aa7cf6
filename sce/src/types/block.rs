//! The minimal view of an externally-owned block the engine needs.
//!
//! The SCE does not own blocks, the UTXO set, or PoW/PoS kernel
//! verification (spec.md §1's non-goals) — it only ever sees the slice of
//! a block relevant to social consensus: carrier transactions and their
//! OP_RETURN commitments, plus enough block metadata to drive checkpoint
//! selection and the lottery.

use super::{Address, Hash256, KindTag, Time, TxHash};
use serde::{Deserialize, Serialize};

/// `BlockHash` newtype, kept distinct from a generic [`Hash256`] so call
/// sites can't accidentally pass a tx hash where a block hash belongs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHash(pub Hash256);

impl std::fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockHash({})", self.0.to_hex())
    }
}

/// `RETURN <kindTag> <payloadHash32hex>` (spec.md §6).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct OpReturn {
    pub kind_tag: KindTag,
    pub payload_hash: Hash256,
}

/// A carrier transaction: the UTXO-layer transaction embedding an
/// application payload's hash in its OP_RETURN (GLOSSARY).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CarrierTx {
    pub tx_hash: TxHash,
    /// Position of this tx within the block, used for tie-breaking
    /// (spec.md §4.5: "Ties within a block are broken by (blockIndex,
    /// time, txHash)").
    pub block_index: u32,
    pub time: Time,
    pub sender: Address,
    pub op_return: Option<OpReturn>,
}

/// `(block, CTransactionRef, prevout→StakeKernelTx)` (spec.md §1), reduced
/// to the fields the engine actually consumes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockContext {
    pub hash: BlockHash,
    pub height: super::Height,
    pub time: Time,
    /// State hash extracted from this block's *own* coinbase, present once
    /// the miner has embedded it (spec.md §4.9).
    pub prev_state_hash: Hash256,
    /// PoS kernel hash used as the lottery's deterministic seed (spec.md
    /// §4.10).
    pub kernel_seed: [u8; 32],
    /// Carrier transactions in block-index order.
    pub txs: Vec<CarrierTx>,
}

impl BlockContext {
    /// Transactions sorted by the tie-break order spec.md §4.5 defines for
    /// within-block ordering.
    pub fn ordered_txs(&self) -> Vec<&CarrierTx> {
        let mut v: Vec<&CarrierTx> = self.txs.iter().collect();
        v.sort_by_key(|t| (t.block_index, t.time, t.tx_hash));
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_tx(idx: u32, time: Time) -> CarrierTx {
        CarrierTx {
            tx_hash: TxHash(Hash256::sha256(format!("tx{idx}").as_bytes())),
            block_index: idx,
            time,
            sender: Address::from("ADDR_A"),
            op_return: None,
        }
    }

    #[test]
    fn ordered_txs_sorts_by_block_index() {
        let ctx = BlockContext {
            hash: BlockHash(Hash256::ZERO),
            height: 10,
            time: 0,
            prev_state_hash: Hash256::ZERO,
            kernel_seed: [0u8; 32],
            txs: vec![dummy_tx(2, 5), dummy_tx(0, 5), dummy_tx(1, 5)],
        };
        let ordered = ctx.ordered_txs();
        assert_eq!(
            ordered.iter().map(|t| t.block_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }
}
