//! State Hash (L7, spec.md §4.9, §6).
//!
//! Every committed block folds a canonical per-table digest into a single
//! chained hash, stored in the next block's coinbase. Table order is
//! frozen (spec.md §6: "Accounts, Content, Comments, Scores,
//! Subscriptions, Blockings, Complaints, Ratings") — reordering it would
//! be a consensus break, so it lives as a `const` here rather than being
//! derived from iteration order anywhere else.

use crate::types::Hash256;

/// The frozen table order folded into a block's state hash (spec.md §6).
pub const TABLE_ORDER: [&str; 8] = [
    "accounts",
    "content",
    "comments",
    "scores",
    "subscriptions",
    "blockings",
    "complaints",
    "ratings",
];

/// SHA256 of one row's canonical field concatenation (spec.md §4.9:
/// "each row is hashed independently, single SHA256").
pub fn row_hash(canonical_fields: &str) -> Hash256 {
    Hash256::sha256(canonical_fields.as_bytes())
}

/// SHA256 over the concatenation of a table's row hashes, hex-encoded and
/// joined in primary-key order (spec.md §4.9: "row hashes are concatenated
/// in primary-key order, then hashed once more").
pub fn table_hash(row_hashes_in_pk_order: &[Hash256]) -> Hash256 {
    let mut buf = String::with_capacity(row_hashes_in_pk_order.len() * 64);
    for h in row_hashes_in_pk_order {
        buf.push_str(&h.to_hex());
    }
    Hash256::sha256(buf.as_bytes())
}

/// Chains this block's table hashes onto the previous block's state hash
/// with a single (not double) SHA256, in `TABLE_ORDER` (spec.md §4.9:
/// "the block state hash is `SHA256(tableHash_0 ‖ ... ‖ tableHash_7 ‖
/// prevStateHash)`, single-hashed — the double-hash convention is reserved
/// for payload hashes, not state hashes — and the previous hash is
/// appended last, not prepended").
pub fn chain_block_state_hash(prev_state_hash: Hash256, table_hashes_in_frozen_order: &[Hash256; 8]) -> Hash256 {
    let mut buf = Vec::with_capacity(32 * 9);
    for h in table_hashes_in_frozen_order {
        buf.extend_from_slice(h.as_bytes());
    }
    buf.extend_from_slice(prev_state_hash.as_bytes());
    Hash256::sha256(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_hash_is_deterministic() {
        assert_eq!(row_hash("a,b,c"), row_hash("a,b,c"));
        assert_ne!(row_hash("a,b,c"), row_hash("a,b,d"));
    }

    #[test]
    fn table_hash_is_order_sensitive() {
        let a = Hash256::sha256(b"a");
        let b = Hash256::sha256(b"b");
        assert_ne!(table_hash(&[a, b]), table_hash(&[b, a]));
    }

    #[test]
    fn chained_state_hash_depends_on_previous_hash() {
        let tables = [Hash256::ZERO; 8];
        let first = chain_block_state_hash(Hash256::ZERO, &tables);
        let second = chain_block_state_hash(first, &tables);
        assert_ne!(first, second);
    }

    #[test]
    fn chained_state_hash_is_deterministic_given_same_inputs() {
        let tables = [Hash256::sha256(b"t"); 8];
        let a = chain_block_state_hash(Hash256::ZERO, &tables);
        let b = chain_block_state_hash(Hash256::ZERO, &tables);
        assert_eq!(a, b);
    }
}
