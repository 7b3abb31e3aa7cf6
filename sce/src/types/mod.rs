//! Core newtypes and enums shared across every layer.

pub mod block;
pub mod payload;
pub mod rating;
pub mod result;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length in bytes of every hash used on the wire and in storage keys.
pub const HASH_LEN: usize = 32;

/// A bare 32-byte digest, with the SHA256(SHA256(·)) convention spec.md §6
/// mandates for payload and state hashes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash256(pub [u8; HASH_LEN]);

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; HASH_LEN]);

    /// Single SHA256 over `data`.
    pub fn sha256(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut out = [0u8; HASH_LEN];
        out.copy_from_slice(&digest);
        Hash256(out)
    }

    /// SHA256 applied twice, the convention used for payload hashes
    /// (spec.md §6: "SHA256 is applied twice").
    pub fn sha256d(data: &[u8]) -> Self {
        Self::sha256(&Self::sha256(data).0)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut out = [0u8; HASH_LEN];
        if bytes.len() == HASH_LEN {
            out.copy_from_slice(&bytes);
        }
        Ok(Hash256(out))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash of a carrier transaction. Primary key in the Payload Store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxHash(pub Hash256);

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.0.to_hex())
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// A base58 account address, carried opaquely (the SCE never decodes the
/// base58 payload itself — that lives in the UTXO engine this crate does
/// not own).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub String);

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address(s.to_string())
    }
}

/// Block height. Signed per spec.md §3 ("Heights are signed 32-bit").
pub type Height = i32;

/// Unix seconds.
pub type Time = i64;

/// Named network, each with its own checkpoint heights and limit overlays
/// (spec.md §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Main,
    Test,
    Regtest,
}

impl Network {
    /// PoS activation height (spec.md §6: "1020 main/test, 200 regtest").
    pub fn pos_activation_height(self) -> Height {
        match self {
            Network::Main => 1020,
            Network::Test => 1020,
            Network::Regtest => 200,
        }
    }

    /// Badge recomputation cadence (spec.md §4.6: "1440 blocks mainnet,
    /// 100 testnet, 5 regtest").
    pub fn badge_period(self) -> Height {
        match self {
            Network::Main => 1440,
            Network::Test => 100,
            Network::Regtest => 5,
        }
    }
}

/// Account mode, a function of reputation/balance/likers (spec.md §4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountMode {
    Trial = 0,
    Full = 1,
    Pro = 2,
}

/// Carrier transaction kind. Every application payload is tagged with one
/// of these. The historical implementation used fixed hex literals as the
/// OP_RETURN kind tag (spec.md §9); here a stable discriminant stands in
/// for them since the literal values are not recoverable from the
/// distilled spec and no testable property in spec.md §8 depends on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KindTag {
    User = 1,
    Post = 2,
    Video = 3,
    Article = 4,
    Comment = 5,
    ScorePost = 6,
    ScoreComment = 7,
    Subscribe = 8,
    SubscribePrivate = 9,
    Unsubscribe = 10,
    Block = 11,
    Unblock = 12,
    Complaint = 13,
    ModerationFlag = 14,
    ModerationVote = 15,
}

impl KindTag {
    /// Whether this kind supports in-place edits with a history table
    /// (spec.md §3: Post/Video/Article/Comment).
    pub fn is_editable_content(self) -> bool {
        matches!(
            self,
            KindTag::Post | KindTag::Video | KindTag::Article | KindTag::Comment
        )
    }

    /// Whether this kind uses "last wins" semantics instead of a bounded
    /// edit count (spec.md §4.1: `commitLast` is for Comment).
    pub fn is_last_wins(self) -> bool {
        matches!(self, KindTag::Comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash256_sha256d_is_double_hashed() {
        let single = Hash256::sha256(b"hello");
        let double = Hash256::sha256(&single.0);
        assert_eq!(Hash256::sha256d(b"hello"), double);
    }

    #[test]
    fn hash256_hex_round_trips() {
        let h = Hash256::sha256(b"round trip me");
        let hex = h.to_hex();
        let parsed = Hash256::from_hex(&hex).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn network_pos_activation_heights_match_spec() {
        assert_eq!(Network::Main.pos_activation_height(), 1020);
        assert_eq!(Network::Test.pos_activation_height(), 1020);
        assert_eq!(Network::Regtest.pos_activation_height(), 200);
    }

    #[test]
    fn badge_period_differs_per_network() {
        assert_eq!(Network::Main.badge_period(), 1440);
        assert_eq!(Network::Test.badge_period(), 100);
        assert_eq!(Network::Regtest.badge_period(), 5);
    }
}
