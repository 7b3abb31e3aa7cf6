//! Tagged-variant payload model (spec.md §9: "Dynamic config / JSON
//! payloads") and the canonical per-kind field lists used for both hashing
//! and storage (spec.md §6).

use super::{Address, Hash256, KindTag, Time, TxHash};
use serde::{Deserialize, Serialize};

/// An account profile (spec.md §3 "Account").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountPayload {
    pub address: Address,
    pub name: String,
    pub avatar: String,
    pub about: String,
    pub lang: String,
    pub url: String,
    pub donations: String,
    pub pubkey: String,
    pub referrer: Option<Address>,
}

/// Post, Video, or Article (spec.md §3 "Content").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentPayload {
    pub root_tx_hash: TxHash,
    pub address: Address,
    pub lang: String,
    pub caption: String,
    pub message: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub url: String,
    pub settings: String,
    /// Set on an edit transaction, pointing at the edit it replaces.
    pub edit_tx_hash: Option<TxHash>,
}

/// Comment (spec.md §3 "Content", Comment variant).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommentPayload {
    pub root_tx_hash: TxHash,
    pub address: Address,
    pub post_id: TxHash,
    pub parent_id: Option<TxHash>,
    pub answer_id: Option<TxHash>,
    pub message: String,
    /// `true` once replaced by a Delete tx (empty body).
    pub deleted: bool,
}

/// ScorePost (spec.md §3 "Score", value in 1..=5).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScorePostPayload {
    pub address: Address,
    pub content_tx_hash: TxHash,
    pub value: i8,
    pub time: Time,
}

/// ScoreComment (spec.md §3 "Score", value in {-1, +1}).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreCommentPayload {
    pub address: Address,
    pub content_tx_hash: TxHash,
    pub value: i8,
    pub time: Time,
}

/// Subscribe / SubscribePrivate / Unsubscribe (spec.md §3 "Subscription").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionKind {
    Subscribe,
    SubscribePrivate,
    Unsubscribe,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPayload {
    pub from: Address,
    pub to: Address,
    pub action: SubscriptionKind,
}

/// Block / Unblock (spec.md §3 "Blocking").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockingKind {
    Block,
    Unblock,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockingPayload {
    pub from: Address,
    pub to: Vec<Address>,
    pub action: BlockingKind,
}

/// Complaint (spec.md §3 "Complaint").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplaintPayload {
    pub address: Address,
    pub post_tx_hash: TxHash,
    pub reason: i32,
}

/// ModerationFlag / ModerationVote (spec.md §4.7).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModerationFlagPayload {
    pub address: Address,
    pub target: Address,
    pub reason: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModerationVotePayload {
    pub address: Address,
    pub jury_id: TxHash,
    pub verdict: bool,
}

/// The full payload, tagged by kind. The web-layer JSON representation is
/// derived from this typed form, never re-parsed directly (spec.md §9).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Payload {
    User(AccountPayload),
    Post(ContentPayload),
    Video(ContentPayload),
    Article(ContentPayload),
    Comment(CommentPayload),
    ScorePost(ScorePostPayload),
    ScoreComment(ScoreCommentPayload),
    Subscription(SubscriptionPayload),
    Blocking(BlockingPayload),
    Complaint(ComplaintPayload),
    ModerationFlag(ModerationFlagPayload),
    ModerationVote(ModerationVotePayload),
}

impl Payload {
    pub fn kind_tag(&self) -> KindTag {
        match self {
            Payload::User(_) => KindTag::User,
            Payload::Post(_) => KindTag::Post,
            Payload::Video(_) => KindTag::Video,
            Payload::Article(_) => KindTag::Article,
            Payload::Comment(_) => KindTag::Comment,
            Payload::ScorePost(_) => KindTag::ScorePost,
            Payload::ScoreComment(_) => KindTag::ScoreComment,
            Payload::Subscription(p) => match p.action {
                SubscriptionKind::Subscribe => KindTag::Subscribe,
                SubscriptionKind::SubscribePrivate => KindTag::SubscribePrivate,
                SubscriptionKind::Unsubscribe => KindTag::Unsubscribe,
            },
            Payload::Blocking(p) => match p.action {
                BlockingKind::Block => KindTag::Block,
                BlockingKind::Unblock => KindTag::Unblock,
            },
            Payload::Complaint(_) => KindTag::Complaint,
            Payload::ModerationFlag(_) => KindTag::ModerationFlag,
            Payload::ModerationVote(_) => KindTag::ModerationVote,
        }
    }

    /// Canonical field concatenation hashed into the OP_RETURN commitment
    /// (spec.md §6). `include_referrer` controls whether the User variant's
    /// optional referrer field is folded in, matching the historical
    /// encoder's conditional inclusion (`[ ‖ referrer ]`).
    pub fn canonical_fields(&self, include_referrer: bool) -> String {
        match self {
            Payload::User(p) => {
                let mut s = format!(
                    "{}{}{}{}{}",
                    p.name, p.url, p.lang, p.about, p.avatar
                );
                s.push_str(&p.donations);
                if include_referrer {
                    if let Some(r) = &p.referrer {
                        s.push_str(&r.0);
                    }
                }
                s.push_str(&p.pubkey);
                s
            }
            Payload::Post(p) | Payload::Video(p) | Payload::Article(p) => format!(
                "{}{}{}{}{}{}",
                p.url,
                p.caption,
                p.message,
                p.tags.join(","),
                p.images.join(","),
                p.edit_tx_hash.map(|h| h.to_string()).unwrap_or_default(),
            ),
            Payload::Comment(p) => format!(
                "{}{}{}{}",
                p.message,
                p.post_id,
                p.parent_id.map(|h| h.to_string()).unwrap_or_default(),
                p.answer_id.map(|h| h.to_string()).unwrap_or_default(),
            ),
            Payload::ScorePost(p) => format!("{}{}", p.content_tx_hash, p.value),
            Payload::ScoreComment(p) => format!("{}{}", p.content_tx_hash, p.value),
            Payload::Complaint(p) => format!("{}_{}", p.post_tx_hash, p.reason),
            Payload::Subscription(p) => p.to.0.clone(),
            Payload::Blocking(p) => p
                .to
                .iter()
                .map(|a| a.0.clone())
                .collect::<Vec<_>>()
                .join(","),
            Payload::ModerationFlag(p) => format!("{}{}", p.target.0, p.reason),
            Payload::ModerationVote(p) => format!("{}{}", p.jury_id, p.verdict),
        }
    }

    /// `getPayloadHash` (spec.md §4.1): SHA256 applied twice over the
    /// canonical field concatenation.
    pub fn payload_hash(&self, include_referrer: bool) -> Hash256 {
        Hash256::sha256d(self.canonical_fields(include_referrer).as_bytes())
    }

    /// The address whose action this payload records (spec.md §4.5's
    /// common preconditions all key off "the sender"). Used both by the
    /// engine's in-memory indices and by the admission boundary wiring a
    /// carrier tx to its payload.
    pub fn sender(&self) -> &Address {
        match self {
            Payload::User(p) => &p.address,
            Payload::Post(p) | Payload::Video(p) | Payload::Article(p) => &p.address,
            Payload::Comment(p) => &p.address,
            Payload::ScorePost(p) => &p.address,
            Payload::ScoreComment(p) => &p.address,
            Payload::Subscription(p) => &p.from,
            Payload::Blocking(p) => &p.from,
            Payload::Complaint(p) => &p.address,
            Payload::ModerationFlag(p) => &p.address,
            Payload::ModerationVote(p) => &p.address,
        }
    }

    /// The root identity this payload files under (spec.md §3: "equals
    /// first version's hash"), for the editable kinds that carry one.
    /// `None` for kinds with no edit history of their own.
    pub fn root_tx_hash(&self) -> Option<TxHash> {
        match self {
            Payload::Post(p) | Payload::Video(p) | Payload::Article(p) => Some(p.root_tx_hash),
            Payload::Comment(p) => Some(p.root_tx_hash),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_content(addr: &str) -> ContentPayload {
        ContentPayload {
            root_tx_hash: TxHash(Hash256::sha256(b"root")),
            address: Address::from(addr),
            lang: "en".into(),
            caption: "hello".into(),
            message: "world".into(),
            tags: vec!["a".into(), "b".into()],
            images: vec![],
            url: String::new(),
            settings: String::new(),
            edit_tx_hash: None,
        }
    }

    #[test]
    fn kind_tag_matches_variant() {
        let p = Payload::Post(dummy_content("ADDR_A"));
        assert_eq!(p.kind_tag(), KindTag::Post);
    }

    #[test]
    fn canonical_fields_joins_tags_with_comma() {
        let p = Payload::Post(dummy_content("ADDR_A"));
        assert!(p.canonical_fields(true).contains("a,b"));
    }

    #[test]
    fn payload_hash_is_deterministic() {
        let p = Payload::Post(dummy_content("ADDR_A"));
        assert_eq!(p.payload_hash(true), p.payload_hash(true));
    }

    #[test]
    fn payload_round_trips_through_json() {
        let p = Payload::ScorePost(ScorePostPayload {
            address: Address::from("ADDR_A"),
            content_tx_hash: TxHash(Hash256::sha256(b"content")),
            value: 5,
            time: 1000,
        });
        let json = serde_json::to_string(&p).unwrap();
        let back: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    /// `SubscriptionPayload`/`BlockingPayload` each carry their own
    /// `action` field alongside the outer variant's `kind` discriminant;
    /// this guards against the two colliding in the flattened JSON object.
    #[test]
    fn subscription_round_trips_through_json_without_tag_collision() {
        let p = Payload::Subscription(SubscriptionPayload {
            from: Address::from("ADDR_A"),
            to: Address::from("ADDR_B"),
            action: SubscriptionKind::SubscribePrivate,
        });
        let json = serde_json::to_string(&p).unwrap();
        let back: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
        if let Payload::Subscription(sub) = &back {
            assert_eq!(sub.action, SubscriptionKind::SubscribePrivate);
        } else {
            panic!("expected Subscription variant");
        }
    }

    #[test]
    fn blocking_round_trips_through_json_without_tag_collision() {
        let p = Payload::Blocking(BlockingPayload {
            from: Address::from("ADDR_A"),
            to: vec![Address::from("ADDR_B"), Address::from("ADDR_C")],
            action: BlockingKind::Block,
        });
        let json = serde_json::to_string(&p).unwrap();
        let back: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
