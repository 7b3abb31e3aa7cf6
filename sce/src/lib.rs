//! Social Consensus Engine.
//!
//! Layers a social overlay (posts, comments, scores, subscriptions,
//! blockings, complaints, user profiles) on top of a UTXO/proof-of-stake
//! chain that this crate does not itself implement. The chain, its P2P
//! stack, wallet, RPC surface, and on-disk block store are external
//! collaborators; this crate consumes only `(block, carrier tx, prevout)`
//! tuples and exposes `check`, `validate`, `index_block`, `rollback`,
//! `compute_state_hash`, `get_user_state`, `select_winners` through
//! [`engine::Engine`].

pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod jury;
pub mod limits;
pub mod lottery;
pub mod mempool;
pub mod metrics;
pub mod rating;
pub mod reputation;
pub mod consensus;
pub mod statehash;
pub mod storage;
pub mod types;

pub use config::SceConfig;
pub use engine::{Engine, EngineError};
pub use types::result::SocialConsensusResult;
