//! Block / Unblock consensus (spec.md §4.5 "Blocking").

use crate::types::payload::{BlockingKind, BlockingPayload};
use crate::types::result::SocialConsensusResult;

/// Structural `Check` (spec.md §4.5): shape only.
pub fn check(payload: &BlockingPayload) -> Result<(), SocialConsensusResult> {
    if payload.to.is_empty() {
        return Err(SocialConsensusResult::BadPayload);
    }
    if payload.to.iter().any(|addr| addr == &payload.from) {
        return Err(SocialConsensusResult::SelfBlocking);
    }
    Ok(())
}

/// Facts the engine gathers before calling `validate`: one entry per target
/// address in `payload.to`, in the same order.
pub struct BlockingValidationFacts {
    /// `true` for each target already in `from`'s active block set (for a
    /// Block) or not in it (for an Unblock).
    pub already_in_requested_state: Vec<bool>,
}

/// Contextual `Validate` (spec.md §4.5 "Blocking"). Every target is
/// evaluated; the first rejection wins, mirroring the post-processor
/// applying the list atomically per spec.md §4.8.
pub fn validate(payload: &BlockingPayload, facts: &BlockingValidationFacts) -> Result<(), SocialConsensusResult> {
    if facts.already_in_requested_state.len() != payload.to.len() {
        return Err(SocialConsensusResult::BadPayload);
    }
    let code = match payload.action {
        BlockingKind::Block => SocialConsensusResult::DoubleBlocking,
        BlockingKind::Unblock => SocialConsensusResult::DoubleBlocking,
    };
    if facts.already_in_requested_state.iter().any(|&already| already) {
        return Err(code);
    }
    Ok(())
}
