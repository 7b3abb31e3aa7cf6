//! `POST /transactions` — the local equivalent of
//! `sendRawTransactionWithMessage(rawTx, payload, kindName)` (spec.md §6):
//! atomically admits a carrier transaction's payload to the engine's
//! payload mempool (L9), after running the common OP_RETURN-hash
//! precondition (spec.md §4.5) and the per-kind `Check`/`Validate` rules
//! (spec.md §4.5).

use std::sync::atomic::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use sce::EngineError;
use sce::SocialConsensusResult;
use sce::mempool::MempoolRow;
use sce::types::payload::Payload;
use sce::types::{Hash256, KindTag, TxHash};

use crate::state::SharedState;

/// Request body for `POST /transactions`.
///
/// `kind` mirrors the on-chain OP_RETURN's `kindTag` token (spec.md §6)
/// and is cross-checked against `payload`'s own tag so a mismatched
/// carrier/payload pair is rejected before it ever reaches the consensus
/// rules. `op_return_hash` is the hex `payloadHash32hex` token the carrier
/// tx committed to on-chain.
#[derive(Debug, Deserialize)]
pub struct SubmitTransactionRequest {
    pub raw_tx_hash: String,
    pub kind: KindTag,
    pub op_return_hash: String,
    pub payload: Payload,
}

#[derive(Debug, Serialize)]
pub struct SubmitTransactionResponse {
    pub status: &'static str,
    pub tx_hash: String,
    pub code: String,
}

/// `POST /transactions`
pub async fn submit_transaction(
    State(state): State<SharedState>,
    Json(body): Json<SubmitTransactionRequest>,
) -> (StatusCode, Json<SubmitTransactionResponse>) {
    let tx_hash = match Hash256::from_hex(&body.raw_tx_hash) {
        Ok(h) => TxHash(h),
        Err(_) => return reject(body.raw_tx_hash, SocialConsensusResult::BadPayload),
    };
    let op_return_hash = match Hash256::from_hex(&body.op_return_hash) {
        Ok(h) => h,
        Err(_) => return reject(body.raw_tx_hash, SocialConsensusResult::FailedOpReturn),
    };
    if body.payload.kind_tag() != body.kind {
        return reject(body.raw_tx_hash, SocialConsensusResult::BadPayload);
    }

    let engine = state.engine.clone();
    let metrics = state.metrics.clone();
    let height = state.tip_height.load(Ordering::SeqCst);
    let payload = body.payload.clone();
    let kind = body.kind;

    let outcome: Result<(), SocialConsensusResult> = tokio::task::spawn_blocking(move || {
        let now = current_unix_timestamp();
        let mut guard = engine.lock().expect("engine mutex poisoned");

        guard.check_payload_hash(payload.payload_hash(true), op_return_hash, tx_hash, kind)?;

        let sender = payload.sender().clone();
        guard.check(&payload, &sender, height).map_err(engine_error_code)?;
        guard.validate(tx_hash, &payload, &sender, height, now).map_err(engine_error_code)?;

        let row = MempoolRow {
            tx_hash,
            kind,
            root_tx_hash: payload.root_tx_hash(),
            payload,
            admitted_time: now,
            back_to_mempool: false,
        };
        guard.mempool_mut().admit(row).map_err(|_| SocialConsensusResult::Duplicate)?;
        metrics.engine.mempool_depth.set(guard.mempool().len() as i64);
        Ok(())
    })
    .await
    .unwrap_or(Err(SocialConsensusResult::Unknown));

    match outcome {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(SubmitTransactionResponse {
                status: "accepted",
                tx_hash: body.raw_tx_hash,
                code: SocialConsensusResult::Success.to_string(),
            }),
        ),
        Err(code) => {
            let code_str = code.to_string();
            state.metrics.engine.rejections_total.with_label_values(&[code_str.as_str()]).inc();
            reject(body.raw_tx_hash, code)
        }
    }
}

fn engine_error_code(e: EngineError) -> SocialConsensusResult {
    match e {
        EngineError::Consensus(code) => code,
        EngineError::Storage(_) => SocialConsensusResult::Failed,
    }
}

fn reject(raw_tx_hash: String, code: SocialConsensusResult) -> (StatusCode, Json<SubmitTransactionResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(SubmitTransactionResponse { status: "rejected", tx_hash: raw_tx_hash, code: code.to_string() }),
    )
}

fn current_unix_timestamp() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}
