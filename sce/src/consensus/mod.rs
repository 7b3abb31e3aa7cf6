//! Social Consensus (L4): per-kind `Check`/`Validate` rules (spec.md §4.5).

pub mod common;
pub mod rules;

pub use common::{AdmissionSource, LegacyExceptionTable, PrecedingTx};
