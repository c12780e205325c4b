use crate::models::{ModelError, RecordId};

/// Errors from engine operations.
///
/// Read paths never fail for missing data; only malformed input, a
/// conflicting write, or a poisoned lock surface here.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Malformed input: {0}")]
    Model(#[from] ModelError),
    #[error("Health record {0} is already indexed")]
    DuplicateRecord(RecordId),
    #[error("Health record {0} is not indexed and no diagnosis was supplied")]
    UnknownRecord(RecordId),
    #[error("Internal lock error")]
    LockPoisoned,
}
