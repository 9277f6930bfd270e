use crate::header::Header;
use ferra_hashes::Hash;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Failure kinds an engine can report for a single header
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("invalid seal for header {0}")]
    InvalidSeal(Hash),

    #[error("invalid difficulty for header {0}")]
    InvalidDifficulty(Hash),

    #[error("header {0} timestamp is too far into the future")]
    FutureTimestamp(Hash),

    #[error("unknown parent {0}")]
    UnknownParent(Hash),

    #[error("verification of header {0} failed: {1}")]
    Other(Hash, String),
}

/// A request for the engine to verify a batch of headers. `seals[i]` marks
/// whether the expensive seal check runs for `headers[i]`.
#[derive(Clone, Debug)]
pub struct VerifyHeaderRequest {
    pub id: u64,
    pub headers: Vec<Arc<Header>>,
    pub seals: Vec<bool>,
    pub deadline: Option<Instant>,
}

/// An engine demand for up to `number_wanted` ancestors of `highest_hash`,
/// walking backwards via parent hashes
#[derive(Clone, Copy, Debug)]
pub struct HeaderRequest {
    pub id: u64,
    pub highest_hash: Hash,
    pub highest_number: u64,
    pub number_wanted: u64,
}

/// An engine verdict for a single header of an outstanding request
#[derive(Clone, Debug)]
pub struct VerifyResult {
    pub hash: Hash,
    pub err: Option<VerificationError>,
}

#[derive(Clone, Debug)]
pub struct BlockError {
    pub hash: Hash,
    pub number: u64,
    pub error: VerificationError,
}

/// The answer to a [`HeaderRequest`], correlated by `id`. On failure `headers`
/// is empty and `block_error` names the first missing ancestor.
#[derive(Clone, Debug)]
pub struct HeaderResponse {
    pub id: u64,
    pub headers: Vec<Arc<Header>>,
    pub block_error: Option<BlockError>,
}
