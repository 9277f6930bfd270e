use ferra_consensus_core::api::verification::VerificationError;
use ferra_database::prelude::StoreError;
use ferra_hashes::Hash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("unknown parent {hash} for header number {number}")]
    UnknownParent { hash: Hash, number: u64 },

    #[error("broken chain at number {number}: expected parent {expected} but got {got}")]
    BrokenChain { number: u64, expected: Hash, got: Hash },

    #[error("header {0} is blacklisted")]
    BlacklistedHash(Hash),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("missing canonical header at number {0}")]
    MissingCanonicalHeader(u64),

    #[error("the operation was cancelled")]
    Cancelled,

    #[error("the verification engine disconnected")]
    EngineDisconnected,
}

pub type RuleResult<T> = std::result::Result<T, RuleError>;
