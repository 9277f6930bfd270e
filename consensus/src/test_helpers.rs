use crate::params::Params;
use ferra_consensus_core::{header::Header, Td};
use ferra_hashes::Hash;
use std::sync::Arc;

/// Builds a genesis header with the given difficulty and matching params
/// (genesis TD equals its own difficulty).
pub fn genesis_params(difficulty: u64) -> Params {
    let genesis = Arc::new(Header::new_finalized(Hash::default(), 0, Td::from(difficulty), 0));
    Params::new(genesis, Td::from(difficulty))
}

/// Builds a finalized header linked to `parent`
pub fn header_with_parent(parent: &Header, difficulty: u64) -> Arc<Header> {
    header_with_parent_and_time(parent, difficulty, parent.timestamp + 1)
}

/// Builds a finalized header linked to `parent` with an explicit timestamp,
/// letting tests construct distinct siblings of equal difficulty
pub fn header_with_parent_and_time(parent: &Header, difficulty: u64, timestamp: u64) -> Arc<Header> {
    Arc::new(Header::new_finalized(parent.hash, parent.number + 1, Td::from(difficulty), timestamp))
}

/// Builds a linked chain of `len` headers on top of `parent`, all with the
/// same difficulty
pub fn chain_with_parent(parent: &Header, difficulty: u64, len: usize) -> Vec<Arc<Header>> {
    let mut chain = Vec::with_capacity(len);
    let mut parent = parent.clone();
    for _ in 0..len {
        let header = header_with_parent(&parent, difficulty);
        parent = (*header).clone();
        chain.push(header);
    }
    chain
}
