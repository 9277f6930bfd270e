use ferra_consensus_core::{header::Header, Td};
use ferra_hashes::Hash;
use std::collections::HashSet;
use std::sync::Arc;

/// Chain parameters. Read-only after construction.
#[derive(Clone)]
pub struct Params {
    pub genesis: Arc<Header>,
    pub genesis_td: Td,
    /// Hashes which are rejected on sight
    pub bad_hashes: HashSet<Hash>,
}

impl Params {
    pub fn new(genesis: Arc<Header>, genesis_td: Td) -> Self {
        Self { genesis, genesis_td, bad_hashes: Default::default() }
    }

    pub fn with_bad_hashes(mut self, bad_hashes: impl IntoIterator<Item = Hash>) -> Self {
        self.bad_hashes.extend(bad_hashes);
        self
    }

    pub fn is_bad_hash(&self, hash: Hash) -> bool {
        self.bad_hashes.contains(&hash)
    }
}
