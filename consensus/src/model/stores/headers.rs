use super::BlockKey;
use ferra_consensus_core::header::Header;
use ferra_database::prelude::{BatchDbWriter, CachedDbAccess, StoreResult, DB};
use ferra_database::registry::DatabaseStorePrefixes;
use ferra_hashes::Hash;
use rocksdb::WriteBatch;
use std::sync::Arc;

pub trait HeaderStoreReader {
    fn get(&self, number: u64, hash: Hash) -> StoreResult<Arc<Header>>;
    fn has(&self, number: u64, hash: Hash) -> StoreResult<bool>;
}

/// A DB + cache implementation of the headers table, with concurrency support.
/// Headers are append only and never deleted once stored.
#[derive(Clone)]
pub struct DbHeadersStore {
    access: CachedDbAccess<BlockKey, Arc<Header>>,
}

impl DbHeadersStore {
    pub fn new(db: Arc<DB>, cache_size: u64) -> Self {
        Self { access: CachedDbAccess::new(db, cache_size, DatabaseStorePrefixes::Headers.into()) }
    }

    pub fn insert_many(&self, batch: &mut WriteBatch, headers: &mut impl Iterator<Item = Arc<Header>>) -> StoreResult<()> {
        self.access
            .write_many_without_cache(BatchDbWriter::new(batch), &mut headers.map(|header| (BlockKey::new(header.number, header.hash), header)))
    }
}

impl HeaderStoreReader for DbHeadersStore {
    fn get(&self, number: u64, hash: Hash) -> StoreResult<Arc<Header>> {
        self.access.read(BlockKey::new(number, hash))
    }

    fn has(&self, number: u64, hash: Hash) -> StoreResult<bool> {
        self.access.has(BlockKey::new(number, hash))
    }
}
