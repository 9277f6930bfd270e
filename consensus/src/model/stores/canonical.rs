use super::NumberKey;
use ferra_database::prelude::{BatchDbWriter, CachedDbAccess, StoreResult, DB};
use ferra_database::registry::DatabaseStorePrefixes;
use ferra_hashes::Hash;
use rocksdb::WriteBatch;
use std::sync::Arc;

pub trait CanonicalStoreReader {
    fn get(&self, number: u64) -> StoreResult<Hash>;
}

/// A DB + cache implementation of the canonical-hash-by-number table.
/// At most one hash per number; entries above the head are deleted on reorg.
#[derive(Clone)]
pub struct DbCanonicalStore {
    access: CachedDbAccess<NumberKey, Hash>,
}

impl DbCanonicalStore {
    pub fn new(db: Arc<DB>, cache_size: u64) -> Self {
        Self { access: CachedDbAccess::new(db, cache_size, DatabaseStorePrefixes::CanonicalHashes.into()) }
    }

    pub fn insert_many(&self, batch: &mut WriteBatch, entries: &mut impl Iterator<Item = (u64, Hash)>) -> StoreResult<()> {
        self.access
            .write_many_without_cache(BatchDbWriter::new(batch), &mut entries.map(|(number, hash)| (NumberKey::new(number), hash)))
    }

    pub fn delete_many(&self, batch: &mut WriteBatch, numbers: &mut impl Iterator<Item = u64>) -> StoreResult<()> {
        self.access.delete_many(BatchDbWriter::new(batch), &mut numbers.map(NumberKey::new))
    }

    /// Canonical entries are rewritten on reorg; see `CachedDbAccess::clear_cache`
    pub fn clear_cache(&self) {
        self.access.clear_cache()
    }
}

impl CanonicalStoreReader for DbCanonicalStore {
    fn get(&self, number: u64) -> StoreResult<Hash> {
        self.access.read(NumberKey::new(number))
    }
}
