use ferra_database::prelude::{BatchDbWriter, CachedDbAccess, CachedDbItem, StoreResult, DB};
use ferra_database::registry::DatabaseStorePrefixes;
use ferra_hashes::Hash;
use rocksdb::WriteBatch;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Block number persisted as raw big-endian bytes
#[derive(Clone, Copy, Serialize, Deserialize)]
pub struct BlockNumberValue([u8; 8]);

impl BlockNumberValue {
    pub fn new(number: u64) -> Self {
        Self(number.to_be_bytes())
    }

    pub fn number(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

pub trait HeadStoreReader {
    fn head_hash(&self) -> StoreResult<Hash>;
    fn header_number(&self, hash: Hash) -> StoreResult<u64>;
}

/// The head-header-hash singleton together with the hash-to-number index
#[derive(Clone)]
pub struct DbHeadStore {
    head_access: CachedDbItem<Hash>,
    numbers_access: CachedDbAccess<Hash, BlockNumberValue>,
}

impl DbHeadStore {
    pub fn new(db: Arc<DB>, cache_size: u64) -> Self {
        Self {
            head_access: CachedDbItem::new(Arc::clone(&db), DatabaseStorePrefixes::HeadHeaderHash.into()),
            numbers_access: CachedDbAccess::new(db, cache_size, DatabaseStorePrefixes::HashToNumber.into()),
        }
    }

    pub fn insert_numbers_many(&self, batch: &mut WriteBatch, entries: &mut impl Iterator<Item = (Hash, u64)>) -> StoreResult<()> {
        self.numbers_access
            .write_many_without_cache(BatchDbWriter::new(batch), &mut entries.map(|(hash, number)| (hash, BlockNumberValue::new(number))))
    }

    pub fn set_head_batch(&self, batch: &mut WriteBatch, hash: Hash) -> StoreResult<()> {
        self.head_access.write(BatchDbWriter::new(batch), &hash)
    }

    /// The head pointer is overwritten on every canonical advance; see
    /// `CachedDbItem::invalidate_cache`
    pub fn invalidate_head_cache(&self) {
        self.head_access.invalidate_cache()
    }
}

impl HeadStoreReader for DbHeadStore {
    fn head_hash(&self) -> StoreResult<Hash> {
        self.head_access.read()
    }

    fn header_number(&self, hash: Hash) -> StoreResult<u64> {
        Ok(self.numbers_access.read(hash)?.number())
    }
}
