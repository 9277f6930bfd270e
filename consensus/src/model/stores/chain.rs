use super::canonical::{CanonicalStoreReader, DbCanonicalStore};
use super::head::{DbHeadStore, HeadStoreReader};
use super::headers::{DbHeadersStore, HeaderStoreReader};
use super::total_difficulty::{DbTdStore, TdStoreReader};
use super::BlockKey;
use crate::params::Params;
use ferra_consensus_core::{header::Header, Td};
use ferra_database::prelude::{StoreResult, StoreResultExtensions, DB};
use ferra_hashes::Hash;
use rocksdb::WriteBatch;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The unified header-chain store: headers, total difficulties, canonical
/// pointers, the hash-to-number index and the head singleton, all over one
/// shared DB. Reads are safe for concurrent use; mutation happens through a
/// [`StagingChainStore`] driven by a single logical writer.
#[derive(Clone)]
pub struct ChainStore {
    db: Arc<DB>,
    headers_store: DbHeadersStore,
    td_store: DbTdStore,
    canonical_store: DbCanonicalStore,
    head_store: DbHeadStore,
}

impl ChainStore {
    pub fn new(db: Arc<DB>, cache_size: u64) -> Self {
        Self {
            db: Arc::clone(&db),
            headers_store: DbHeadersStore::new(Arc::clone(&db), cache_size),
            td_store: DbTdStore::new(Arc::clone(&db), cache_size),
            canonical_store: DbCanonicalStore::new(Arc::clone(&db), cache_size),
            head_store: DbHeadStore::new(db, cache_size),
        }
    }

    /// Bootstraps genesis into an empty store under a single batch. Idempotent.
    pub fn init(&self, params: &Params) -> StoreResult<()> {
        if self.head_store.head_hash().optional()?.is_some() {
            return Ok(());
        }
        let genesis = &params.genesis;
        let mut staging = self.staging();
        staging.write_header(Arc::clone(genesis));
        staging.write_td(genesis.number, genesis.hash, params.genesis_td);
        staging.write_canonical(genesis.number, genesis.hash);
        staging.write_number(genesis.hash, genesis.number);
        staging.write_head(genesis.hash);
        staging.commit()
    }

    pub fn header(&self, number: u64, hash: Hash) -> StoreResult<Arc<Header>> {
        self.headers_store.get(number, hash)
    }

    pub fn has_header(&self, number: u64, hash: Hash) -> StoreResult<bool> {
        self.headers_store.has(number, hash)
    }

    pub fn td(&self, number: u64, hash: Hash) -> StoreResult<Td> {
        self.td_store.get(number, hash)
    }

    pub fn canonical_hash(&self, number: u64) -> StoreResult<Hash> {
        self.canonical_store.get(number)
    }

    pub fn head_hash(&self) -> StoreResult<Hash> {
        self.head_store.head_hash()
    }

    pub fn header_number(&self, hash: Hash) -> StoreResult<u64> {
        self.head_store.header_number(hash)
    }

    /// The header the head singleton points at
    pub fn current_header(&self) -> StoreResult<Arc<Header>> {
        let hash = self.head_hash()?;
        let number = self.header_number(hash)?;
        self.header(number, hash)
    }

    /// The canonical header at `number`
    pub fn header_by_number(&self, number: u64) -> StoreResult<Arc<Header>> {
        let hash = self.canonical_hash(number)?;
        self.header(number, hash)
    }

    /// Any stored header previously indexed through the hash-to-number table
    pub fn header_by_hash(&self, hash: Hash) -> StoreResult<Arc<Header>> {
        let number = self.header_number(hash)?;
        self.header(number, hash)
    }

    pub fn staging(&self) -> StagingChainStore<'_> {
        StagingChainStore::new(self)
    }
}

/// A write-through overlay over [`ChainStore`]. Reads see the staged writes,
/// which the insertion pipeline requires for the deep-fork walk and for
/// intra-batch duplicate detection. `commit` applies everything through one
/// rocksdb `WriteBatch`: either all keys become durable or none do.
pub struct StagingChainStore<'a> {
    store: &'a ChainStore,
    staged_headers: HashMap<BlockKey, Arc<Header>>,
    staged_tds: HashMap<BlockKey, Td>,
    staged_canonical: HashMap<u64, Hash>,
    deleted_canonical: HashSet<u64>,
    staged_numbers: HashMap<Hash, u64>,
    staged_head: Option<Hash>,
}

impl<'a> StagingChainStore<'a> {
    pub fn new(store: &'a ChainStore) -> Self {
        Self {
            store,
            staged_headers: HashMap::new(),
            staged_tds: HashMap::new(),
            staged_canonical: HashMap::new(),
            deleted_canonical: HashSet::new(),
            staged_numbers: HashMap::new(),
            staged_head: None,
        }
    }

    pub fn header(&self, number: u64, hash: Hash) -> StoreResult<Arc<Header>> {
        if let Some(header) = self.staged_headers.get(&BlockKey::new(number, hash)) {
            return Ok(Arc::clone(header));
        }
        self.store.header(number, hash)
    }

    pub fn has_header(&self, number: u64, hash: Hash) -> StoreResult<bool> {
        Ok(self.staged_headers.contains_key(&BlockKey::new(number, hash)) || self.store.has_header(number, hash)?)
    }

    pub fn canonical_hash(&self, number: u64) -> StoreResult<Option<Hash>> {
        if let Some(hash) = self.staged_canonical.get(&number) {
            return Ok(Some(*hash));
        }
        if self.deleted_canonical.contains(&number) {
            return Ok(None);
        }
        self.store.canonical_hash(number).optional()
    }

    pub fn write_header(&mut self, header: Arc<Header>) {
        self.staged_headers.insert(BlockKey::new(header.number, header.hash), header);
    }

    pub fn write_td(&mut self, number: u64, hash: Hash, td: Td) {
        self.staged_tds.insert(BlockKey::new(number, hash), td);
    }

    pub fn write_canonical(&mut self, number: u64, hash: Hash) {
        self.deleted_canonical.remove(&number);
        self.staged_canonical.insert(number, hash);
    }

    pub fn delete_canonical(&mut self, number: u64) {
        self.staged_canonical.remove(&number);
        self.deleted_canonical.insert(number);
    }

    pub fn write_number(&mut self, hash: Hash, number: u64) {
        self.staged_numbers.insert(hash, number);
    }

    pub fn write_head(&mut self, hash: Hash) {
        self.staged_head = Some(hash);
    }

    pub fn commit(self) -> StoreResult<()> {
        let store = self.store;
        let mut batch = WriteBatch::default();
        store.headers_store.insert_many(&mut batch, &mut self.staged_headers.into_values())?;
        store.td_store.insert_many(&mut batch, &mut self.staged_tds.into_iter().map(|(key, td)| (key.number(), key.hash(), td)))?;
        store.canonical_store.insert_many(&mut batch, &mut self.staged_canonical.into_iter())?;
        store.canonical_store.delete_many(&mut batch, &mut self.deleted_canonical.into_iter())?;
        store.head_store.insert_numbers_many(&mut batch, &mut self.staged_numbers.into_iter())?;
        if let Some(head) = self.staged_head {
            store.head_store.set_head_batch(&mut batch, head)?;
        }
        store.db.write(batch)?;
        // Canonical pointers and the head singleton are the only rewritable
        // keys; drop anything a concurrent reader may have cached while the
        // batch was in flight.
        store.canonical_store.clear_cache();
        store.head_store.invalidate_head_cache();
        Ok(())
    }
}
