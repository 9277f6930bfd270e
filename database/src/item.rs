use crate::db::DB;
use crate::errors::StoreError;
use crate::key::DbKey;
use crate::writer::DbWriter;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// A cached DB item (singleton value under a fixed key)
#[derive(Clone)]
pub struct CachedDbItem<T> {
    db: Arc<DB>,
    key: Vec<u8>,
    cached_item: Arc<RwLock<Option<T>>>,
}

impl<T> CachedDbItem<T> {
    pub fn new(db: Arc<DB>, key: Vec<u8>) -> Self {
        Self { db, key, cached_item: Arc::new(RwLock::new(None)) }
    }

    pub fn read(&self) -> Result<T, StoreError>
    where
        T: Clone + DeserializeOwned,
    {
        if let Some(item) = self.cached_item.read().clone() {
            return Ok(item);
        }
        if let Some(slice) = self.db.get_pinned(DbKey::prefix_only(&self.key))? {
            let item: T = bincode::deserialize(&slice)?;
            *self.cached_item.write() = Some(item.clone());
            Ok(item)
        } else {
            Err(StoreError::KeyNotFound(DbKey::prefix_only(&self.key)))
        }
    }

    /// Writes the item through `writer`. The write may be part of a batch that
    /// is applied later, so the cached value is dropped rather than replaced;
    /// the next read loads whatever the DB holds once the batch has landed.
    pub fn write(&self, mut writer: impl DbWriter, item: &T) -> Result<(), StoreError>
    where
        T: Serialize,
    {
        *self.cached_item.write() = None;
        let bin_data = bincode::serialize(item)?;
        writer.put(DbKey::prefix_only(&self.key), bin_data)?;
        Ok(())
    }

    /// Drops the cached value. A concurrent read may repopulate the cache
    /// between a batched write and the batch application; callers apply this
    /// after the batch lands so the next read observes the committed value.
    pub fn invalidate_cache(&self) {
        *self.cached_item.write() = None;
    }
}
