use crate::cache::Cache;
use crate::db::DB;
use crate::errors::StoreError;
use crate::key::DbKey;
use crate::writer::DbWriter;
use serde::{de::DeserializeOwned, Serialize};
use std::{hash::Hash, sync::Arc};

/// A concurrent DB store access with typed caching.
#[derive(Clone)]
pub struct CachedDbAccess<TKey, TData>
where
    TKey: Clone + Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
{
    db: Arc<DB>,

    // Cache
    cache: Cache<TKey, TData>,

    // DB bucket/path
    prefix: Vec<u8>,
}

impl<TKey, TData> CachedDbAccess<TKey, TData>
where
    TKey: Clone + Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
{
    pub fn new(db: Arc<DB>, cache_size: u64, prefix: Vec<u8>) -> Self {
        Self { db, cache: Cache::new(cache_size), prefix }
    }

    pub fn has(&self, key: TKey) -> Result<bool, StoreError>
    where
        TKey: AsRef<[u8]>,
    {
        Ok(self.cache.contains_key(&key) || self.db.get_pinned(DbKey::new(&self.prefix, key))?.is_some())
    }

    pub fn read(&self, key: TKey) -> Result<TData, StoreError>
    where
        TKey: AsRef<[u8]>,
        TData: DeserializeOwned, // We need `DeserializeOwned` since the slice coming from `db.get_pinned` has short lifetime
    {
        if let Some(data) = self.cache.get(&key) {
            Ok(data)
        } else {
            let db_key = DbKey::new(&self.prefix, key.clone());
            if let Some(slice) = self.db.get_pinned(&db_key)? {
                let data: TData = bincode::deserialize(&slice)?;
                self.cache.insert(key, data.clone());
                Ok(data)
            } else {
                Err(StoreError::KeyNotFound(db_key))
            }
        }
    }

    pub fn write(&self, mut writer: impl DbWriter, key: TKey, data: TData) -> Result<(), StoreError>
    where
        TKey: AsRef<[u8]>,
        TData: Serialize,
    {
        let bin_data = bincode::serialize(&data)?;
        self.cache.insert(key.clone(), data);
        writer.put(DbKey::new(&self.prefix, key), bin_data)?;
        Ok(())
    }

    /// Write directly from an iterator and do not cache any data. NOTE: this action also clears the cache
    pub fn write_many_without_cache(
        &self,
        mut writer: impl DbWriter,
        iter: &mut impl Iterator<Item = (TKey, TData)>,
    ) -> Result<(), StoreError>
    where
        TKey: AsRef<[u8]>,
        TData: Serialize,
    {
        for (key, data) in iter {
            let bin_data = bincode::serialize(&data)?;
            writer.put(DbKey::new(&self.prefix, key), bin_data)?;
        }
        // We must clear the cache in order to avoid invalidated entries
        self.cache.remove_all();
        Ok(())
    }

    pub fn delete(&self, mut writer: impl DbWriter, key: TKey) -> Result<(), StoreError>
    where
        TKey: AsRef<[u8]>,
    {
        self.cache.remove(&key);
        writer.delete(DbKey::new(&self.prefix, key))?;
        Ok(())
    }

    pub fn delete_many(&self, mut writer: impl DbWriter, key_iter: &mut impl Iterator<Item = TKey>) -> Result<(), StoreError>
    where
        TKey: AsRef<[u8]>,
    {
        for key in key_iter {
            self.cache.remove(&key);
            writer.delete(DbKey::new(&self.prefix, key))?;
        }
        Ok(())
    }

    /// Drops all cached entries. A concurrent read may repopulate the cache
    /// between a batched write and the batch application; callers whose keys
    /// can be overwritten or deleted apply this after the batch lands.
    pub fn clear_cache(&self) {
        self.cache.remove_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_temp_db;
    use crate::prelude::{BatchDbWriter, ConnBuilder, DirectDbWriter, StoreResultExtensions};
    use rocksdb::WriteBatch;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    struct Key([u8; 8]);

    impl From<u64> for Key {
        fn from(value: u64) -> Self {
            Key(value.to_le_bytes())
        }
    }

    impl AsRef<[u8]> for Key {
        fn as_ref(&self) -> &[u8] {
            &self.0
        }
    }

    #[test]
    fn test_write_read_delete() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default());
        let access = CachedDbAccess::<Key, u64>::new(db.clone(), 2, vec![1, 2]);

        access.write(DirectDbWriter::new(&db), Key::from(1), 100).unwrap();
        assert!(access.has(Key::from(1)).unwrap());
        assert_eq!(access.read(Key::from(1)).unwrap(), 100);
        assert_eq!(access.read(Key::from(7)).optional().unwrap(), None);

        access.delete(DirectDbWriter::new(&db), Key::from(1)).unwrap();
        assert!(!access.has(Key::from(1)).unwrap());
    }

    #[test]
    fn test_batched_writes_are_not_visible_until_applied() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default());
        let access = CachedDbAccess::<Key, u64>::new(db.clone(), 16, vec![3]);

        let mut batch = WriteBatch::default();
        access.write_many_without_cache(BatchDbWriter::new(&mut batch), &mut (0..8u64).map(|i| (Key::from(i), i))).unwrap();
        assert!(!access.has(Key::from(0)).unwrap());

        db.write(batch).unwrap();
        assert!((0..8u64).all(|i| access.read(Key::from(i)).unwrap() == i));

        let mut batch = WriteBatch::default();
        access.delete_many(BatchDbWriter::new(&mut batch), &mut (0..8u64).map(Key::from)).unwrap();
        db.write(batch).unwrap();
        assert!((0..8u64).all(|i| !access.has(Key::from(i)).unwrap()));
    }
}
