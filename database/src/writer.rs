use crate::db::DB;
use crate::errors::StoreError;
use crate::key::DbKey;
use rocksdb::WriteBatch;

/// Abstraction over writing into the DB directly or into an atomic write batch
pub trait DbWriter {
    fn put(&mut self, key: DbKey, value: Vec<u8>) -> Result<(), StoreError>;
    fn delete(&mut self, key: DbKey) -> Result<(), StoreError>;
}

pub struct DirectDbWriter<'a> {
    db: &'a DB,
}

impl<'a> DirectDbWriter<'a> {
    pub fn new(db: &'a DB) -> Self {
        Self { db }
    }
}

impl DbWriter for DirectDbWriter<'_> {
    fn put(&mut self, key: DbKey, value: Vec<u8>) -> Result<(), StoreError> {
        Ok(self.db.put(key, value)?)
    }

    fn delete(&mut self, key: DbKey) -> Result<(), StoreError> {
        Ok(self.db.delete(key)?)
    }
}

pub struct BatchDbWriter<'a> {
    batch: &'a mut WriteBatch,
}

impl<'a> BatchDbWriter<'a> {
    pub fn new(batch: &'a mut WriteBatch) -> Self {
        Self { batch }
    }
}

impl DbWriter for BatchDbWriter<'_> {
    fn put(&mut self, key: DbKey, value: Vec<u8>) -> Result<(), StoreError> {
        self.batch.put(key, value);
        Ok(())
    }

    fn delete(&mut self, key: DbKey) -> Result<(), StoreError> {
        self.batch.delete(key);
        Ok(())
    }
}
