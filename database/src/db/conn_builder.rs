use crate::db::DB;
use rocksdb::{DBWithThreadMode, MultiThreaded};
use std::path::PathBuf;
use std::sync::Arc;

/// Builder of a rocksdb connection
#[derive(Clone, Debug)]
pub struct ConnBuilder {
    db_path: PathBuf,
    create_if_missing: bool,
    parallelism: usize,
}

impl Default for ConnBuilder {
    fn default() -> Self {
        Self { db_path: PathBuf::from("datadir"), create_if_missing: true, parallelism: 1 }
    }
}

impl ConnBuilder {
    pub fn with_db_path(mut self, db_path: PathBuf) -> Self {
        self.db_path = db_path;
        self
    }

    pub fn with_create_if_missing(mut self, create_if_missing: bool) -> Self {
        self.create_if_missing = create_if_missing;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn build(self) -> Result<Arc<DB>, rocksdb::Error> {
        let mut opts = rocksdb::Options::default();
        if self.parallelism > 1 {
            opts.increase_parallelism(self.parallelism as i32);
        }
        opts.create_if_missing(self.create_if_missing);
        let inner = DBWithThreadMode::<MultiThreaded>::open(&opts, self.db_path.to_str().unwrap())?;
        Ok(Arc::new(DB::new(inner)))
    }
}
