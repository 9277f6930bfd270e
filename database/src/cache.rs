use parking_lot::RwLock;
use rand::Rng;
use std::{collections::HashMap, hash::Hash, sync::Arc};

/// A simple concurrent cache with random eviction once full
#[derive(Clone)]
pub struct Cache<TKey: Clone + Hash + Eq + Send + Sync, TData: Clone + Send + Sync> {
    map: Arc<RwLock<HashMap<TKey, TData>>>,
    size: usize,
}

impl<TKey: Clone + Hash + Eq + Send + Sync, TData: Clone + Send + Sync> Cache<TKey, TData> {
    pub fn new(size: u64) -> Self {
        Self { map: Arc::new(RwLock::new(HashMap::with_capacity(size as usize))), size: size as usize }
    }

    pub fn get(&self, key: &TKey) -> Option<TData> {
        self.map.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &TKey) -> bool {
        self.map.read().contains_key(key)
    }

    pub fn insert(&self, key: TKey, data: TData) {
        if self.size == 0 {
            return;
        }

        let mut write_guard = self.map.write();
        if write_guard.len() == self.size && !write_guard.contains_key(&key) {
            let random_key = write_guard.keys().nth(rand::thread_rng().gen_range(0..self.size)).unwrap().clone();
            write_guard.remove(&random_key);
        }
        write_guard.insert(key, data);
    }

    pub fn remove(&self, key: &TKey) {
        self.map.write().remove(key);
    }

    pub fn remove_all(&self) {
        self.map.write().clear();
    }
}
