//! The in-memory store backing the mock server.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use failure::Error;

use super::{Keyed, Store};

/// A shared, lock-guarded map of entities by key.
///
/// The original implementation this mocks kept plain unsynchronized lists;
/// the lock also gives `create_with_id` its required atomicity: the
/// collision check and the insert happen in one critical section.
#[derive(Debug)]
pub struct MemoryStore<T> {
    inner: Arc<RwLock<BTreeMap<String, T>>>,
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> MemoryStore<T> {
        MemoryStore {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> MemoryStore<T> {
        MemoryStore {
            inner: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl<T> MemoryStore<T>
where
    T: Keyed + Clone,
{
    pub fn new() -> MemoryStore<T> {
        MemoryStore::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().expect("lock poisoned").contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds and inserts an entity under a freshly generated id,
    /// re-rolling `gen` until the id is unused. Termination relies on the
    /// astronomically low collision probability of the id alphabets, not
    /// on a retry cap that could spuriously fail.
    pub fn create_with_id<G, F>(&self, mut gen: G, make: F) -> T
    where
        G: FnMut() -> String,
        F: FnOnce(String) -> T,
    {
        let mut map = self.inner.write().expect("lock poisoned");

        let mut id = gen();
        while map.contains_key(&id) {
            id = gen();
        }

        let entity = make(id);
        map.insert(entity.key().to_string(), entity.clone());

        entity
    }
}

impl<T> Store<T> for MemoryStore<T>
where
    T: Keyed + Clone,
{
    fn create(&self, entity: T) -> Result<T, Error> {
        let mut map = self.inner.write().expect("lock poisoned");

        ensure!(
            !map.contains_key(entity.key()),
            "entity already exists: {}",
            entity.key()
        );

        map.insert(entity.key().to_string(), entity.clone());
        Ok(entity)
    }

    fn get(&self, key: &str) -> Option<T> {
        self.inner.read().expect("lock poisoned").get(key).cloned()
    }

    fn find_all(&self, predicate: &dyn Fn(&T) -> bool) -> Vec<T> {
        self.inner
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }
}
