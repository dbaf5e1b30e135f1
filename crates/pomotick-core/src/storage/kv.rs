//! Durable key-value store seam.
//!
//! The engine persists named JSON blobs through [`KvStore`]. The SQLite
//! [`Database`](super::Database) is the production implementation;
//! [`MemoryStore`] backs tests and embedders that bring their own storage.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::Result;

/// Get/set over named blobs.
pub trait KvStore {
    /// Read a blob, `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write several blobs so that either all or none become visible.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()>;

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        (**self).set_many(entries)
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut map = self.entries.borrow_mut();
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }
}
