use alloc::{
    borrow::ToOwned,
    collections::BTreeMap,
    string::{String, ToString},
};

use super::KeyValueStore;

type Entries = BTreeMap<(String, String), String>;
type StoreKey = (Option<String>, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryStoreError {
    Unavailable,
}

/// Volatile [`KeyValueStore`] keeping every store in memory.
///
/// It counts opens and committed writes which makes it suitable for
/// verifying how often a store is actually rewritten.
#[derive(Debug)]
pub struct MemoryStore {
    stores: BTreeMap<StoreKey, Entries>,
    available: bool,
    opened: usize,
    committed: usize,
}

/// An open store, a private copy of its entries until committed.
#[derive(Debug)]
pub struct MemoryHandle {
    entries: Entries,
    modified: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            stores: BTreeMap::new(),
            available: true,
            opened: 0,
            committed: 0,
        }
    }

    /// Make all subsequent opens and commits fail (or succeed again).
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn insert(
        &mut self,
        namespace: Option<&str>,
        store: &str,
        group: &str,
        field: &str,
        value: &str,
    ) {
        self.stores
            .entry((namespace.map(ToOwned::to_owned), store.to_string()))
            .or_default()
            .insert((group.to_string(), field.to_string()), value.to_string());
    }

    pub fn get(&self, namespace: Option<&str>, store: &str, group: &str, field: &str) -> Option<&str> {
        self.stores
            .get(&(namespace.map(ToOwned::to_owned), store.to_string()))?
            .get(&(group.to_string(), field.to_string()))
            .map(String::as_str)
    }

    /// Number of stores opened so far
    pub fn opened(&self) -> usize {
        self.opened
    }

    /// Number of writes that reached the store so far
    pub fn committed(&self) -> usize {
        self.committed
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    type Handle = MemoryHandle;
    type Error = MemoryStoreError;

    fn open(&mut self, namespace: Option<&str>, store: &str) -> Result<MemoryHandle, Self::Error> {
        if !self.available {
            return Err(MemoryStoreError::Unavailable);
        }

        self.opened += 1;
        let entries = self
            .stores
            .get(&(namespace.map(ToOwned::to_owned), store.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(MemoryHandle {
            entries,
            modified: false,
        })
    }

    fn get_string(&self, handle: &MemoryHandle, group: &str, field: &str) -> Option<String> {
        handle
            .entries
            .get(&(group.to_string(), field.to_string()))
            .cloned()
    }

    fn set_string(&mut self, handle: &mut MemoryHandle, group: &str, field: &str, value: &str) {
        handle
            .entries
            .insert((group.to_string(), field.to_string()), value.to_string());
        handle.modified = true;
    }

    fn close(
        &mut self,
        namespace: Option<&str>,
        store: &str,
        handle: MemoryHandle,
        commit: bool,
    ) -> Result<(), Self::Error> {
        if !commit {
            return Ok(());
        }
        if !self.available {
            return Err(MemoryStoreError::Unavailable);
        }

        if handle.modified {
            self.committed += 1;
        }
        self.stores.insert(
            (namespace.map(ToOwned::to_owned), store.to_string()),
            handle.entries,
        );
        Ok(())
    }
}
