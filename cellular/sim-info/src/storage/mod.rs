mod memory;

use alloc::string::String;

pub use memory::{MemoryHandle, MemoryStore, MemoryStoreError};

/// A small string key/value store.
///
/// Stores are addressed by `(namespace, store)`. A `None` namespace addresses
/// the single global store with that name, otherwise the store is private to
/// the namespace, e.g. an IMSI.
pub trait KeyValueStore {
    type Handle;
    type Error;

    fn open(&mut self, namespace: Option<&str>, store: &str) -> Result<Self::Handle, Self::Error>;

    fn get_string(&self, handle: &Self::Handle, group: &str, field: &str) -> Option<String>;

    fn set_string(&mut self, handle: &mut Self::Handle, group: &str, field: &str, value: &str);

    /// Release the handle, writing it back to stable storage if `commit` is set.
    fn close(
        &mut self,
        namespace: Option<&str>,
        store: &str,
        handle: Self::Handle,
        commit: bool,
    ) -> Result<(), Self::Error>;
}

impl<S: KeyValueStore> KeyValueStore for &mut S {
    type Handle = S::Handle;
    type Error = S::Error;

    fn open(&mut self, namespace: Option<&str>, store: &str) -> Result<Self::Handle, Self::Error> {
        (**self).open(namespace, store)
    }

    fn get_string(&self, handle: &Self::Handle, group: &str, field: &str) -> Option<String> {
        (**self).get_string(handle, group, field)
    }

    fn set_string(&mut self, handle: &mut Self::Handle, group: &str, field: &str, value: &str) {
        (**self).set_string(handle, group, field, value)
    }

    fn close(
        &mut self,
        namespace: Option<&str>,
        store: &str,
        handle: Self::Handle,
        commit: bool,
    ) -> Result<(), Self::Error> {
        (**self).close(namespace, store, handle, commit)
    }
}
