/// A failed attempt to persist a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError<E> {
    /// The store could not be opened
    Open(E),
    /// The store was modified but could not be written back
    Commit(E),
}
