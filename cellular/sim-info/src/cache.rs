//! Persistence of the ICCID to IMSI map and the per IMSI service provider name.
//!
//! The stores most likely live on flash with a limited number of write
//! cycles, so an entry is only written when its value actually changed.

use alloc::string::String;

use crate::{error::StorageError, storage::KeyValueStore, SimInfoConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Commit {
    Written,
    Unchanged,
}

/// Get the IMSI last seen together with `iccid`
pub(crate) fn load_imsi<S: KeyValueStore, C: SimInfoConfig>(
    store: &mut S,
    iccid: &str,
) -> Result<Option<String>, StorageError<S::Error>> {
    load(store, None, C::ICCID_MAP_STORE, C::ICCID_MAP_GROUP, iccid)
}

/// Get the service provider name last known for `imsi`
pub(crate) fn load_spn<S: KeyValueStore, C: SimInfoConfig>(
    store: &mut S,
    imsi: &str,
) -> Result<Option<String>, StorageError<S::Error>> {
    load(store, Some(imsi), C::SPN_STORE, C::SPN_GROUP, C::SPN_FIELD)
}

pub(crate) fn save_imsi<S: KeyValueStore, C: SimInfoConfig>(
    store: &mut S,
    iccid: &str,
    imsi: &str,
) -> Result<Commit, StorageError<S::Error>> {
    save(store, None, C::ICCID_MAP_STORE, C::ICCID_MAP_GROUP, iccid, imsi)
}

pub(crate) fn save_spn<S: KeyValueStore, C: SimInfoConfig>(
    store: &mut S,
    imsi: &str,
    spn: &str,
) -> Result<Commit, StorageError<S::Error>> {
    save(store, Some(imsi), C::SPN_STORE, C::SPN_GROUP, C::SPN_FIELD, spn)
}

fn load<S: KeyValueStore>(
    store: &mut S,
    namespace: Option<&str>,
    name: &str,
    group: &str,
    field: &str,
) -> Result<Option<String>, StorageError<S::Error>> {
    let handle = store.open(namespace, name).map_err(StorageError::Open)?;
    let value = store.get_string(&handle, group, field);
    // Read only, the close result carries nothing
    let _ = store.close(namespace, name, handle, false);
    Ok(value)
}

fn save<S: KeyValueStore>(
    store: &mut S,
    namespace: Option<&str>,
    name: &str,
    group: &str,
    field: &str,
    value: &str,
) -> Result<Commit, StorageError<S::Error>> {
    let mut handle = store.open(namespace, name).map_err(StorageError::Open)?;
    if store.get_string(&handle, group, field).as_deref() == Some(value) {
        let _ = store.close(namespace, name, handle, false);
        return Ok(Commit::Unchanged);
    }

    store.set_string(&mut handle, group, field, value);
    store
        .close(namespace, name, handle, true)
        .map_err(StorageError::Commit)?;
    Ok(Commit::Written)
}

#[cfg(test)]
mod tests {
    use crate::{storage::MemoryStoreError, DefaultConfig, MemoryStore};

    use super::*;

    const ICCID: &str = "89457387300008689393";
    const IMSI: &str = "001010000000001";

    #[test]
    fn saves_use_the_expected_layout() {
        let mut store = MemoryStore::new();

        assert_eq!(
            Ok(Commit::Written),
            save_imsi::<_, DefaultConfig>(&mut store, ICCID, IMSI)
        );
        assert_eq!(
            Ok(Commit::Written),
            save_spn::<_, DefaultConfig>(&mut store, IMSI, "Operator")
        );

        assert_eq!(Some(IMSI), store.get(None, "iccidmap", "imsi", ICCID));
        assert_eq!(Some("Operator"), store.get(Some(IMSI), "cache", "sim", "spn"));
    }

    #[test]
    fn saving_the_stored_value_does_not_write() {
        let mut store = MemoryStore::new();
        store.insert(Some(IMSI), "cache", "sim", "spn", "Operator");

        assert_eq!(
            Ok(Commit::Unchanged),
            save_spn::<_, DefaultConfig>(&mut store, IMSI, "Operator")
        );
        assert_eq!(0, store.committed());

        assert_eq!(
            Ok(Commit::Written),
            save_spn::<_, DefaultConfig>(&mut store, IMSI, "Other")
        );
        assert_eq!(1, store.committed());
    }

    #[test]
    fn missing_entries_load_as_none() {
        let mut store = MemoryStore::new();

        assert_eq!(Ok(None), load_imsi::<_, DefaultConfig>(&mut store, ICCID));
        assert_eq!(Ok(None), load_spn::<_, DefaultConfig>(&mut store, IMSI));
    }

    #[test]
    fn failures_tell_which_step_failed() {
        let mut store = MemoryStore::new();
        store.set_available(false);

        let error = save_imsi::<_, DefaultConfig>(&mut store, ICCID, IMSI).unwrap_err();
        assert_eq!(StorageError::Open(MemoryStoreError::Unavailable), error);
    }
}
