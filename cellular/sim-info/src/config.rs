/// Where and how the tracker persists what it learns about a SIM.
pub trait SimInfoConfig {
    /// Store holding the last known service provider name, one per IMSI
    const SPN_STORE: &'static str = "cache";
    const SPN_GROUP: &'static str = "sim";
    const SPN_FIELD: &'static str = "spn";

    /// Global store mapping ICCID (the field) to IMSI (the value)
    const ICCID_MAP_STORE: &'static str = "iccidmap";
    const ICCID_MAP_GROUP: &'static str = "imsi";

    /// Drop the change signals queued while hydrating during construction.
    ///
    /// Nobody can have subscribed before the tracker exists, so these
    /// would only reach a publisher based bus.
    const SILENT_HYDRATION: bool = true;
}

pub struct DefaultConfig;

impl SimInfoConfig for DefaultConfig {}
