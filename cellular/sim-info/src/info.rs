use alloc::string::String;

/// What subscribers get to see of a tracked SIM.
///
/// Note that the iccid, imsi and spn may come from the cache, i.e. become
/// available before the pin code is entered and before the SIM itself
/// reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimInfo {
    pub(crate) path: String,
    pub(crate) iccid: Option<String>,
    pub(crate) imsi: Option<String>,
    pub(crate) spn: Option<String>,
}

impl SimInfo {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: path.into(),
            iccid: None,
            imsi: None,
            spn: None,
        }
    }

    /// The modem path this information is tracked for
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn iccid(&self) -> Option<&str> {
        self.iccid.as_deref()
    }

    pub fn imsi(&self) -> Option<&str> {
        self.imsi.as_deref()
    }

    /// The public service provider name
    pub fn spn(&self) -> Option<&str> {
        self.spn.as_deref()
    }
}
