//! The modem watch the tracker reads its inputs from.
//!
//! A watch gives de-duplicated access to the current SIM and network
//! registration state of a single modem. Change notifications carry no
//! payload, the receiver re-reads the current value from the watch.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimState {
    /// No SIM card is inserted
    NotPresent,
    /// SIM card is inserted but not yet initialized
    Inserted,
    /// SIM card is waiting for a PIN or PUK
    LockedOut,
    /// SIM card is initialized and its files can be read
    Ready,
    /// SIM card is being reset
    Resetting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationStatus {
    /// Not registered, the MT is not currently searching a new operator to register to
    NotRegistered = 0,
    /// Registered, home network
    Registered = 1,
    /// Not registered, but the MT is currently searching a new operator to register to
    Searching = 2,
    /// Registration denied
    Denied = 3,
    /// Unknown (e.g. out of GERAN/UTRAN/E-UTRAN coverage)
    Unknown = 4,
    /// Registered, roaming
    Roaming = 5,
}

impl RegistrationStatus {
    pub fn is_registered(self) -> bool {
        self == RegistrationStatus::Registered || self == RegistrationStatus::Roaming
    }
}

pub trait Sim {
    fn state(&self) -> SimState;

    /// The home network mobile country code, read from the IMSI
    fn mcc(&self) -> Option<&str>;

    /// The home network mobile network code, read from the IMSI
    fn mnc(&self) -> Option<&str>;
}

pub trait NetworkRegistration {
    fn status(&self) -> RegistrationStatus;

    /// Mobile country code of the serving network
    fn mcc(&self) -> Option<&str>;

    /// Mobile network code of the serving network
    fn mnc(&self) -> Option<&str>;

    /// Operator name as advertised by the serving network
    fn name(&self) -> Option<&str>;
}

pub trait Watch {
    type Sim: Sim;
    type Netreg: NetworkRegistration;

    /// The modem object path, e.g. `/ril_0`
    fn path(&self) -> &str;
    fn iccid(&self) -> Option<&str>;
    fn imsi(&self) -> Option<&str>;

    /// Service provider name as read from the SIM
    fn spn(&self) -> Option<&str>;
    fn sim(&self) -> Option<&Self::Sim>;
    fn netreg(&self) -> Option<&Self::Netreg>;
}

impl<T: Watch> Watch for &T {
    type Sim = T::Sim;
    type Netreg = T::Netreg;

    fn path(&self) -> &str {
        (**self).path()
    }

    fn iccid(&self) -> Option<&str> {
        (**self).iccid()
    }

    fn imsi(&self) -> Option<&str> {
        (**self).imsi()
    }

    fn spn(&self) -> Option<&str> {
        (**self).spn()
    }

    fn sim(&self) -> Option<&Self::Sim> {
        (**self).sim()
    }

    fn netreg(&self) -> Option<&Self::Netreg> {
        (**self).netreg()
    }
}

/// Change notifications delivered by a [`Watch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchEvent {
    IccidChanged,
    ImsiChanged,
    SpnChanged,
    /// A network registration was attached to or detached from the modem
    NetregChanged,
    /// The status of the attached network registration changed
    NetregStatusChanged,
}
