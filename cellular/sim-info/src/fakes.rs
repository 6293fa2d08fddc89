use mockall::mock;

use crate::{
    watch::{NetworkRegistration, RegistrationStatus, Sim, SimState, Watch},
    NotificationBus, SimInfo, SimInfoEvent,
};

#[derive(Debug, Default)]
pub struct FakeWatch {
    pub iccid: Option<String>,
    pub imsi: Option<String>,
    pub spn: Option<String>,
    pub sim: Option<FakeSim>,
    pub netreg: Option<FakeNetreg>,
}

#[derive(Debug, Clone)]
pub struct FakeSim {
    pub state: SimState,
    pub mcc: Option<String>,
    pub mnc: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FakeNetreg {
    pub status: RegistrationStatus,
    pub mcc: Option<String>,
    pub mnc: Option<String>,
    pub name: Option<String>,
}

impl FakeSim {
    pub fn ready(mcc: &str, mnc: &str) -> Self {
        Self {
            state: SimState::Ready,
            mcc: Some(mcc.into()),
            mnc: Some(mnc.into()),
        }
    }
}

impl FakeNetreg {
    pub fn registered(mcc: &str, mnc: &str, name: &str) -> Self {
        Self {
            status: RegistrationStatus::Registered,
            mcc: Some(mcc.into()),
            mnc: Some(mnc.into()),
            name: Some(name.into()),
        }
    }
}

impl Watch for FakeWatch {
    type Sim = FakeSim;
    type Netreg = FakeNetreg;

    fn path(&self) -> &str {
        "/ril_0"
    }

    fn iccid(&self) -> Option<&str> {
        self.iccid.as_deref()
    }

    fn imsi(&self) -> Option<&str> {
        self.imsi.as_deref()
    }

    fn spn(&self) -> Option<&str> {
        self.spn.as_deref()
    }

    fn sim(&self) -> Option<&FakeSim> {
        self.sim.as_ref()
    }

    fn netreg(&self) -> Option<&FakeNetreg> {
        self.netreg.as_ref()
    }
}

impl Sim for FakeSim {
    fn state(&self) -> SimState {
        self.state
    }

    fn mcc(&self) -> Option<&str> {
        self.mcc.as_deref()
    }

    fn mnc(&self) -> Option<&str> {
        self.mnc.as_deref()
    }
}

impl NetworkRegistration for FakeNetreg {
    fn status(&self) -> RegistrationStatus {
        self.status
    }

    fn mcc(&self) -> Option<&str> {
        self.mcc.as_deref()
    }

    fn mnc(&self) -> Option<&str> {
        self.mnc.as_deref()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Records every emitted event
impl NotificationBus for Vec<SimInfoEvent> {
    fn emit(&mut self, event: SimInfoEvent, _info: &SimInfo) {
        self.push(event);
    }
}

mock! {
    pub Bus {}

    impl NotificationBus for Bus {
        fn emit(&mut self, event: SimInfoEvent, info: &SimInfo);
    }
}
