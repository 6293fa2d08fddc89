use core::marker::PhantomData;

use alloc::string::String;

use crate::{
    cache::{self, Commit},
    error::StorageError,
    signals::QueuedSignals,
    spn::{self, DefaultSpn},
    storage::KeyValueStore,
    watch::{NetworkRegistration, Sim, SimState, Watch, WatchEvent},
    DefaultConfig, HandlerId, Handlers, NotificationBus, SimInfo, SimInfoConfig, SimInfoEvent,
};

/// Keeps track of the ICCID, IMSI and public service provider name of the
/// SIM in a single modem slot.
///
/// All mutations happen synchronously inside the top-level entry points
/// ([`Self::handle`] and the `*_changed` functions). Signals that become due
/// while processing an event are queued and emitted once, in the order
/// ICCID, IMSI, SPN, when the entry point returns. Subscribers only get a
/// shared reference to the [`SimInfo`] and cannot re-enter the tracker while
/// being notified.
pub struct SimInfoTracker<
    W: Watch,
    S: KeyValueStore,
    N: NotificationBus = Handlers,
    C: SimInfoConfig = DefaultConfig,
> {
    watch: W,
    store: S,
    bus: N,
    info: SimInfo,
    sim_spn: Option<String>,
    cached_spn: Option<String>,
    default_spn: DefaultSpn,
    netreg_attached: bool,
    update_imsi_cache: bool,
    update_iccid_map: bool,
    write_failed: bool,
    queued: QueuedSignals,
    _config: PhantomData<C>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

impl<W: Watch, S: KeyValueStore, N: NotificationBus> SimInfoTracker<W, S, N, DefaultConfig> {
    pub fn new(watch: W, store: S, bus: N) -> Self {
        Self::new_with_config(watch, store, bus)
    }
}

impl<W: Watch, S: KeyValueStore, N: NotificationBus, C: SimInfoConfig> SimInfoTracker<W, S, N, C> {
    /// Create a tracker and hydrate it from the current watch values and the cache
    pub fn new_with_config(watch: W, store: S, bus: N) -> Self {
        let info = SimInfo::new(watch.path());
        let mut tracker = Self {
            watch,
            store,
            bus,
            info,
            sim_spn: None,
            cached_spn: None,
            default_spn: DefaultSpn::new(),
            netreg_attached: false,
            update_imsi_cache: false,
            update_iccid_map: false,
            write_failed: false,
            queued: QueuedSignals::default(),
            _config: PhantomData,
        };

        tracker.sync_from_watch();
        if C::SILENT_HYDRATION {
            tracker.queued.clear();
        } else {
            tracker.emit_queued_signals();
        }

        info!("[{}] Tracking sim info", tracker.info.path.as_str());
        tracker
    }

    /// Stop tracking and give back the watch and the store
    pub fn release(self) -> (W, S) {
        debug!("[{}] Released", self.info.path.as_str());
        (self.watch, self.store)
    }

    pub fn info(&self) -> &SimInfo {
        &self.info
    }

    pub fn path(&self) -> &str {
        self.info.path()
    }

    pub fn iccid(&self) -> Option<&str> {
        self.info.iccid()
    }

    pub fn imsi(&self) -> Option<&str> {
        self.info.imsi()
    }

    /// The public service provider name
    pub fn spn(&self) -> Option<&str> {
        self.info.spn()
    }

    pub fn watch(&self) -> &W {
        &self.watch
    }

    pub fn watch_mut(&mut self) -> &mut W {
        &mut self.watch
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn bus(&self) -> &N {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut N {
        &mut self.bus
    }

    /// Whether some cache entry still needs to be written
    pub fn has_pending_writes(&self) -> bool {
        self.update_imsi_cache || self.update_iccid_map
    }

    pub fn handle(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::IccidChanged => self.iccid_changed(),
            WatchEvent::ImsiChanged => self.imsi_changed(),
            WatchEvent::SpnChanged => self.spn_changed(),
            WatchEvent::NetregChanged => self.netreg_changed(),
            WatchEvent::NetregStatusChanged => self.netreg_status_changed(),
        }
    }

    pub fn iccid_changed(&mut self) {
        self.retry_failed_writes();
        let iccid = self.watch.iccid().map(String::from);
        trace!(
            "[{}] Watch iccid {}",
            self.info.path.as_str(),
            iccid.as_deref().unwrap_or("")
        );
        self.set_iccid(iccid.as_deref());
        self.emit_queued_signals();
    }

    pub fn imsi_changed(&mut self) {
        self.retry_failed_writes();
        self.update_imsi();
        self.emit_queued_signals();
    }

    pub fn spn_changed(&mut self) {
        self.retry_failed_writes();
        self.update_spn();
        self.emit_queued_signals();
    }

    pub fn netreg_changed(&mut self) {
        self.retry_failed_writes();
        self.set_netreg();
        self.emit_queued_signals();
    }

    pub fn netreg_status_changed(&mut self) {
        self.retry_failed_writes();
        // Status changes are only subscribed to while a netreg is attached
        if self.netreg_attached {
            self.network_check();
        }
        self.emit_queued_signals();
    }

    /// Re-read everything from the watch, e.g. after watch events were lost
    pub fn resync(&mut self) {
        self.retry_failed_writes();
        self.sync_from_watch();
        self.emit_queued_signals();
    }

    fn sync_from_watch(&mut self) {
        let iccid = self.watch.iccid().map(String::from);
        self.set_iccid(iccid.as_deref());
        self.set_netreg();
        self.update_imsi();
        self.update_spn();
        self.network_check();
    }

    fn set_iccid(&mut self, iccid: Option<&str>) {
        let iccid = iccid.filter(|iccid| !iccid.is_empty());
        if self.info.iccid.as_deref() == iccid {
            return;
        }

        self.info.iccid = iccid.map(String::from);
        self.queued.queue(SimInfoEvent::IccidChanged);
        if self.info.iccid.is_some() {
            self.load_cache();
        } else {
            debug!("[{}] No more iccid", self.info.path.as_str());
            if self.info.imsi.take().is_some() {
                self.queued.queue(SimInfoEvent::ImsiChanged);
            }
            self.sim_spn = None;
            self.cached_spn = None;
            self.default_spn.clear();
            self.update_public_spn();
        }
    }

    fn load_cache(&mut self) {
        if let Some(iccid) = non_empty(&self.info.iccid).map(String::from) {
            match cache::load_imsi::<S, C>(&mut self.store, &iccid) {
                Ok(Some(imsi))
                    if !imsi.is_empty() && self.info.imsi.as_deref() != Some(imsi.as_str()) =>
                {
                    if let Some(previous) = non_empty(&self.info.imsi) {
                        debug!(
                            "[{}] Imsi changed {} -> {}",
                            self.info.path.as_str(),
                            previous,
                            imsi.as_str()
                        );
                        self.update_iccid_map = true;
                    }
                    debug!(
                        "[{}] imsi[{}] = {}",
                        self.info.path.as_str(),
                        iccid.as_str(),
                        imsi.as_str()
                    );
                    self.info.imsi = Some(imsi);
                    self.flush_iccid_map();
                    self.update_default_spn();
                    self.queued.queue(SimInfoEvent::ImsiChanged);
                }
                Ok(Some(_)) => {}
                Ok(None) => debug!(
                    "[{}] No imsi for iccid {}",
                    self.info.path.as_str(),
                    iccid.as_str()
                ),
                Err(_) => warn!(
                    "[{}] Unable to read {}",
                    self.info.path.as_str(),
                    C::ICCID_MAP_STORE
                ),
            }
        }

        self.load_spn_cache();
    }

    fn load_spn_cache(&mut self) {
        let Some(imsi) = non_empty(&self.info.imsi).map(String::from) else {
            return;
        };

        match cache::load_spn::<S, C>(&mut self.store, &imsi) {
            Ok(Some(spn))
                if !spn.is_empty() && self.cached_spn.as_deref() != Some(spn.as_str()) =>
            {
                if non_empty(&self.sim_spn).is_some() {
                    // The name reported by the SIM wins, make the cache agree with it
                    debug!(
                        "[{}] Replacing cached spn \"{}\" for {}",
                        self.info.path.as_str(),
                        spn.as_str(),
                        imsi.as_str()
                    );
                    self.update_imsi_cache = true;
                    self.flush_imsi_cache();
                    return;
                }

                if let Some(previous) = non_empty(&self.cached_spn) {
                    debug!(
                        "[{}] Spn changing {} -> {}",
                        self.info.path.as_str(),
                        previous,
                        spn.as_str()
                    );
                    self.update_imsi_cache = true;
                }
                debug!(
                    "[{}] spn[{}] = \"{}\"",
                    self.info.path.as_str(),
                    imsi.as_str(),
                    spn.as_str()
                );
                self.cached_spn = Some(spn);
                self.flush_imsi_cache();
                self.update_public_spn();
            }
            Ok(Some(_)) => {}
            Ok(None) => debug!(
                "[{}] No spn for imsi {}",
                self.info.path.as_str(),
                imsi.as_str()
            ),
            Err(_) => warn!(
                "[{}] Unable to read {}/{}",
                self.info.path.as_str(),
                imsi.as_str(),
                C::SPN_STORE
            ),
        }
    }

    fn update_imsi(&mut self) {
        let imsi = self
            .watch
            .imsi()
            .filter(|imsi| !imsi.is_empty())
            .map(String::from);

        // The imsi is only reset when the iccid disappears, a missing imsi is ignored here
        if let Some(imsi) = imsi {
            if self.info.imsi.as_deref() != Some(imsi.as_str()) {
                debug!("[{}] Imsi {}", self.info.path.as_str(), imsi.as_str());
                self.info.imsi = Some(imsi);
                self.update_iccid_map = true;
                self.flush_iccid_map();
                self.load_spn_cache();
                self.flush_imsi_cache();
                self.queued.queue(SimInfoEvent::ImsiChanged);
            }
        }

        // MCC and MNC may have become available
        self.update_default_spn();
    }

    fn update_spn(&mut self) {
        let spn = self
            .watch
            .spn()
            .filter(|spn| !spn.is_empty())
            .map(String::from);

        if let Some(spn) = spn {
            self.set_sim_spn(&spn);
        }
    }

    fn set_sim_spn(&mut self, spn: &str) {
        if self.sim_spn.as_deref() == Some(spn) {
            return;
        }

        debug!("[{}] Sim spn \"{}\"", self.info.path.as_str(), spn);
        self.sim_spn = Some(spn.into());
        self.update_imsi_cache = true;
        self.set_cached_spn(spn);
        self.flush_imsi_cache();
        self.update_public_spn();
    }

    fn set_cached_spn(&mut self, spn: &str) {
        if self.cached_spn.as_deref() == Some(spn) {
            return;
        }

        debug!("[{}] Cached spn \"{}\"", self.info.path.as_str(), spn);
        self.cached_spn = Some(spn.into());
        self.update_imsi_cache = true;
        self.flush_imsi_cache();
        self.update_public_spn();
    }

    fn update_default_spn(&mut self) {
        let default_spn = match self.watch.sim() {
            Some(sim) if sim.state() == SimState::Ready => match (sim.mcc(), sim.mnc()) {
                (Some(mcc), Some(mnc)) => DefaultSpn::from_mcc_mnc(mcc, mnc),
                _ => DefaultSpn::new(),
            },
            _ => DefaultSpn::new(),
        };

        if default_spn != self.default_spn {
            debug!(
                "[{}] Default spn \"{}\"",
                self.info.path.as_str(),
                default_spn.as_str()
            );
            self.default_spn = default_spn;
            self.update_public_spn();
        }
    }

    fn update_public_spn(&mut self) {
        let spn = spn::public_spn(
            self.sim_spn.as_deref(),
            self.cached_spn.as_deref(),
            &self.default_spn,
        );

        if self.info.spn.as_deref() != spn {
            match spn {
                Some(spn) => debug!("[{}] Public spn \"{}\"", self.info.path.as_str(), spn),
                None => debug!("[{}] No public spn", self.info.path.as_str()),
            }
            self.info.spn = spn.map(String::from);
            self.queued.queue(SimInfoEvent::SpnChanged);
        }
    }

    fn set_netreg(&mut self) {
        if self.watch.netreg().is_some() {
            if !self.netreg_attached {
                debug!("[{}] Netreg attached", self.info.path.as_str());
                self.netreg_attached = true;
            }
            self.network_check();
        } else if self.netreg_attached {
            debug!("[{}] Netreg detached", self.info.path.as_str());
            self.netreg_attached = false;
        }
    }

    /// Adopt the operator name as cached spn while registered with the home network
    fn network_check(&mut self) {
        let name = match (self.watch.sim(), self.watch.netreg()) {
            (Some(sim), Some(netreg)) => home_network_name(sim, netreg).map(String::from),
            _ => None,
        };

        if let Some(name) = name {
            debug!("[{}] Home network \"{}\"", self.info.path.as_str(), name.as_str());
            // A SIM with an EFspn reports it before getting registered
            if non_empty(&self.sim_spn).is_none() {
                self.set_cached_spn(&name);
            }
        }
    }

    fn flush_imsi_cache(&mut self) {
        if !self.update_imsi_cache {
            return;
        }
        let (Some(imsi), Some(spn)) = (non_empty(&self.info.imsi), non_empty(&self.cached_spn))
        else {
            return;
        };

        match cache::save_spn::<S, C>(&mut self.store, imsi, spn) {
            Ok(commit) => {
                if commit == Commit::Written {
                    debug!(
                        "[{}] Updated {}/{}",
                        self.info.path.as_str(),
                        imsi,
                        C::SPN_STORE
                    );
                }
                self.update_imsi_cache = false;
            }
            Err(error) => {
                self.storage_failed(&error, C::SPN_STORE);
            }
        }
    }

    fn flush_iccid_map(&mut self) {
        if !self.update_iccid_map {
            return;
        }
        let (Some(iccid), Some(imsi)) = (non_empty(&self.info.iccid), non_empty(&self.info.imsi))
        else {
            return;
        };

        match cache::save_imsi::<S, C>(&mut self.store, iccid, imsi) {
            Ok(commit) => {
                if commit == Commit::Written {
                    debug!(
                        "[{}] Updated {}",
                        self.info.path.as_str(),
                        C::ICCID_MAP_STORE
                    );
                }
                self.update_iccid_map = false;
            }
            Err(error) => {
                self.storage_failed(&error, C::ICCID_MAP_STORE);
            }
        }
    }

    /// The dirty flag stays set, the write is retried on the next event
    fn storage_failed(&mut self, error: &StorageError<S::Error>, store: &str) {
        match error {
            StorageError::Open(_) => {
                warn!("[{}] Unable to open {}", self.info.path.as_str(), store)
            }
            StorageError::Commit(_) => {
                warn!("[{}] Unable to write {}", self.info.path.as_str(), store)
            }
        }
        self.write_failed = true;
    }

    fn retry_failed_writes(&mut self) {
        if core::mem::take(&mut self.write_failed) {
            debug!("[{}] Retrying cache writes", self.info.path.as_str());
            self.flush_iccid_map();
            self.flush_imsi_cache();
        }
    }

    fn emit_queued_signals(&mut self) {
        for event in SimInfoEvent::ALL {
            if self.queued.is_empty() {
                break;
            }
            if self.queued.take(event) {
                self.bus.emit(event, &self.info);
            }
        }
    }
}

impl<W: Watch, S: KeyValueStore, C: SimInfoConfig> SimInfoTracker<W, S, Handlers, C> {
    pub fn add_iccid_changed_handler<F>(&mut self, callback: F) -> HandlerId
    where
        F: FnMut(&SimInfo) + 'static,
    {
        self.bus.add(SimInfoEvent::IccidChanged, callback)
    }

    pub fn add_imsi_changed_handler<F>(&mut self, callback: F) -> HandlerId
    where
        F: FnMut(&SimInfo) + 'static,
    {
        self.bus.add(SimInfoEvent::ImsiChanged, callback)
    }

    pub fn add_spn_changed_handler<F>(&mut self, callback: F) -> HandlerId
    where
        F: FnMut(&SimInfo) + 'static,
    {
        self.bus.add(SimInfoEvent::SpnChanged, callback)
    }

    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        self.bus.remove(id)
    }

    pub fn remove_handlers(&mut self, ids: &mut [Option<HandlerId>]) {
        self.bus.remove_all(ids)
    }
}

fn home_network_name<'a>(
    sim: &impl Sim,
    netreg: &'a impl NetworkRegistration,
) -> Option<&'a str> {
    if sim.state() != SimState::Ready || !netreg.status().is_registered() {
        return None;
    }

    let sim_mcc = sim.mcc().filter(|mcc| !mcc.is_empty())?;
    let sim_mnc = sim.mnc().filter(|mnc| !mnc.is_empty())?;
    let net_mcc = netreg.mcc().filter(|mcc| !mcc.is_empty())?;
    let net_mnc = netreg.mnc().filter(|mnc| !mnc.is_empty())?;
    let name = netreg.name().filter(|name| !name.is_empty())?;

    (sim_mcc == net_mcc && sim_mnc == net_mnc).then_some(name)
}
