use alloc::{boxed::Box, vec::Vec};

use embassy_sync::{blocking_mutex::raw::RawMutex, pubsub::ImmediatePublisher};

use crate::SimInfo;

/// Change notifications emitted by the tracker. They carry no payload,
/// subscribers read the current value from the [`SimInfo`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimInfoEvent {
    IccidChanged = 0,
    ImsiChanged = 1,
    SpnChanged = 2,
}

impl SimInfoEvent {
    /// All events in the order they are emitted
    pub const ALL: [SimInfoEvent; 3] = [
        SimInfoEvent::IccidChanged,
        SimInfoEvent::ImsiChanged,
        SimInfoEvent::SpnChanged,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Signals that became due but are not yet emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct QueuedSignals(u8);

impl QueuedSignals {
    pub(crate) fn queue(&mut self, event: SimInfoEvent) {
        self.0 |= event.bit();
    }

    /// Clear `event` and return whether it was queued
    pub(crate) fn take(&mut self, event: SimInfoEvent) -> bool {
        let queued = self.0 & event.bit() != 0;
        self.0 &= !event.bit();
        queued
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub(crate) fn clear(&mut self) {
        self.0 = 0;
    }
}

/// Delivers tracker notifications to whoever is interested.
pub trait NotificationBus {
    fn emit(&mut self, event: SimInfoEvent, info: &SimInfo);
}

impl<N: NotificationBus> NotificationBus for &mut N {
    fn emit(&mut self, event: SimInfoEvent, info: &SimInfo) {
        (**self).emit(event, info)
    }
}

/// Forward notifications to the subscribers of a pubsub channel.
///
/// Slow subscribers observe a lag rather than blocking the tracker.
impl<M: RawMutex, const CAP: usize, const SUBS: usize, const PUBS: usize> NotificationBus
    for ImmediatePublisher<'_, M, SimInfoEvent, CAP, SUBS, PUBS>
{
    fn emit(&mut self, event: SimInfoEvent, _info: &SimInfo) {
        self.publish_immediate(event);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandlerId(u32);

struct Handler {
    id: HandlerId,
    event: SimInfoEvent,
    callback: Box<dyn FnMut(&SimInfo)>,
}

/// Callback registry, handlers are invoked in the order they were added.
pub struct Handlers {
    last_id: u32,
    handlers: Vec<Handler>,
}

impl Handlers {
    pub const fn new() -> Self {
        Self {
            last_id: 0,
            handlers: Vec::new(),
        }
    }

    pub fn add<F>(&mut self, event: SimInfoEvent, callback: F) -> HandlerId
    where
        F: FnMut(&SimInfo) + 'static,
    {
        self.last_id = self.last_id.wrapping_add(1).max(1);
        let id = HandlerId(self.last_id);
        self.handlers.push(Handler {
            id,
            event,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a handler, returns whether it was registered
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let len = self.handlers.len();
        self.handlers.retain(|handler| handler.id != id);
        self.handlers.len() != len
    }

    /// Remove all handlers in `ids` and reset the slots.
    ///
    /// Slots that are already `None` are skipped, so this can be called
    /// repeatedly during teardown.
    pub fn remove_all(&mut self, ids: &mut [Option<HandlerId>]) {
        for id in ids.iter_mut() {
            if let Some(id) = id.take() {
                self.remove(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for Handlers {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBus for Handlers {
    fn emit(&mut self, event: SimInfoEvent, info: &SimInfo) {
        for handler in self
            .handlers
            .iter_mut()
            .filter(|handler| handler.event == event)
        {
            (handler.callback)(info);
        }
    }
}
