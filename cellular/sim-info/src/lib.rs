#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

mod cache;
mod config;
mod error;
mod events;
mod info;
pub mod signals;
pub mod spn;
pub mod storage;
mod tracker;
pub mod watch;

#[cfg(test)]
mod fakes;

extern crate alloc;

pub use config::{DefaultConfig, SimInfoConfig};
pub use info::SimInfo;
pub use signals::{HandlerId, Handlers, NotificationBus, SimInfoEvent};
pub use storage::{KeyValueStore, MemoryStore};
pub use tracker::SimInfoTracker;
pub use watch::{Watch, WatchEvent};
