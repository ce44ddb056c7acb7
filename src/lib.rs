#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! ## Feature flags
#![doc = document_features::document_features!(feature_label = r#"<span class="stab portability"><code>{feature}</code></span>"#)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod backend;
pub mod config;
pub mod countdown;
pub mod device;
pub mod error;
pub mod instance;
pub mod irq;
mod state;
mod timing;

#[cfg(test)]
mod mock;

// Reexports
pub use backend::{EtimerDriver, FtmDriver, LpitDriver, LptmrDriver, PitDriver, StmDriver};
pub use config::{Callback, ChannelConfig, Extension, NotificationKind, TimerConfig};
pub use device::{DeviceProfile, FamilyProfile, VectorLayout};
pub use error::{DriverError, Error, Result};
pub use instance::{Family, TimerInstance};
pub use irq::{InterruptControl, Vector};
pub use state::ChannelStatus;
pub use timing::{Drivers, ResolutionUnit, Timing};

#[doc(hidden)]
pub use paste as __paste;
