//! Register-model adapters, one per timer family.
//!
//! Each family exposes a driver trait that a board support crate implements
//! over its peripheral access crate. The adapters in this module turn those
//! register-level calls into the uniform [`Backend`] operations the
//! [`Timing`](crate::Timing) facade dispatches to. Adapters hold no state:
//! everything that survives a call lives in the facade's channel table.

use crate::config::{ChannelConfig, Extension, TimerConfig};
use crate::error::DriverError;
use crate::instance::Family;

pub mod etimer;
pub mod ftm;
pub mod lpit;
pub mod lptmr;
pub mod pit;
pub mod stm;

pub use etimer::EtimerDriver;
pub use ftm::FtmDriver;
pub use lpit::LpitDriver;
pub use lptmr::LptmrDriver;
pub use pit::PitDriver;
pub use stm::StmDriver;

/// Counter clock seen by a channel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Clock {
    pub frequency: u32,
    pub prescaler: u64,
}

/// The channel an operation applies to, with the clocking its instance was set up with.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Target {
    pub instance: u8,
    pub channel: u8,
    pub extension: Extension,
}

/// Values recorded when the channel was last armed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Snapshot {
    pub period: u32,
    pub reference: u32,
}

/// Uniform operations over one timer family.
pub(crate) trait Backend {
    /// Largest value the counter reaches before wrapping.
    fn max_count(&self, extension: &Extension) -> u32;

    /// Programs instance-wide settings. Runs before any channel is set up.
    fn init_instance(&self, instance: u8, config: &TimerConfig<'_>) -> Result<(), DriverError>;

    /// Programs one channel.
    fn init_channel(&self, _instance: u8, _channel: &ChannelConfig, _extension: &Extension) -> Result<(), DriverError> {
        Ok(())
    }

    /// Disables the instance.
    fn deinit(&self, instance: u8);

    /// Arms the channel to expire `period` ticks from now.
    ///
    /// Returns the counter value the period is measured from, for free-running counters.
    fn start(&self, target: Target, period: u32) -> Option<u32>;

    /// Stops event generation on the channel.
    fn stop(&self, target: Target);

    /// Ticks elapsed in the current period.
    fn elapsed(&self, target: Target, snapshot: Snapshot) -> u32;

    /// Ticks left in the current period.
    fn remaining(&self, target: Target, snapshot: Snapshot) -> u32 {
        snapshot.period.saturating_sub(self.elapsed(target, snapshot))
    }

    /// Counter clock. Panics if the clock is not running.
    fn clock(&self, instance: u8, extension: &Extension) -> Clock;

    /// Whether the channel's event flag is set.
    fn event_pending(&self, instance: u8, channel: u8) -> bool;

    /// Acknowledges the channel's event flag.
    fn clear_event(&self, instance: u8, channel: u8);

    /// Whether the event flag must be cleared before the callback runs.
    fn clears_before_callback(&self) -> bool {
        false
    }

    /// Whether events on a channel the facade considers stopped are spurious.
    fn gated_by_running(&self) -> bool {
        false
    }

    /// Moves the comparator one period ahead after a continuous event.
    ///
    /// Returns the new reference for free-running counters; reload counters
    /// re-arm in hardware and return `None`.
    fn rearm(&self, _target: Target, _period: u32) -> Option<u32> {
        None
    }
}

/// Ticks from `reference` to `current` on a counter that wraps after `max`.
pub(crate) const fn wrapping_elapsed(current: u32, reference: u32, max: u32) -> u32 {
    if current >= reference {
        current - reference
    } else {
        max.wrapping_sub(reference).wrapping_add(current)
    }
}

/// Comparator value `delta` ticks after `base` on a counter that wraps after `max`.
pub(crate) const fn wrapping_compare(base: u32, delta: u32, max: u32) -> u32 {
    ((base as u64 + delta as u64) % (max as u64 + 1)) as u32
}

/// Unwraps a driver's frequency report.
pub(crate) fn require_clock(family: Family, frequency: Option<u32>) -> u32 {
    match frequency {
        Some(f) if f > 0 => f,
        _ => panic!("{:?} clock not running", family),
    }
}

/// Unwraps the extension variant a family's instance was initialized with.
macro_rules! extension {
    ($ext:expr, $variant:ident) => {
        match $ext {
            $crate::config::Extension::$variant(e) => e,
            _ => panic!("{} instance not initialized", ::core::stringify!($variant)),
        }
    };
}
pub(crate) use extension;
