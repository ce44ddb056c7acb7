//! Periodic Interrupt Timer.
//!
//! 32-bit down counters with hardware reload. Writing a new period to a
//! running channel only takes effect once the current period expires.

use super::{require_clock, Backend, Clock, Snapshot, Target};
use crate::config::{ChannelConfig, Extension, TimerConfig};
use crate::error::DriverError;
use crate::instance::Family;

/// Register-level PIT access.
pub trait PitDriver: Sync {
    /// Enables the module. Counters freeze while a debugger halts the core when `stop_in_debug` is set.
    fn init(&self, instance: u8, stop_in_debug: bool);

    /// Sets up `channel` as an unchained timer with its interrupt enabled.
    fn init_channel(&self, instance: u8, channel: u8) -> Result<(), DriverError>;

    /// Disables the module.
    fn deinit(&self, instance: u8);

    /// Writes the load value of `channel`.
    fn set_period(&self, instance: u8, channel: u8, ticks: u32);

    /// Enables counting on `channel`.
    fn start_channel(&self, instance: u8, channel: u8);

    /// Disables counting on `channel`.
    fn stop_channel(&self, instance: u8, channel: u8);

    /// Whether `channel` is enabled.
    fn is_running(&self, instance: u8, channel: u8) -> bool;

    /// Current value of the channel's down counter.
    fn current_count(&self, instance: u8, channel: u8) -> u32;

    /// Whether the channel's interrupt flag is set.
    fn status_flag(&self, instance: u8, channel: u8) -> bool;

    /// Clears the channel's interrupt flag.
    fn clear_status_flag(&self, instance: u8, channel: u8);

    /// Functional clock of the instance, `None` if it is gated.
    fn frequency(&self, instance: u8) -> Option<u32>;
}

pub(crate) struct Pit<'d>(pub(crate) &'d dyn PitDriver);

impl Backend for Pit<'_> {
    fn max_count(&self, _extension: &Extension) -> u32 {
        Family::Pit.max_count()
    }

    fn init_instance(&self, instance: u8, _config: &TimerConfig<'_>) -> Result<(), DriverError> {
        self.0.init(instance, true);
        Ok(())
    }

    fn init_channel(&self, instance: u8, channel: &ChannelConfig, _extension: &Extension) -> Result<(), DriverError> {
        self.0.init_channel(instance, channel.channel)
    }

    fn deinit(&self, instance: u8) {
        self.0.deinit(instance);
    }

    fn start(&self, target: Target, period: u32) -> Option<u32> {
        let (instance, channel) = (target.instance, target.channel);
        self.0.set_period(instance, channel, period);
        if !self.0.is_running(instance, channel) {
            self.0.start_channel(instance, channel);
        }
        None
    }

    fn stop(&self, target: Target) {
        self.0.stop_channel(target.instance, target.channel);
    }

    fn elapsed(&self, target: Target, snapshot: Snapshot) -> u32 {
        let current = self.0.current_count(target.instance, target.channel);
        snapshot.period.saturating_sub(current)
    }

    fn remaining(&self, target: Target, _snapshot: Snapshot) -> u32 {
        self.0.current_count(target.instance, target.channel)
    }

    fn clock(&self, instance: u8, _extension: &Extension) -> Clock {
        Clock {
            frequency: require_clock(Family::Pit, self.0.frequency(instance)),
            prescaler: 1,
        }
    }

    fn event_pending(&self, instance: u8, channel: u8) -> bool {
        self.0.status_flag(instance, channel)
    }

    fn clear_event(&self, instance: u8, channel: u8) {
        self.0.clear_status_flag(instance, channel);
    }
}
