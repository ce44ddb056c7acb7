//! System Timer Module.
//!
//! One 32-bit free-running counter per instance shared by all channels;
//! each channel fires when the counter equals its comparator.

use super::{extension, require_clock, wrapping_compare, wrapping_elapsed, Backend, Clock, Snapshot, Target};
use crate::config::{Extension, StmClockSource, StmExtension, TimerConfig};
use crate::error::DriverError;
use crate::instance::Family;

/// Register-level STM access.
pub trait StmDriver: Sync {
    /// Configures the module clock and prescaler, sets the counter to zero.
    /// The counter freezes while a debugger halts the core when `stop_in_debug` is set.
    fn init(&self, instance: u8, config: &StmExtension, stop_in_debug: bool);

    /// Disables the module.
    fn deinit(&self, instance: u8);

    /// Current counter value.
    fn counter(&self, instance: u8) -> u32;

    /// Enables counting.
    fn start_timer(&self, instance: u8);

    /// Writes the comparator of `channel` and enables the channel.
    fn configure_channel(&self, instance: u8, channel: u8, compare: u32);

    /// Comparator value of `channel`.
    fn compare(&self, instance: u8, channel: u8) -> u32;

    /// Writes the comparator of `channel` without touching its enable bit.
    fn set_compare(&self, instance: u8, channel: u8, compare: u32);

    /// Disables `channel`.
    fn disable_channel(&self, instance: u8, channel: u8);

    /// Whether the channel's interrupt flag is set.
    fn channel_flag(&self, instance: u8, channel: u8) -> bool;

    /// Clears the channel's interrupt flag.
    fn clear_channel_flag(&self, instance: u8, channel: u8);

    /// Frequency of `source`, `None` if it is gated.
    fn source_frequency(&self, instance: u8, source: StmClockSource) -> Option<u32>;
}

pub(crate) struct Stm<'d>(pub(crate) &'d dyn StmDriver);

impl Backend for Stm<'_> {
    fn max_count(&self, _extension: &Extension) -> u32 {
        Family::Stm.max_count()
    }

    fn init_instance(&self, instance: u8, config: &TimerConfig<'_>) -> Result<(), DriverError> {
        let ext = extension!(config.extension, Stm);
        self.0.init(instance, &ext, true);
        Ok(())
    }

    fn deinit(&self, instance: u8) {
        self.0.deinit(instance);
    }

    fn start(&self, target: Target, period: u32) -> Option<u32> {
        let (instance, channel) = (target.instance, target.channel);
        let counter = self.0.counter(instance);
        let compare = wrapping_compare(counter, period, Family::Stm.max_count());
        self.0.configure_channel(instance, channel, compare);
        self.0.start_timer(instance);
        Some(counter)
    }

    fn stop(&self, target: Target) {
        self.0.disable_channel(target.instance, target.channel);
    }

    fn elapsed(&self, target: Target, snapshot: Snapshot) -> u32 {
        let current = self.0.counter(target.instance);
        wrapping_elapsed(current, snapshot.reference, Family::Stm.max_count())
    }

    fn clock(&self, instance: u8, extension: &Extension) -> Clock {
        let ext = extension!(*extension, Stm);
        Clock {
            frequency: require_clock(Family::Stm, self.0.source_frequency(instance, ext.clock_select)),
            prescaler: ext.divider(),
        }
    }

    fn event_pending(&self, instance: u8, channel: u8) -> bool {
        self.0.channel_flag(instance, channel)
    }

    fn clear_event(&self, instance: u8, channel: u8) {
        self.0.clear_channel_flag(instance, channel);
    }

    fn rearm(&self, target: Target, period: u32) -> Option<u32> {
        let (instance, channel) = (target.instance, target.channel);
        let matched = self.0.compare(instance, channel);
        self.0.set_compare(instance, channel, matched.wrapping_add(period));
        Some(matched)
    }
}
