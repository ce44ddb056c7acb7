//! FlexTimer Module.
//!
//! The counter runs freely from zero to its final value (`MOD`) and wraps.
//! Channels sit in output-compare mode; a channel "runs" while its match
//! interrupt is enabled, and each match moves the comparator one period on.

use super::{extension, require_clock, wrapping_compare, wrapping_elapsed, Backend, Clock, Snapshot, Target};
use crate::config::{Extension, FtmClockSource, FtmPrescaler, TimerConfig};
use crate::error::DriverError;
use crate::instance::Family;

/// Register-level FTM access.
pub trait FtmDriver: Sync {
    /// Enables the module with software synchronization, in output-compare mode.
    fn init(&self, instance: u8, clock: FtmClockSource, prescaler: FtmPrescaler) -> Result<(), DriverError>;

    /// Sets the counter final value and puts every channel in `channels` (bitmask)
    /// in toggle-on-match output compare with the comparator at `0xFFFF`.
    fn init_output_compare(&self, instance: u8, final_value: u16, channels: u32) -> Result<(), DriverError>;

    /// Disables the module.
    fn deinit(&self, instance: u8);

    /// Current counter value.
    fn counter(&self, instance: u8) -> u16;

    /// Counter final value.
    fn final_value(&self, instance: u8) -> u16;

    /// Comparator value of `channel`.
    fn compare(&self, instance: u8, channel: u8) -> u16;

    /// Writes the comparator of `channel`.
    fn set_compare(&self, instance: u8, channel: u8, value: u16);

    /// Enables the match interrupt of `channel`.
    fn enable_channel_interrupt(&self, instance: u8, channel: u8);

    /// Disables the match interrupt of `channel`.
    fn disable_channel_interrupt(&self, instance: u8, channel: u8);

    /// Whether the channel's event flag is set.
    fn channel_event(&self, instance: u8, channel: u8) -> bool;

    /// Clears the channel's event flag.
    fn clear_channel_event(&self, instance: u8, channel: u8);

    /// Counter clock after the prescaler, `None` if it is gated.
    fn frequency(&self, instance: u8) -> Option<u32>;
}

pub(crate) struct Ftm<'d>(pub(crate) &'d dyn FtmDriver);

impl Backend for Ftm<'_> {
    fn max_count(&self, extension: &Extension) -> u32 {
        match extension {
            Extension::Ftm(ext) => ext.final_value as u32,
            _ => Family::Ftm.max_count(),
        }
    }

    fn init_instance(&self, instance: u8, config: &TimerConfig<'_>) -> Result<(), DriverError> {
        let ext = extension!(config.extension, Ftm);
        let channels = config
            .channels
            .iter()
            .fold(0u32, |mask, ch| mask | (1 << ch.channel));
        self.0.init(instance, ext.clock_select, ext.prescaler)?;
        self.0.init_output_compare(instance, ext.final_value, channels)
    }

    fn deinit(&self, instance: u8) {
        self.0.deinit(instance);
    }

    fn start(&self, target: Target, period: u32) -> Option<u32> {
        let (instance, channel) = (target.instance, target.channel);
        let max = self.0.final_value(instance) as u32;
        assert!(period <= max, "FTM period beyond counter final value");

        // A match from init or from the previous period may still be flagged.
        self.0.clear_channel_event(instance, channel);
        let counter = self.0.counter(instance);
        let compare = wrapping_compare(counter as u32, period, max);
        self.0.set_compare(instance, channel, compare as u16);
        self.0.enable_channel_interrupt(instance, channel);
        Some(counter as u32)
    }

    fn stop(&self, target: Target) {
        self.0.disable_channel_interrupt(target.instance, target.channel);
    }

    fn elapsed(&self, target: Target, snapshot: Snapshot) -> u32 {
        let current = self.0.counter(target.instance) as u32;
        let max = self.0.final_value(target.instance) as u32;
        wrapping_elapsed(current, snapshot.reference, max)
    }

    fn clock(&self, instance: u8, _extension: &Extension) -> Clock {
        Clock {
            frequency: require_clock(Family::Ftm, self.0.frequency(instance)),
            prescaler: 1,
        }
    }

    fn event_pending(&self, instance: u8, channel: u8) -> bool {
        self.0.channel_event(instance, channel)
    }

    fn clear_event(&self, instance: u8, channel: u8) {
        self.0.clear_channel_event(instance, channel);
    }

    fn clears_before_callback(&self) -> bool {
        true
    }

    fn gated_by_running(&self) -> bool {
        true
    }

    fn rearm(&self, target: Target, period: u32) -> Option<u32> {
        let (instance, channel) = (target.instance, target.channel);
        let max = self.0.final_value(instance) as u32;
        let matched = self.0.compare(instance, channel) as u32;
        self.0.set_compare(instance, channel, wrapping_compare(matched, period, max) as u16);
        Some(matched)
    }
}
