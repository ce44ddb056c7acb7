//! Enhanced Motor Control Timer.
//!
//! Every channel owns a 16-bit counter that counts up to its first comparator
//! and reloads; the tick register reads as the elapsed time of the period.

use super::{extension, require_clock, Backend, Clock, Snapshot, Target};
use crate::config::{ChannelConfig, EtimerInputSource, Extension, TimerConfig};
use crate::error::DriverError;
use crate::instance::Family;

/// Register-level eTimer access.
pub trait EtimerDriver: Sync {
    /// Enables the module.
    fn init(&self, instance: u8);

    /// Sets up `channel`: counts `input` up to comparator 1 then reloads
    /// (count length, repeating), interrupt on comparator 1, halted in debug.
    fn init_channel(&self, instance: u8, channel: u8, input: EtimerInputSource) -> Result<(), DriverError>;

    /// Disables the module.
    fn deinit(&self, instance: u8);

    /// Writes both comparators of `channel`.
    fn set_compare_threshold(&self, instance: u8, channel: u8, compare1: u16, compare2: u16);

    /// Writes the counter of `channel`.
    fn set_ticks(&self, instance: u8, channel: u8, ticks: u16);

    /// Counter of `channel`.
    fn ticks(&self, instance: u8, channel: u8) -> u16;

    /// Starts every channel set in `mask`.
    fn start_channels(&self, instance: u8, mask: u16);

    /// Stops every channel set in `mask`.
    fn stop_channels(&self, instance: u8, mask: u16);

    /// Whether the channel's comparator 1 flag is set.
    fn compare_flag(&self, instance: u8, channel: u8) -> bool;

    /// Clears the channel's comparator 1 flag.
    fn clear_compare_flag(&self, instance: u8, channel: u8);

    /// Module clock, `None` if it is gated.
    fn frequency(&self, instance: u8) -> Option<u32>;
}

pub(crate) struct Etimer<'d>(pub(crate) &'d dyn EtimerDriver);

impl Backend for Etimer<'_> {
    fn max_count(&self, _extension: &Extension) -> u32 {
        Family::Etimer.max_count()
    }

    fn init_instance(&self, instance: u8, _config: &TimerConfig<'_>) -> Result<(), DriverError> {
        self.0.init(instance);
        Ok(())
    }

    fn init_channel(&self, instance: u8, channel: &ChannelConfig, extension: &Extension) -> Result<(), DriverError> {
        let ext = extension!(*extension, Etimer);
        self.0.init_channel(instance, channel.channel, ext.input)
    }

    fn deinit(&self, instance: u8) {
        self.0.deinit(instance);
    }

    fn start(&self, target: Target, period: u32) -> Option<u32> {
        assert!(period <= Family::Etimer.max_count(), "eTimer period out of range");
        let (instance, channel) = (target.instance, target.channel);
        self.0.set_compare_threshold(instance, channel, period as u16, u16::MAX);
        self.0.set_ticks(instance, channel, 0);
        self.0.start_channels(instance, 1 << channel);
        None
    }

    fn stop(&self, target: Target) {
        self.0.stop_channels(target.instance, 1 << target.channel);
    }

    fn elapsed(&self, target: Target, _snapshot: Snapshot) -> u32 {
        self.0.ticks(target.instance, target.channel) as u32
    }

    fn clock(&self, instance: u8, extension: &Extension) -> Clock {
        let ext = extension!(*extension, Etimer);
        Clock {
            frequency: require_clock(Family::Etimer, self.0.frequency(instance)),
            prescaler: ext.input.divider(),
        }
    }

    fn event_pending(&self, instance: u8, channel: u8) -> bool {
        self.0.compare_flag(instance, channel)
    }

    fn clear_event(&self, instance: u8, channel: u8) {
        self.0.clear_compare_flag(instance, channel);
    }

    fn clears_before_callback(&self) -> bool {
        true
    }
}
