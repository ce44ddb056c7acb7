//! Low Power Interrupt Timer.
//!
//! Each channel is a 32-bit down counter that reloads its period on expiry,
//! so a period written while the channel runs takes effect on the next reload.

use super::{require_clock, Backend, Clock, Snapshot, Target};
use crate::config::{ChannelConfig, Extension, TimerConfig};
use crate::error::DriverError;
use crate::instance::Family;

/// Register-level LPIT access.
pub trait LpitDriver: Sync {
    /// Enables the module. The counters keep running while the core is halted
    /// by a debugger when `run_in_debug` is set, and in doze mode when `run_in_doze` is set.
    fn init(&self, instance: u8, run_in_debug: bool, run_in_doze: bool);

    /// Sets up `channel` as a periodic counter with its interrupt enabled.
    fn init_channel(&self, instance: u8, channel: u8) -> Result<(), DriverError>;

    /// Disables the module.
    fn deinit(&self, instance: u8);

    /// Writes the reload value of `channel`.
    fn set_period(&self, instance: u8, channel: u8, ticks: u32);

    /// Starts every channel set in `mask`.
    fn start_channels(&self, instance: u8, mask: u32);

    /// Stops every channel set in `mask`.
    fn stop_channels(&self, instance: u8, mask: u32);

    /// Current value of the channel's down counter.
    fn current_count(&self, instance: u8, channel: u8) -> u32;

    /// Whether the channel's timeout flag is set.
    fn interrupt_flag(&self, instance: u8, channel: u8) -> bool;

    /// Clears the channel's timeout flag.
    fn clear_interrupt_flag(&self, instance: u8, channel: u8);

    /// Functional clock of the instance, `None` if it is gated.
    fn frequency(&self, instance: u8) -> Option<u32>;
}

pub(crate) struct Lpit<'d>(pub(crate) &'d dyn LpitDriver);

impl Backend for Lpit<'_> {
    fn max_count(&self, _extension: &Extension) -> u32 {
        Family::Lpit.max_count()
    }

    fn init_instance(&self, instance: u8, _config: &TimerConfig<'_>) -> Result<(), DriverError> {
        self.0.init(instance, true, true);
        Ok(())
    }

    fn init_channel(&self, instance: u8, channel: &ChannelConfig, _extension: &Extension) -> Result<(), DriverError> {
        self.0.init_channel(instance, channel.channel)
    }

    fn deinit(&self, instance: u8) {
        self.0.deinit(instance);
    }

    fn start(&self, target: Target, period: u32) -> Option<u32> {
        self.0.set_period(target.instance, target.channel, period);
        self.0.start_channels(target.instance, 1 << target.channel);
        None
    }

    fn stop(&self, target: Target) {
        self.0.stop_channels(target.instance, 1 << target.channel);
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
            frequency: require_clock(Family::Lpit, self.0.frequency(instance)),
            prescaler: 1,
        }
    }

    fn event_pending(&self, instance: u8, channel: u8) -> bool {
        self.0.interrupt_flag(instance, channel)
    }

    fn clear_event(&self, instance: u8, channel: u8) {
        self.0.clear_interrupt_flag(instance, channel);
    }
}
