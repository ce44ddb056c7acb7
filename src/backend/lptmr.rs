//! Low Power Timer.
//!
//! A single 16-bit up counter per instance that resets on compare match.
//! Its count is the elapsed time of the current period.

use super::{extension, require_clock, Backend, Clock, Snapshot, Target};
use crate::config::{Extension, LptmrClockSource, LptmrExtension, TimerConfig};
use crate::error::DriverError;
use crate::instance::Family;

/// Register-level LPTMR access.
pub trait LptmrDriver: Sync {
    /// Configures the timer: time-counter mode, reset on compare, compare value 0,
    /// compare interrupt enabled, counter stopped.
    fn init(&self, instance: u8, config: &LptmrExtension);

    /// Disables the timer.
    fn deinit(&self, instance: u8);

    /// Writes the compare value.
    fn set_compare(&self, instance: u8, ticks: u16);

    /// Enables counting.
    fn start_counter(&self, instance: u8);

    /// Disables counting. The counter resets to zero.
    fn stop_counter(&self, instance: u8);

    /// Current counter value.
    fn counter(&self, instance: u8) -> u16;

    /// Whether the compare flag is set.
    fn compare_flag(&self, instance: u8) -> bool;

    /// Clears the compare flag.
    fn clear_compare_flag(&self, instance: u8);

    /// Frequency of `source`, `None` if it is gated.
    fn source_frequency(&self, instance: u8, source: LptmrClockSource) -> Option<u32>;
}

pub(crate) struct Lptmr<'d>(pub(crate) &'d dyn LptmrDriver);

impl Backend for Lptmr<'_> {
    fn max_count(&self, _extension: &Extension) -> u32 {
        Family::Lptmr.max_count()
    }

    fn init_instance(&self, instance: u8, config: &TimerConfig<'_>) -> Result<(), DriverError> {
        let ext = extension!(config.extension, Lptmr);
        self.0.init(instance, &ext);
        Ok(())
    }

    fn deinit(&self, instance: u8) {
        self.0.deinit(instance);
    }

    fn start(&self, target: Target, period: u32) -> Option<u32> {
        assert!(period <= Family::Lptmr.max_count(), "LPTMR period out of range");
        self.0.stop_counter(target.instance);
        self.0.set_compare(target.instance, period as u16);
        self.0.start_counter(target.instance);
        None
    }

    fn stop(&self, target: Target) {
        self.0.stop_counter(target.instance);
    }

    fn elapsed(&self, target: Target, _snapshot: Snapshot) -> u32 {
        self.0.counter(target.instance) as u32
    }

    fn clock(&self, instance: u8, extension: &Extension) -> Clock {
        let ext = extension!(*extension, Lptmr);
        Clock {
            frequency: require_clock(Family::Lptmr, self.0.source_frequency(instance, ext.clock_select)),
            prescaler: ext.divider(),
        }
    }

    fn event_pending(&self, instance: u8, _channel: u8) -> bool {
        self.0.compare_flag(instance)
    }

    fn clear_event(&self, instance: u8, _channel: u8) {
        self.0.clear_compare_flag(instance);
    }
}
