//! `embedded-hal` count-down timer over one timing channel.

pub use embedded_hal_02::timer::{Cancel, CountDown, Periodic};
use void::Void;

use crate::error::Error;
use crate::instance::TimerInstance;
use crate::Timing;

/// One channel of a [`Timing`] driven through the `embedded-hal` 0.2 timer traits.
///
/// Time is counted in ticks of the instance's counter clock. Expiry is
/// observed through the channel's event counter, so the channel's interrupt
/// must be bound; [`wait`](CountDown::wait) never blocks.
pub struct ChannelTimer<'t, 'd> {
    timing: &'t Timing<'d>,
    instance: TimerInstance,
    channel: u8,
    seen: u32,
}

impl<'t, 'd> ChannelTimer<'t, 'd> {
    /// Wraps `channel` of `instance`. The instance must already be set up.
    pub fn new(timing: &'t Timing<'d>, instance: TimerInstance, channel: u8) -> Self {
        let seen = timing.event_count(instance, channel);
        Self {
            timing,
            instance,
            channel,
            seen,
        }
    }

    /// Ticks left before the next expiry.
    pub fn remaining(&self) -> u32 {
        self.timing.remaining(self.instance, self.channel)
    }
}

impl CountDown for ChannelTimer<'_, '_> {
    type Time = u32;

    fn start<T>(&mut self, count: T)
    where
        T: Into<Self::Time>,
    {
        self.seen = self.timing.event_count(self.instance, self.channel);
        self.timing.start_channel(self.instance, self.channel, count.into());
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        let events = self.timing.event_count(self.instance, self.channel);
        if events == self.seen {
            return Err(nb::Error::WouldBlock);
        }
        self.seen = self.seen.wrapping_add(1);
        Ok(())
    }
}

impl Periodic for ChannelTimer<'_, '_> {}

impl Cancel for ChannelTimer<'_, '_> {
    type Error = Error;

    fn cancel(&mut self) -> Result<(), Error> {
        if !self.timing.is_running(self.instance, self.channel) {
            return Err(Error::Idle);
        }
        self.timing.stop_channel(self.instance, self.channel);
        Ok(())
    }
}
