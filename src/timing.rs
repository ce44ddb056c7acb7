//! The uniform timing API over every timer family.

use crate::backend::etimer::Etimer;
use crate::backend::ftm::Ftm;
use crate::backend::lpit::Lpit;
use crate::backend::lptmr::Lptmr;
use crate::backend::pit::Pit;
use crate::backend::stm::Stm;
use crate::backend::{Backend, EtimerDriver, FtmDriver, LpitDriver, LptmrDriver, PitDriver, Snapshot, StmDriver, Target};
use crate::config::{Callback, Extension, NotificationKind, TimerConfig};
use crate::device::DeviceProfile;
use crate::error::{Error, Result};
use crate::instance::{Family, TimerInstance};
use crate::irq::{InterruptControl, Vector};
use crate::state::{ChannelStatus, ChannelTable};

/// Granularity of [`Timing::resolution`] and [`Timing::max_period`] results.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResolutionUnit {
    /// Seconds.
    Second,
    /// Milliseconds.
    Millisecond,
    /// Microseconds.
    Microsecond,
    /// Nanoseconds.
    Nanosecond,
}

impl ResolutionUnit {
    /// Units in one second.
    pub const fn per_second(self) -> u64 {
        match self {
            ResolutionUnit::Second => 1,
            ResolutionUnit::Millisecond => 1_000,
            ResolutionUnit::Microsecond => 1_000_000,
            ResolutionUnit::Nanosecond => 1_000_000_000,
        }
    }
}

/// Register-level drivers for the families in use. Families left `None` are unavailable.
#[derive(Copy, Clone)]
pub struct Drivers<'d> {
    /// LPIT driver.
    pub lpit: Option<&'d dyn LpitDriver>,
    /// LPTMR driver.
    pub lptmr: Option<&'d dyn LptmrDriver>,
    /// FTM driver.
    pub ftm: Option<&'d dyn FtmDriver>,
    /// PIT driver.
    pub pit: Option<&'d dyn PitDriver>,
    /// STM driver.
    pub stm: Option<&'d dyn StmDriver>,
    /// eTimer driver.
    pub etimer: Option<&'d dyn EtimerDriver>,
}

impl<'d> Drivers<'d> {
    /// No drivers bound.
    pub const NONE: Self = Self {
        lpit: None,
        lptmr: None,
        ftm: None,
        pit: None,
        stm: None,
        etimer: None,
    };
}

/// Timing driver.
///
/// Owns the runtime state of every timer channel and dispatches each call to
/// the adapter of the instance's family. Meant to live in a `static` shared by
/// foreground code and the interrupt handlers bound with
/// [`bind_interrupts!`](crate::bind_interrupts).
///
/// Foreground calls on one channel must not race each other; interrupt
/// handlers may preempt them at any point.
pub struct Timing<'d> {
    profile: DeviceProfile,
    lpit: Option<Lpit<'d>>,
    lptmr: Option<Lptmr<'d>>,
    ftm: Option<Ftm<'d>>,
    pit: Option<Pit<'d>>,
    stm: Option<Stm<'d>>,
    etimer: Option<Etimer<'d>>,
    interrupts: &'d dyn InterruptControl,
    table: ChannelTable,
}

impl<'d> Timing<'d> {
    /// Creates a timing driver for the part described by `profile`.
    pub const fn new(profile: DeviceProfile, drivers: Drivers<'d>, interrupts: &'d dyn InterruptControl) -> Self {
        profile.validate();
        Self {
            profile,
            lpit: match drivers.lpit {
                Some(d) => Some(Lpit(d)),
                None => None,
            },
            lptmr: match drivers.lptmr {
                Some(d) => Some(Lptmr(d)),
                None => None,
            },
            ftm: match drivers.ftm {
                Some(d) => Some(Ftm(d)),
                None => None,
            },
            pit: match drivers.pit {
                Some(d) => Some(Pit(d)),
                None => None,
            },
            stm: match drivers.stm {
                Some(d) => Some(Stm(d)),
                None => None,
            },
            etimer: match drivers.etimer {
                Some(d) => Some(Etimer(d)),
                None => None,
            },
            interrupts,
            table: ChannelTable::new(),
        }
    }

    /// The part this driver was created for.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub(crate) fn backend(&self, family: Family) -> Option<&dyn Backend> {
        match family {
            Family::Lpit => self.lpit.as_ref().map(|b| b as &dyn Backend),
            Family::Lptmr => self.lptmr.as_ref().map(|b| b as &dyn Backend),
            Family::Ftm => self.ftm.as_ref().map(|b| b as &dyn Backend),
            Family::Pit => self.pit.as_ref().map(|b| b as &dyn Backend),
            Family::Stm => self.stm.as_ref().map(|b| b as &dyn Backend),
            Family::Etimer => self.etimer.as_ref().map(|b| b as &dyn Backend),
        }
    }

    fn bound(&self, instance: TimerInstance) -> &dyn Backend {
        assert!(
            self.profile.contains(instance),
            "timer instance not fitted on this part"
        );
        match self.backend(instance.family) {
            Some(backend) => backend,
            None => panic!("no {:?} driver bound", instance.family),
        }
    }

    fn check_channel(&self, instance: TimerInstance, channel: u8) {
        assert!(
            self.profile.contains(instance),
            "timer instance not fitted on this part"
        );
        assert!(
            channel < self.profile.family(instance.family).channels,
            "channel out of range"
        );
    }

    fn vector(&self, instance: TimerInstance, channel: u8) -> Vector {
        let layout = self.profile.family(instance.family).layout;
        Vector::new(instance, layout.group_of(channel))
    }

    fn extension(&self, instance: TimerInstance) -> Extension {
        critical_section::with(|cs| self.table.instance(cs, instance).extension.get())
    }

    fn target(&self, instance: TimerInstance, channel: u8) -> Target {
        Target {
            instance: instance.index,
            channel,
            extension: self.extension(instance),
        }
    }

    /// Sets up `instance` and the channels listed in `config`.
    ///
    /// Every channel of the instance is first returned to its defaults. The
    /// configured channels are left idle with notification disabled and their
    /// interrupt lines unmasked; counting starts with [`start_channel`](Self::start_channel).
    ///
    /// Stops at the first channel the driver fails to set up and reports it.
    pub fn init(&self, instance: TimerInstance, config: &TimerConfig<'_>) -> Result<()> {
        let family = instance.family;
        if !self.profile.contains(instance) {
            return Err(Error::Range {
                family,
                index: instance.index,
            });
        }
        let backend = self.backend(family).ok_or(Error::NoDriver(family))?;
        if !config.extension.fits(family) {
            return Err(Error::ExtensionMismatch(family));
        }
        let channels = self.profile.family(family).channels;
        if let Some(bad) = config.channels.iter().find(|c| c.channel >= channels) {
            return Err(Error::ChannelRange { channel: bad.channel });
        }

        debug!("timing: init {:?} with {} channels", instance, config.channels.len());
        critical_section::with(|cs| {
            self.table.reset(cs, instance);
            let state = self.table.instance(cs, instance);
            state.initialized.set(false);
            state.extension.set(config.extension);
        });

        backend.init_instance(instance.index, config).map_err(|e| {
            warn!("timing: {:?} init failed: {:?}", instance, e);
            Error::Driver(e)
        })?;
        for channel in config.channels {
            backend
                .init_channel(instance.index, channel, &config.extension)
                .map_err(|error| {
                    warn!("timing: {:?} channel {} init failed: {:?}", instance, channel.channel, error);
                    Error::ChannelInit {
                        channel: channel.channel,
                        error,
                    }
                })?;
        }

        critical_section::with(|cs| {
            for channel in config.channels {
                self.table.channel(cs, instance, channel.channel).configure(channel);
            }
            self.table.instance(cs, instance).initialized.set(true);
        });
        for channel in config.channels {
            self.interrupts.enable(self.vector(instance, channel.channel));
        }
        Ok(())
    }

    /// Shuts `instance` down and returns all its channels to their defaults.
    ///
    /// Panics if the instance is not fitted or its family has no driver.
    pub fn deinit(&self, instance: TimerInstance) {
        let backend = self.bound(instance);
        debug!("timing: deinit {:?}", instance);

        let profile = self.profile.family(instance.family);
        for group in 0..profile.layout.group_count(profile.channels) {
            self.interrupts.disable(Vector::new(instance, group));
        }
        backend.deinit(instance.index);
        critical_section::with(|cs| {
            self.table.reset(cs, instance);
            let state = self.table.instance(cs, instance);
            state.initialized.set(false);
            state.extension.set(Extension::reset_for(instance.family));
        });
    }

    /// Whether `instance` has been set up by [`init`](Self::init) and not shut down since.
    pub fn is_initialized(&self, instance: TimerInstance) -> bool {
        self.profile.contains(instance)
            && critical_section::with(|cs| self.table.instance(cs, instance).initialized.get())
    }

    /// Arms `channel` to expire `ticks` counter ticks from now and enables its notification.
    ///
    /// On LPIT and PIT a channel that is already counting keeps its current
    /// period; the new one is loaded when it expires. Stop the channel first
    /// to restart it immediately.
    ///
    /// Panics if `ticks` exceeds the counter range of a 16-bit family (FTM
    /// against its final value).
    pub fn start_channel(&self, instance: TimerInstance, channel: u8, ticks: u32) {
        let backend = self.bound(instance);
        self.check_channel(instance, channel);
        let target = self.target(instance, channel);
        trace!("timing: start {:?} channel {} for {} ticks", instance, channel, ticks);

        critical_section::with(|cs| {
            let reference = backend.start(target, ticks);
            let state = self.table.channel(cs, instance, channel);
            if let Some(reference) = reference {
                state.reference.set(reference);
            }
            state.period.set(ticks);
            state.notify.set(true);
            state.running.set(true);
        });
    }

    /// Stops event generation on `channel` and disables its notification.
    ///
    /// The period and callback are kept. An event the hardware latched just
    /// before the stop is still delivered; on FTM it is discarded.
    pub fn stop_channel(&self, instance: TimerInstance, channel: u8) {
        let backend = self.bound(instance);
        self.check_channel(instance, channel);
        let target = self.target(instance, channel);
        trace!("timing: stop {:?} channel {}", instance, channel);

        critical_section::with(|cs| {
            backend.stop(target);
            let state = self.table.channel(cs, instance, channel);
            state.notify.set(false);
            state.running.set(false);
        });
    }

    fn snapshot(&self, instance: TimerInstance, channel: u8) -> Snapshot {
        critical_section::with(|cs| {
            let state = self.table.channel(cs, instance, channel);
            Snapshot {
                period: state.period.get(),
                reference: state.reference.get(),
            }
        })
    }

    /// Ticks elapsed in the current period of `channel`.
    ///
    /// Meaningless on a channel that was never started.
    pub fn elapsed(&self, instance: TimerInstance, channel: u8) -> u32 {
        let backend = self.bound(instance);
        self.check_channel(instance, channel);
        backend.elapsed(self.target(instance, channel), self.snapshot(instance, channel))
    }

    /// Ticks left in the current period of `channel`.
    ///
    /// On LPIT and PIT this is the live down counter, which can exceed the
    /// period while a shorter period is queued behind a running one.
    pub fn remaining(&self, instance: TimerInstance, channel: u8) -> u32 {
        let backend = self.bound(instance);
        self.check_channel(instance, channel);
        backend.remaining(self.target(instance, channel), self.snapshot(instance, channel))
    }

    /// Lets events on `channel` invoke its callback. Counting is not affected.
    pub fn enable_notification(&self, instance: TimerInstance, channel: u8) {
        self.set_notification(instance, channel, true);
    }

    /// Stops events on `channel` from invoking its callback. Counting is not
    /// affected and events are still acknowledged.
    pub fn disable_notification(&self, instance: TimerInstance, channel: u8) {
        self.set_notification(instance, channel, false);
    }

    fn set_notification(&self, instance: TimerInstance, channel: u8, enabled: bool) {
        self.bound(instance);
        self.check_channel(instance, channel);
        critical_section::with(|cs| self.table.channel(cs, instance, channel).notify.set(enabled));
    }

    /// Duration of one counter tick of `instance`, rounded to the nearest `unit`.
    ///
    /// Fails with [`Error::Resolution`] when a tick is shorter than half a `unit`.
    /// Panics if the instance's counter clock is not running.
    pub fn resolution(&self, instance: TimerInstance, unit: ResolutionUnit) -> Result<u64> {
        let backend = self.bound(instance);
        let clock = backend.clock(instance.index, &self.extension(instance));
        let frequency = clock.frequency as u64;

        let resolution = (unit.per_second() * clock.prescaler + (frequency >> 1)) / frequency;
        if resolution == 0 {
            debug!("timing: {:?} resolution below one {:?}", instance, unit);
            return Err(Error::Resolution);
        }
        Ok(resolution)
    }

    /// Longest period `instance` can count before its counter wraps, in `unit`.
    ///
    /// Nanoseconds are derived from the rounded tick duration; coarser units
    /// are scaled before rounding.
    pub fn max_period(&self, instance: TimerInstance, unit: ResolutionUnit) -> Result<u64> {
        let backend = self.bound(instance);
        let extension = self.extension(instance);
        let counts = backend.max_count(&extension) as u128 + 1;

        let max = if unit == ResolutionUnit::Nanosecond {
            self.resolution(instance, unit)? as u128 * counts
        } else {
            let clock = backend.clock(instance.index, &extension);
            let frequency = clock.frequency as u128;
            (unit.per_second() as u128 * clock.prescaler as u128 * counts + (frequency >> 1)) / frequency
        };
        if max == 0 {
            debug!("timing: {:?} max period below one {:?}", instance, unit);
            return Err(Error::Resolution);
        }
        Ok(u64::try_from(max).unwrap_or(u64::MAX))
    }

    /// Replaces the callback of `channel` and its argument.
    ///
    /// The channel's interrupt line is masked for the duration of the write,
    /// so a handler never sees the new callback with the old argument.
    pub fn install_callback(&self, instance: TimerInstance, channel: u8, callback: Option<Callback>, arg: *mut ()) {
        self.bound(instance);
        self.check_channel(instance, channel);
        let vector = self.vector(instance, channel);
        trace!("timing: install callback on {:?} channel {}", instance, channel);

        self.interrupts.disable(vector);
        critical_section::with(|cs| {
            let state = self.table.channel(cs, instance, channel);
            state.callback.set(callback);
            state.callback_arg.set(arg);
        });
        self.interrupts.enable(vector);
    }

    /// Whether `channel` generates events.
    pub fn is_running(&self, instance: TimerInstance, channel: u8) -> bool {
        self.check_channel(instance, channel);
        critical_section::with(|cs| self.table.channel(cs, instance, channel).running.get())
    }

    /// Whether events on `channel` invoke its callback.
    pub fn notification_enabled(&self, instance: TimerInstance, channel: u8) -> bool {
        self.check_channel(instance, channel);
        critical_section::with(|cs| self.table.channel(cs, instance, channel).notify.get())
    }

    /// Snapshot of the runtime state of `channel`.
    pub fn channel_status(&self, instance: TimerInstance, channel: u8) -> ChannelStatus {
        self.check_channel(instance, channel);
        critical_section::with(|cs| self.table.channel(cs, instance, channel).status())
    }

    /// Events serviced on `channel` since its instance was set up. Wraps on overflow.
    pub fn event_count(&self, instance: TimerInstance, channel: u8) -> u32 {
        self.check_channel(instance, channel);
        critical_section::with(|cs| self.table.channel(cs, instance, channel).events.get())
    }

    /// Services an expiry of `channel`. Called from interrupt context.
    ///
    /// Runs the callback if one is installed and notification is enabled,
    /// then stops a one-shot channel or re-arms a continuous one, and
    /// acknowledges the event flag. FTM and eTimer acknowledge before the
    /// callback. An FTM event on a stopped channel is acknowledged and dropped.
    pub fn on_channel_event(&self, instance: TimerInstance, channel: u8) {
        let backend = self.bound(instance);
        self.check_channel(instance, channel);
        let (index, early_clear) = (instance.index, backend.clears_before_callback());

        let (callback, arg, running) = critical_section::with(|cs| {
            let state = self.table.channel(cs, instance, channel);
            let callback = if state.notify.get() { state.callback.get() } else { None };
            (callback, state.callback_arg.get(), state.running.get())
        });
        if backend.gated_by_running() && !running {
            trace!("timing: spurious event on {:?} channel {}", instance, channel);
            backend.clear_event(index, channel);
            return;
        }

        if early_clear {
            backend.clear_event(index, channel);
        }
        if let Some(callback) = callback {
            callback(arg);
        }

        let target = self.target(instance, channel);
        critical_section::with(|cs| {
            let state = self.table.channel(cs, instance, channel);
            match state.kind.get() {
                NotificationKind::OneShot => {
                    backend.stop(target);
                    state.running.set(false);
                }
                // The callback may have stopped the channel.
                NotificationKind::Continuous if state.running.get() => {
                    if let Some(reference) = backend.rearm(target, state.period.get()) {
                        state.reference.set(reference);
                    }
                }
                NotificationKind::Continuous => {}
            }
            state.events.set(state.events.get().wrapping_add(1));
        });
        if !early_clear {
            backend.clear_event(index, channel);
        }
    }
}
