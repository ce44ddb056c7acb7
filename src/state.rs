//! Runtime state of every channel, in one flat table.

use core::cell::Cell;
use core::ptr;

use critical_section::CriticalSection;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::CriticalSectionMutex as Mutex;

use crate::config::{Callback, ChannelConfig, Extension, NotificationKind};
use crate::instance::{Family, TimerInstance};

const fn channel_slots(family: Family) -> usize {
    family.max_instances() * family.max_channels()
}

const fn channel_base(family: Family) -> usize {
    let mut base = 0;
    let mut i = 0;
    while i < family.index() {
        base += channel_slots(Family::ALL[i]);
        i += 1;
    }
    base
}

const fn instance_base(family: Family) -> usize {
    let mut base = 0;
    let mut i = 0;
    while i < family.index() {
        base += Family::ALL[i].max_instances();
        i += 1;
    }
    base
}

/// Channel slots across every family.
pub(crate) const CHANNEL_SLOTS: usize = channel_base(Family::Etimer) + channel_slots(Family::Etimer);
/// Instance slots across every family.
pub(crate) const INSTANCE_SLOTS: usize = instance_base(Family::Etimer) + Family::Etimer.max_instances();

/// Position of a channel in the table.
pub(crate) const fn channel_slot(instance: TimerInstance, channel: u8) -> usize {
    let family = instance.family;
    channel_base(family) + instance.index as usize * family.max_channels() + channel as usize
}

/// Position of an instance in the table.
pub(crate) const fn instance_slot(instance: TimerInstance) -> usize {
    instance_base(instance.family) + instance.index as usize
}

pub(crate) struct ChannelState {
    pub period: Cell<u32>,
    /// Counter value the current period is measured from.
    pub reference: Cell<u32>,
    pub kind: Cell<NotificationKind>,
    pub callback: Cell<Option<Callback>>,
    pub callback_arg: Cell<*mut ()>,
    pub notify: Cell<bool>,
    /// Set by start, cleared by stop and by a one-shot expiry.
    pub running: Cell<bool>,
    /// Serviced events since init, wrapping.
    pub events: Cell<u32>,
}

unsafe impl Send for ChannelState {}

impl ChannelState {
    pub const fn new() -> Self {
        Self {
            period: Cell::new(0),
            reference: Cell::new(0),
            kind: Cell::new(NotificationKind::Continuous),
            callback: Cell::new(None),
            callback_arg: Cell::new(ptr::null_mut()),
            notify: Cell::new(false),
            running: Cell::new(false),
            events: Cell::new(0),
        }
    }

    pub fn reset(&self) {
        self.period.set(0);
        self.reference.set(0);
        self.kind.set(NotificationKind::Continuous);
        self.callback.set(None);
        self.callback_arg.set(ptr::null_mut());
        self.notify.set(false);
        self.running.set(false);
        self.events.set(0);
    }

    pub fn configure(&self, config: &ChannelConfig) {
        self.kind.set(config.kind);
        self.callback.set(config.callback);
        self.callback_arg.set(config.callback_arg);
        self.notify.set(false);
    }

    pub fn status(&self) -> ChannelStatus {
        ChannelStatus {
            period: self.period.get(),
            reference: self.reference.get(),
            kind: self.kind.get(),
            has_callback: self.callback.get().is_some(),
            notification_enabled: self.notify.get(),
            running: self.running.get(),
        }
    }
}

pub(crate) struct InstanceState {
    pub initialized: Cell<bool>,
    /// Clocking the instance was last set up with.
    pub extension: Cell<Extension>,
}

impl InstanceState {
    const fn new(extension: Extension) -> Self {
        Self {
            initialized: Cell::new(false),
            extension: Cell::new(extension),
        }
    }
}

/// Every instance slot, uninitialized and clocked with its family's defaults.
const fn instance_defaults() -> [InstanceState; INSTANCE_SLOTS] {
    let mut states = [const { InstanceState::new(Extension::None) }; INSTANCE_SLOTS];
    let mut f = 0;
    while f < Family::ALL.len() {
        let family = Family::ALL[f];
        let mut i = 0;
        while i < family.max_instances() {
            states[instance_base(family) + i] = InstanceState::new(Extension::reset_for(family));
            i += 1;
        }
        f += 1;
    }
    states
}

/// Read-only snapshot of one channel's runtime state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelStatus {
    /// Period in ticks set by the last start.
    pub period: u32,
    /// Counter value the current period is measured from (free-running counters only).
    pub reference: u32,
    /// Notification kind.
    pub kind: NotificationKind,
    /// Whether a callback is installed.
    pub has_callback: bool,
    /// Whether events invoke the callback.
    pub notification_enabled: bool,
    /// Whether the channel generates events.
    pub running: bool,
}

impl ChannelStatus {
    /// State of a channel after init or deinit.
    pub const DEFAULT: Self = Self {
        period: 0,
        reference: 0,
        kind: NotificationKind::Continuous,
        has_callback: false,
        notification_enabled: false,
        running: false,
    };
}

/// Channel and instance state shared between foreground code and interrupt handlers.
pub(crate) struct ChannelTable {
    channels: Mutex<[ChannelState; CHANNEL_SLOTS]>,
    instances: Mutex<[InstanceState; INSTANCE_SLOTS]>,
}

impl ChannelTable {
    pub const fn new() -> Self {
        Self {
            channels: Mutex::const_new(
                CriticalSectionRawMutex::new(),
                [const { ChannelState::new() }; CHANNEL_SLOTS],
            ),
            instances: Mutex::const_new(CriticalSectionRawMutex::new(), instance_defaults()),
        }
    }

    pub fn channel<'cs>(&'cs self, cs: CriticalSection<'cs>, instance: TimerInstance, channel: u8) -> &'cs ChannelState {
        &self.channels.borrow(cs)[channel_slot(instance, channel)]
    }

    pub fn instance<'cs>(&'cs self, cs: CriticalSection<'cs>, instance: TimerInstance) -> &'cs InstanceState {
        &self.instances.borrow(cs)[instance_slot(instance)]
    }

    /// Returns every channel of `instance` to its defaults.
    pub fn reset(&self, cs: CriticalSection<'_>, instance: TimerInstance) {
        let base = channel_slot(instance, 0);
        let channels = self.channels.borrow(cs);
        for state in &channels[base..base + instance.family.max_channels()] {
            state.reset();
        }
    }
}
