//! Instance and channel configuration.

use core::ptr;

use crate::instance::Family;

/// Function invoked from interrupt context when a channel's period expires.
///
/// The argument is the opaque pointer registered alongside the callback.
pub type Callback = fn(*mut ());

/// Whether a channel fires once or every period.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotificationKind {
    /// Fire once, then stop generating events.
    OneShot,
    /// Fire every period until stopped.
    #[default]
    Continuous,
}

/// Per-channel configuration applied by [`Timing::init`](crate::Timing::init).
#[derive(Debug, Copy, Clone)]
pub struct ChannelConfig {
    /// Hardware channel number.
    pub channel: u8,
    /// Notification kind, fixed until the instance is deinitialized.
    pub kind: NotificationKind,
    /// Callback run on every event while notification is enabled.
    pub callback: Option<Callback>,
    /// Argument handed to `callback`.
    pub callback_arg: *mut (),
}

// The callback argument is opaque to this crate; it is only handed back to the callback.
unsafe impl Send for ChannelConfig {}
unsafe impl Sync for ChannelConfig {}

impl ChannelConfig {
    /// A continuous channel without a callback.
    pub const fn new(channel: u8) -> Self {
        Self {
            channel,
            kind: NotificationKind::Continuous,
            callback: None,
            callback_arg: ptr::null_mut(),
        }
    }

    /// Sets the notification kind.
    pub const fn kind(mut self, kind: NotificationKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the callback and its argument.
    pub const fn callback(mut self, callback: Callback, arg: *mut ()) -> Self {
        self.callback = Some(callback);
        self.callback_arg = arg;
        self
    }
}

/// Configuration of one timer instance.
#[derive(Debug, Copy, Clone)]
pub struct TimerConfig<'a> {
    /// Channels to set up. Channels not listed stay unconfigured.
    pub channels: &'a [ChannelConfig],
    /// Family-specific clocking parameters.
    pub extension: Extension,
}

impl<'a> TimerConfig<'a> {
    /// Creates a configuration for `channels` with family-specific `extension`.
    pub const fn new(channels: &'a [ChannelConfig], extension: Extension) -> Self {
        Self { channels, extension }
    }
}

/// Family-specific clocking parameters.
///
/// LPIT and PIT take their clock straight from the clock tree and need none.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Extension {
    /// No parameters (LPIT, PIT).
    #[default]
    None,
    /// LPTMR clock selection.
    Lptmr(LptmrExtension),
    /// FTM clock selection and counter modulo.
    Ftm(FtmExtension),
    /// STM clock selection.
    Stm(StmExtension),
    /// eTimer input selection.
    Etimer(EtimerExtension),
}

impl Extension {
    /// Whether this extension is the one `family` needs.
    pub const fn fits(&self, family: Family) -> bool {
        matches!(
            (family, self),
            (Family::Lpit, Extension::None)
                | (Family::Pit, Extension::None)
                | (Family::Lptmr, Extension::Lptmr(_))
                | (Family::Ftm, Extension::Ftm(_))
                | (Family::Stm, Extension::Stm(_))
                | (Family::Etimer, Extension::Etimer(_))
        )
    }

    /// Clocking an instance falls back to after deinitialization.
    pub(crate) const fn reset_for(family: Family) -> Self {
        match family {
            Family::Lptmr => Extension::Lptmr(LptmrExtension::DEFAULT),
            Family::Stm => Extension::Stm(StmExtension::DEFAULT),
            _ => Extension::None,
        }
    }
}

/// LPTMR counter clock.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LptmrClockSource {
    /// SIRC divided by two.
    #[default]
    Sircdiv2,
    /// 1 kHz low power oscillator.
    Lpo1k,
    /// RTC clock.
    Rtc,
    /// Clock selected in the peripheral clock controller.
    Pcc,
}

/// LPTMR prescaler. Divides the counter clock by `2^(n+1)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum LptmrPrescaler {
    #[default]
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
    Div256,
    Div512,
    Div1024,
    Div2048,
    Div4096,
    Div8192,
    Div16384,
    Div32768,
    Div65536,
}

impl LptmrPrescaler {
    /// Clock divider.
    pub const fn divider(self) -> u64 {
        1u64 << (self as u32 + 1)
    }
}

/// LPTMR clocking.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LptmrExtension {
    /// Counter clock source.
    pub clock_select: LptmrClockSource,
    /// Prescaler, ignored when `bypass_prescaler` is set.
    pub prescaler: LptmrPrescaler,
    /// Count the source clock directly.
    pub bypass_prescaler: bool,
}

impl LptmrExtension {
    const DEFAULT: Self = Self {
        clock_select: LptmrClockSource::Sircdiv2,
        prescaler: LptmrPrescaler::Div2,
        bypass_prescaler: false,
    };

    /// Effective clock divider.
    pub const fn divider(&self) -> u64 {
        if self.bypass_prescaler {
            1
        } else {
            self.prescaler.divider()
        }
    }
}

/// FTM counter clock.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FtmClockSource {
    /// System clock.
    #[default]
    System,
    /// Fixed frequency clock.
    Fixed,
    /// External clock.
    External,
}

/// FTM prescaler. Divides the counter clock by `2^n`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum FtmPrescaler {
    #[default]
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
}

/// FTM clocking and counter range.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FtmExtension {
    /// Counter clock source.
    pub clock_select: FtmClockSource,
    /// Counter prescaler.
    pub prescaler: FtmPrescaler,
    /// Counter final value (`MOD`). The counter wraps to zero after it.
    pub final_value: u16,
}

impl Default for FtmExtension {
    fn default() -> Self {
        Self {
            clock_select: FtmClockSource::System,
            prescaler: FtmPrescaler::Div1,
            final_value: u16::MAX,
        }
    }
}

/// STM counter clock.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StmClockSource {
    /// Module system clock.
    #[default]
    System,
    /// Fast external crystal oscillator.
    Fxosc,
}

/// STM clocking.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StmExtension {
    /// Counter clock source.
    pub clock_select: StmClockSource,
    /// Prescaler register value. The clock is divided by `prescaler + 1`.
    pub prescaler: u8,
}

impl StmExtension {
    const DEFAULT: Self = Self {
        clock_select: StmClockSource::System,
        prescaler: 0,
    };

    /// Effective clock divider.
    pub const fn divider(&self) -> u64 {
        self.prescaler as u64 + 1
    }
}

/// eTimer primary input: the instance clock through a divider.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum EtimerInputSource {
    #[default]
    ClkDiv1,
    ClkDiv2,
    ClkDiv4,
    ClkDiv8,
    ClkDiv16,
    ClkDiv32,
    ClkDiv64,
    ClkDiv128,
}

impl EtimerInputSource {
    /// Clock divider.
    pub const fn divider(self) -> u64 {
        1u64 << (self as u32)
    }
}

/// eTimer clocking.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EtimerExtension {
    /// Primary counter input.
    pub input: EtimerInputSource,
}
