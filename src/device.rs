//! Silicon description: which timer instances exist and how their channels share interrupt vectors.
//!
//! The channel state table is sized for the largest part of every family
//! (see [`Family::max_instances`] and [`Family::max_channels`]); a
//! [`DeviceProfile`] narrows that down to what the selected part actually has.

use crate::instance::{Family, TimerInstance};

/// How the channels of one timer instance are wired to interrupt vectors.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VectorLayout {
    /// One vector per channel (`PIT_Ch0`, `STM0_Ch1`, `ETIMER0_TC2IR`, ...).
    PerChannel,
    /// One vector for every channel of the instance (`LPIT0`, `PIT_RTI0`, `FTM0_Ch0_7`, `STM1`).
    Shared,
    /// One vector per pair of consecutive channels (`FTM0_Ch0_Ch1`, `FTM0_Ch2_Ch3`, ...).
    Pairs,
    /// Channel 0 alone, the remaining channels on a second vector (`STM0_Ch0`, `STM0_Ch123`).
    FirstThenShared,
}

impl VectorLayout {
    /// The vector group serving `channel`.
    pub const fn group_of(self, channel: u8) -> u8 {
        match self {
            VectorLayout::PerChannel => channel,
            VectorLayout::Shared => 0,
            VectorLayout::Pairs => channel / 2,
            VectorLayout::FirstThenShared => {
                if channel == 0 {
                    0
                } else {
                    1
                }
            }
        }
    }

    /// Number of vectors an instance with `channels` channels uses.
    pub const fn group_count(self, channels: u8) -> u8 {
        match self {
            VectorLayout::PerChannel => channels,
            VectorLayout::Shared => 1,
            VectorLayout::Pairs => channels.div_ceil(2),
            VectorLayout::FirstThenShared => {
                if channels > 1 {
                    2
                } else {
                    1
                }
            }
        }
    }

    /// Bitmask of the channels served by vector `group`, limited to `channels` channels.
    pub const fn channel_mask(self, group: u8, channels: u8) -> u32 {
        let all = if channels >= 32 { u32::MAX } else { (1u32 << channels) - 1 };
        let mask = match self {
            VectorLayout::PerChannel => {
                if group < 32 {
                    1u32 << group
                } else {
                    0
                }
            }
            VectorLayout::Shared => {
                if group == 0 {
                    u32::MAX
                } else {
                    0
                }
            }
            VectorLayout::Pairs => {
                if group < 16 {
                    0b11u32 << (group * 2)
                } else {
                    0
                }
            }
            VectorLayout::FirstThenShared => match group {
                0 => 1,
                1 => !1,
                _ => 0,
            },
        };
        mask & all
    }
}

/// The instances and channels of one timer family on a given part.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FamilyProfile {
    /// Number of instances fitted.
    pub instances: u8,
    /// Number of channels per instance.
    pub channels: u8,
    /// Interrupt vector wiring of each instance.
    pub layout: VectorLayout,
}

impl FamilyProfile {
    /// Family not present on the part.
    pub const ABSENT: Self = Self {
        instances: 0,
        channels: 0,
        layout: VectorLayout::PerChannel,
    };

    /// Describes a fitted family.
    pub const fn new(instances: u8, channels: u8, layout: VectorLayout) -> Self {
        Self {
            instances,
            channels,
            layout,
        }
    }

    /// Whether this family is fitted at all.
    pub const fn is_present(&self) -> bool {
        self.instances > 0 && self.channels > 0
    }
}

/// Timer resources of one microcontroller part.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceProfile {
    /// LPIT resources.
    pub lpit: FamilyProfile,
    /// LPTMR resources.
    pub lptmr: FamilyProfile,
    /// FTM resources.
    pub ftm: FamilyProfile,
    /// PIT resources.
    pub pit: FamilyProfile,
    /// STM resources.
    pub stm: FamilyProfile,
    /// eTimer resources.
    pub etimer: FamilyProfile,
}

impl DeviceProfile {
    /// A part with no timers; start from here and fill in the fitted families.
    pub const EMPTY: Self = Self {
        lpit: FamilyProfile::ABSENT,
        lptmr: FamilyProfile::ABSENT,
        ftm: FamilyProfile::ABSENT,
        pit: FamilyProfile::ABSENT,
        stm: FamilyProfile::ABSENT,
        etimer: FamilyProfile::ABSENT,
    };

    /// MPC5748G: one PIT with sixteen channels, three STMs, each channel on its own vector.
    pub const MPC5748G: Self = Self {
        pit: FamilyProfile::new(1, 16, VectorLayout::PerChannel),
        stm: FamilyProfile::new(3, 4, VectorLayout::PerChannel),
        ..Self::EMPTY
    };

    /// MPC5744P: PIT, one STM and three eTimers.
    pub const MPC5744P: Self = Self {
        pit: FamilyProfile::new(1, 4, VectorLayout::PerChannel),
        stm: FamilyProfile::new(1, 4, VectorLayout::FirstThenShared),
        etimer: FamilyProfile::new(3, 6, VectorLayout::PerChannel),
        ..Self::EMPTY
    };

    /// S32K144: LPIT, LPTMR and four FTMs with paired channel vectors.
    pub const S32K144: Self = Self {
        lpit: FamilyProfile::new(1, 4, VectorLayout::PerChannel),
        lptmr: FamilyProfile::new(1, 1, VectorLayout::Shared),
        ftm: FamilyProfile::new(4, 8, VectorLayout::Pairs),
        ..Self::EMPTY
    };

    /// S32K116: LPIT and LPTMR behind single vectors, two FTMs with one vector each.
    pub const S32K116: Self = Self {
        lpit: FamilyProfile::new(1, 4, VectorLayout::Shared),
        lptmr: FamilyProfile::new(1, 1, VectorLayout::Shared),
        ftm: FamilyProfile::new(2, 8, VectorLayout::Shared),
        ..Self::EMPTY
    };

    /// The resources of `family`.
    pub const fn family(&self, family: Family) -> &FamilyProfile {
        match family {
            Family::Lpit => &self.lpit,
            Family::Lptmr => &self.lptmr,
            Family::Ftm => &self.ftm,
            Family::Pit => &self.pit,
            Family::Stm => &self.stm,
            Family::Etimer => &self.etimer,
        }
    }

    /// Whether `instance` is fitted on this part.
    pub const fn contains(&self, instance: TimerInstance) -> bool {
        (instance.index as usize) < self.family(instance.family).instances as usize
    }

    /// Checks every family against the capacity of the channel state table.
    ///
    /// Called from [`Timing::new`](crate::Timing::new), so an oversized
    /// profile in a `static` fails at compile time.
    pub const fn validate(&self) {
        let mut i = 0;
        while i < Family::ALL.len() {
            let family = Family::ALL[i];
            let profile = self.family(family);
            ::core::assert!(
                profile.instances as usize <= family.max_instances(),
                "more instances than the family supports"
            );
            ::core::assert!(
                profile.channels as usize <= family.max_channels(),
                "more channels than the family supports"
            );
            i += 1;
        }
    }
}
