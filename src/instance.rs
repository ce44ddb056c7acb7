//! Timer families and instance identifiers.

/// The timer peripheral families multiplexed behind [`Timing`](crate::Timing).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Family {
    /// Low Power Interrupt Timer. 32-bit reload counters.
    Lpit,
    /// Low Power Timer. Single 16-bit counter with compare.
    Lptmr,
    /// FlexTimer Module. 16-bit free-running counter, output compare channels.
    Ftm,
    /// Periodic Interrupt Timer. 32-bit reload counters.
    Pit,
    /// System Timer Module. 32-bit free-running counter, compare channels.
    Stm,
    /// Enhanced Motor Control Timer. 16-bit per-channel counters.
    Etimer,
}

impl Family {
    /// Every family, in dispatch-table order.
    pub const ALL: [Family; 6] = [
        Family::Lpit,
        Family::Lptmr,
        Family::Ftm,
        Family::Pit,
        Family::Stm,
        Family::Etimer,
    ];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Largest number of instances of this family on any supported part.
    pub const fn max_instances(self) -> usize {
        match self {
            Family::Lpit => 1,
            Family::Lptmr => 1,
            Family::Ftm => 8,
            Family::Pit => 2,
            Family::Stm => 3,
            Family::Etimer => 3,
        }
    }

    /// Largest number of channels per instance of this family on any supported part.
    pub const fn max_channels(self) -> usize {
        match self {
            Family::Lpit => 4,
            Family::Lptmr => 1,
            Family::Ftm => 8,
            Family::Pit => 16,
            Family::Stm => 4,
            Family::Etimer => 8,
        }
    }

    /// Largest value the family's counter or comparator can hold.
    pub const fn max_count(self) -> u32 {
        match self {
            Family::Lpit | Family::Pit | Family::Stm => u32::MAX,
            Family::Lptmr | Family::Ftm | Family::Etimer => u16::MAX as u32,
        }
    }
}

/// One physical timer peripheral: a family and the 0-based unit number within it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerInstance {
    /// Timer family.
    pub family: Family,
    /// Unit number within the family.
    pub index: u8,
}

impl TimerInstance {
    /// Creates an instance identifier.
    pub const fn new(family: Family, index: u8) -> Self {
        Self { family, index }
    }

    /// LPIT unit `index`.
    pub const fn lpit(index: u8) -> Self {
        Self::new(Family::Lpit, index)
    }

    /// LPTMR unit `index`.
    pub const fn lptmr(index: u8) -> Self {
        Self::new(Family::Lptmr, index)
    }

    /// FTM unit `index`.
    pub const fn ftm(index: u8) -> Self {
        Self::new(Family::Ftm, index)
    }

    /// PIT unit `index`.
    pub const fn pit(index: u8) -> Self {
        Self::new(Family::Pit, index)
    }

    /// STM unit `index`.
    pub const fn stm(index: u8) -> Self {
        Self::new(Family::Stm, index)
    }

    /// eTimer unit `index`.
    pub const fn etimer(index: u8) -> Self {
        Self::new(Family::Etimer, index)
    }
}
