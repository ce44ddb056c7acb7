//! Interrupt routing.
//!
//! A [`Vector`] names one hardware interrupt line by the timer channels it
//! serves. Which channels share a line is described by the instance's
//! [`VectorLayout`](crate::device::VectorLayout), so a single routine,
//! [`Timing::on_vector`], services every line of every family.

use crate::instance::{Family, TimerInstance};
use crate::Timing;

/// One timer interrupt line.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vector {
    /// Timer family.
    pub family: Family,
    /// Instance within the family.
    pub instance: u8,
    /// Channel group of the instance, see [`VectorLayout::group_of`](crate::device::VectorLayout::group_of).
    pub group: u8,
}

impl Vector {
    /// Names the line serving channel group `group` of `instance`.
    pub const fn new(instance: TimerInstance, group: u8) -> Self {
        Self {
            family: instance.family,
            instance: instance.index,
            group,
        }
    }

    /// The timer instance this line belongs to.
    pub const fn timer(&self) -> TimerInstance {
        TimerInstance::new(self.family, self.instance)
    }
}

/// Masks and unmasks timer interrupt lines at the interrupt controller.
pub trait InterruptControl: Sync {
    /// Unmasks `vector`. A request latched while it was masked is taken right away.
    fn enable(&self, vector: Vector);

    /// Masks `vector`.
    fn disable(&self, vector: Vector);
}

impl Timing<'_> {
    /// Services interrupt line `vector`.
    ///
    /// A line serving a single channel dispatches straight to it. A shared
    /// line first samples the event flag of every channel it serves, then
    /// dispatches each flagged channel in ascending order.
    pub fn on_vector(&self, vector: Vector) {
        let profile = self.profile().family(vector.family);
        if vector.instance >= profile.instances {
            warn!("timing: interrupt on unfitted {:?} instance {}", vector.family, vector.instance);
            return;
        }
        let Some(backend) = self.backend(vector.family) else {
            warn!("timing: interrupt on unbound {:?}", vector.family);
            return;
        };

        let instance = vector.timer();
        let mut channels = profile.layout.channel_mask(vector.group, profile.channels);
        if channels.count_ones() == 1 {
            self.on_channel_event(instance, channels.trailing_zeros() as u8);
            return;
        }

        let mut pending = 0u32;
        while channels != 0 {
            let channel = channels.trailing_zeros() as u8;
            channels &= channels - 1;
            if backend.event_pending(instance.index, channel) {
                pending |= 1 << channel;
            }
        }

        trace!("timing: {:?} pending {:x}", vector, pending);
        while pending != 0 {
            let channel = pending.trailing_zeros() as u8;
            pending &= pending - 1;
            self.on_channel_event(instance, channel);
        }
    }
}

/// Binds timer interrupt vectors to a [`Timing`] in a `static`.
///
/// Each entry emits an `extern "C"` handler with the given symbol name that
/// forwards to [`Timing::on_vector`].
///
/// ```rust,ignore
/// use timing_pal::{bind_interrupts, Family};
///
/// bind_interrupts!(TIMING => {
///     PIT_Ch0_IRQHandler => Pit 0 [0];
///     STM0_Ch0_IRQHandler => Stm 0 [0];
///     FTM0_Ch0_Ch1_IrqHandler => Ftm 0 [0];
/// });
/// ```
#[macro_export]
macro_rules! bind_interrupts {
    ($timing:path => { $($irq:ident => $family:ident $instance:literal [$group:literal];)* }) => {
        $(
            #[allow(non_snake_case)]
            #[no_mangle]
            unsafe extern "C" fn $irq() {
                $timing.on_vector($crate::irq::Vector::new(
                    $crate::TimerInstance::new($crate::Family::$family, $instance),
                    $group,
                ));
            }
        )*
    };
}

/// Binds one handler per channel, named `<prefix>_Ch<n>_IRQHandler`.
///
/// For instances whose layout is [`VectorLayout::PerChannel`](crate::device::VectorLayout::PerChannel).
///
/// ```rust,ignore
/// // PIT_Ch0_IRQHandler .. PIT_Ch3_IRQHandler
/// timing_pal::bind_channel_vectors!(TIMING => Pit 0 as PIT: [0, 1, 2, 3]);
/// ```
#[macro_export]
macro_rules! bind_channel_vectors {
    ($timing:path => $family:ident $instance:literal as $prefix:ident: [$($channel:literal),* $(,)?]) => {
        $crate::__paste::paste! {
            $(
                #[allow(non_snake_case)]
                #[no_mangle]
                unsafe extern "C" fn [<$prefix _Ch $channel _IRQHandler>]() {
                    $timing.on_vector($crate::irq::Vector::new(
                        $crate::TimerInstance::new($crate::Family::$family, $instance),
                        $channel,
                    ));
                }
            )*
        }
    };
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::sync::Mutex;
    use std::vec::Vec;

    use super::*;
    use crate::config::{ChannelConfig, Extension, FtmExtension, TimerConfig};
    use crate::mock::{arg, Board};

    static ORDER: Mutex<Vec<(u8, u8)>> = Mutex::new(Vec::new());

    struct Tag {
        board: u8,
        channel: u8,
    }

    fn record(arg: *mut ()) {
        let tag = unsafe { &*(arg as *const Tag) };
        ORDER.lock().unwrap().push((tag.board, tag.channel));
    }

    fn order_of(board: u8) -> Vec<u8> {
        ORDER
            .lock()
            .unwrap()
            .iter()
            .filter(|(b, _)| *b == board)
            .map(|(_, c)| *c)
            .collect()
    }

    fn tag(board: u8, channel: u8) -> *mut () {
        arg(std::boxed::Box::leak(std::boxed::Box::new(Tag { board, channel })))
    }

    #[test]
    fn shared_line_dispatches_flagged_channels_in_order() {
        let board = Board::leak();
        let timing = board.timing();
        let lpit = TimerInstance::lpit(0);
        let channels = [0, 1, 2, 3].map(|c| ChannelConfig::new(c).callback(record, tag(1, c)));
        timing.init(lpit, &TimerConfig::new(&channels, Extension::None)).unwrap();
        for channel in 0..4 {
            timing.start_channel(lpit, channel, 100);
        }

        board.lpit.raise(0, 3);
        board.lpit.raise(0, 1);
        board.lpit.clear_log();
        timing.on_vector(Vector::new(lpit, 0));
        assert_eq!(order_of(1), [1, 3]);
        assert_eq!(board.lpit.log(), ["clear 1", "clear 3"]);
    }

    #[test]
    fn pair_line_serves_only_its_two_channels() {
        let board = Board::leak();
        let timing = board.timing();
        let ftm = TimerInstance::ftm(1);
        let channels = [4, 5, 6].map(|c| ChannelConfig::new(c).callback(record, tag(2, c)));
        timing
            .init(ftm, &TimerConfig::new(&channels, Extension::Ftm(FtmExtension::default())))
            .unwrap();
        for channel in [4, 5, 6] {
            timing.start_channel(ftm, channel, 100);
        }

        for channel in [4, 5, 6] {
            board.ftm.raise(1, channel);
        }
        timing.on_vector(Vector::new(ftm, 2));
        assert_eq!(order_of(2), [4, 5]);
        assert!(board.ftm.chan(1, 6).flag);
    }

    #[test]
    fn per_channel_line_dispatches_directly() {
        let board = Board::leak();
        let timing = board.timing();
        let pit = TimerInstance::pit(1);
        let channels = [ChannelConfig::new(11).callback(record, tag(3, 11))];
        timing.init(pit, &TimerConfig::new(&channels, Extension::None)).unwrap();
        timing.start_channel(pit, 11, 100);

        board.pit.raise(1, 11);
        timing.on_vector(Vector::new(pit, 11));
        assert_eq!(order_of(3), [11]);
        assert_eq!(timing.event_count(pit, 11), 1);
    }

    #[test]
    fn first_then_shared_splits_channel_zero() {
        let board = Board::leak();
        let timing = board.timing();
        let stm = TimerInstance::stm(0);
        let channels = [0, 1, 2, 3].map(|c| ChannelConfig::new(c).callback(record, tag(4, c)));
        timing
            .init(stm, &TimerConfig::new(&channels, Extension::Stm(Default::default())))
            .unwrap();
        for channel in 0..4 {
            timing.start_channel(stm, channel, 100);
            board.stm.raise(0, channel);
        }

        timing.on_vector(Vector::new(stm, 1));
        assert_eq!(order_of(4), [1, 2, 3]);
        timing.on_vector(Vector::new(stm, 0));
        assert_eq!(order_of(4), [1, 2, 3, 0]);
    }

    #[test]
    fn stray_vectors_are_ignored() {
        let board = Board::leak();
        let timing = board.timing();
        timing.on_vector(Vector {
            family: Family::Pit,
            instance: 5,
            group: 0,
        });

        let drivers = crate::timing::Drivers {
            pit: Some(&board.pit),
            ..crate::timing::Drivers::NONE
        };
        let partial = Timing::new(crate::mock::PROFILE, drivers, &board.irq);
        board.etimer.raise(0, 0);
        partial.on_vector(Vector::new(TimerInstance::etimer(0), 0));
        assert!(board.etimer.chan(0, 0).flag);
    }

    #[test]
    fn vector_names_its_timer() {
        let vector = Vector::new(TimerInstance::ftm(3), 2);
        assert_eq!(vector.timer(), TimerInstance::ftm(3));
        assert_eq!((vector.family, vector.instance, vector.group), (Family::Ftm, 3, 2));
    }
}
