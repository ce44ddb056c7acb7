//! Simulated timer peripherals and interrupt controller for host tests.

extern crate std;

use std::boxed::Box;
use std::string::String;
use std::sync::{Mutex, MutexGuard};
use std::vec::Vec;
use std::format;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::backend::{EtimerDriver, FtmDriver, LpitDriver, LptmrDriver, PitDriver, StmDriver};
use crate::config::{EtimerInputSource, FtmClockSource, FtmPrescaler, LptmrClockSource, LptmrExtension, StmClockSource, StmExtension};
use crate::device::{DeviceProfile, FamilyProfile, VectorLayout};
use crate::error::DriverError;
use crate::irq::{InterruptControl, Vector};
use crate::timing::{Drivers, Timing};

/// Every family fitted, with every vector layout represented.
pub const PROFILE: DeviceProfile = DeviceProfile {
    lpit: FamilyProfile::new(1, 4, VectorLayout::Shared),
    lptmr: FamilyProfile::new(1, 1, VectorLayout::Shared),
    ftm: FamilyProfile::new(2, 8, VectorLayout::Pairs),
    pit: FamilyProfile::new(2, 16, VectorLayout::PerChannel),
    stm: FamilyProfile::new(3, 4, VectorLayout::FirstThenShared),
    etimer: FamilyProfile::new(3, 6, VectorLayout::PerChannel),
};

#[derive(Debug, Default, Copy, Clone)]
pub struct Chan {
    pub configured: bool,
    pub period: u32,
    pub count: u32,
    pub compare: u32,
    pub compare2: u32,
    pub running: bool,
    pub irq: bool,
    pub flag: bool,
    pub starts: u32,
}

#[derive(Debug, Default, Copy, Clone)]
pub struct Unit {
    pub initialized: bool,
    pub counter: u32,
    pub final_value: u16,
    pub counting: bool,
    pub channels: [Chan; 16],
}

#[derive(Debug, Default)]
pub struct Hw {
    pub units: [Unit; 8],
    pub frequency: Option<u32>,
    pub fail_init: Option<DriverError>,
    pub fail_channels: Vec<u8>,
    pub log: Vec<String>,
}

/// One simulated peripheral family.
pub struct MockTimer {
    hw: Mutex<Hw>,
}

impl MockTimer {
    pub fn new(frequency: u32) -> Self {
        Self {
            hw: Mutex::new(Hw {
                frequency: Some(frequency),
                ..Hw::default()
            }),
        }
    }

    pub fn hw(&self) -> MutexGuard<'_, Hw> {
        self.hw.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn chan(&self, instance: u8, channel: u8) -> Chan {
        self.hw().units[instance as usize].channels[channel as usize]
    }

    pub fn unit(&self, instance: u8) -> Unit {
        self.hw().units[instance as usize]
    }

    pub fn with_chan(&self, instance: u8, channel: u8, f: impl FnOnce(&mut Chan)) {
        f(&mut self.hw().units[instance as usize].channels[channel as usize]);
    }

    pub fn set_counter(&self, instance: u8, value: u32) {
        self.hw().units[instance as usize].counter = value;
    }

    pub fn raise(&self, instance: u8, channel: u8) {
        self.with_chan(instance, channel, |c| c.flag = true);
    }

    pub fn log(&self) -> Vec<String> {
        self.hw().log.clone()
    }

    pub fn clear_log(&self) {
        self.hw().log.clear();
    }

    fn record(&self, entry: String) {
        self.hw().log.push(entry);
    }

    fn channel_init(&self, instance: u8, channel: u8) -> Result<(), DriverError> {
        let mut hw = self.hw();
        if hw.fail_channels.contains(&channel) {
            return Err(DriverError::Error);
        }
        hw.units[instance as usize].channels[channel as usize].configured = true;
        Ok(())
    }

    fn each_in_mask(&self, instance: u8, mask: u32, f: impl Fn(&mut Chan)) {
        let mut hw = self.hw();
        for (ch, chan) in hw.units[instance as usize].channels.iter_mut().enumerate() {
            if mask & (1 << ch) != 0 {
                f(chan);
            }
        }
    }
}

impl LpitDriver for MockTimer {
    fn init(&self, instance: u8, _run_in_debug: bool, _run_in_doze: bool) {
        self.hw().units[instance as usize].initialized = true;
    }

    fn init_channel(&self, instance: u8, channel: u8) -> Result<(), DriverError> {
        self.channel_init(instance, channel)
    }

    fn deinit(&self, instance: u8) {
        self.hw().units[instance as usize] = Unit::default();
    }

    fn set_period(&self, instance: u8, channel: u8, ticks: u32) {
        self.with_chan(instance, channel, |c| {
            c.period = ticks;
            if !c.running {
                c.count = ticks;
            }
        });
    }

    fn start_channels(&self, instance: u8, mask: u32) {
        self.each_in_mask(instance, mask, |c| {
            if !c.running {
                c.count = c.period;
            }
            c.running = true;
            c.starts += 1;
        });
    }

    fn stop_channels(&self, instance: u8, mask: u32) {
        self.each_in_mask(instance, mask, |c| c.running = false);
    }

    fn current_count(&self, instance: u8, channel: u8) -> u32 {
        self.chan(instance, channel).count
    }

    fn interrupt_flag(&self, instance: u8, channel: u8) -> bool {
        self.chan(instance, channel).flag
    }

    fn clear_interrupt_flag(&self, instance: u8, channel: u8) {
        self.record(format!("clear {}", channel));
        self.with_chan(instance, channel, |c| c.flag = false);
    }

    fn frequency(&self, _instance: u8) -> Option<u32> {
        self.hw().frequency
    }
}

impl LptmrDriver for MockTimer {
    fn init(&self, instance: u8, config: &LptmrExtension) {
        self.record(format!("init {:?}", config.clock_select));
        let mut hw = self.hw();
        let unit = &mut hw.units[instance as usize];
        unit.initialized = true;
        unit.counter = 0;
        unit.channels[0].compare = 0;
    }

    fn deinit(&self, instance: u8) {
        self.hw().units[instance as usize] = Unit::default();
    }

    fn set_compare(&self, instance: u8, ticks: u16) {
        self.record(format!("compare {}", ticks));
        self.with_chan(instance, 0, |c| c.compare = ticks as u32);
    }

    fn start_counter(&self, instance: u8) {
        self.record(String::from("start"));
        self.hw().units[instance as usize].counting = true;
    }

    fn stop_counter(&self, instance: u8) {
        self.record(String::from("stop"));
        let mut hw = self.hw();
        let unit = &mut hw.units[instance as usize];
        unit.counting = false;
        unit.counter = 0;
    }

    fn counter(&self, instance: u8) -> u16 {
        self.unit(instance).counter as u16
    }

    fn compare_flag(&self, instance: u8) -> bool {
        self.chan(instance, 0).flag
    }

    fn clear_compare_flag(&self, instance: u8) {
        self.record(String::from("clear 0"));
        self.with_chan(instance, 0, |c| c.flag = false);
    }

    fn source_frequency(&self, _instance: u8, source: LptmrClockSource) -> Option<u32> {
        match source {
            LptmrClockSource::Lpo1k => Some(1_000),
            _ => self.hw().frequency,
        }
    }
}

impl FtmDriver for MockTimer {
    fn init(&self, instance: u8, _clock: FtmClockSource, _prescaler: FtmPrescaler) -> Result<(), DriverError> {
        let mut hw = self.hw();
        if let Some(e) = hw.fail_init {
            return Err(e);
        }
        hw.units[instance as usize].initialized = true;
        Ok(())
    }

    fn init_output_compare(&self, instance: u8, final_value: u16, channels: u32) -> Result<(), DriverError> {
        self.hw().units[instance as usize].final_value = final_value;
        self.each_in_mask(instance, channels, |c| {
            c.configured = true;
            c.compare = 0xFFFF;
        });
        Ok(())
    }

    fn deinit(&self, instance: u8) {
        self.hw().units[instance as usize] = Unit::default();
    }

    fn counter(&self, instance: u8) -> u16 {
        self.unit(instance).counter as u16
    }

    fn final_value(&self, instance: u8) -> u16 {
        self.unit(instance).final_value
    }

    fn compare(&self, instance: u8, channel: u8) -> u16 {
        self.chan(instance, channel).compare as u16
    }

    fn set_compare(&self, instance: u8, channel: u8, value: u16) {
        self.with_chan(instance, channel, |c| c.compare = value as u32);
    }

    fn enable_channel_interrupt(&self, instance: u8, channel: u8) {
        self.with_chan(instance, channel, |c| c.irq = true);
    }

    fn disable_channel_interrupt(&self, instance: u8, channel: u8) {
        self.with_chan(instance, channel, |c| c.irq = false);
    }

    fn channel_event(&self, instance: u8, channel: u8) -> bool {
        self.chan(instance, channel).flag
    }

    fn clear_channel_event(&self, instance: u8, channel: u8) {
        self.record(format!("clear {}", channel));
        self.with_chan(instance, channel, |c| c.flag = false);
    }

    fn frequency(&self, _instance: u8) -> Option<u32> {
        self.hw().frequency
    }
}

impl PitDriver for MockTimer {
    fn init(&self, instance: u8, _stop_in_debug: bool) {
        self.hw().units[instance as usize].initialized = true;
    }

    fn init_channel(&self, instance: u8, channel: u8) -> Result<(), DriverError> {
        self.channel_init(instance, channel)
    }

    fn deinit(&self, instance: u8) {
        self.hw().units[instance as usize] = Unit::default();
    }

    fn set_period(&self, instance: u8, channel: u8, ticks: u32) {
        LpitDriver::set_period(self, instance, channel, ticks);
    }

    fn start_channel(&self, instance: u8, channel: u8) {
        LpitDriver::start_channels(self, instance, 1 << channel);
    }

    fn stop_channel(&self, instance: u8, channel: u8) {
        LpitDriver::stop_channels(self, instance, 1 << channel);
    }

    fn is_running(&self, instance: u8, channel: u8) -> bool {
        self.chan(instance, channel).running
    }

    fn current_count(&self, instance: u8, channel: u8) -> u32 {
        self.chan(instance, channel).count
    }

    fn status_flag(&self, instance: u8, channel: u8) -> bool {
        self.chan(instance, channel).flag
    }

    fn clear_status_flag(&self, instance: u8, channel: u8) {
        LpitDriver::clear_interrupt_flag(self, instance, channel);
    }

    fn frequency(&self, _instance: u8) -> Option<u32> {
        self.hw().frequency
    }
}

impl StmDriver for MockTimer {
    fn init(&self, instance: u8, _config: &StmExtension, _stop_in_debug: bool) {
        let mut hw = self.hw();
        let unit = &mut hw.units[instance as usize];
        unit.initialized = true;
        unit.counter = 0;
    }

    fn deinit(&self, instance: u8) {
        self.hw().units[instance as usize] = Unit::default();
    }

    fn counter(&self, instance: u8) -> u32 {
        self.unit(instance).counter
    }

    fn start_timer(&self, instance: u8) {
        self.hw().units[instance as usize].counting = true;
    }

    fn configure_channel(&self, instance: u8, channel: u8, compare: u32) {
        self.with_chan(instance, channel, |c| {
            c.compare = compare;
            c.running = true;
        });
    }

    fn compare(&self, instance: u8, channel: u8) -> u32 {
        self.chan(instance, channel).compare
    }

    fn set_compare(&self, instance: u8, channel: u8, compare: u32) {
        self.with_chan(instance, channel, |c| c.compare = compare);
    }

    fn disable_channel(&self, instance: u8, channel: u8) {
        self.with_chan(instance, channel, |c| c.running = false);
    }

    fn channel_flag(&self, instance: u8, channel: u8) -> bool {
        self.chan(instance, channel).flag
    }

    fn clear_channel_flag(&self, instance: u8, channel: u8) {
        LpitDriver::clear_interrupt_flag(self, instance, channel);
    }

    fn source_frequency(&self, _instance: u8, source: StmClockSource) -> Option<u32> {
        match source {
            StmClockSource::Fxosc => Some(40_000_000),
            StmClockSource::System => self.hw().frequency,
        }
    }
}

impl EtimerDriver for MockTimer {
    fn init(&self, instance: u8) {
        self.hw().units[instance as usize].initialized = true;
    }

    fn init_channel(&self, instance: u8, channel: u8, _input: EtimerInputSource) -> Result<(), DriverError> {
        self.channel_init(instance, channel)
    }

    fn deinit(&self, instance: u8) {
        self.hw().units[instance as usize] = Unit::default();
    }

    fn set_compare_threshold(&self, instance: u8, channel: u8, compare1: u16, compare2: u16) {
        self.with_chan(instance, channel, |c| {
            c.compare = compare1 as u32;
            c.compare2 = compare2 as u32;
        });
    }

    fn set_ticks(&self, instance: u8, channel: u8, ticks: u16) {
        self.with_chan(instance, channel, |c| c.count = ticks as u32);
    }

    fn ticks(&self, instance: u8, channel: u8) -> u16 {
        self.chan(instance, channel).count as u16
    }

    fn start_channels(&self, instance: u8, mask: u16) {
        self.each_in_mask(instance, mask as u32, |c| c.running = true);
    }

    fn stop_channels(&self, instance: u8, mask: u16) {
        self.each_in_mask(instance, mask as u32, |c| c.running = false);
    }

    fn compare_flag(&self, instance: u8, channel: u8) -> bool {
        self.chan(instance, channel).flag
    }

    fn clear_compare_flag(&self, instance: u8, channel: u8) {
        LpitDriver::clear_interrupt_flag(self, instance, channel);
    }

    fn frequency(&self, _instance: u8) -> Option<u32> {
        self.hw().frequency
    }
}

type Hook = Box<dyn Fn(Vector) + Send + Sync>;

/// Simulated interrupt controller. An unmask runs the optional hook, which
/// stands in for a request latched while the line was masked.
#[derive(Default)]
pub struct MockInterrupts {
    enabled: Mutex<Vec<Vector>>,
    log: Mutex<Vec<(bool, Vector)>>,
    hook: Mutex<Option<Hook>>,
}

impl MockInterrupts {
    pub fn is_enabled(&self, vector: Vector) -> bool {
        self.enabled.lock().unwrap_or_else(|e| e.into_inner()).contains(&vector)
    }

    pub fn log(&self) -> Vec<(bool, Vector)> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn on_enable(&self, hook: impl Fn(Vector) + Send + Sync + 'static) {
        *self.hook.lock().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(hook));
    }
}

impl InterruptControl for MockInterrupts {
    fn enable(&self, vector: Vector) {
        {
            let mut enabled = self.enabled.lock().unwrap_or_else(|e| e.into_inner());
            if !enabled.contains(&vector) {
                enabled.push(vector);
            }
        }
        self.log.lock().unwrap_or_else(|e| e.into_inner()).push((true, vector));
        let hook = self.hook.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hook) = hook.as_ref() {
            hook(vector);
        }
    }

    fn disable(&self, vector: Vector) {
        self.enabled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|v| *v != vector);
        self.log.lock().unwrap_or_else(|e| e.into_inner()).push((false, vector));
    }
}

/// A full set of simulated peripherals.
pub struct Board {
    pub lpit: MockTimer,
    pub lptmr: MockTimer,
    pub ftm: MockTimer,
    pub pit: MockTimer,
    pub stm: MockTimer,
    pub etimer: MockTimer,
    pub irq: MockInterrupts,
}

impl Board {
    /// Leaked so the board can back a `Timing<'static>`.
    pub fn leak() -> &'static Board {
        Box::leak(Box::new(Board {
            lpit: MockTimer::new(40_000_000),
            lptmr: MockTimer::new(8_000_000),
            ftm: MockTimer::new(10_000_000),
            pit: MockTimer::new(40_000_000),
            stm: MockTimer::new(160_000_000),
            etimer: MockTimer::new(80_000_000),
            irq: MockInterrupts::default(),
        }))
    }

    pub fn drivers(&'static self) -> Drivers<'static> {
        Drivers {
            lpit: Some(&self.lpit),
            lptmr: Some(&self.lptmr),
            ftm: Some(&self.ftm),
            pit: Some(&self.pit),
            stm: Some(&self.stm),
            etimer: Some(&self.etimer),
        }
    }

    pub fn timing(&'static self) -> Timing<'static> {
        Timing::new(PROFILE, self.drivers(), &self.irq)
    }
}

/// A leaked event counter, handed to [`bump`] as its argument.
pub fn counter() -> &'static AtomicU32 {
    Box::leak(Box::new(AtomicU32::new(0)))
}

/// Opaque callback argument pointing at `value`.
pub fn arg<T>(value: &'static T) -> *mut () {
    value as *const T as *mut ()
}

/// Callback counting its invocations in the [`counter`] it is given.
pub fn bump(arg: *mut ()) {
    let counter = unsafe { &*(arg as *const AtomicU32) };
    counter.fetch_add(1, Ordering::SeqCst);
}

pub fn hits(counter: &AtomicU32) -> u32 {
    counter.load(Ordering::SeqCst)
}
