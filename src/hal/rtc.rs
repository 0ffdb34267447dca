//! RTC peripheral programming and the scheduler's soft tick counter
//!
//! The RTC clock domain is asynchronous to the peripheral clock; every
//! register write waits for the matching `STATUS` busy flag first. The
//! overflow interrupt increments a 16-bit soft counter which is the tick
//! source the task scheduler and its soft timers run on.

use core::cell::Cell;

use avr_device::attiny1614::RTC;
use avr_device::interrupt::{self, Mutex};

use crate::rtos::ticks::TickSource;

const CTRLA_RTCEN: u8 = 0x01;
const CTRLA_RUNSTDBY: u8 = 0x80;
const STATUS_CTRLABUSY: u8 = 0x01;
const STATUS_CNTBUSY: u8 = 0x02;
const STATUS_PERBUSY: u8 = 0x04;
const STATUS_CMPBUSY: u8 = 0x08;
const INT_OVF: u8 = 0x01;
const INT_CMP: u8 = 0x02;

/// RTC clock source (`CLKSEL`).
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum RtcClockSource {
    /// Internal 32.768 kHz ULP oscillator
    Int32K = 0x00,
    /// Internal ULP oscillator divided to 1.024 kHz
    Int1K = 0x01,
    /// 32.768 kHz crystal oscillator or external clock on TOSC1
    Tosc32K = 0x02,
    /// External clock on the EXTCLK pin
    ExtClock = 0x03,
}

/// RTC prescaler division factor (`CTRLA.PRESCALER`).
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum RtcPrescaler {
    Div1 = 0x00,
    Div2 = 0x01,
    Div4 = 0x02,
    Div8 = 0x03,
    Div16 = 0x04,
    Div32 = 0x05,
    Div64 = 0x06,
    Div128 = 0x07,
    Div256 = 0x08,
    Div512 = 0x09,
    Div1024 = 0x0A,
    Div2048 = 0x0B,
    Div4096 = 0x0C,
    Div8192 = 0x0D,
    Div16384 = 0x0E,
    Div32768 = 0x0F,
}

/// One-call RTC bring-up values for [`Rtc::init_enable`].
pub struct RtcConfig {
    pub source: RtcClockSource,
    pub prescaler: RtcPrescaler,
    pub period: u16,
    pub compare: u16,
    pub overflow_interrupt: bool,
    pub compare_interrupt: bool,
    pub run_standby: bool,
}

/// Real Time Counter register access.
pub struct Rtc;

impl Rtc {
    /// Configure and start the RTC in a single call. Not reentrant.
    ///
    /// Also resets the soft tick counter to zero, so scheduler time starts
    /// with the hardware counter.
    pub fn init_enable(config: &RtcConfig) {
        let p = unsafe { &*RTC::ptr() };
        let intctrl = (if config.overflow_interrupt { INT_OVF } else { 0 })
            | (if config.compare_interrupt { INT_CMP } else { 0 });
        p.intctrl.write(|w| unsafe { w.bits(intctrl) });
        SoftCounter::reset();
        Self::set_count(0);
        Self::set_period(config.period);
        Self::set_compare(config.compare);
        Self::set_prescaler(config.prescaler);
        Self::set_clock_source(config.source);
        Self::enable(config.run_standby);
    }

    /// Select the RTC clock source. The source itself must be enabled
    /// elsewhere (see [`crate::hal::clock`]).
    pub fn set_clock_source(source: RtcClockSource) {
        let p = unsafe { &*RTC::ptr() };
        p.clksel.write(|w| unsafe { w.bits(source as u8) });
    }

    /// Set the RTC prescaler, preserving the RTCEN and RUNSTDBY bits.
    /// Waits for clock domain sync before writing.
    pub fn set_prescaler(ps: RtcPrescaler) {
        let p = unsafe { &*RTC::ptr() };
        while p.status.read().bits() & STATUS_CTRLABUSY != 0 {}
        let keep = p.ctrla.read().bits() & (CTRLA_RTCEN | CTRLA_RUNSTDBY);
        p.ctrla
            .write(|w| unsafe { w.bits(keep | ((ps as u8) << 3)) });
    }

    /// Write the period register. The RTC is not stopped first; the
    /// function waits for clock domain sync before writing.
    pub fn set_period(period: u16) {
        let p = unsafe { &*RTC::ptr() };
        while p.status.read().bits() & STATUS_PERBUSY != 0 {}
        p.per.write(|w| unsafe { w.bits(period) });
    }

    /// Write the compare register, waiting for clock domain sync first.
    pub fn set_compare(compare: u16) {
        let p = unsafe { &*RTC::ptr() };
        while p.status.read().bits() & STATUS_CMPBUSY != 0 {}
        p.cmp.write(|w| unsafe { w.bits(compare) });
    }

    /// Read the 16-bit count register. May be called from an ISR.
    ///
    /// The 16-bit access goes through the shared TEMP register, so
    /// interrupts are disabled around the read to keep it atomic.
    pub fn count() -> u16 {
        interrupt::free(|_| {
            let p = unsafe { &*RTC::ptr() };
            p.cnt.read().bits()
        })
    }

    /// Write the 16-bit count register. May be called from an ISR.
    pub fn set_count(count: u16) {
        let p = unsafe { &*RTC::ptr() };
        // wait outside the critical section when possible
        while p.status.read().bits() & STATUS_CNTBUSY != 0 {}
        interrupt::free(|_| {
            while p.status.read().bits() & STATUS_CNTBUSY != 0 {}
            p.cnt.write(|w| unsafe { w.bits(count) });
        });
    }

    /// Set the RTCEN bit (and optionally RUNSTDBY), waiting for clock
    /// domain sync first.
    pub fn enable(run_standby: bool) {
        let p = unsafe { &*RTC::ptr() };
        while p.status.read().bits() & STATUS_CTRLABUSY != 0 {}
        let standby = if run_standby { CTRLA_RUNSTDBY } else { 0 };
        p.ctrla
            .modify(|r, w| unsafe { w.bits(r.bits() | CTRLA_RTCEN | standby) });
    }

    /// Clear the RTCEN bit, waiting for clock domain sync first.
    pub fn disable() {
        let p = unsafe { &*RTC::ptr() };
        while p.status.read().bits() & STATUS_CTRLABUSY != 0 {}
        p.ctrla
            .modify(|r, w| unsafe { w.bits(r.bits() & !CTRLA_RTCEN) });
    }
}

// Soft counter incremented once per RTC overflow. Owned by the ISR; every
// other reader goes through a critical section so a torn 16-bit read can
// never be observed.
static TICK_COUNT: Mutex<Cell<u16>> = Mutex::new(Cell::new(0));

/// The RTC soft counter as a scheduler tick source.
///
/// Starts at 0 when the RTC is initialized and increments by one on every
/// RTC overflow, wrapping silently at 16 bits.
#[derive(Clone, Copy, Default)]
pub struct SoftCounter;

impl SoftCounter {
    /// Current soft counter value. Safe from ISR and main-line context.
    pub fn count() -> u16 {
        interrupt::free(|cs| TICK_COUNT.borrow(cs).get())
    }

    /// Reset the counter to zero. Called by [`Rtc::init_enable`].
    pub fn reset() {
        interrupt::free(|cs| TICK_COUNT.borrow(cs).set(0));
    }
}

impl TickSource for SoftCounter {
    fn ticks(&self) -> u16 {
        Self::count()
    }
}

#[avr_device::interrupt(attiny1614)]
fn RTC_CNT() {
    let p = unsafe { &*RTC::ptr() };
    // acknowledge the overflow, leave a pending compare untouched
    p.intflags.write(|w| unsafe { w.bits(INT_OVF) });
    interrupt::free(|cs| {
        let count = TICK_COUNT.borrow(cs);
        count.set(count.get().wrapping_add(1));
    });
}
