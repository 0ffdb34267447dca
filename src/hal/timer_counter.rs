//! Thin register wrappers for the TCA, TCB, and TCD timer/counters
//!
//! These bypass the buffered compare/period registers and write directly,
//! which is not recommended while a timer is running.

use avr_device::attiny1614::{TCA0, TCB0, TCD0};

const TCA_CTRLA_ENABLE: u8 = 0x01;
const TCB_CTRLA_ENABLE: u8 = 0x01;
const TCD_CTRLA_ENABLE: u8 = 0x01;
const TCD_STATUS_ENRDY: u8 = 0x01;
const TCD_STATUS_CMDRDY: u8 = 0x02;

/// Timer/Counter A (16-bit, three compare channels).
pub struct TimerA;

impl TimerA {
    /// Directly set the period register.
    pub fn set_period(period: u16) {
        let p = unsafe { &*TCA0::ptr() };
        p.per.write(|w| unsafe { w.bits(period) });
    }

    /// Directly set the three compare registers; `compare[0]` goes to
    /// CMP0, `compare[1]` to CMP1, `compare[2]` to CMP2.
    pub fn set_compare(compare: [u16; 3]) {
        let p = unsafe { &*TCA0::ptr() };
        p.cmp0.write(|w| unsafe { w.bits(compare[0]) });
        p.cmp1.write(|w| unsafe { w.bits(compare[1]) });
        p.cmp2.write(|w| unsafe { w.bits(compare[2]) });
    }

    /// Current 16-bit counter value.
    pub fn counter() -> u16 {
        let p = unsafe { &*TCA0::ptr() };
        p.cnt.read().bits()
    }

    /// Set the ENABLE bit, leaving the clock selection untouched.
    pub fn enable() {
        let p = unsafe { &*TCA0::ptr() };
        p.ctrla
            .modify(|r, w| unsafe { w.bits(r.bits() | TCA_CTRLA_ENABLE) });
    }

    pub fn disable() {
        let p = unsafe { &*TCA0::ptr() };
        p.ctrla
            .modify(|r, w| unsafe { w.bits(r.bits() & !TCA_CTRLA_ENABLE) });
    }
}

/// Timer/Counter B (16-bit, single capture/compare channel).
pub struct TimerB;

impl TimerB {
    /// Directly set the capture/compare register.
    pub fn set_compare(compare: u16) {
        let p = unsafe { &*TCB0::ptr() };
        p.ccmp.write(|w| unsafe { w.bits(compare) });
    }

    /// Current 16-bit counter value.
    pub fn counter() -> u16 {
        let p = unsafe { &*TCB0::ptr() };
        p.cnt.read().bits()
    }

    pub fn enable() {
        let p = unsafe { &*TCB0::ptr() };
        p.ctrla
            .modify(|r, w| unsafe { w.bits(r.bits() | TCB_CTRLA_ENABLE) });
    }

    pub fn disable() {
        let p = unsafe { &*TCB0::ptr() };
        p.ctrla
            .modify(|r, w| unsafe { w.bits(r.bits() & !TCB_CTRLA_ENABLE) });
    }
}

/// Timer/Counter D (12-bit, asynchronous).
pub struct TimerD;

impl TimerD {
    /// Set the channel A set/clear compare values.
    pub fn set_compare_a(set: u16, clear: u16) {
        let p = unsafe { &*TCD0::ptr() };
        p.cmpaset.write(|w| unsafe { w.bits(set) });
        p.cmpaclr.write(|w| unsafe { w.bits(clear) });
    }

    /// Set the channel B set/clear compare values.
    pub fn set_compare_b(set: u16, clear: u16) {
        let p = unsafe { &*TCD0::ptr() };
        p.cmpbset.write(|w| unsafe { w.bits(set) });
        p.cmpbclr.write(|w| unsafe { w.bits(clear) });
    }

    /// Set the ENABLE bit; waits for the enable-ready status flag, as the
    /// TCD clock domain is asynchronous.
    pub fn enable() {
        let p = unsafe { &*TCD0::ptr() };
        while p.status.read().bits() & TCD_STATUS_ENRDY == 0 {}
        p.ctrla
            .modify(|r, w| unsafe { w.bits(r.bits() | TCD_CTRLA_ENABLE) });
    }

    pub fn disable() {
        let p = unsafe { &*TCD0::ptr() };
        while p.status.read().bits() & TCD_STATUS_CMDRDY == 0 {}
        p.ctrla
            .modify(|r, w| unsafe { w.bits(r.bits() & !TCD_CTRLA_ENABLE) });
    }
}
