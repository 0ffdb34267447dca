//! Main clock configuration: source, prescaler, and the external
//! 32.768 kHz oscillator
//!
//! CLKCTRL registers are change-protected; every write goes through the
//! CCP unlock sequence (IOREG signature written to `CPU.CCP`, then the
//! register write within the four-cycle window).

use avr_device::attiny1614::{CLKCTRL, CPU};

const CCP_IOREG: u8 = 0xD8;

const MCLKCTRLA_CLKOUT: u8 = 0x80;
const MCLKCTRLB_PEN: u8 = 0x01;
const MCLKSTATUS_SOSC: u8 = 0x01;
const MCLKSTATUS_XOSC32KS: u8 = 0x40;
const XOSC32KCTRLA_ENABLE: u8 = 0x01;
const XOSC32KCTRLA_RUNSTDBY: u8 = 0x02;

/// Main clock source (`MCLKCTRLA.CLKSEL`).
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum SysClockSource {
    /// 16/20 MHz internal oscillator
    Osc20M = 0x00,
    /// Internal 32.768 kHz ULP oscillator
    Osc32K = 0x01,
    /// External 32.768 kHz crystal oscillator
    XOsc32K = 0x02,
    /// External clock on the EXTCLK pin
    ExtClock = 0x03,
}

/// Main clock prescaler division factor (`MCLKCTRLB.PDIV`).
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum SysClockPrescaler {
    Div1 = 0xFF, // prescaler disabled, PDIV ignored
    Div2 = 0x00,
    Div4 = 0x01,
    Div8 = 0x02,
    Div16 = 0x03,
    Div32 = 0x04,
    Div64 = 0x05,
    Div6 = 0x08,
    Div10 = 0x09,
    Div12 = 0x0A,
    Div24 = 0x0B,
    Div48 = 0x0C,
}

/// Crystal start-up time (`XOSC32KCTRLA.CSUT`).
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum XOsc32kStartupTime {
    Cycles1k = 0x00,
    Cycles16k = 0x10,
    Cycles32k = 0x20,
    Cycles64k = 0x30,
}

/// What is connected to the TOSC pins (`XOSC32KCTRLA.SEL`).
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum XOsc32kSourceType {
    Crystal = 0x00,
    ExternalClock = 0x04,
}

/// Write a change-protected CLKCTRL register.
fn protected_write(write: impl FnOnce(&avr_device::attiny1614::clkctrl::RegisterBlock)) {
    let cpu = unsafe { &*CPU::ptr() };
    let clkctrl = unsafe { &*CLKCTRL::ptr() };
    cpu.ccp.write(|w| unsafe { w.bits(CCP_IOREG) });
    write(clkctrl);
}

/// Set the system clock prescaler. Not reentrant.
///
/// `Div1` disables the prescaler entirely (clears the PEN bit).
pub fn set_sys_clock_prescaler(ps: SysClockPrescaler) {
    let mask = match ps {
        SysClockPrescaler::Div1 => 0x00,
        _ => ((ps as u8) << 1) | MCLKCTRLB_PEN,
    };
    let clkctrl = unsafe { &*CLKCTRL::ptr() };
    // wait for any pending clock change to finish
    while clkctrl.mclkstatus.read().bits() & MCLKSTATUS_SOSC != 0 {}
    protected_write(|p| p.mclkctrlb.write(|w| unsafe { w.bits(mask) }));
}

/// Set the system clock source. Not reentrant.
///
/// Make sure no transient combination of source and prescaler exceeds the
/// maximum system clock frequency for the operating voltage.
pub fn set_sys_clock_source(source: SysClockSource) {
    let clkctrl = unsafe { &*CLKCTRL::ptr() };
    // keep the CLKOUT pin state
    let mask = (clkctrl.mclkctrla.read().bits() & MCLKCTRLA_CLKOUT) | source as u8;
    while clkctrl.mclkstatus.read().bits() & MCLKSTATUS_SOSC != 0 {}
    protected_write(|p| p.mclkctrla.write(|w| unsafe { w.bits(mask) }));
    // wait for the change to complete
    while clkctrl.mclkstatus.read().bits() & MCLKSTATUS_SOSC != 0 {}
}

/// Configure the external 32.768 kHz oscillator. Not reentrant.
///
/// A running oscillator is stopped while its configuration changes and
/// started again with the new settings; a stopped one stays stopped.
pub fn config_xosc32k(sut: XOsc32kStartupTime, src: XOsc32kSourceType, run_standby: bool) {
    let clkctrl = unsafe { &*CLKCTRL::ptr() };
    let enabled = clkctrl.xosc32kctrla.read().bits() & XOSC32KCTRLA_ENABLE;
    if enabled != 0 {
        protected_write(|p| {
            p.xosc32kctrla
                .modify(|r, w| unsafe { w.bits(r.bits() & !XOSC32KCTRLA_ENABLE) })
        });
    }
    // the stable flag must read 0 before the register may change
    while clkctrl.mclkstatus.read().bits() & MCLKSTATUS_XOSC32KS != 0 {}
    let mask = enabled
        | sut as u8
        | src as u8
        | if run_standby { XOSC32KCTRLA_RUNSTDBY } else { 0 };
    protected_write(|p| p.xosc32kctrla.write(|w| unsafe { w.bits(mask) }));
    if mask & XOSC32KCTRLA_ENABLE != 0 {
        while clkctrl.mclkstatus.read().bits() & MCLKSTATUS_XOSC32KS == 0 {}
    }
}

/// Start the external 32.768 kHz oscillator and wait for it to stabilize.
pub fn start_xosc32k() {
    let clkctrl = unsafe { &*CLKCTRL::ptr() };
    let mask = clkctrl.xosc32kctrla.read().bits() | XOSC32KCTRLA_ENABLE;
    protected_write(|p| p.xosc32kctrla.write(|w| unsafe { w.bits(mask) }));
    while clkctrl.mclkstatus.read().bits() & MCLKSTATUS_XOSC32KS == 0 {}
}

/// Stop the external 32.768 kHz oscillator.
pub fn stop_xosc32k() {
    let clkctrl = unsafe { &*CLKCTRL::ptr() };
    let mask = clkctrl.xosc32kctrla.read().bits() & !XOSC32KCTRLA_ENABLE;
    protected_write(|p| p.xosc32kctrla.write(|w| unsafe { w.bits(mask) }));
}
