//! Hardware abstraction layer for the tinyAVR 1-series (ATtiny1614 class)
//! built around a cooperative, interrupt-free task scheduler.
//!
//! The `rtos` module is the heart of the crate: a single-threaded dispatcher
//! that multiplexes timed, queued, and conditional callbacks over one
//! execution context, clocked by a 16-bit soft counter the RTC overflow
//! interrupt increments. The scheduler core is hardware-independent and
//! builds on any target; the register wrappers in `hal` compile for AVR
//! targets only.
//!
//! Interrupt handlers are restricted to incrementing the tick counter and
//! peripheral housekeeping. They must never touch the task lists, and the
//! scheduler driver must not be re-entered from a callback it is running.
#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

pub mod config;
pub mod hal;
pub mod rtos;
