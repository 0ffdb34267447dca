//! Register-level peripheral wrappers for the tinyAVR 1-series
//!
//! Thin, stateless access to the clock controller, RTC, SPI, USART, and
//! timer/counter peripherals. Everything here touches device registers and
//! compiles for AVR targets only; the scheduler core in [`crate::rtos`]
//! stays hardware-independent so it can be tested off-target.

#[cfg(target_arch = "avr")]
pub mod clock;
#[cfg(target_arch = "avr")]
pub mod rtc;
#[cfg(target_arch = "avr")]
pub mod spi;
#[cfg(target_arch = "avr")]
pub mod timer_counter;
#[cfg(target_arch = "avr")]
pub mod usart;

#[cfg(target_arch = "avr")]
pub use rtc::{Rtc, RtcConfig, SoftCounter};
#[cfg(target_arch = "avr")]
pub use spi::{Spi, SpiConfig};
#[cfg(target_arch = "avr")]
pub use usart::{Usart, UsartConfig};
