//! Configuration constants for the tinyAVR 1-series HAL

/// Peripheral clock in Hz: 20 MHz internal oscillator behind the default /6 fuse prescaler
pub const CPU_FREQ_HZ: u32 = 3_333_333;

/// RTC clock source frequency (internal 32.768 kHz ULP oscillator)
pub const RTC_CLOCK_HZ: u32 = 32_768;

/// Default RTC period register value, about 1 ms per overflow tick
pub const RTC_TICK_PERIOD: u16 = 33;

/// Default USART baud rate
pub const USART_BAUD: u32 = 9_600;

/// Default task arena capacity for the scheduler
pub const SCHEDULER_CAPACITY: usize = 16;
