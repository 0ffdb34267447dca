//! USART0 in asynchronous serial mode: blocking and non-blocking byte I/O
//!
//! The status predicates [`Usart::rx_has_data`] and [`Usart::tx_ready`] are
//! shaped for use as conditional-task predicates, so buffered transfers can
//! be driven from the scheduler instead of busy-waiting.

use core::convert::Infallible;
use core::marker::PhantomData;

use avr_device::attiny1614::USART0;

use crate::config::CPU_FREQ_HZ;

const STATUS_RXCIF: u8 = 0x80;
const STATUS_TXCIF: u8 = 0x40;
const STATUS_DREIF: u8 = 0x20;
const STATUS_RXSIF: u8 = 0x10;
const STATUS_ISFIF: u8 = 0x08;
const STATUS_BDF: u8 = 0x01;

const CTRLA_LBME: u8 = 0x08;
const CTRLA_RS485_MASK: u8 = 0x03;

const CTRLB_RXEN: u8 = 0x80;
const CTRLB_TXEN: u8 = 0x40;
const CTRLB_SFDEN: u8 = 0x10;
const CTRLB_ODME: u8 = 0x08;

const CTRLC_CHSIZE_8BIT: u8 = 0x03;

const RXDATAH_BUFOVF: u8 = 0x40;
const RXDATAH_FERR: u8 = 0x04;
const RXDATAH_PERR: u8 = 0x02;

/// Parity mode (`CTRLC.PMODE`).
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum Parity {
    None = 0x00,
    Even = 0x20,
    Odd = 0x30,
}

/// Stop bit count (`CTRLC.SBMODE`).
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum StopBits {
    One = 0x00,
    Two = 0x08,
}

/// Receive errors flagged in RXDATAH alongside the data byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsartError {
    Framing,
    Parity,
    Overrun,
}

/// Asynchronous serial configuration for [`Usart::new`].
pub struct UsartConfig {
    pub baud: u32,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub rx_enable: bool,
    pub tx_enable: bool,
}

impl Default for UsartConfig {
    fn default() -> Self {
        Self {
            baud: crate::config::USART_BAUD,
            parity: Parity::None,
            stop_bits: StopBits::One,
            rx_enable: true,
            tx_enable: true,
        }
    }
}

/// BAUD register value for normal-speed async mode: 64 * f_clk / (16 * baud),
/// rounded to nearest.
const fn baud_register(baud: u32) -> u16 {
    ((8 * CPU_FREQ_HZ / baud + 1) / 2) as u16
}

/// USART0 peripheral driver.
pub struct Usart {
    _usart: PhantomData<USART0>,
}

impl Usart {
    /// Configure USART0 for asynchronous serial and enable it.
    ///
    /// Pin directions (TXD out, RXD in) must be set elsewhere.
    pub fn new(config: &UsartConfig) -> Self {
        let p = unsafe { &*USART0::ptr() };
        // clear sticky status flags
        p.status.write(|w| unsafe {
            w.bits(STATUS_TXCIF | STATUS_RXSIF | STATUS_ISFIF | STATUS_BDF)
        });
        // normal async mode, 8 data bits
        p.ctrlc.write(|w| unsafe {
            w.bits(config.parity as u8 | config.stop_bits as u8 | CTRLC_CHSIZE_8BIT)
        });
        p.baud
            .write(|w| unsafe { w.bits(baud_register(config.baud)) });
        let ctrlb = (if config.rx_enable { CTRLB_RXEN } else { 0 })
            | (if config.tx_enable { CTRLB_TXEN } else { 0 });
        p.ctrlb.write(|w| unsafe { w.bits(ctrlb) });
        Self {
            _usart: PhantomData,
        }
    }

    /// Enable loop-back and/or open-drain pin modes.
    pub fn config_pins(&mut self, loopback: bool, open_drain: bool) {
        let p = unsafe { &*USART0::ptr() };
        if loopback {
            p.ctrla
                .modify(|r, w| unsafe { w.bits((r.bits() & !CTRLA_RS485_MASK) | CTRLA_LBME) });
        }
        if open_drain {
            p.ctrlb
                .modify(|r, w| unsafe { w.bits(r.bits() | CTRLB_ODME) });
        }
    }

    /// Enable start-of-frame detection for wake from standby.
    pub fn enable_start_frame_detection(&mut self) {
        let p = unsafe { &*USART0::ptr() };
        p.ctrlb
            .modify(|r, w| unsafe { w.bits(r.bits() | CTRLB_SFDEN) });
    }

    /// `true` when the receive buffer holds at least one byte.
    pub fn rx_has_data() -> bool {
        let p = unsafe { &*USART0::ptr() };
        p.status.read().bits() & STATUS_RXCIF != 0
    }

    /// `true` when the transmit data register will accept a byte.
    pub fn tx_ready() -> bool {
        let p = unsafe { &*USART0::ptr() };
        p.status.read().bits() & STATUS_DREIF != 0
    }

    /// Transmit a single byte. Non-buffered, blocking.
    pub fn write_byte(&mut self, byte: u8) {
        let p = unsafe { &*USART0::ptr() };
        while p.status.read().bits() & STATUS_DREIF == 0 {}
        p.txdatal.write(|w| unsafe { w.bits(byte) });
    }

    /// Receive a single byte. Non-buffered, blocking; reports receive
    /// errors flagged with the byte.
    pub fn read_byte(&mut self) -> Result<u8, UsartError> {
        let p = unsafe { &*USART0::ptr() };
        while p.status.read().bits() & STATUS_RXCIF == 0 {}
        self.take_byte()
    }

    /// Transmit a string, blocking until every byte is queued.
    pub fn write_str(&mut self, s: &str) {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
    }

    // RXDATAH must be read before RXDATAL; reading RXDATAL pops the FIFO.
    fn take_byte(&mut self) -> Result<u8, UsartError> {
        let p = unsafe { &*USART0::ptr() };
        let high = p.rxdatah.read().bits();
        let data = p.rxdatal.read().bits();
        if high & RXDATAH_FERR != 0 {
            Err(UsartError::Framing)
        } else if high & RXDATAH_PERR != 0 {
            Err(UsartError::Parity)
        } else if high & RXDATAH_BUFOVF != 0 {
            Err(UsartError::Overrun)
        } else {
            Ok(data)
        }
    }
}

impl embedded_hal::serial::Read<u8> for Usart {
    type Error = UsartError;

    fn read(&mut self) -> nb::Result<u8, UsartError> {
        if Self::rx_has_data() {
            self.take_byte().map_err(nb::Error::Other)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl embedded_hal::serial::Write<u8> for Usart {
    type Error = Infallible;

    fn write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        if Self::tx_ready() {
            let p = unsafe { &*USART0::ptr() };
            p.txdatal.write(|w| unsafe { w.bits(byte) });
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        let p = unsafe { &*USART0::ptr() };
        if p.status.read().bits() & STATUS_TXCIF != 0 {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl ufmt::uWrite for Usart {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        Usart::write_str(self, s);
        Ok(())
    }
}
