//! SPI0 master in buffered mode with blocking full-duplex transfers

use core::convert::Infallible;
use core::marker::PhantomData;

use avr_device::attiny1614::SPI0;

const CTRLA_ENABLE: u8 = 0x01;
const CTRLA_MASTER: u8 = 0x20;

const CTRLB_BUFEN: u8 = 0x80;
const CTRLB_SSD: u8 = 0x04;

const INTFLAGS_RXCIF: u8 = 0x80;
const INTFLAGS_TXCIF: u8 = 0x40;
const INTFLAGS_DREIF: u8 = 0x20;
const INTFLAGS_SSIF: u8 = 0x10;

/// SPI clock prescaler (`CTRLA.PRESC`).
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum SpiPrescaler {
    Div4 = 0x00,
    Div16 = 0x02,
    Div64 = 0x04,
    Div128 = 0x06,
}

/// SPI transfer mode (`CTRLB.MODE`): clock polarity and phase.
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum SpiMode {
    Mode0 = 0x00,
    Mode1 = 0x01,
    Mode2 = 0x02,
    Mode3 = 0x03,
}

/// Bit order on the wire (`CTRLA.DORD`).
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum DataOrder {
    MsbFirst = 0x00,
    LsbFirst = 0x40,
}

/// Master-mode configuration for [`Spi::new_master`].
pub struct SpiConfig {
    pub mode: SpiMode,
    pub prescaler: SpiPrescaler,
    pub data_order: DataOrder,
    /// Double the SCK rate (`CLK2X`).
    pub clock_double: bool,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            mode: SpiMode::Mode0,
            prescaler: SpiPrescaler::Div4,
            data_order: DataOrder::MsbFirst,
            clock_double: false,
        }
    }
}

/// SPI0 peripheral driver (master, hardware buffers enabled).
pub struct Spi {
    _spi: PhantomData<SPI0>,
}

impl Spi {
    /// Configure and enable SPI0 in buffered master mode.
    ///
    /// Pin directions for MOSI, SCK, and !SS must be set as outputs
    /// elsewhere; chip select is driven externally.
    pub fn new_master(config: &SpiConfig) -> Self {
        let p = unsafe { &*SPI0::ptr() };
        // clear stale interrupt flags
        p.intflags.write(|w| unsafe {
            w.bits(INTFLAGS_RXCIF | INTFLAGS_TXCIF | INTFLAGS_DREIF | INTFLAGS_SSIF)
        });
        p.ctrlb
            .write(|w| unsafe { w.bits(CTRLB_BUFEN | CTRLB_SSD | config.mode as u8) });
        let clk2x = if config.clock_double { 0x10 } else { 0 };
        p.ctrla.write(|w| unsafe {
            w.bits(
                config.data_order as u8
                    | CTRLA_MASTER
                    | clk2x
                    | config.prescaler as u8
                    | CTRLA_ENABLE,
            )
        });
        // drain any stale bytes from the receive buffer
        let _ = p.data.read().bits();
        let _ = p.data.read().bits();
        let _ = p.data.read().bits();
        Self { _spi: PhantomData }
    }

    /// Full-duplex blocking transfer: every byte in `buf` is transmitted
    /// and replaced by the byte clocked in at the same position.
    ///
    /// Interleaves DRE-gated writes with RXC-gated reads so the hardware
    /// buffers stay busy without ever overrunning.
    pub fn transfer_in_place(&mut self, buf: &mut [u8]) {
        let p = unsafe { &*SPI0::ptr() };
        let mut tx = 0;
        let mut rx = 0;
        while tx < buf.len() || rx < buf.len() {
            if tx < buf.len() && p.intflags.read().bits() & INTFLAGS_DREIF != 0 {
                p.data.write(|w| unsafe { w.bits(buf[tx]) });
                tx += 1;
            }
            if rx < buf.len() && p.intflags.read().bits() & INTFLAGS_RXCIF != 0 {
                buf[rx] = p.data.read().bits();
                rx += 1;
            }
        }
    }

    /// Transfer a single byte and return the byte clocked in.
    pub fn transfer(&mut self, byte: u8) -> u8 {
        let mut buf = [byte];
        self.transfer_in_place(&mut buf);
        buf[0]
    }
}

impl embedded_hal::spi::FullDuplex<u8> for Spi {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Infallible> {
        let p = unsafe { &*SPI0::ptr() };
        if p.intflags.read().bits() & INTFLAGS_RXCIF != 0 {
            Ok(p.data.read().bits())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn send(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        let p = unsafe { &*SPI0::ptr() };
        if p.intflags.read().bits() & INTFLAGS_DREIF != 0 {
            p.data.write(|w| unsafe { w.bits(byte) });
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}
