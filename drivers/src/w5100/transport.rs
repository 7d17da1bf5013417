//! Bus transport: turns register reads/writes into framed SPI transactions.
//!
//! # Layers
//!
//! - [`SpiBus`] is the board's byte-transfer peripheral (external).
//! - [`Transport`] is what the register accessor consumes: one byte in or
//!   out at a 16-bit chip address.
//! - [`SpiTransport`] implements [`Transport`] on top of any [`SpiBus`]. Two
//!   peripheral flavours exist and are picked at construction through
//!   [`TransportMode`]; they differ only in how bus idle is detected and how
//!   the chip select is asserted.
//! - An optional chip-select pin (any `embedded-hal` [`OutputPin`]) is driven
//!   low for the duration of each transaction, e.g. to steer an external
//!   chip-select demultiplexer. [`NoSelect`] stands in when the peripheral
//!   handles select itself.
//!
//! # Framing
//!
//! Every transaction is exactly four bytes, no burst mode:
//!
//! | op    | byte 0 | byte 1  | byte 2  | byte 3          |
//! |-------|--------|---------|---------|-----------------|
//! | write | `0xF0` | addr hi | addr lo | data            |
//! | read  | `0x0F` | addr hi | addr lo | dummy (`0x00`)  |
//!
//! A read returns the byte clocked in during the dummy byte, i.e. the last
//! byte left in the receive FIFO.
//!
//! # Idle wait
//!
//! Both transports spin until the peripheral reports idle before starting a
//! transaction (and, for reads, before draining the FIFO). The spin has **no
//! bound**: a peripheral that never reports idle blocks forever.

use core::convert::Infallible;

use bitflags::bitflags;
use embedded_hal::digital::{ErrorType, OutputPin};

use super::regs::{OP_READ, OP_WRITE};

bitflags! {
    /// Transmitter status bits of the SPI master block.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SpiStatus: u8 {
        /// Last transfer finished.
        const DONE = 1 << 0;
        /// Shifter idle with an empty TX FIFO.
        const IDLE = 1 << 1;
    }
}

/// Byte-transfer peripheral supplied by the board.
pub trait SpiBus {
    /// Queue one byte for transmission.
    fn write_tx(&mut self, byte: u8);
    /// Pop one byte from the receive FIFO.
    fn read_rx(&mut self) -> Option<u8>;
    /// Discard everything in the receive FIFO.
    fn clear_rx(&mut self);
    /// Transmitter status (fixed-function SPI master).
    fn status(&mut self) -> SpiStatus;
    /// Route the hardware slave-select to `line` (serial communication block).
    fn set_active_select(&mut self, line: u8);
    /// Level of slave-select `line`; high means no transfer in flight.
    fn select_line_high(&mut self, line: u8) -> bool;
}

/// Single-byte register access at a 16-bit chip address.
pub trait Transport {
    fn write(&mut self, addr: u16, data: u8);
    fn read(&mut self, addr: u16) -> u8;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    #[inline]
    fn write(&mut self, addr: u16, data: u8) {
        (**self).write(addr, data)
    }

    #[inline]
    fn read(&mut self, addr: u16) -> u8 {
        (**self).read(addr)
    }
}

/// Which peripheral flavour drives the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportMode {
    /// Fixed-function SPI master. Idle is `DONE | IDLE` in the status
    /// register; chip select comes from the optional select pin.
    Master,
    /// Serial communication block in SPI mode. Idle is the slave-select line
    /// reading high; the line is made active before every transaction.
    SerialBlock { select_line: u8 },
}

/// Chip-select placeholder for peripherals that assert select in hardware.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSelect;

impl ErrorType for NoSelect {
    type Error = Infallible;
}

impl OutputPin for NoSelect {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub struct SpiTransport<B: SpiBus, CS: OutputPin = NoSelect> {
    bus: B,
    mode: TransportMode,
    cs: CS,
}

impl<B: SpiBus> SpiTransport<B, NoSelect> {
    pub fn new(bus: B, mode: TransportMode) -> Self {
        Self {
            bus,
            mode,
            cs: NoSelect,
        }
    }

    pub fn master(bus: B) -> Self {
        Self::new(bus, TransportMode::Master)
    }

    pub fn serial_block(bus: B, select_line: u8) -> Self {
        Self::new(bus, TransportMode::SerialBlock { select_line })
    }

    /// Drive `cs` low around every transaction. The pin is raised first.
    pub fn with_chip_select<P: OutputPin>(self, mut cs: P) -> SpiTransport<B, P> {
        cs.set_high().ok();
        SpiTransport {
            bus: self.bus,
            mode: self.mode,
            cs,
        }
    }
}

impl<B: SpiBus, CS: OutputPin> SpiTransport<B, CS> {
    #[inline]
    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn chip_select(&self) -> &CS {
        &self.cs
    }

    /// Give back the bus and the chip-select pin.
    pub fn release(self) -> (B, CS) {
        (self.bus, self.cs)
    }

    fn is_idle(&mut self) -> bool {
        match self.mode {
            TransportMode::Master => self
                .bus
                .status()
                .intersects(SpiStatus::DONE | SpiStatus::IDLE),
            TransportMode::SerialBlock { select_line } => self.bus.select_line_high(select_line),
        }
    }

    fn wait_idle(&mut self) {
        while !self.is_idle() {
            core::hint::spin_loop();
        }
    }

    // Pin errors cannot be reported through `Transport`; the frame goes out
    // regardless.
    fn select(&mut self) {
        if let TransportMode::SerialBlock { select_line } = self.mode {
            self.bus.set_active_select(select_line);
        }
        self.cs.set_low().ok();
    }

    fn deselect(&mut self) {
        self.wait_idle();
        self.cs.set_high().ok();
    }

    fn send_frame(&mut self, op: u8, addr: u16, data: u8) {
        self.wait_idle();
        self.select();
        self.bus.clear_rx();
        let [hi, lo] = addr.to_be_bytes();
        self.bus.write_tx(op);
        self.bus.write_tx(hi);
        self.bus.write_tx(lo);
        self.bus.write_tx(data);
    }
}

impl<B: SpiBus, CS: OutputPin> Transport for SpiTransport<B, CS> {
    fn write(&mut self, addr: u16, data: u8) {
        self.send_frame(OP_WRITE, addr, data);
        self.deselect();
    }

    fn read(&mut self, addr: u16) -> u8 {
        self.send_frame(OP_READ, addr, 0);
        self.deselect();
        let mut last = 0u8;
        while let Some(byte) = self.bus.read_rx() {
            last = byte;
        }
        last
    }
}
