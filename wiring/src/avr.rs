//! Module `avr` describes the ATmega48/88/168/328 family: where its
//! peripherals live in data space and which pins they use.
//!
//! [`Board::take`] hands out the peripherals as ready-made ports, once per
//! program run.

use core::cell::Cell;

use critical_section::Mutex;

use crate::delay::Delay;
use crate::digital::{Port, PortRegister};
use crate::register::Mmio;
use crate::serial::{HardwareSerial, UsartRegister};
use crate::spi::{Spi, SpiRegister};

pub const PORTB_BASE: usize = 0x23;
pub const PORTC_BASE: usize = 0x26;
pub const PORTD_BASE: usize = 0x29;
pub const SPI_BASE: usize = 0x4c;
pub const USART0_BASE: usize = 0xc0;

/// SPI clock pin, PB5.
pub const SPI_SCK: u8 = 5;
/// SPI data-out pin, PB3.
pub const SPI_MOSI: u8 = 3;

pub type PortRegs = Mmio<PortRegister>;
pub type SerialPort = HardwareSerial<Mmio<UsartRegister>>;
pub type SpiPort = Spi<Mmio<SpiRegister>, Port<PortRegs>>;

static TAKEN: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

/// `Board` is every peripheral this crate knows how to drive.
pub struct Board {
    pub serial: SerialPort,
    pub spi: SpiPort,
    pub port_b: Port<PortRegs>,
    pub port_c: Port<PortRegs>,
    pub port_d: Port<PortRegs>,
    pub delay: Delay,
}

impl Board {
    /// `take` returns the board the first time it is called and `None`
    /// after that. `f_cpu` is the CPU clock in hertz.
    pub fn take(f_cpu: u32) -> Option<Self> {
        critical_section::with(|cs| {
            let taken = TAKEN.borrow(cs);
            if taken.get() {
                None
            } else {
                taken.set(true);
                // Safety: guarded by TAKEN.
                Some(unsafe { Self::steal(f_cpu) })
            }
        })
    }

    /// `steal` returns the board unconditionally.
    ///
    /// # Safety
    ///
    /// Must only be called on an ATmega48/88/168/328, and the caller must
    /// not use ports from two boards in ways that conflict. Note that the
    /// SPI port controls the direction of two port B pins.
    pub unsafe fn steal(f_cpu: u32) -> Self {
        Self {
            serial: HardwareSerial::new(Mmio::new(USART0_BASE), f_cpu),
            spi: Spi::new(
                Mmio::new(SPI_BASE),
                Port::new(Mmio::new(PORTB_BASE)),
                SPI_SCK,
                SPI_MOSI,
            ),
            port_b: Port::new(Mmio::new(PORTB_BASE)),
            port_c: Port::new(Mmio::new(PORTC_BASE)),
            port_d: Port::new(Mmio::new(PORTD_BASE)),
            delay: Delay::new(f_cpu),
        }
    }
}
