//! Module `digital` controls general purpose I/O ports.
//!
//! An AVR I/O port is three registers: `PINx` reads the pin levels, `DDRx`
//! selects each pin's direction, and `PORTx` drives output levels (or enables
//! pull-ups on inputs). [`Port`] wraps one such block and implements
//! [`DigitalPins`] with pins numbered 0 to 7 by bit position. Mapping board
//! pin numbers onto ports is left to the board support code.

use crate::register::{Register, RegisterBlock};

/// `Level` is the logic level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level == Level::High
    }
}

/// `PinMode` is the direction of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    Input,
    Output,
}

/// `DigitalPins` is implemented by anything that can drive and sense
/// individually numbered pins.
pub trait DigitalPins {
    fn pin_mode(&mut self, pin: u8, mode: PinMode);

    fn pin_read(&mut self, pin: u8) -> Level;

    fn pin_write(&mut self, pin: u8, level: Level);

    fn digital_write(&mut self, pin: u8, level: Level) {
        self.pin_write(pin, level)
    }

    fn digital_read(&mut self, pin: u8) -> Level {
        self.pin_read(pin)
    }
}

impl<P: DigitalPins + ?Sized> DigitalPins for &mut P {
    fn pin_mode(&mut self, pin: u8, mode: PinMode) {
        (**self).pin_mode(pin, mode)
    }

    fn pin_read(&mut self, pin: u8) -> Level {
        (**self).pin_read(pin)
    }

    fn pin_write(&mut self, pin: u8, level: Level) {
        (**self).pin_write(pin, level)
    }
}

/// `PortRegister` names the three registers of an I/O port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortRegister {
    Pin,
    Ddr,
    Port,
}

impl Register for PortRegister {
    fn offset(self) -> usize {
        match self {
            PortRegister::Pin => 0,
            PortRegister::Ddr => 1,
            PortRegister::Port => 2,
        }
    }
}

/// `Port` is one 8-bit I/O port.
#[derive(Debug)]
pub struct Port<R: RegisterBlock<Register = PortRegister>> {
    regs: R,
}

impl<R: RegisterBlock<Register = PortRegister>> Port<R> {
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }

    /// `port_mode` sets the direction of all eight pins at once. Each set bit
    /// in `outputs` makes the corresponding pin an output.
    pub fn port_mode(&mut self, outputs: u8) {
        self.regs.write(PortRegister::Ddr, outputs)
    }

    pub fn port_read(&mut self) -> u8 {
        self.regs.read(PortRegister::Pin)
    }

    pub fn port_write(&mut self, value: u8) {
        self.regs.write(PortRegister::Port, value)
    }

    /// `release` returns the register block wrapped by the `Port`.
    pub fn release(self) -> R {
        self.regs
    }

    fn set_bit(&mut self, reg: PortRegister, pin: u8, set: bool) {
        if let Some(mask) = mask(pin) {
            if set {
                self.regs.modify(reg, |v| v | mask);
            } else {
                self.regs.modify(reg, |v| v & !mask);
            }
        }
    }
}

impl<R: RegisterBlock<Register = PortRegister>> DigitalPins for Port<R> {
    /// Pins outside 0 to 7 are ignored.
    fn pin_mode(&mut self, pin: u8, mode: PinMode) {
        self.set_bit(PortRegister::Ddr, pin, mode == PinMode::Output)
    }

    /// Pins outside 0 to 7 read low.
    fn pin_read(&mut self, pin: u8) -> Level {
        match mask(pin) {
            Some(mask) => Level::from(self.regs.read(PortRegister::Pin) & mask != 0),
            None => Level::Low,
        }
    }

    fn pin_write(&mut self, pin: u8, level: Level) {
        self.set_bit(PortRegister::Port, pin, level == Level::High)
    }
}

fn mask(pin: u8) -> Option<u8> {
    if pin < 8 {
        Some(1 << pin)
    } else {
        None
    }
}
