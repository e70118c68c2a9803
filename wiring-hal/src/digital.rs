use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::digital::v2::{InputPin, OutputPin};
use wiring::digital::{DigitalPins, Level, PinMode};

/// `PortPin` borrows one pin of a `wiring` port as an `embedded-hal`
/// digital pin.
///
/// `embedded-hal` reads pins through a shared reference while `wiring`
/// needs exclusive access to the port registers, so the borrow is held in a
/// `RefCell`.
pub struct PortPin<'a, P: DigitalPins> {
    port: RefCell<&'a mut P>,
    pin: u8,
}

impl<'a, P: DigitalPins> PortPin<'a, P> {
    /// `PortPin::output` makes `pin` an output and borrows it.
    pub fn output(port: &'a mut P, pin: u8) -> Self {
        port.pin_mode(pin, PinMode::Output);
        Self {
            port: RefCell::new(port),
            pin,
        }
    }

    /// `PortPin::input` makes `pin` an input and borrows it.
    pub fn input(port: &'a mut P, pin: u8) -> Self {
        port.pin_mode(pin, PinMode::Input);
        Self {
            port: RefCell::new(port),
            pin,
        }
    }

    fn level(&self) -> Level {
        self.port.borrow_mut().pin_read(self.pin)
    }
}

impl<P: DigitalPins> OutputPin for PortPin<'_, P> {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.port.get_mut().pin_write(self.pin, Level::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.port.get_mut().pin_write(self.pin, Level::High);
        Ok(())
    }
}

impl<P: DigitalPins> InputPin for PortPin<'_, P> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.level() == Level::High)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.level() == Level::Low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiring::digital::{Port, PortRegister};
    use wiring::register::Memory;

    #[test]
    fn output_pin_drives_port_bit() {
        let mut port = Port::new(Memory::new());
        {
            let mut led = PortPin::output(&mut port, 5);
            led.set_high().unwrap();
            led.set_low().unwrap();
            led.set_high().unwrap();
        }

        let regs = port.release();
        assert_eq!(regs.get(PortRegister::Ddr), 1 << 5);
        assert_eq!(regs.get(PortRegister::Port), 1 << 5);
    }

    #[test]
    fn input_pin_senses_port_bit() {
        let mut regs = Memory::new();
        regs.set(PortRegister::Ddr, 0xff);
        regs.set(PortRegister::Pin, 1 << 2);
        let mut port = Port::new(regs);

        let button = PortPin::input(&mut port, 2);
        assert_eq!(button.is_high(), Ok(true));
        assert_eq!(button.is_low(), Ok(false));
        drop(button);

        assert_eq!(port.release().get(PortRegister::Ddr), 0xff & !(1 << 2));
    }
}
