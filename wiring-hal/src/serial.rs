use core::convert::Infallible;

use embedded_hal::blocking;
use embedded_hal::serial;
use wiring::register::RegisterBlock;
use wiring::serial::{HardwareSerial, UsartRegister};
use wiring::{ByteSink, ByteSource};

/// `SerialPort` is a `wiring` USART as an `embedded-hal` serial reader and
/// writer.
///
/// Reads and writes return `WouldBlock` instead of spinning when the
/// hardware is not ready.
pub struct SerialPort<R: RegisterBlock<Register = UsartRegister>> {
    serial: HardwareSerial<R>,
}

impl<R: RegisterBlock<Register = UsartRegister>> SerialPort<R> {
    /// `SerialPort::new` wraps a port that has already been started with
    /// `begin`.
    pub fn new(serial: HardwareSerial<R>) -> Self {
        Self { serial }
    }

    /// `inner` gives access to the wrapped port, for the formatted output
    /// and scanning operations of `wiring`.
    pub fn inner(&mut self) -> &mut HardwareSerial<R> {
        &mut self.serial
    }

    pub fn release(self) -> HardwareSerial<R> {
        self.serial
    }
}

impl<R: RegisterBlock<Register = UsartRegister>> serial::Read<u8> for SerialPort<R> {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.serial.read().ok_or(nb::Error::WouldBlock)
    }
}

impl<R: RegisterBlock<Register = UsartRegister>> serial::Write<u8> for SerialPort<R> {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if !self.serial.is_write_ready() {
            return Err(nb::Error::WouldBlock);
        }
        self.serial.write_byte(word);
        Ok(())
    }

    /// The port has no transmit buffer of its own to drain.
    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

impl<R: RegisterBlock<Register = UsartRegister>> blocking::serial::write::Default<u8>
    for SerialPort<R>
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::blocking::serial::Write as _;
    use embedded_hal::serial::{Read as _, Write as _};
    use wiring::register::Memory;
    use wiring::serial::{RXC, UDRE};

    fn port(status: u8) -> SerialPort<Memory<UsartRegister>> {
        let mut regs = Memory::new();
        regs.set(UsartRegister::Ucsra, status);
        regs.set(UsartRegister::Udr, b'k');
        SerialPort::new(HardwareSerial::new(regs, 16_000_000))
    }

    #[test]
    fn read_would_block_until_received() {
        assert!(matches!(port(0).read(), Err(nb::Error::WouldBlock)));
        assert!(matches!(port(1 << RXC).read(), Ok(b'k')));
    }

    #[test]
    fn write_would_block_until_ready() {
        let mut busy = port(0);
        assert!(matches!(busy.write(b'x'), Err(nb::Error::WouldBlock)));

        let mut ready = port(1 << UDRE);
        assert!(matches!(ready.write(b'x'), Ok(())));
        assert_eq!(ready.release().release().get(UsartRegister::Udr), b'x');
    }

    #[test]
    fn blocking_write_sends_everything() {
        let mut ready = port(1 << UDRE);
        ready.bwrite_all(b"abc").unwrap();
        ready.bflush().unwrap();

        assert_eq!(ready.release().release().get(UsartRegister::Udr), b'c');
    }
}
