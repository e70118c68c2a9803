use core::convert::Infallible;

use embedded_hal::blocking::spi;
use wiring::digital::DigitalPins;
use wiring::register::RegisterBlock;
use wiring::spi::{Spi, SpiRegister};

/// `SpiBus` is a `wiring` SPI master as an `embedded-hal` blocking SPI bus.
pub struct SpiBus<R, P>
where
    R: RegisterBlock<Register = SpiRegister>,
    P: DigitalPins,
{
    spi: Spi<R, P>,
}

impl<R, P> SpiBus<R, P>
where
    R: RegisterBlock<Register = SpiRegister>,
    P: DigitalPins,
{
    /// `SpiBus::new` enables the peripheral and wraps it.
    pub fn new(mut spi: Spi<R, P>) -> Self {
        spi.begin();
        Self { spi }
    }

    /// `release` disables the peripheral and returns it.
    pub fn release(mut self) -> Spi<R, P> {
        self.spi.end();
        self.spi
    }
}

impl<R, P> spi::Transfer<u8> for SpiBus<R, P>
where
    R: RegisterBlock<Register = SpiRegister>,
    P: DigitalPins,
{
    type Error = Infallible;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        self.spi.transfer_in_place(words);
        Ok(words)
    }
}

impl<R, P> spi::Write<u8> for SpiBus<R, P>
where
    R: RegisterBlock<Register = SpiRegister>,
    P: DigitalPins,
{
    type Error = Infallible;

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for &word in words {
            self.spi.transfer(word);
        }
        Ok(())
    }
}
