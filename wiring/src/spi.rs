//! Module `spi` drives the SPI peripheral as a bus master.
//!
//! The peripheral is configured with [`SpiConfig`] and then exchanges one
//! byte at a time with [`Spi::transfer`], which busy-waits for each exchange
//! to complete.

use crate::digital::{DigitalPins, PinMode};
use crate::register::{Register, RegisterBlock};

/// `SpiRegister` names the registers of the SPI peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiRegister {
    Spcr,
    Spsr,
    Spdr,
}

impl Register for SpiRegister {
    fn offset(self) -> usize {
        match self {
            SpiRegister::Spcr => 0,
            SpiRegister::Spsr => 1,
            SpiRegister::Spdr => 2,
        }
    }
}

// SPCR bits
pub const SPE: u8 = 6;
pub const DORD: u8 = 5;
pub const MSTR: u8 = 4;
pub const CPOL: u8 = 3;
pub const CPHA: u8 = 2;
pub const SPR1: u8 = 1;
pub const SPR0: u8 = 0;

// SPSR bits
pub const SPIF: u8 = 7;
pub const SPI2X: u8 = 0;

const CLOCK_MASK: u8 = (1 << SPR1) | (1 << SPR0);
const MODE_MASK: u8 = (1 << CPOL) | (1 << CPHA);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// `DataMode` selects clock polarity and phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataMode {
    /// Clock idles low, data sampled on the leading edge.
    Mode0,
    /// Clock idles low, data sampled on the trailing edge.
    Mode1,
    /// Clock idles high, data sampled on the leading edge.
    Mode2,
    /// Clock idles high, data sampled on the trailing edge.
    Mode3,
}

/// `ClockDivider` selects the SPI clock as a fraction of the CPU clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDivider {
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
}

impl ClockDivider {
    /// `code` is the 3-bit hardware encoding: bit 2 is SPI2X, bits 1 and 0
    /// are SPR1 and SPR0.
    pub fn code(self) -> u8 {
        match self {
            ClockDivider::Div4 => 0b000,
            ClockDivider::Div16 => 0b001,
            ClockDivider::Div64 => 0b010,
            ClockDivider::Div128 => 0b011,
            ClockDivider::Div2 => 0b100,
            ClockDivider::Div8 => 0b101,
            ClockDivider::Div32 => 0b110,
        }
    }

    pub fn divisor(self) -> u32 {
        match self {
            ClockDivider::Div2 => 2,
            ClockDivider::Div4 => 4,
            ClockDivider::Div8 => 8,
            ClockDivider::Div16 => 16,
            ClockDivider::Div32 => 32,
            ClockDivider::Div64 => 64,
            ClockDivider::Div128 => 128,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    pub bit_order: BitOrder,
    pub data_mode: DataMode,
    pub clock: ClockDivider,
}

/// The peripheral's state out of reset.
pub const DEFAULT_CONFIG: SpiConfig = SpiConfig {
    bit_order: BitOrder::MsbFirst,
    data_mode: DataMode::Mode0,
    clock: ClockDivider::Div4,
};

impl Default for SpiConfig {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}

impl SpiConfig {
    /// `control_bits` returns the configuration's contribution to SPCR.
    pub(crate) fn control_bits(&self) -> u8 {
        let mut bits = 0u8;
        bits = bits
            | (match self.bit_order {
                BitOrder::MsbFirst => 0,
                BitOrder::LsbFirst => 1,
            } << DORD);
        bits = bits | mode_bits(self.data_mode);
        bits = bits | (self.clock.code() & CLOCK_MASK);
        bits
    }

    /// `status_bits` returns the configuration's contribution to SPSR.
    pub(crate) fn status_bits(&self) -> u8 {
        (self.clock.code() >> 2) << SPI2X
    }
}

fn mode_bits(mode: DataMode) -> u8 {
    match mode {
        DataMode::Mode0 => 0,
        DataMode::Mode1 => 1 << CPHA,
        DataMode::Mode2 => 1 << CPOL,
        DataMode::Mode3 => (1 << CPOL) | (1 << CPHA),
    }
}

/// `Spi` is the SPI peripheral in master mode.
///
/// It also holds the digital port carrying the clock and data-out pins,
/// because enabling the peripheral requires making those pins outputs.
#[derive(Debug)]
pub struct Spi<R, P>
where
    R: RegisterBlock<Register = SpiRegister>,
    P: DigitalPins,
{
    regs: R,
    pins: P,
    sck: u8,
    mosi: u8,
}

impl<R, P> Spi<R, P>
where
    R: RegisterBlock<Register = SpiRegister>,
    P: DigitalPins,
{
    /// `Spi::new` associates the peripheral's registers with the port that
    /// carries its `sck` and `mosi` pins. Nothing is written until `begin`.
    pub fn new(regs: R, pins: P, sck: u8, mosi: u8) -> Self {
        Self {
            regs,
            pins,
            sck,
            mosi,
        }
    }

    /// `begin` makes the clock and data-out pins outputs and enables the
    /// peripheral as bus master. Calling it again has no further effect.
    pub fn begin(&mut self) {
        self.pins.pin_mode(self.sck, PinMode::Output);
        self.pins.pin_mode(self.mosi, PinMode::Output);
        self.regs.modify(SpiRegister::Spcr, |v| v | (1 << MSTR));
        self.regs.modify(SpiRegister::Spcr, |v| v | (1 << SPE));

        #[cfg(feature = "defmt")]
        defmt::debug!("spi: enabled, sck={=u8} mosi={=u8}", self.sck, self.mosi);
    }

    /// `end` disables the peripheral and returns its pins to inputs.
    pub fn end(&mut self) {
        self.regs.modify(SpiRegister::Spcr, |v| v & !(1 << SPE));
        self.pins.pin_mode(self.sck, PinMode::Input);
        self.pins.pin_mode(self.mosi, PinMode::Input);

        #[cfg(feature = "defmt")]
        defmt::debug!("spi: disabled");
    }

    /// `transfer` clocks `data` out while clocking one byte in, waiting for
    /// the exchange to finish, and returns the byte received.
    pub fn transfer(&mut self, data: u8) -> u8 {
        self.regs.write(SpiRegister::Spdr, data);
        while self.regs.read(SpiRegister::Spsr) & (1 << SPIF) == 0 {}
        self.regs.read(SpiRegister::Spdr)
    }

    /// `transfer_in_place` exchanges each byte of `words` in turn, replacing
    /// it with the byte received.
    pub fn transfer_in_place(&mut self, words: &mut [u8]) {
        for word in words.iter_mut() {
            *word = self.transfer(*word);
        }
    }

    /// `configure` applies bit order, data mode and clock rate together.
    pub fn configure(&mut self, config: &SpiConfig) {
        let keep = !((1 << DORD) | MODE_MASK | CLOCK_MASK);
        let control = config.control_bits();
        self.regs.modify(SpiRegister::Spcr, |v| (v & keep) | control);
        let status = config.status_bits();
        self.regs
            .modify(SpiRegister::Spsr, |v| (v & !(1 << SPI2X)) | status);
    }

    pub fn set_bit_order(&mut self, order: BitOrder) {
        match order {
            BitOrder::LsbFirst => self.regs.modify(SpiRegister::Spcr, |v| v | (1 << DORD)),
            BitOrder::MsbFirst => self.regs.modify(SpiRegister::Spcr, |v| v & !(1 << DORD)),
        }
    }

    pub fn set_data_mode(&mut self, mode: DataMode) {
        let bits = mode_bits(mode);
        self.regs
            .modify(SpiRegister::Spcr, |v| (v & !MODE_MASK) | bits);
    }

    pub fn set_clock_divider(&mut self, clock: ClockDivider) {
        let code = clock.code();
        self.regs
            .modify(SpiRegister::Spcr, |v| (v & !CLOCK_MASK) | (code & CLOCK_MASK));
        self.regs
            .modify(SpiRegister::Spsr, |v| (v & !(1 << SPI2X)) | ((code >> 2) << SPI2X));
    }

    /// `release` returns the register block and pin port wrapped by the
    /// `Spi`.
    pub fn release(self) -> (R, P) {
        (self.regs, self.pins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digital::{Port, PortRegister};
    use crate::register::Memory;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Access {
        Read(SpiRegister),
        Write(SpiRegister, u8),
    }

    /// Records register traffic. Writing SPDR completes an exchange
    /// immediately, loading `incoming` and raising SPIF.
    struct Recorder {
        regs: Memory<SpiRegister>,
        incoming: u8,
        log: Vec<Access>,
    }

    impl Recorder {
        fn new(incoming: u8) -> Self {
            Self {
                regs: Memory::new(),
                incoming,
                log: Vec::new(),
            }
        }
    }

    impl RegisterBlock for Recorder {
        type Register = SpiRegister;

        fn read(&mut self, reg: SpiRegister) -> u8 {
            self.log.push(Access::Read(reg));
            self.regs.get(reg)
        }

        fn write(&mut self, reg: SpiRegister, value: u8) {
            self.log.push(Access::Write(reg, value));
            if reg == SpiRegister::Spdr {
                self.regs.set(SpiRegister::Spdr, self.incoming);
                let status = self.regs.get(SpiRegister::Spsr);
                self.regs.set(SpiRegister::Spsr, status | (1 << SPIF));
            } else {
                self.regs.set(reg, value);
            }
        }
    }

    fn spi(incoming: u8) -> Spi<Recorder, Port<Memory<PortRegister>>> {
        Spi::new(Recorder::new(incoming), Port::new(Memory::new()), 5, 3)
    }

    #[test]
    fn transfer_is_one_exchange() {
        let mut spi = spi(0x5a);

        assert_eq!(spi.transfer(0xff), 0x5a);

        let (regs, _) = spi.release();
        assert_eq!(
            regs.log,
            vec![
                Access::Write(SpiRegister::Spdr, 0xff),
                Access::Read(SpiRegister::Spsr),
                Access::Read(SpiRegister::Spdr),
            ]
        );
    }

    #[test]
    fn transfer_in_place_replaces_words() {
        let mut spi = spi(0x11);
        let mut words = [1, 2, 3];
        spi.transfer_in_place(&mut words);

        assert_eq!(words, [0x11, 0x11, 0x11]);
    }

    #[test]
    fn begin_enables_master_and_pins() {
        let mut spi = spi(0);
        spi.begin();
        spi.begin();

        let (regs, port) = spi.release();
        assert_eq!(regs.regs.get(SpiRegister::Spcr), (1 << MSTR) | (1 << SPE));
        assert_eq!(port.release().get(PortRegister::Ddr), (1 << 5) | (1 << 3));
    }

    #[test]
    fn end_disables_and_releases_pins() {
        let mut spi = spi(0);
        spi.begin();
        spi.end();

        let (regs, port) = spi.release();
        assert_eq!(regs.regs.get(SpiRegister::Spcr), 1 << MSTR);
        assert_eq!(port.release().get(PortRegister::Ddr), 0);
    }

    #[test]
    fn clock_divider_splits_across_registers() {
        let cases = [
            (ClockDivider::Div2, 0b00, 1),
            (ClockDivider::Div4, 0b00, 0),
            (ClockDivider::Div8, 0b01, 1),
            (ClockDivider::Div16, 0b01, 0),
            (ClockDivider::Div32, 0b10, 1),
            (ClockDivider::Div64, 0b10, 0),
            (ClockDivider::Div128, 0b11, 0),
        ];
        for &(clock, spr, spi2x) in &cases {
            let mut spi = spi(0);
            spi.begin();
            spi.set_clock_divider(clock);

            let (regs, _) = spi.release();
            let spcr = regs.regs.get(SpiRegister::Spcr);
            assert_eq!(spcr & CLOCK_MASK, spr, "{:?}", clock);
            assert_eq!(spcr & (1 << SPE), 1 << SPE, "{:?}", clock);
            assert_eq!(regs.regs.get(SpiRegister::Spsr), spi2x, "{:?}", clock);
        }
    }

    #[test]
    fn bit_order_and_mode() {
        let mut spi = spi(0);
        spi.set_bit_order(BitOrder::LsbFirst);
        spi.set_data_mode(DataMode::Mode3);
        spi.set_data_mode(DataMode::Mode1);
        spi.set_bit_order(BitOrder::MsbFirst);

        let (regs, _) = spi.release();
        assert_eq!(regs.regs.get(SpiRegister::Spcr), 1 << CPHA);
    }

    #[test]
    fn configure_preserves_enable_bits() {
        let mut spi = spi(0);
        spi.begin();
        spi.configure(&SpiConfig {
            bit_order: BitOrder::LsbFirst,
            data_mode: DataMode::Mode2,
            clock: ClockDivider::Div8,
        });

        let (regs, _) = spi.release();
        assert_eq!(
            regs.regs.get(SpiRegister::Spcr),
            (1 << SPE) | (1 << MSTR) | (1 << DORD) | (1 << CPOL) | 0b01
        );
        assert_eq!(regs.regs.get(SpiRegister::Spsr), 1 << SPI2X);
    }

    #[test]
    fn default_config_is_reset_state() {
        assert_eq!(SpiConfig::default().control_bits(), 0);
        assert_eq!(SpiConfig::default().status_bits(), 0);
    }
}
