//! Module `serial` drives a USART as a polled, unbuffered serial port.
//!
//! [`HardwareSerial`] implements both halves of the stream abstraction
//! directly on the peripheral's status and data registers: writing a byte
//! waits for the transmit data register to empty, and reading a byte takes
//! whatever is sitting in the receive data register, if anything.

use crate::print::ByteSink;
use crate::register::{Register, RegisterBlock};
use crate::stream::ByteSource;
use crate::Error;

/// `UsartRegister` names the registers of one USART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsartRegister {
    Ucsra,
    Ucsrb,
    Ucsrc,
    Ubrrl,
    Ubrrh,
    Udr,
}

impl Register for UsartRegister {
    fn offset(self) -> usize {
        match self {
            UsartRegister::Ucsra => 0,
            UsartRegister::Ucsrb => 1,
            UsartRegister::Ucsrc => 2,
            UsartRegister::Ubrrl => 4,
            UsartRegister::Ubrrh => 5,
            UsartRegister::Udr => 6,
        }
    }
}

// UCSRnA bits
pub const RXC: u8 = 7;
pub const UDRE: u8 = 5;
pub const U2X: u8 = 1;

// UCSRnB bits
pub const RXEN: u8 = 4;
pub const TXEN: u8 = 3;

// UCSRnC bits
pub const UPM1: u8 = 5;
pub const UPM0: u8 = 4;
pub const USBS: u8 = 3;
pub const UCSZ1: u8 = 2;
pub const UCSZ0: u8 = 1;

// UBRRn is 12 bits wide, holding the divisor minus one.
const MAX_DIVISOR: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// `SerialConfig` describes the line settings applied by
/// [`HardwareSerial::begin_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    pub baud: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

impl SerialConfig {
    /// `SerialConfig::new` returns an 8N1 configuration at the given baud
    /// rate.
    pub const fn new(baud: u32) -> Self {
        Self {
            baud,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
        }
    }

    /// `frame_format` returns the UCSRnC value for the configuration.
    pub(crate) fn frame_format(&self) -> u8 {
        let mut bits = 0u8;
        bits = bits
            | (match self.data_bits {
                DataBits::Five => 0b00,
                DataBits::Six => 0b01,
                DataBits::Seven => 0b10,
                DataBits::Eight => 0b11,
            } << UCSZ0);
        bits = bits
            | (match self.stop_bits {
                StopBits::One => 0,
                StopBits::Two => 1,
            } << USBS);
        bits = bits
            | (match self.parity {
                Parity::None => 0b00,
                Parity::Even => 0b10,
                Parity::Odd => 0b11,
            } << UPM0);
        bits
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new(9600)
    }
}

/// `BaudSetting` is a baud rate divisor and sampling mode for a particular
/// CPU clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudSetting {
    /// `double_speed` selects 8 samples per bit (U2X) rather than 16.
    pub double_speed: bool,
    /// `ubrr` is the value for the baud rate register, one less than the
    /// divisor.
    pub ubrr: u16,
}

impl BaudSetting {
    /// `for_clock` finds the setting whose actual baud rate is closest to
    /// `baud`.
    ///
    /// Both sampling modes are tried, each with its divisor rounded to
    /// nearest. Double speed is chosen only if its error is strictly smaller,
    /// since normal speed tolerates more clock mismatch.
    pub fn for_clock(f_cpu: u32, baud: u32) -> Result<Self, Error> {
        if baud == 0 {
            return Err(Error::InvalidBaud);
        }
        let double = candidate(f_cpu, baud, 8);
        let normal = candidate(f_cpu, baud, 16);

        let (double_speed, divisor) = match (double, normal) {
            (Some((d, d_err)), Some((_, n_err))) if d_err < n_err => (true, d),
            (Some((d, _)), None) => (true, d),
            (_, Some((n, _))) => (false, n),
            (None, None) => return Err(Error::InvalidBaud),
        };
        Ok(Self {
            double_speed,
            ubrr: (divisor - 1) as u16,
        })
    }

    /// `actual_baud` is the baud rate this setting really produces.
    pub fn actual_baud(&self, f_cpu: u32) -> u32 {
        f_cpu / self.samples() / (self.ubrr as u32 + 1)
    }

    fn samples(&self) -> u32 {
        if self.double_speed {
            8
        } else {
            16
        }
    }
}

/// Returns the rounded divisor for `samples` per bit and its absolute baud
/// error, if the divisor fits the register.
fn candidate(f_cpu: u32, baud: u32, samples: u32) -> Option<(u32, u32)> {
    let divisor = (u64::from(f_cpu / baud) + u64::from(samples / 2)) / u64::from(samples);
    if divisor == 0 || divisor > u64::from(MAX_DIVISOR) {
        return None;
    }
    let divisor = divisor as u32;
    let actual = f_cpu / samples / divisor;
    let error = if actual > baud {
        actual - baud
    } else {
        baud - actual
    };
    Some((divisor, error))
}

/// `HardwareSerial` is a USART operated by polling.
///
/// The port is unbuffered: `available` reports at most one byte, and bytes
/// that arrive while nobody is reading are lost to the hardware's overrun
/// handling.
#[derive(Debug)]
pub struct HardwareSerial<R: RegisterBlock<Register = UsartRegister>> {
    regs: R,
    f_cpu: u32,
}

impl<R: RegisterBlock<Register = UsartRegister>> HardwareSerial<R> {
    /// `HardwareSerial::new` wraps a USART's registers. `f_cpu` is the CPU
    /// clock in hertz, from which baud rate divisors are derived.
    pub const fn new(regs: R, f_cpu: u32) -> Self {
        Self { regs, f_cpu }
    }

    /// `begin` enables the port at `baud` with 8 data bits, no parity and
    /// one stop bit.
    pub fn begin(&mut self, baud: u32) -> Result<BaudSetting, Error> {
        self.begin_with(&SerialConfig::new(baud))
    }

    /// `begin_with` enables the port with the given line settings,
    /// returning the baud rate setting that was chosen.
    ///
    /// The registers are written with interrupts masked, so that an
    /// interrupt handler never observes a half-written baud rate.
    pub fn begin_with(&mut self, config: &SerialConfig) -> Result<BaudSetting, Error> {
        let setting = BaudSetting::for_clock(self.f_cpu, config.baud)?;
        let regs = &mut self.regs;
        critical_section::with(|_| {
            regs.write(
                UsartRegister::Ucsra,
                if setting.double_speed { 1 << U2X } else { 0 },
            );
            regs.write(UsartRegister::Ubrrh, (setting.ubrr >> 8) as u8);
            regs.write(UsartRegister::Ubrrl, setting.ubrr as u8);
            regs.write(UsartRegister::Ucsrc, config.frame_format());
            regs.write(UsartRegister::Ucsrb, (1 << RXEN) | (1 << TXEN));
        });

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "usart: baud={=u32} ubrr={=u16} double_speed={=bool}",
            config.baud,
            setting.ubrr,
            setting.double_speed
        );

        Ok(setting)
    }

    /// `end` disables the receiver and transmitter.
    pub fn end(&mut self) {
        let regs = &mut self.regs;
        critical_section::with(|_| {
            regs.modify(UsartRegister::Ucsrb, |v| v & !((1 << RXEN) | (1 << TXEN)));
        });
    }

    /// `is_write_ready` reports whether the transmit data register can take
    /// another byte.
    pub fn is_write_ready(&mut self) -> bool {
        self.regs.read(UsartRegister::Ucsra) & (1 << UDRE) != 0
    }

    /// `is_read_ready` reports whether a received byte is waiting.
    pub fn is_read_ready(&mut self) -> bool {
        self.regs.read(UsartRegister::Ucsra) & (1 << RXC) != 0
    }

    /// `release` returns the register block wrapped by the port.
    pub fn release(self) -> R {
        self.regs
    }
}

impl<R: RegisterBlock<Register = UsartRegister>> ByteSink for HardwareSerial<R> {
    /// Waits for the transmit data register to empty, then writes `value`.
    /// Always accepts the byte.
    fn write_byte(&mut self, value: u8) -> usize {
        while !self.is_write_ready() {}
        self.regs.write(UsartRegister::Udr, value);
        1
    }
}

impl<R: RegisterBlock<Register = UsartRegister>> ByteSource for HardwareSerial<R> {
    fn available(&mut self) -> usize {
        if self.is_read_ready() {
            1
        } else {
            0
        }
    }

    fn read(&mut self) -> Option<u8> {
        if self.is_read_ready() {
            Some(self.regs.read(UsartRegister::Udr))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::print::{Print, Radix};
    use crate::register::Memory;
    use crate::stream::Stream;
    use std::collections::VecDeque;

    const F_16MHZ: u32 = 16_000_000;

    #[test]
    fn baud_table() {
        // (clock, requested) => (double speed, UBRR)
        let cases = [
            (16_000_000, 9600, false, 103),
            (16_000_000, 57600, true, 34),
            (16_000_000, 115200, true, 16),
            (8_000_000, 9600, false, 51),
            (8_000_000, 38400, false, 12),
            (1_000_000, 9600, true, 12),
            (16_000_000, 300, false, 3332),
        ];
        for &(f_cpu, baud, double_speed, ubrr) in &cases {
            assert_eq!(
                BaudSetting::for_clock(f_cpu, baud),
                Ok(BaudSetting { double_speed, ubrr }),
                "{} Hz at {} baud",
                f_cpu,
                baud
            );
        }
    }

    #[test]
    fn baud_tie_favours_normal_speed() {
        // Both modes land on 9615 baud here.
        let setting = BaudSetting::for_clock(F_16MHZ, 9600).unwrap();

        assert!(!setting.double_speed);
        assert_eq!(setting.actual_baud(F_16MHZ), 9615);
    }

    #[test]
    fn baud_falls_back_when_one_mode_cannot_reach() {
        // Too fast for 16 samples per bit.
        let setting = BaudSetting::for_clock(F_16MHZ, 4_000_000).unwrap();
        assert_eq!(setting, BaudSetting { double_speed: true, ubrr: 0 });

        // Too slow for 8 samples per bit.
        let setting = BaudSetting::for_clock(F_16MHZ, 300).unwrap();
        assert!(!setting.double_speed);
    }

    #[test]
    fn unreachable_baud_is_rejected() {
        assert_eq!(BaudSetting::for_clock(F_16MHZ, 0), Err(Error::InvalidBaud));
        assert_eq!(BaudSetting::for_clock(F_16MHZ, 20_000_000), Err(Error::InvalidBaud));
        assert_eq!(BaudSetting::for_clock(F_16MHZ, 100), Err(Error::InvalidBaud));
    }

    #[test]
    fn extreme_clock_is_rejected() {
        assert_eq!(BaudSetting::for_clock(u32::MAX, 1), Err(Error::InvalidBaud));
        assert_eq!(BaudSetting::for_clock(u32::MAX, 9), Err(Error::InvalidBaud));

        let mut serial = HardwareSerial::new(Memory::new(), u32::MAX);
        assert_eq!(serial.begin(1), Err(Error::InvalidBaud));
    }

    #[test]
    fn begin_writes_registers() {
        let mut serial = HardwareSerial::new(Memory::new(), F_16MHZ);
        serial.begin(115200).unwrap();

        let regs = serial.release();
        assert_eq!(regs.get(UsartRegister::Ucsra), 1 << U2X);
        assert_eq!(regs.get(UsartRegister::Ubrrh), 0);
        assert_eq!(regs.get(UsartRegister::Ubrrl), 16);
        assert_eq!(regs.get(UsartRegister::Ucsrb), (1 << RXEN) | (1 << TXEN));
        assert_eq!(regs.get(UsartRegister::Ucsrc), 0b0000_0110);
    }

    #[test]
    fn begin_splits_wide_divisor() {
        let mut serial = HardwareSerial::new(Memory::new(), F_16MHZ);
        serial.begin(300).unwrap();

        let regs = serial.release();
        assert_eq!(regs.get(UsartRegister::Ucsra), 0);
        assert_eq!(regs.get(UsartRegister::Ubrrh), (3332u16 >> 8) as u8);
        assert_eq!(regs.get(UsartRegister::Ubrrl), (3332u16 & 0xff) as u8);
    }

    #[test]
    fn begin_rejects_bad_baud_without_writing() {
        let mut serial = HardwareSerial::new(Memory::new(), F_16MHZ);

        assert_eq!(serial.begin(0), Err(Error::InvalidBaud));
        assert_eq!(serial.release().get(UsartRegister::Ucsrb), 0);
    }

    #[test]
    fn frame_formats() {
        let config = SerialConfig {
            baud: 9600,
            data_bits: DataBits::Seven,
            stop_bits: StopBits::Two,
            parity: Parity::Even,
        };
        assert_eq!(config.frame_format(), (1 << UPM1) | (1 << USBS) | (1 << UCSZ1));

        let config = SerialConfig {
            data_bits: DataBits::Five,
            parity: Parity::Odd,
            ..SerialConfig::default()
        };
        assert_eq!(config.frame_format(), (1 << UPM1) | (1 << UPM0));
    }

    #[test]
    fn end_clears_both_enables() {
        let mut regs = Memory::new();
        regs.set(UsartRegister::Ucsrb, 0b1001_1000);
        let mut serial = HardwareSerial::new(regs, F_16MHZ);
        serial.end();

        assert_eq!(serial.release().get(UsartRegister::Ucsrb), 0b1000_0000);
    }

    /// A USART whose transmitter is always ready and whose receiver hands out
    /// queued bytes one at a time.
    struct Wire {
        regs: Memory<UsartRegister>,
        rx: VecDeque<u8>,
        tx: Vec<u8>,
    }

    impl Wire {
        fn new(rx: &[u8]) -> Self {
            Self {
                regs: Memory::new(),
                rx: rx.iter().copied().collect(),
                tx: Vec::new(),
            }
        }
    }

    impl RegisterBlock for Wire {
        type Register = UsartRegister;

        fn read(&mut self, reg: UsartRegister) -> u8 {
            match reg {
                UsartRegister::Ucsra => {
                    let rxc = if self.rx.is_empty() { 0 } else { 1 << RXC };
                    self.regs.get(reg) | rxc | (1 << UDRE)
                }
                UsartRegister::Udr => self.rx.pop_front().unwrap_or(0),
                _ => self.regs.get(reg),
            }
        }

        fn write(&mut self, reg: UsartRegister, value: u8) {
            match reg {
                UsartRegister::Udr => self.tx.push(value),
                _ => self.regs.set(reg, value),
            }
        }
    }

    #[test]
    fn prints_through_data_register() {
        let mut serial = HardwareSerial::new(Wire::new(b""), F_16MHZ);
        serial.begin(9600).unwrap();

        assert_eq!(serial.println_int(-12i16, Radix::Dec), 5);
        assert_eq!(serial.release().tx, b"-12\r\n");
    }

    #[test]
    fn reads_one_byte_at_a_time() {
        let mut serial = HardwareSerial::new(Wire::new(b"ab"), F_16MHZ);

        assert_eq!(serial.available(), 1);
        assert_eq!(serial.read(), Some(b'a'));
        assert_eq!(serial.read(), Some(b'b'));
        assert_eq!(serial.available(), 0);
        assert_eq!(serial.read(), None);
    }

    #[test]
    fn serial_is_a_stream() {
        let mut serial = HardwareSerial::new(Wire::new(b"+CSQ: 17\r\nOK\r\n"), F_16MHZ);
        let mut value = [0u8; 4];

        assert!(serial.find("+CSQ: "));
        assert_eq!(serial.read_bytes_until(b'\r', &mut value), 2);
        assert_eq!(&value[..2], b"17");
        assert!(serial.find_until("OK", "ERROR"));
    }
}
