//! Minimal I/O runtime for 8-bit microcontrollers
//!
//! This library provides a small, allocation-free set of building blocks for
//! talking to the outside world from an AVR-class microcontroller: a
//! polymorphic byte-stream abstraction with formatted output and lexical
//! scanning, a polled USART port, a blocking SPI master, and digital port
//! primitives, plus busy-wait delays.
//!
//! Everything is layered over two capabilities. A type that can emit bytes
//! implements [`ByteSink`](print::ByteSink) and receives the whole of
//! [`Print`](print::Print) for free:
//!
//! ```rust,ignore
//! serial.begin(9600)?;
//! serial.print_str("temperature: ");
//! serial.println_float(21.5, 1)?;
//! serial.println_int(0xbeefu16, Radix::Hex);
//! ```
//!
//! A type that can also produce bytes implements
//! [`ByteSource`](stream::ByteSource) and then satisfies
//! [`Stream`](stream::Stream), which adds token search and delimited reads:
//!
//! ```rust,ignore
//! if serial.find_until("OK", "ERROR") {
//!     let mut line = [0u8; 32];
//!     let n = serial.read_bytes_until(b'\n', &mut line);
//! }
//! ```
//!
//! The concrete ports ([`HardwareSerial`](serial::HardwareSerial),
//! [`Spi`](spi::Spi) and [`Port`](digital::Port)) never touch memory
//! directly. Instead they go through a [`RegisterBlock`](register::RegisterBlock),
//! which is either real memory-mapped I/O ([`Mmio`](register::Mmio)) or a
//! plain in-memory stand-in for running on a development workstation.
//!
//! Any existing `embedded-hal` serial implementation can also join in by
//! wrapping it in a [`Channel`](channel::Channel).

#![cfg_attr(not(test), no_std)]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

pub mod avr;
pub mod channel;
pub mod delay;
pub mod digital;
pub mod entry;
pub mod print;
pub mod register;
pub mod serial;
pub mod spi;
pub mod stream;

#[cfg(test)]
mod mock;

pub use channel::{Channel, ChannelError};
pub use delay::Delay;
pub use digital::{DigitalPins, Level, PinMode, Port};
pub use entry::{run, Sketch};
pub use print::{ByteSink, Integer, Print, Printable, Radix};
pub use serial::{HardwareSerial, SerialConfig};
pub use spi::{Spi, SpiConfig};
pub use stream::{ByteSource, Stream};

/// `Error` represents the conditions under which an operation refuses its
/// input rather than producing output.
///
/// Byte-level operations never return this; they report short counts or
/// empty reads instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// `OutOfRange` indicates a floating point value whose integer part does
    /// not fit in 32 bits, including infinities.
    OutOfRange,

    /// `NotANumber` indicates a floating point NaN, which has no textual
    /// rendering.
    NotANumber,

    /// `InvalidBaud` indicates a requested baud rate that no divisor in the
    /// 12-bit baud register can approximate, in either speed mode.
    InvalidBaud,
}
