//! Module `print` contains the output half of the stream abstraction.
//!
//! A type only has to implement [`ByteSink::write_byte`] to become a sink.
//! Every sink then automatically implements [`Print`], which converts
//! integers, floats, strings and [`Printable`] values to text and hands the
//! resulting bytes back to the sink. None of the formatting allocates.
//!
//! All operations return the number of bytes the sink actually accepted,
//! which is less than requested if the sink dropped some of them.

use core::ffi::CStr;
use core::fmt;

use crate::Error;

/// The line terminator emitted by every `println` variant.
pub const LINE_TERMINATOR: [u8; 2] = [b'\r', b'\n'];

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

// Wide enough for u64::MAX in base 2.
const NUMBER_BUFFER_LEN: usize = 64;

// Integer part of a printed float must fit in a u32.
const FLOAT_INTEGER_LIMIT: f64 = 4_294_967_296.0;

/// `ByteSink` is the output capability: something that accepts bytes.
pub trait ByteSink {
    /// `write_byte` emits a single byte, returning 1 if it was accepted or 0
    /// if it was dropped.
    fn write_byte(&mut self, value: u8) -> usize;

    /// `write_buffer` emits each byte of `buffer` in order, returning how
    /// many were accepted.
    ///
    /// Implementations may override this for speed, but must emit exactly
    /// the same bytes as calling `write_byte` once per element.
    fn write_buffer(&mut self, buffer: &[u8]) -> usize {
        let mut n = 0;
        for &b in buffer {
            n += self.write_byte(b);
        }
        n
    }

    /// `flush` waits for any bytes buffered by the sink to be sent. The
    /// default does nothing, which suits unbuffered sinks.
    fn flush(&mut self) {}
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_byte(&mut self, value: u8) -> usize {
        (**self).write_byte(value)
    }

    fn write_buffer(&mut self, buffer: &[u8]) -> usize {
        (**self).write_buffer(buffer)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

/// `Radix` selects the numeric base for integer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Radix {
    Bin = 2,
    Oct = 8,
    Dec = 10,
    Hex = 16,
}

impl Radix {
    /// `from_base` returns the radix for `base`, if it is one of the four
    /// supported bases.
    pub fn from_base(base: u8) -> Option<Self> {
        match base {
            2 => Some(Radix::Bin),
            8 => Some(Radix::Oct),
            10 => Some(Radix::Dec),
            16 => Some(Radix::Hex),
            _ => None,
        }
    }

    pub const fn base(self) -> u8 {
        self as u8
    }
}

impl Default for Radix {
    fn default() -> Self {
        Radix::Dec
    }
}

mod sealed {
    pub trait Sealed {}
}

/// `Integer` is implemented for each primitive integer type up to 64 bits,
/// and describes how [`Print::print_int`] should render it.
pub trait Integer: Copy + sealed::Sealed {
    /// `magnitude` returns whether the value is negative along with its
    /// absolute value, for decimal output.
    fn magnitude(self) -> (bool, u64);

    /// `bit_pattern` returns the value reinterpreted as unsigned at its own
    /// width, for output in the non-decimal radices.
    fn bit_pattern(self) -> u64;
}

macro_rules! unsigned_integer {
    ($($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {}

            impl Integer for $t {
                fn magnitude(self) -> (bool, u64) {
                    (false, self as u64)
                }

                fn bit_pattern(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

macro_rules! signed_integer {
    ($($t:ty => $u:ty),*) => {
        $(
            impl sealed::Sealed for $t {}

            impl Integer for $t {
                fn magnitude(self) -> (bool, u64) {
                    (self < 0, (self as i64).unsigned_abs())
                }

                fn bit_pattern(self) -> u64 {
                    self as $u as u64
                }
            }
        )*
    };
}

unsigned_integer!(u8, u16, u32, u64, usize);
signed_integer!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, isize => usize);

/// `Printable` is implemented by values that know how to render themselves
/// onto any sink.
pub trait Printable {
    /// `print_to` writes the value's textual form to `out`, returning the
    /// number of bytes accepted.
    fn print_to(&self, out: &mut dyn ByteSink) -> usize;
}

/// `Print` is the formatted-output API available on every [`ByteSink`].
///
/// Each method converts its argument to bytes and delegates to the sink; none
/// of them do any I/O of their own.
pub trait Print: ByteSink {
    /// `write_cstr` writes a NUL-terminated string, excluding the
    /// terminator. Writing `None` is not an error and writes nothing.
    fn write_cstr(&mut self, s: Option<&CStr>) -> usize {
        match s {
            Some(s) => self.write_buffer(s.to_bytes()),
            None => 0,
        }
    }

    fn print_str(&mut self, s: &str) -> usize {
        self.write_buffer(s.as_bytes())
    }

    fn print_char(&mut self, c: char) -> usize {
        let mut buf = [0u8; 4];
        self.write_buffer(c.encode_utf8(&mut buf).as_bytes())
    }

    /// `print_int` writes `n` in the given radix, most significant digit
    /// first, using upper-case digits above 9.
    ///
    /// Only decimal output carries a sign. In the other radices a negative
    /// value is written as its two's-complement bit pattern at its own width,
    /// so `-1i8` in hex is `FF`.
    fn print_int<I: Integer>(&mut self, n: I, radix: Radix) -> usize {
        match radix {
            Radix::Dec => {
                let (negative, magnitude) = n.magnitude();
                let mut count = 0;
                if negative {
                    count += self.write_byte(b'-');
                }
                count + print_number(self, magnitude, radix.base())
            }
            _ => print_number(self, n.bit_pattern(), radix.base()),
        }
    }

    /// `print_float` writes `n` with exactly `places` digits after the
    /// decimal point, rounding half away from zero in the last place.
    ///
    /// Values whose rounded integer part does not fit in 32 bits fail with
    /// [`Error::OutOfRange`], and NaN fails with [`Error::NotANumber`]. In
    /// both cases nothing is written.
    fn print_float(&mut self, n: f64, places: u8) -> Result<usize, Error> {
        if n.is_nan() {
            return Err(Error::NotANumber);
        }
        let negative = n < 0.0;
        let mut n = if negative { -n } else { n };

        let mut rounding = 0.5;
        for _ in 0..places {
            rounding /= 10.0;
        }
        n += rounding;

        if !(n < FLOAT_INTEGER_LIMIT) {
            return Err(Error::OutOfRange);
        }

        let int_part = n as u32;
        let mut remainder = n - int_part as f64;

        let mut count = 0;
        if negative {
            count += self.write_byte(b'-');
        }
        count += self.print_int(int_part, Radix::Dec);
        if places > 0 {
            count += self.write_byte(b'.');
        }
        for _ in 0..places {
            remainder *= 10.0;
            let digit = remainder as u8;
            count += self.write_byte(DIGITS[digit as usize]);
            remainder -= digit as f64;
        }
        Ok(count)
    }

    /// `print_fmt` renders `core::fmt` arguments onto the sink, for use with
    /// `format_args!`.
    fn print_fmt(&mut self, args: fmt::Arguments<'_>) -> usize {
        let mut counter = Counter {
            out: self,
            count: 0,
        };
        // Only a failing Display impl can produce an error here, and what it
        // managed to write has already been counted.
        let _ = fmt::write(&mut counter, args);
        counter.count
    }

    fn print_printable<P: Printable + ?Sized>(&mut self, p: &P) -> usize
    where
        Self: Sized,
    {
        p.print_to(self)
    }

    /// `println` writes just the line terminator.
    fn println(&mut self) -> usize {
        self.write_buffer(&LINE_TERMINATOR)
    }

    fn println_str(&mut self, s: &str) -> usize {
        self.print_str(s) + self.println()
    }

    fn println_char(&mut self, c: char) -> usize {
        self.print_char(c) + self.println()
    }

    fn println_int<I: Integer>(&mut self, n: I, radix: Radix) -> usize {
        self.print_int(n, radix) + self.println()
    }

    /// `println_float` is [`Print::print_float`] followed by the line
    /// terminator. On error neither is written.
    fn println_float(&mut self, n: f64, places: u8) -> Result<usize, Error> {
        let count = self.print_float(n, places)?;
        Ok(count + self.println())
    }

    fn println_fmt(&mut self, args: fmt::Arguments<'_>) -> usize {
        self.print_fmt(args) + self.println()
    }

    fn println_printable<P: Printable + ?Sized>(&mut self, p: &P) -> usize
    where
        Self: Sized,
    {
        self.print_printable(p) + self.println()
    }
}

impl<S: ByteSink + ?Sized> Print for S {}

fn print_number<S: ByteSink + ?Sized>(out: &mut S, mut n: u64, base: u8) -> usize {
    let base = base as u64;
    let mut buf = [0u8; NUMBER_BUFFER_LEN];
    let mut i = buf.len();
    loop {
        i -= 1;
        buf[i] = DIGITS[(n % base) as usize];
        n /= base;
        if n == 0 {
            break;
        }
    }
    out.write_buffer(&buf[i..])
}

struct Counter<'a, S: ?Sized> {
    out: &'a mut S,
    count: usize,
}

impl<S: ByteSink + ?Sized> fmt::Write for Counter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.count += self.out.write_buffer(s.as_bytes());
        Ok(())
    }
}
