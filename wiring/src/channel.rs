//! Module `channel` adapts `embedded-hal` serial implementations to the
//! stream abstraction.
//!
//! Any transmitter and receiver implementing
//! [`embedded_hal::serial::Write`] and [`embedded_hal::serial::Read`] can be
//! wrapped in a [`Channel`], which is then a full [`Stream`](crate::Stream):
//!
//! ```rust,ignore
//! let (tx, rx) = port.split();
//! let mut ch = Channel::new(tx, rx);
//! ch.println_str("AT");
//! let ok = ch.find_until("OK", "ERROR");
//! ```

use embedded_hal::serial;

use crate::print::ByteSink;
use crate::stream::ByteSource;

/// `ChannelError` is an error reported by the wrapped serial objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError<TXErr, RXErr> {
    /// `Write` holds the error returned by the underlying serial writer.
    Write(TXErr),

    /// `Read` holds the error returned by the underlying serial reader.
    Read(RXErr),
}

impl<TXErr, RXErr> ChannelError<TXErr, RXErr> {
    fn tx(got: TXErr) -> Self {
        ChannelError::Write(got)
    }

    fn rx(got: RXErr) -> Self {
        ChannelError::Read(got)
    }
}

/// `Channel` is a duplex stream over a pair of `embedded-hal` serial
/// objects.
///
/// The byte-level operations cannot report the underlying errors, so a
/// failing write counts as a dropped byte and a failing read as an empty
/// one. The most recent error is kept and can be collected with
/// [`Channel::take_error`].
pub struct Channel<TX: serial::Write<u8>, RX: serial::Read<u8>> {
    tx: TX,
    rx: RX,
    pending: Option<u8>,
    error: Option<ChannelError<TX::Error, RX::Error>>,
}

impl<TX, RX, TXErr, RXErr> Channel<TX, RX>
where
    TX: serial::Write<u8, Error = TXErr>,
    RX: serial::Read<u8, Error = RXErr>,
{
    /// `Channel::new` associates a serial writer and reader with a new
    /// `Channel`.
    ///
    /// The objects are consumed. To get them back, call `release`.
    pub fn new(tx: TX, rx: RX) -> Self {
        Self {
            tx,
            rx,
            pending: None,
            error: None,
        }
    }

    /// `take_error` returns the most recent error from the underlying serial
    /// objects, if any, and clears it.
    pub fn take_error(&mut self) -> Option<ChannelError<TXErr, RXErr>> {
        self.error.take()
    }

    /// `discard_input` throws away everything the reader has ready, stopping
    /// as soon as it would have to wait.
    pub fn discard_input(&mut self) -> Result<(), ChannelError<TXErr, RXErr>> {
        self.pending = None;
        loop {
            match self.rx.read() {
                Ok(_) => (),
                Err(nb::Error::WouldBlock) => return Ok(()),
                Err(nb::Error::Other(err)) => return Err(ChannelError::rx(err)),
            }
        }
    }

    /// `release` returns the serial writer and reader wrapped by the
    /// `Channel`. A byte that was seen by `available` but not yet read is
    /// lost.
    pub fn release(self) -> (TX, RX) {
        (self.tx, self.rx)
    }

    fn poll(&mut self) -> Option<u8> {
        if let Some(c) = self.pending.take() {
            return Some(c);
        }
        match self.rx.read() {
            Ok(c) => Some(c),
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(err)) => {
                self.error = Some(ChannelError::rx(err));
                None
            }
        }
    }
}

impl<TX, RX, TXErr, RXErr> ByteSink for Channel<TX, RX>
where
    TX: serial::Write<u8, Error = TXErr>,
    RX: serial::Read<u8, Error = RXErr>,
{
    fn write_byte(&mut self, value: u8) -> usize {
        match nb::block!(self.tx.write(value)) {
            Ok(()) => 1,
            Err(err) => {
                self.error = Some(ChannelError::tx(err));
                0
            }
        }
    }

    fn flush(&mut self) {
        if let Err(err) = nb::block!(self.tx.flush()) {
            self.error = Some(ChannelError::tx(err));
        }
    }
}

impl<TX, RX, TXErr, RXErr> ByteSource for Channel<TX, RX>
where
    TX: serial::Write<u8, Error = TXErr>,
    RX: serial::Read<u8, Error = RXErr>,
{
    /// Reports 1 if a byte is ready. The reader has no way to look ahead, so
    /// this reads one byte early and holds it for the next `read`.
    fn available(&mut self) -> usize {
        if self.pending.is_none() {
            self.pending = self.poll();
        }
        if self.pending.is_some() {
            1
        } else {
            0
        }
    }

    fn read(&mut self) -> Option<u8> {
        self.poll()
    }
}
