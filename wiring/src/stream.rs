//! Module `stream` contains the input half of the stream abstraction.
//!
//! A type implementing both [`ByteSink`](crate::print::ByteSink) and
//! [`ByteSource`] is a full duplex stream, and automatically implements
//! [`Stream`]: everything in [`Print`] plus token search and buffered,
//! delimited reads.
//!
//! All of the reads poll the source synchronously. None of them wait for data
//! that has not yet arrived: an empty source ends the operation. There is no
//! timeout, because there is no clock to measure one against.

use crate::print::{ByteSink, Print};

#[cfg(any(test, feature = "alloc"))]
use alloc::vec::Vec;

/// `ByteSource` is the input capability: something that may have bytes
/// ready to read.
pub trait ByteSource {
    /// `available` returns how many bytes can be read without waiting. A
    /// hardware port that cannot tell reports 1 when at least one byte is
    /// ready.
    fn available(&mut self) -> usize;

    /// `read` returns the next byte, or `None` if no byte is ready. It never
    /// waits.
    fn read(&mut self) -> Option<u8>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn available(&mut self) -> usize {
        (**self).available()
    }

    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }
}

/// `Stream` is the sequential-input API available on every duplex port.
pub trait Stream: Print + ByteSource {
    /// `find` reads from the stream until `target` has been read, returning
    /// true, or until the stream runs dry, returning false.
    ///
    /// An empty `target` matches immediately without consuming anything.
    fn find<T: AsRef<[u8]>>(&mut self, target: T) -> bool {
        self.find_until(target, b"")
    }

    /// `find_until` is like [`Stream::find`], but also gives up, returning
    /// false, if `terminator` is read before `target` completes. An empty
    /// terminator never matches.
    ///
    /// Matching tracks only the length of the current partial match for each
    /// pattern, so it is not a general substring search. When a byte breaks
    /// a partial match of `target`, matching restarts with that byte compared
    /// against the first byte of `target` only. A partial match of
    /// `terminator` that breaks is simply discarded. For example, searching
    /// for `AAB` in `AAAB` fails because the third `A` resets the match.
    fn find_until<T, U>(&mut self, target: T, terminator: U) -> bool
    where
        T: AsRef<[u8]>,
        U: AsRef<[u8]>,
    {
        let mut scan = Scan::new(target.as_ref(), terminator.as_ref());
        if scan.target.is_empty() {
            return true;
        }
        while self.available() > 0 {
            let c = match self.read() {
                Some(c) => c,
                None => break,
            };
            if let Some(found) = scan.feed(c) {
                return found;
            }
        }
        false
    }

    /// `read_bytes` fills `buffer` from the stream, stopping early if the
    /// stream runs dry. It returns the number of bytes stored.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in buffer.iter_mut() {
            match self.read() {
                Some(c) => *slot = c,
                None => break,
            }
            count += 1;
        }
        count
    }

    /// `read_bytes_until` is like [`Stream::read_bytes`] but also stops at
    /// the first `terminator` byte, which is consumed from the stream but not
    /// stored. An empty buffer reads nothing.
    fn read_bytes_until(&mut self, terminator: u8, buffer: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in buffer.iter_mut() {
            match self.read() {
                Some(c) if c != terminator => *slot = c,
                _ => break,
            }
            count += 1;
        }
        count
    }

    /// `read_string` collects everything up to the point the stream runs dry.
    ///
    /// The result grows without bound. Where memory is tight, prefer
    /// [`Stream::read_string_bounded`] or [`Stream::read_bytes`].
    #[cfg(any(test, feature = "alloc"))]
    fn read_string(&mut self) -> Vec<u8> {
        let mut ret = Vec::new();
        while let Some(c) = self.read() {
            ret.push(c);
        }
        ret
    }

    /// `read_string_until` collects bytes up to the first `terminator`, which
    /// is consumed but not included, or until the stream runs dry.
    #[cfg(any(test, feature = "alloc"))]
    fn read_string_until(&mut self, terminator: u8) -> Vec<u8> {
        let mut ret = Vec::new();
        while let Some(c) = self.read() {
            if c == terminator {
                break;
            }
            ret.push(c);
        }
        ret
    }

    /// `read_string_bounded` collects at most `N` bytes, stopping when the
    /// stream runs dry. Bytes beyond the first `N` stay in the stream.
    fn read_string_bounded<const N: usize>(&mut self) -> heapless::Vec<u8, N> {
        let mut ret = heapless::Vec::new();
        while !ret.is_full() {
            match self.read() {
                Some(c) => {
                    // Cannot fail: checked for room above.
                    let _ = ret.push(c);
                }
                None => break,
            }
        }
        ret
    }

    /// `read_string_until_bounded` is [`Stream::read_string_until`] limited to
    /// `N` bytes. If the buffer fills first, the terminator has not been
    /// consumed.
    fn read_string_until_bounded<const N: usize>(&mut self, terminator: u8) -> heapless::Vec<u8, N> {
        let mut ret = heapless::Vec::new();
        while !ret.is_full() {
            match self.read() {
                Some(c) if c != terminator => {
                    let _ = ret.push(c);
                }
                _ => break,
            }
        }
        ret
    }
}

impl<T: ByteSink + ByteSource + ?Sized> Stream for T {}

/// Match cursors for [`Stream::find_until`]. Each counts how many bytes of
/// its pattern the most recent run of input has matched.
struct Scan<'a> {
    target: &'a [u8],
    terminator: &'a [u8],
    target_index: usize,
    terminator_index: usize,
}

impl<'a> Scan<'a> {
    fn new(target: &'a [u8], terminator: &'a [u8]) -> Self {
        Self {
            target,
            terminator,
            target_index: 0,
            terminator_index: 0,
        }
    }

    /// Advances both cursors past `c`. Returns `Some(true)` once the target
    /// is complete, `Some(false)` once the terminator is, and `None` while
    /// neither is. `target` must not be empty.
    fn feed(&mut self, c: u8) -> Option<bool> {
        if c != self.target[self.target_index] {
            self.target_index = 0;
        }
        if c == self.target[self.target_index] {
            self.target_index += 1;
            if self.target_index >= self.target.len() {
                return Some(true);
            }
        }

        if !self.terminator.is_empty() && c == self.terminator[self.terminator_index] {
            self.terminator_index += 1;
            if self.terminator_index >= self.terminator.len() {
                return Some(false);
            }
        } else {
            self.terminator_index = 0;
        }
        None
    }
}
