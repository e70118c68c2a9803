//! In-memory duplex port for unit tests.

use std::collections::VecDeque;

use crate::print::ByteSink;
use crate::stream::ByteSource;

pub(crate) struct MockPort {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    tx_capacity: Option<usize>,
}

impl MockPort {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            tx: Vec::new(),
            tx_capacity: None,
        }
    }

    /// A port with `input` queued for reading.
    pub fn with_input(input: &[u8]) -> Self {
        let mut port = Self::new();
        port.rx.extend(input.iter().copied());
        port
    }

    /// A port that drops every byte written after the first `capacity`.
    pub fn with_tx_capacity(capacity: usize) -> Self {
        let mut port = Self::new();
        port.tx_capacity = Some(capacity);
        port
    }

    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    pub fn written_str(&self) -> String {
        String::from_utf8(self.tx.clone()).unwrap()
    }

    pub fn remaining(&self) -> Vec<u8> {
        self.rx.iter().copied().collect()
    }
}

impl ByteSink for MockPort {
    fn write_byte(&mut self, value: u8) -> usize {
        match self.tx_capacity {
            Some(capacity) if self.tx.len() >= capacity => 0,
            _ => {
                self.tx.push(value);
                1
            }
        }
    }
}

impl ByteSource for MockPort {
    fn available(&mut self) -> usize {
        self.rx.len()
    }

    fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}
