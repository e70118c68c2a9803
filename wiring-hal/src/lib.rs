//! `embedded-hal` implementations for the `wiring` ports
//!
//! [`embedded-hal`](https://crates.io/crates/embedded-hal) is a hardware
//! abstraction layer for embedded systems. Device drivers written against its
//! traits run on any microcontroller that implements them.
//!
//! This library implements some of the `embedded-hal` traits in terms of the
//! polled ports from the `wiring` crate, so that such drivers can be used on
//! the AVR parts `wiring` supports:
//!
//! - [`serial::SerialPort`] wraps a `HardwareSerial` as a non-blocking
//!   serial reader and writer.
//! - [`spi::SpiBus`] wraps an `Spi` as a blocking SPI bus.
//! - [`digital::PortPin`] borrows a single pin of a `Port` as a digital input
//!   and output pin.
//!
//! All of the wrappers take an already-constructed port from the `wiring`
//! crate. Configuring it (baud rate, SPI clock, and so on) is still done
//! through `wiring`.

#![cfg_attr(not(test), no_std)]

extern crate embedded_hal;

pub mod digital;
pub mod serial;
pub mod spi;
