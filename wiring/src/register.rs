//! Module `register` is the boundary between the ports in this crate and the
//! hardware they drive.
//!
//! Each peripheral names its registers with a small enum implementing
//! [`Register`]. A port is generic over a [`RegisterBlock`] for that enum, so
//! the same port logic runs against real memory-mapped I/O on the target
//! ([`Mmio`]) or against plain memory on a workstation ([`Memory`]).

use core::marker::PhantomData;

/// `Register` identifies one 8-bit register within a peripheral's register
/// block.
pub trait Register: Copy {
    /// `offset` is the register's byte offset from the start of the block.
    fn offset(self) -> usize;
}

/// `RegisterBlock` gives read and write access to the registers of one
/// peripheral instance.
///
/// Both operations take `&mut self` because reading a hardware data register
/// commonly has side effects, such as popping a receive buffer.
pub trait RegisterBlock {
    type Register: Register;

    fn read(&mut self, reg: Self::Register) -> u8;

    fn write(&mut self, reg: Self::Register, value: u8);

    /// `modify` performs a read-modify-write of a single register.
    ///
    /// This is not atomic with respect to interrupts. Callers that share a
    /// register with an interrupt handler must arrange their own exclusion.
    fn modify<F>(&mut self, reg: Self::Register, f: F)
    where
        F: FnOnce(u8) -> u8,
    {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

/// `Mmio` is a register block backed by volatile memory-mapped I/O starting
/// at a fixed data-space address.
#[derive(Debug)]
pub struct Mmio<R: Register> {
    base: usize,
    _registers: PhantomData<R>,
}

impl<R: Register> Mmio<R> {
    /// `Mmio::new` creates a handle for the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the data-space address of a peripheral whose register
    /// layout matches `R`, and the caller must ensure that handles to the
    /// same peripheral are not used to violate each other's assumptions.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            base,
            _registers: PhantomData,
        }
    }

    fn address(&self, reg: R) -> *mut u8 {
        (self.base + reg.offset()) as *mut u8
    }
}

impl<R: Register> RegisterBlock for Mmio<R> {
    type Register = R;

    fn read(&mut self, reg: R) -> u8 {
        // Safety: the address was vouched for when this handle was created.
        unsafe { core::ptr::read_volatile(self.address(reg)) }
    }

    fn write(&mut self, reg: R, value: u8) {
        // Safety: as above.
        unsafe { core::ptr::write_volatile(self.address(reg), value) }
    }
}

/// Size of the largest register block described in this crate.
const MEMORY_SIZE: usize = 8;

/// `Memory` is a register block backed by ordinary memory, with none of the
/// side effects of real hardware. A value written is simply read back.
///
/// This is useful for exercising port logic on a development workstation:
/// set the status bits a port polls for with [`Memory::set`], drive the
/// port, then inspect what it wrote with [`Memory::get`].
#[derive(Debug, Clone)]
pub struct Memory<R: Register> {
    cells: [u8; MEMORY_SIZE],
    _registers: PhantomData<R>,
}

impl<R: Register> Memory<R> {
    /// `Memory::new` creates a register block with every register zeroed,
    /// matching the reset state of the peripherals in this crate.
    pub const fn new() -> Self {
        Self {
            cells: [0; MEMORY_SIZE],
            _registers: PhantomData,
        }
    }

    pub fn get(&self, reg: R) -> u8 {
        self.cells[reg.offset()]
    }

    pub fn set(&mut self, reg: R, value: u8) {
        self.cells[reg.offset()] = value;
    }
}

impl<R: Register> Default for Memory<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Register> RegisterBlock for Memory<R> {
    type Register = R;

    fn read(&mut self, reg: R) -> u8 {
        self.get(reg)
    }

    fn write(&mut self, reg: R, value: u8) {
        self.set(reg, value)
    }
}
