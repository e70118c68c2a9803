//! Module `delay` provides busy-wait delays timed by counting CPU cycles.
//!
//! There is no timer involved, so the delays are only as accurate as the
//! clock frequency given to [`Delay::new`], and interrupts that fire during a
//! delay lengthen it.

use embedded_hal::blocking::delay::DelayMs;

// Approximate CPU cycles spent on one iteration of the spin loop.
const CYCLES_PER_SPIN: u32 = 4;

/// `Delay` waits by spinning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Delay {
    f_cpu: u32,
}

impl Delay {
    /// `Delay::new` returns a delay calibrated for a CPU clock of `f_cpu`
    /// hertz.
    pub const fn new(f_cpu: u32) -> Self {
        Self { f_cpu }
    }

    /// `spins_per_ms` is the number of loop iterations in one millisecond.
    pub const fn spins_per_ms(&self) -> u32 {
        self.f_cpu / 1000 / CYCLES_PER_SPIN
    }

    fn spin_ms(&self, ms: u32) -> u64 {
        let per_ms = self.spins_per_ms();
        let mut spins = 0;
        for _ in 0..ms {
            spins += u64::from(spin(per_ms));
        }
        spins
    }
}

fn spin(count: u32) -> u32 {
    let mut i = 0;
    while i < count {
        // Keeps the optimizer from deleting the loop.
        i = core::hint::black_box(i) + 1;
    }
    i
}

impl DelayMs<u16> for Delay {
    fn delay_ms(&mut self, ms: u16) {
        self.spin_ms(u32::from(ms));
    }
}

impl DelayMs<u8> for Delay {
    fn delay_ms(&mut self, ms: u8) {
        self.spin_ms(u32::from(ms));
    }
}
