//! Program entry.
//!
//! A program is a [`Sketch`]: something set up once and then stepped
//! forever. The peripherals it uses live in a context value owned by
//! [`run`] and lent to the sketch on every call, rather than in globals.
//!
//! ```rust,ignore
//! struct Echo;
//!
//! impl Sketch for Echo {
//!     type Context = Board;
//!
//!     fn setup(&mut self, board: &mut Board) {
//!         board.serial.begin(9600).ok();
//!     }
//!
//!     fn tick(&mut self, board: &mut Board) {
//!         if let Some(c) = board.serial.read() {
//!             board.serial.write_byte(c);
//!         }
//!     }
//! }
//!
//! run(Echo, Board::take(16_000_000).unwrap())
//! ```

/// `Sketch` is the user program.
pub trait Sketch {
    /// `Context` holds the ports and other state shared with the program.
    type Context;

    /// `setup` is called exactly once, before the first `tick`.
    fn setup(&mut self, ctx: &mut Self::Context);

    /// `tick` is called repeatedly, forever.
    fn tick(&mut self, ctx: &mut Self::Context);
}

/// `run` calls `setup` and then `tick` in an endless loop. It never returns.
pub fn run<S: Sketch>(mut sketch: S, mut ctx: S::Context) -> ! {
    sketch.setup(&mut ctx);
    loop {
        sketch.tick(&mut ctx);
    }
}
