//! # DSP (Digital Signal Processing) Primitives
//!
//! - **`delay_line`**: the ring buffer holding input history, and the
//!   interpolated reader that taps it at any (even negative) delay.
//!
//! - **`filter`**: one-pole smoothers that keep delay time and wet/dry mix
//!   from jumping.
//!
//! - **`pitch`**: pitch CV to frequency, and phase offset to delay time.
//!
//! - **`stabilizer`**: debounces the Delay Time control and crossfades
//!   between the old and new base delay.

pub mod delay_line;
pub mod filter;
pub mod pitch;
pub mod stabilizer;
