//! # One-Pole Smoothing Filter
//!
//! Parameter jumps are audible: a delay tap that moves by thousands of
//! samples in one step clicks, and a wet/dry mix that snaps produces zipper
//! noise. Every control value the engine consumes is therefore passed
//! through a one-pole lowpass:
//!
//! ```text
//! y[n] = c * y[n-1] + (1 - c) * x[n]
//! ```
//!
//! ## Coefficient from a time constant
//!
//! The filter is specified by its time constant `τ` (how long it takes to
//! cover ~63% of a step) rather than a cutoff frequency:
//!
//! ```text
//! c = e^(-1 / (τ * sample_rate))
//! ```
//!
//! The engine uses two constants: [`FAST_TIME_CONSTANT`] (2 ms) for the
//! delay tap, the wet mix, and an unsettled base delay, and
//! [`SLOW_TIME_CONSTANT`] (50 ms) for a base delay that has settled.

/// Time constant for the per-sample smoothers and an unsettled base delay.
pub const FAST_TIME_CONSTANT: f32 = 0.002;

/// Time constant for the base delay once the Delay Time control has settled.
pub const SLOW_TIME_CONSTANT: f32 = 0.05;

/// Compute the one-pole coefficient for a time constant in seconds.
pub fn coefficient(time_constant_sec: f32, sample_rate: f32) -> f32 {
    (-1.0 / (time_constant_sec * sample_rate)).exp()
}

/// A one-pole (6 dB/octave) lowpass used as a parameter smoother.
///
/// The smoother stores its current output, so it doubles as the "smoothed
/// value" state the engine reads between samples and blocks.
pub struct OnePoleFilter {
    /// Weight given to the previous output. Range: 0.0 (passthrough) to
    /// just under 1.0 (very slow).
    coefficient: f32,

    /// The previous output sample, i.e. the current smoothed value.
    prev_output: f32,
}

impl OnePoleFilter {
    /// Create a passthrough filter whose output starts at `initial`.
    pub fn new(initial: f32) -> Self {
        Self {
            coefficient: 0.0,
            prev_output: initial,
        }
    }

    /// Set the coefficient directly, e.g. one precomputed per block with
    /// [`coefficient()`].
    pub fn set_coefficient(&mut self, coefficient: f32) {
        self.coefficient = coefficient;
    }

    /// Move one step toward `target` and return the new smoothed value.
    pub fn process(&mut self, target: f32) -> f32 {
        let output = self.coefficient * self.prev_output + (1.0 - self.coefficient) * target;
        self.prev_output = output;
        output
    }

    pub fn value(&self) -> f32 {
        self.prev_output
    }

    /// Jump straight to `value`, dropping any smoothing history.
    pub fn reset(&mut self, value: f32) {
        self.prev_output = value;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
