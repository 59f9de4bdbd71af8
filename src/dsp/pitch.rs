//! Pitch and phase mapping.
//!
//! A phase offset only means something relative to a frequency: shifting a
//! 440 Hz tone by 90° is a delay of a quarter period, `(90 / 360) / 440` s.
//! The pitch control follows the 1 V/octave convention referenced to A4.

/// Frequency at 0 V of pitch control.
pub const REFERENCE_HZ: f32 = 440.0;

/// Floor applied to the mapped frequency before it is used as a divisor.
pub const MIN_FREQUENCY_HZ: f32 = 0.1;

/// Below this frequency the phase offset produces no delay at all.
pub const MIN_PHASE_FREQUENCY_HZ: f32 = 20.0;

/// Map a pitch control voltage to a frequency, `440 * 2^cv`, floored at
/// [`MIN_FREQUENCY_HZ`].
pub fn frequency(pitch_cv: f32) -> f32 {
    (REFERENCE_HZ * pitch_cv.exp2()).max(MIN_FREQUENCY_HZ)
}

/// Delay in seconds that shifts a tone of `freq_hz` by `phase_degrees`.
///
/// Sub-audio frequencies would need arbitrarily long delays, so anything
/// below [`MIN_PHASE_FREQUENCY_HZ`] maps to zero.
pub fn phase_delay_seconds(phase_degrees: f32, freq_hz: f32) -> f32 {
    if freq_hz < MIN_PHASE_FREQUENCY_HZ {
        return 0.0;
    }
    (phase_degrees / 360.0) / freq_hz
}
