use thiserror::Error;

/// Construction and configuration problems.
///
/// Processing itself never fails: an engine in any of these situations
/// simply leaves the buses untouched.
#[derive(Debug, Error, PartialEq)]
pub enum ShiftDelayError {
    #[error("delay memory holds {actual} samples, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("sample rate {0} Hz is outside the supported 32-192 kHz range")]
    UnsupportedSampleRate(f32),
}
