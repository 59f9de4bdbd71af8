//! # Delay Line (Ring Buffer)
//!
//! A fixed-capacity circular buffer holding the unprocessed input history,
//! plus the interpolated reader that taps it.
//!
//! ## Reading around the write head
//!
//! The read position for a delay of `d` samples is
//!
//! ```text
//! read_pos = write_pos - d
//! ```
//!
//! `d` may be negative (a "look-ahead" read, which lands on history written
//! almost one full buffer ago) and, after modulation, may be several buffer
//! lengths long. The position is folded back into `[0, capacity)` by adding
//! or subtracting the capacity at most [`MAX_WRAPS`] times, then hard-clamped
//! as a last resort, so every read resolves to an in-range index.
//!
//! ## Linear Interpolation
//!
//! ```text
//! result = buffer[i] * (1 - frac) + buffer[i + 1] * frac
//! ```
//!
//! where `i = floor(read_pos)` and `frac` is the fractional part. The result
//! always lies between the two neighbouring samples.

/// Upper bound on buffer-length folds performed by a single read.
pub const MAX_WRAPS: usize = 10;

/// A ring buffer that functions as an audio delay line.
///
/// The buffer comes from the host (or from `initialize()`) fully sized, so
/// no memory allocation ever happens during audio processing.
pub struct DelayLine {
    /// The circular buffer storing audio samples, zero-filled on creation.
    buffer: Box<[f32]>,

    /// Where the next incoming sample will be stored. Always `< buffer.len()`.
    write_pos: usize,
}

impl DelayLine {
    /// Take ownership of `memory` as delay storage and zero it.
    ///
    /// Panics in debug builds on an empty slice; callers validate the length
    /// before handing memory over.
    pub fn from_memory(mut memory: Box<[f32]>) -> Self {
        debug_assert!(!memory.is_empty(), "delay line needs at least one sample");
        memory.fill(0.0);
        Self {
            buffer: memory,
            write_pos: 0,
        }
    }

    /// Allocate a zeroed delay line of `capacity` samples.
    #[cfg(test)]
    pub fn new(capacity: usize) -> Self {
        Self::from_memory(vec![0.0; capacity].into_boxed_slice())
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[cfg(test)]
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Store `sample` at the write head and advance it, wrapping to 0 at the
    /// end of the buffer.
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Read `delay_sec` seconds behind the write head.
    pub fn read(&self, delay_sec: f32, sample_rate: f32) -> f32 {
        self.read_samples(f64::from(delay_sec) * f64::from(sample_rate))
    }

    /// Read `delay_samples` behind the write head with linear interpolation.
    ///
    /// Positions are computed in `f64`: at 192 kHz the buffer holds over a
    /// million samples, which leaves `f32` with no fractional resolution.
    pub fn read_samples(&self, delay_samples: f64) -> f32 {
        let capacity = self.buffer.len();
        let len = capacity as f64;

        let delay_samples = if delay_samples.is_nan() {
            0.0
        } else {
            let limit = len * MAX_WRAPS as f64;
            delay_samples.clamp(-limit, limit)
        };

        let mut read_pos = self.write_pos as f64 - delay_samples;

        let mut wraps = 0;
        while read_pos < 0.0 && wraps < MAX_WRAPS {
            read_pos += len;
            wraps += 1;
        }
        while read_pos >= len && wraps < MAX_WRAPS {
            read_pos -= len;
            wraps += 1;
        }
        let read_pos = read_pos.clamp(0.0, len - 1.0);

        let index_a = read_pos as usize % capacity;
        let index_b = (index_a + 1) % capacity;
        let frac = (read_pos - read_pos.floor()) as f32;

        self.buffer[index_a] * (1.0 - frac) + self.buffer[index_b] * frac
    }

    /// Silence the buffer and move the write head back to the start.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
