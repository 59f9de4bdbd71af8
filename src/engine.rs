//! # ShiftDelay Engine
//!
//! All mutable state of one running effect, and the per-block processing
//! that drives it.
//!
//! ## Signal Flow
//!
//! ```text
//!                once per block
//! Delay Time ──► [Stabilizer] ──► base delay ──► [slow/fast smoother]
//!                                                        │
//!                 per sample                             ▼
//! Phase + CV ─┐                                   (+) ◄── phase delay
//! Pitch + CV ─┴─► frequency ──► phase delay ──────►│
//!                                                  ▼
//!                                         [fast smoother] ──► tap ─┐
//!                                                                  │
//! Input ──┬──────────────────────────────────────── × (1 - mix) ──(+)──► Output bus
//!         │                                               ▲
//!         └──► [Delay Line] ──► tap(s), crossfaded ── × mix
//! ```
//!
//! The delay line always stores the dry input, never the output, so the
//! phase tap and the base delay read the same history independently.

use std::mem;

use crate::dsp::delay_line::DelayLine;
use crate::dsp::filter::OnePoleFilter;
use crate::dsp::pitch::{frequency, phase_delay_seconds};
use crate::dsp::stabilizer::{PotStabilizer, Timing};
use crate::error::ShiftDelayError;
use crate::params::BlockParams;
use crate::routing::BusRouting;

/// Longest base delay the Delay Time control can select.
pub const MAX_DELAY_SECONDS: f32 = 6.0;

pub const MIN_SAMPLE_RATE: f32 = 32_000.0;
pub const MAX_SAMPLE_RATE: f32 = 192_000.0;

/// Delay line length in samples: six seconds at the highest supported
/// sample rate, whatever rate is actually in use.
pub const DELAY_CAPACITY: usize = 6 * 192_000;

const MIN_BASE_DELAY_SECONDS: f32 = 0.005;

const PHASE_DEGREES_PER_VOLT: f32 = 72.0;
const WET_MIX_PER_VOLT: f32 = 0.1;

const INITIAL_DELAY_TIME: f32 = 0.01;
const INITIAL_BASE_DELAY: f32 = 2.0;
const INITIAL_WET_MIX: f32 = 0.5;

/// Memory the host must provide for one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRequirements {
    pub state_bytes: usize,
    pub delay_samples: usize,
    pub delay_bytes: usize,
}

pub fn is_supported_sample_rate(sample_rate: f32) -> bool {
    (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate)
}

/// The state of one ShiftDelay instance.
///
/// Every field is owned here; nothing is shared between instances. Only
/// [`process_block()`](Self::process_block) mutates it while audio runs.
pub struct ShiftDelay {
    /// `None` until the host attaches delay memory. Processing is a no-op
    /// without it.
    delay_line: Option<DelayLine>,

    /// Total delay (phase delay + base delay) feeding the read tap.
    delay_time: OnePoleFilter,

    /// Base delay, stepped once per block toward the committed Delay Time.
    base_delay: OnePoleFilter,

    wet_mix: OnePoleFilter,

    stabilizer: PotStabilizer,
}

impl Default for ShiftDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl ShiftDelay {
    /// Create an instance with no delay memory attached yet.
    pub fn new() -> Self {
        Self {
            delay_line: None,
            delay_time: OnePoleFilter::new(INITIAL_DELAY_TIME),
            base_delay: OnePoleFilter::new(INITIAL_BASE_DELAY),
            wet_mix: OnePoleFilter::new(INITIAL_WET_MIX),
            stabilizer: PotStabilizer::new(INITIAL_BASE_DELAY),
        }
    }

    pub fn memory_requirements() -> MemoryRequirements {
        MemoryRequirements {
            state_bytes: mem::size_of::<Self>(),
            delay_samples: DELAY_CAPACITY,
            delay_bytes: DELAY_CAPACITY * mem::size_of::<f32>(),
        }
    }

    /// Take `memory` as the delay buffer. It must hold exactly
    /// [`DELAY_CAPACITY`] samples and is zeroed before use.
    pub fn attach_memory(&mut self, memory: Box<[f32]>) -> Result<(), ShiftDelayError> {
        if memory.len() != DELAY_CAPACITY {
            return Err(ShiftDelayError::BufferSize {
                expected: DELAY_CAPACITY,
                actual: memory.len(),
            });
        }
        self.delay_line = Some(DelayLine::from_memory(memory));
        Ok(())
    }

    pub fn has_memory(&self) -> bool {
        self.delay_line.is_some()
    }

    pub fn check_sample_rate(sample_rate: f32) -> Result<(), ShiftDelayError> {
        if is_supported_sample_rate(sample_rate) {
            Ok(())
        } else {
            Err(ShiftDelayError::UnsupportedSampleRate(sample_rate))
        }
    }

    /// Silence the delay line and return every smoother and the stabilizer
    /// to their starting values. Attached memory is kept.
    pub fn reset(&mut self) {
        if let Some(delay_line) = self.delay_line.as_mut() {
            delay_line.clear();
        }
        self.delay_time.reset(INITIAL_DELAY_TIME);
        self.base_delay.reset(INITIAL_BASE_DELAY);
        self.wet_mix.reset(INITIAL_WET_MIX);
        self.stabilizer = PotStabilizer::new(INITIAL_BASE_DELAY);
    }

    /// The smoothed total delay currently feeding the read tap, in seconds.
    pub fn delay_time(&self) -> f32 {
        self.delay_time.value()
    }

    #[cfg(test)]
    pub fn is_crossfading(&self) -> bool {
        self.stabilizer.is_fading()
    }

    /// How long the effect keeps sounding after its input goes silent.
    pub fn tail_samples(&self, sample_rate: f32) -> u32 {
        (self.delay_time().abs() * sample_rate) as u32
    }

    /// Process one block.
    ///
    /// `buses` is bus-major: bus `b` holds frames
    /// `[b * num_frames, (b + 1) * num_frames)`. The output bus is written
    /// in place according to the output mode. Nothing happens at an
    /// unsupported sample rate or without delay memory.
    pub fn process_block(
        &mut self,
        sample_rate: f32,
        buses: &mut [f32],
        num_frames: usize,
        params: &BlockParams,
    ) {
        if !is_supported_sample_rate(sample_rate) || num_frames == 0 {
            return;
        }
        let Some(delay_line) = self.delay_line.as_mut() else {
            return;
        };
        let Some(routing) = BusRouting::resolve(&params.routing, buses.len() / num_frames) else {
            return;
        };

        let timing = Timing::new(sample_rate);
        let max_delay_sec = delay_line.capacity() as f32 / sample_rate;

        // ─── Once per block: debounce Delay Time, step the base delay ───
        let pot_sec = params.delay_time_ms / 1000.0;
        self.stabilizer
            .update(pot_sec, num_frames, &timing, self.base_delay.value());

        self.base_delay.set_coefficient(if self.stabilizer.is_settled(&timing) {
            timing.slow_coefficient
        } else {
            timing.fast_coefficient
        });
        let base_target = self
            .stabilizer
            .target()
            .clamp(MIN_BASE_DELAY_SECONDS, MAX_DELAY_SECONDS);
        let base_delay = self
            .base_delay
            .process(base_target)
            .clamp(-max_delay_sec, max_delay_sec);

        self.delay_time.set_coefficient(timing.fast_coefficient);
        self.wet_mix.set_coefficient(timing.fast_coefficient);

        let base_wet_mix = params.wet_mix_percent / 100.0;

        // ─── Per sample ───
        for i in 0..num_frames {
            let phase_cv = routing.phase_cv.map_or(0.0, |bus| buses[bus * num_frames + i]);
            let dry_wet_cv = routing
                .dry_wet_cv
                .map_or(0.0, |bus| buses[bus * num_frames + i]);
            let pitch_cv = routing.pitch_cv.map_or(0.0, |bus| buses[bus * num_frames + i]);
            let input = buses[routing.audio_in * num_frames + i];

            let wet_mix = self
                .wet_mix
                .process((base_wet_mix + dry_wet_cv * WET_MIX_PER_VOLT).clamp(0.0, 1.0));

            let freq_hz = frequency(params.pitch_cv + pitch_cv);
            let phase_delay = phase_delay_seconds(
                params.phase_offset_deg + phase_cv * PHASE_DEGREES_PER_VOLT,
                freq_hz,
            );
            let total_delay = (phase_delay + base_delay).clamp(-max_delay_sec, max_delay_sec);
            let delay_time = self.delay_time.process(total_delay);

            let new_tap = delay_line.read(delay_time, sample_rate);
            let wet = match self.stabilizer.crossfade(&timing) {
                Some(fade) => {
                    let old_delay =
                        (phase_delay + fade.old_delay_sec).clamp(-max_delay_sec, max_delay_sec);
                    let old_tap = delay_line.read(old_delay, sample_rate);
                    self.stabilizer.advance(&timing);
                    fade.blend(old_tap, new_tap)
                }
                None => new_tap,
            };

            let output = wet_mix * wet + (1.0 - wet_mix) * input;
            params
                .output_mode
                .write(&mut buses[routing.output * num_frames + i], output);

            delay_line.write(input);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::params::OutputMode;
    use crate::routing::{BusAssignments, MAX_BUSES};

    const SAMPLE_RATE: f32 = 48_000.0;
    const BLOCK: usize = 64;

    fn engine() -> ShiftDelay {
        let mut engine = ShiftDelay::new();
        engine
            .attach_memory(vec![0.0; DELAY_CAPACITY].into_boxed_slice())
            .unwrap();
        engine
    }

    fn buses(frames: usize) -> Vec<f32> {
        vec![0.0; MAX_BUSES * frames]
    }

    fn replace() -> BlockParams {
        BlockParams {
            output_mode: OutputMode::Replace,
            ..BlockParams::default()
        }
    }

    /// Run `blocks` silent blocks.
    fn run(engine: &mut ShiftDelay, params: &BlockParams, blocks: usize) {
        let mut buses = buses(BLOCK);
        for _ in 0..blocks {
            buses.fill(0.0);
            engine.process_block(SAMPLE_RATE, &mut buses, BLOCK, params);
        }
    }

    #[test]
    fn test_memory_requirements() {
        let reqs = ShiftDelay::memory_requirements();
        assert_eq!(reqs.delay_samples, 1_152_000);
        assert_eq!(reqs.delay_bytes, 4 * 1_152_000);
        assert!(reqs.state_bytes > 0);
    }

    #[test]
    fn test_wrong_memory_size_is_rejected() {
        let mut engine = ShiftDelay::new();
        let err = engine
            .attach_memory(vec![0.0; 1024].into_boxed_slice())
            .unwrap_err();
        assert_eq!(
            err,
            ShiftDelayError::BufferSize {
                expected: DELAY_CAPACITY,
                actual: 1024,
            }
        );
        assert!(!engine.has_memory());
    }

    #[test]
    fn test_no_memory_is_a_no_op() {
        let mut engine = ShiftDelay::new();
        let mut buses: Vec<f32> = (0..MAX_BUSES * BLOCK).map(|i| i as f32).collect();
        let before = buses.clone();
        engine.process_block(SAMPLE_RATE, &mut buses, BLOCK, &replace());
        assert_eq!(buses, before);
        assert_eq!(engine.delay_time(), INITIAL_DELAY_TIME);
    }

    #[test]
    fn test_unsupported_sample_rate_is_a_no_op() {
        let mut engine = engine();
        for sample_rate in [22_050.0, 31_999.0, 192_001.0, 384_000.0, f32::NAN] {
            assert!(ShiftDelay::check_sample_rate(sample_rate).is_err());
            let mut buses = vec![0.5; MAX_BUSES * BLOCK];
            engine.process_block(sample_rate, &mut buses, BLOCK, &replace());
            assert!(buses.iter().all(|&s| s == 0.5));
        }
        assert!(ShiftDelay::check_sample_rate(32_000.0).is_ok());
        assert!(ShiftDelay::check_sample_rate(192_000.0).is_ok());
    }

    #[test]
    fn test_empty_block_is_a_no_op() {
        let mut engine = engine();
        engine.process_block(SAMPLE_RATE, &mut [], 0, &replace());
        assert_eq!(engine.delay_time(), INITIAL_DELAY_TIME);
    }

    /// With silent history the wet tap is zero, so the output is the dry
    /// input scaled by `1 - mix`, added to or replacing the bus.
    #[test]
    fn test_output_modes() {
        for (mode, expected) in [(OutputMode::Add, 1.25), (OutputMode::Replace, 0.25)] {
            let mut engine = engine();
            let params = BlockParams {
                output_mode: mode,
                routing: BusAssignments {
                    output: 2,
                    ..BusAssignments::default()
                },
                ..BlockParams::default()
            };
            let mut buses = buses(BLOCK);
            buses[..BLOCK].fill(0.5);
            buses[BLOCK..2 * BLOCK].fill(1.0);

            engine.process_block(SAMPLE_RATE, &mut buses, BLOCK, &params);

            for &sample in &buses[BLOCK..2 * BLOCK] {
                assert_eq!(sample, expected);
            }
            // The input bus is left alone.
            assert!(buses[..BLOCK].iter().all(|&s| s == 0.5));
        }
    }

    /// The delay line stores the dry input even when the output replaces
    /// the input bus in place.
    #[test]
    fn test_delay_line_stores_dry_input() {
        let mut engine = engine();
        let mut buses = buses(BLOCK);
        let input: Vec<f32> = (0..BLOCK).map(|i| (i as f32 + 1.0) / BLOCK as f32).collect();
        buses[..BLOCK].copy_from_slice(&input);

        engine.process_block(SAMPLE_RATE, &mut buses, BLOCK, &replace());

        assert_ne!(&buses[..BLOCK], &input[..]);
        let delay_line = engine.delay_line.as_ref().unwrap();
        for k in 1..=BLOCK {
            assert_eq!(delay_line.read_samples(k as f64), input[BLOCK - k]);
        }
    }

    /// 48 kHz, 2000 ms, 0°, 50%, 0 V: the tap settles at 2 s and the output
    /// is half the input from two seconds ago plus half the current input.
    #[test]
    fn test_settled_default_scenario() {
        let mut engine = engine();
        let params = replace();
        let delay_samples = 96_000;
        let total_blocks = (delay_samples + 14_000) / BLOCK;

        let signal = |n: usize| {
            (2.0 * std::f64::consts::PI * 5.0 * n as f64 / f64::from(SAMPLE_RATE)).sin() as f32
        };

        let mut buses = buses(BLOCK);
        for block in 0..total_blocks {
            let start = block * BLOCK;
            buses.fill(0.0);
            for i in 0..BLOCK {
                buses[i] = signal(start + i);
            }

            engine.process_block(SAMPLE_RATE, &mut buses, BLOCK, &params);

            if block + 1 == total_blocks {
                for i in 0..BLOCK {
                    let n = start + i;
                    let expected = 0.5 * signal(n - delay_samples) + 0.5 * signal(n);
                    assert_abs_diff_eq!(buses[i], expected, epsilon = 1e-4);
                }
            }
        }

        assert_abs_diff_eq!(engine.delay_time(), 2.0, epsilon = 1e-5);
        assert_eq!(engine.base_delay.value(), 2.0);
        assert_eq!(engine.wet_mix.value(), 0.5);
        assert!(!engine.is_crossfading());
    }

    /// With constant inputs the smoothed wet mix and delay time get strictly
    /// closer to their targets on every block.
    #[test]
    fn test_smoothers_converge_monotonically() {
        let mut engine = engine();
        let params = BlockParams {
            wet_mix_percent: 80.0,
            ..replace()
        };

        let mut wet_error = (0.8 - engine.wet_mix.value()).abs();
        let mut delay_error = (2.0 - engine.delay_time()).abs();
        for _ in 0..10 {
            run(&mut engine, &params, 1);
            let next_wet = (0.8 - engine.wet_mix.value()).abs();
            let next_delay = (2.0 - engine.delay_time()).abs();
            assert!(next_wet < wet_error);
            assert!(next_delay < delay_error);
            wet_error = next_wet;
            delay_error = next_delay;
        }
    }

    fn count_fade_starts(engine: &mut ShiftDelay, params: &BlockParams, blocks: usize) -> usize {
        let mut starts = 0;
        for _ in 0..blocks {
            let was_fading = engine.is_crossfading();
            run(engine, params, 1);
            if !was_fading && engine.is_crossfading() {
                starts += 1;
            }
        }
        starts
    }

    #[test]
    fn test_held_delay_time_fades_exactly_once() {
        let mut engine = engine();
        let params = replace();
        assert_eq!(count_fade_starts(&mut engine, &params, 300), 1);

        let params = BlockParams {
            delay_time_ms: 1000.0,
            ..params
        };
        assert_eq!(count_fade_starts(&mut engine, &params, 300), 1);
        assert_eq!(engine.stabilizer.target(), 1.0);
    }

    #[test]
    fn test_moving_delay_time_never_fades() {
        let mut engine = engine();
        let mut params = replace();
        for block in 0..300 {
            // A new value every 10 blocks (640 samples, under 20 ms).
            params.delay_time_ms = 1000.0 + (block / 10) as f32;
            run(&mut engine, &params, 1);
            assert!(!engine.is_crossfading());
        }
    }

    #[test]
    fn test_crossfade_lasts_fifty_milliseconds() {
        const SMALL_BLOCK: usize = 4;
        let mut engine = engine();
        let params = replace();
        let mut buses = buses(SMALL_BLOCK);
        let mut process = |engine: &mut ShiftDelay| {
            buses.fill(0.0);
            engine.process_block(SAMPLE_RATE, &mut buses, SMALL_BLOCK, &params);
        };

        while !engine.is_crossfading() {
            process(&mut engine);
        }
        // The committing block already produced four blended samples;
        // 2400 samples in total is 600 blocks of four.
        for _ in 0..598 {
            process(&mut engine);
        }
        assert!(engine.is_crossfading());
        process(&mut engine);
        assert!(!engine.is_crossfading());
    }

    /// With a ramp in the history every tap reads a distinct value, so the
    /// blended output pins down which delays the two taps were read at.
    #[test]
    fn test_crossfade_moves_from_old_tap_to_new_tap() {
        // 2400 fade samples are exactly 75 blocks of 32.
        const FRAMES: usize = 32;
        const SCALE: f32 = 1e-5;

        let mut engine = engine();
        let delay_line = engine.delay_line.as_mut().unwrap();
        for n in 0..DELAY_CAPACITY {
            delay_line.write(n as f32 * SCALE);
        }

        // One full period of 110 Hz: about 436 samples of phase delay.
        let mut params = BlockParams {
            phase_offset_deg: 360.0,
            wet_mix_percent: 100.0,
            pitch_cv: -2.0,
            ..replace()
        };
        let phase_delay = phase_delay_seconds(360.0, frequency(-2.0));
        let max_delay_sec = DELAY_CAPACITY as f32 / SAMPLE_RATE;

        let mut buses = buses(FRAMES);
        let mut next = DELAY_CAPACITY;
        // Returns (first input, first output, last input, last output).
        let mut process = |engine: &mut ShiftDelay, params: &BlockParams| {
            buses.fill(0.0);
            for (i, slot) in buses[..FRAMES].iter_mut().enumerate() {
                *slot = (next + i) as f32 * SCALE;
            }
            next += FRAMES;
            let (first_input, last_input) = (buses[0], buses[FRAMES - 1]);
            engine.process_block(SAMPLE_RATE, &mut buses, FRAMES, params);
            (first_input, buses[0], last_input, buses[FRAMES - 1])
        };

        // Let the start-up fade at 2000 ms run to completion.
        while !engine.is_crossfading() {
            process(&mut engine, &params);
        }
        while engine.is_crossfading() {
            process(&mut engine, &params);
        }

        params.delay_time_ms = 1000.0;
        let (first_input, first_output, old_tap, old_delay) = loop {
            let old_delay =
                (phase_delay + engine.base_delay.value()).clamp(-max_delay_sec, max_delay_sec);
            let old_tap = engine
                .delay_line
                .as_ref()
                .unwrap()
                .read(old_delay, SAMPLE_RATE);
            let (first_input, first_output, _, _) = process(&mut engine, &params);
            if engine.is_crossfading() {
                break (first_input, first_output, old_tap, old_delay);
            }
        };
        let wet = engine.wet_mix.value();
        assert_abs_diff_eq!(
            first_output,
            wet * old_tap + (1.0 - wet) * first_input,
            epsilon = 1e-5
        );

        let mut last = (0.0, 0.0);
        while engine.is_crossfading() {
            let (_, _, last_input, last_output) = process(&mut engine, &params);
            last = (last_input, last_output);
        }
        let (last_input, last_output) = last;
        // The write head has moved one past the last blended sample.
        let delay_line = engine.delay_line.as_ref().unwrap();
        let tap_at = |delay_sec: f32| {
            delay_line.read_samples(f64::from(delay_sec) * f64::from(SAMPLE_RATE) + 1.0)
        };
        let new_tap = tap_at(engine.delay_time());
        let wet = engine.wet_mix.value();
        assert_abs_diff_eq!(
            last_output,
            wet * new_tap + (1.0 - wet) * last_input,
            epsilon = 1e-4
        );
        // By then the base delay has moved far enough for the old tap to
        // read something else.
        assert!((new_tap - tap_at(old_delay)).abs() > 5e-3);
    }

    #[test]
    fn test_disabled_cv_is_ignored() {
        let mut engine = engine();
        let mut buses = buses(BLOCK);
        for _ in 0..50 {
            buses.fill(10.0);
            engine.process_block(SAMPLE_RATE, &mut buses, BLOCK, &replace());
        }
        assert_eq!(engine.wet_mix.value(), 0.5);
        assert_abs_diff_eq!(engine.delay_time(), 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_dry_wet_cv_adds_ten_percent_per_volt() {
        let mut engine = engine();
        let params = BlockParams {
            routing: BusAssignments {
                dry_wet_cv: 3,
                ..BusAssignments::default()
            },
            ..replace()
        };
        let mut buses = buses(BLOCK);
        for _ in 0..50 {
            buses.fill(0.0);
            buses[2 * BLOCK..3 * BLOCK].fill(3.0);
            engine.process_block(SAMPLE_RATE, &mut buses, BLOCK, &params);
        }
        assert_abs_diff_eq!(engine.wet_mix.value(), 0.8, epsilon = 1e-5);

        // Far past 100% clamps to fully wet.
        for _ in 0..50 {
            buses.fill(0.0);
            buses[2 * BLOCK..3 * BLOCK].fill(10.0);
            engine.process_block(SAMPLE_RATE, &mut buses, BLOCK, &params);
        }
        assert_abs_diff_eq!(engine.wet_mix.value(), 1.0, epsilon = 1e-5);
    }

    /// Five volts of phase CV is a full cycle: one period of 440 Hz on top
    /// of the base delay.
    #[test]
    fn test_phase_cv_shifts_tap_by_one_period() {
        let mut engine = engine();
        let params = BlockParams {
            routing: BusAssignments {
                phase_cv: 2,
                ..BusAssignments::default()
            },
            ..replace()
        };
        let mut buses = buses(BLOCK);
        for _ in 0..100 {
            buses.fill(0.0);
            buses[BLOCK..2 * BLOCK].fill(5.0);
            engine.process_block(SAMPLE_RATE, &mut buses, BLOCK, &params);
        }
        assert_abs_diff_eq!(engine.delay_time(), 2.0 + 1.0 / 440.0, epsilon = 1e-5);
    }

    #[test]
    fn test_negative_phase_reads_ahead_of_base_delay() {
        let mut engine = engine();
        let params = BlockParams {
            phase_offset_deg: -180.0,
            pitch_cv: 1.0,
            ..replace()
        };
        run(&mut engine, &params, 100);
        assert_abs_diff_eq!(engine.delay_time(), 2.0 - 0.5 / 880.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sub_audio_pitch_cv_drops_phase_delay() {
        let mut engine = engine();
        let params = BlockParams {
            phase_offset_deg: 360.0,
            routing: BusAssignments {
                pitch_cv: 4,
                ..BusAssignments::default()
            },
            ..replace()
        };
        let mut buses = buses(BLOCK);
        for _ in 0..100 {
            buses.fill(0.0);
            buses[3 * BLOCK..4 * BLOCK].fill(-10.0);
            engine.process_block(SAMPLE_RATE, &mut buses, BLOCK, &params);
        }
        assert_abs_diff_eq!(engine.delay_time(), 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_short_delay_time_is_clamped_to_five_ms() {
        let mut engine = engine();
        let params = BlockParams {
            delay_time_ms: 1.0,
            ..replace()
        };
        // The base delay takes one smoothing step per block, so short
        // blocks reach the target in a reasonable number of samples.
        let mut buses = buses(4);
        for _ in 0..40_000 {
            buses.fill(0.0);
            engine.process_block(SAMPLE_RATE, &mut buses, 4, &params);
        }
        assert_abs_diff_eq!(engine.base_delay.value(), MIN_BASE_DELAY_SECONDS, epsilon = 1e-5);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut engine = engine();
        let params = BlockParams {
            delay_time_ms: 500.0,
            wet_mix_percent: 100.0,
            ..replace()
        };
        let mut buses = buses(BLOCK);
        for _ in 0..40 {
            buses.fill(0.7);
            engine.process_block(SAMPLE_RATE, &mut buses, BLOCK, &params);
        }

        engine.reset();

        assert!(engine.has_memory());
        assert!(!engine.is_crossfading());
        assert_eq!(engine.delay_time(), INITIAL_DELAY_TIME);
        assert_eq!(engine.base_delay.value(), INITIAL_BASE_DELAY);
        assert_eq!(engine.wet_mix.value(), INITIAL_WET_MIX);
        let delay_line = engine.delay_line.as_ref().unwrap();
        assert_eq!(delay_line.read_samples(1.0), 0.0);
    }

    #[test]
    fn test_tail_follows_delay_time() {
        let mut engine = engine();
        run(&mut engine, &replace(), 100);
        let tail = engine.tail_samples(SAMPLE_RATE);
        assert!((95_999..=96_000).contains(&tail), "tail {tail}");
    }
}
