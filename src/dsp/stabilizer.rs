//! # Delay Time Stabilization and Crossfade
//!
//! Moving the base delay moves the read tap, and a tap that jumps is a
//! click. So a new Delay Time is not committed straight away:
//!
//! 1. Once per block the raw control ("pot") value is compared with the
//!    previous block's. Any change restarts the debounce counter.
//! 2. When the value has held for [`STABILIZATION_TIME`] and no crossfade is
//!    running, the value is committed as the new base-delay target and a
//!    crossfade starts from the current base delay.
//! 3. For [`CROSSFADE_TIME`] the engine reads two taps, the old base delay
//!    and the moving new one, and blends them linearly.
//!
//! A change that arrives while a crossfade is running does not interrupt
//! it; it only restarts the debounce for the next commit.

use super::filter::{coefficient, FAST_TIME_CONSTANT, SLOW_TIME_CONSTANT};

/// How long the Delay Time control must hold still before it is committed.
pub const STABILIZATION_TIME: f32 = 0.02;

/// Length of the blend from the old tap to the new one.
pub const CROSSFADE_TIME: f32 = 0.05;

/// Sample-rate dependent constants, recomputed on every processing call.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub stabilization_samples: u32,
    pub crossfade_samples: u32,
    pub fast_coefficient: f32,
    pub slow_coefficient: f32,
}

impl Timing {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            stabilization_samples: (STABILIZATION_TIME * sample_rate) as u32,
            crossfade_samples: ((CROSSFADE_TIME * sample_rate) as u32).max(1),
            fast_coefficient: coefficient(FAST_TIME_CONSTANT, sample_rate),
            slow_coefficient: coefficient(SLOW_TIME_CONSTANT, sample_rate),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FadeState {
    Idle,
    Fading { old_delay_sec: f32, elapsed: u32 },
}

/// One sample's worth of crossfade: where the old tap sits and how far the
/// blend has progressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossfade {
    pub old_delay_sec: f32,
    /// Weight of the new tap, in `[0, 1)`.
    pub position: f32,
}

impl Crossfade {
    pub fn blend(&self, old: f32, new: f32) -> f32 {
        (1.0 - self.position) * old + self.position * new
    }
}

/// Debounce bookkeeping for the Delay Time control plus the crossfade state.
pub struct PotStabilizer {
    /// Pot value seen in the previous block, in seconds.
    previous_pot: f32,
    /// Last committed pot value: the target for the base delay.
    stable_pot: f32,
    /// Samples the pot has held still, saturating at the threshold.
    stable_samples: u32,
    /// Set when the held value has been committed; cleared by any change.
    committed: bool,
    fade: FadeState,
}

impl PotStabilizer {
    pub fn new(initial_pot: f32) -> Self {
        Self {
            previous_pot: initial_pot,
            stable_pot: initial_pot,
            stable_samples: 0,
            committed: false,
            fade: FadeState::Idle,
        }
    }

    /// Feed one block's pot value.
    ///
    /// `current_base_delay` is the smoothed base delay at the start of the
    /// block; it becomes the old tap if a crossfade starts.
    pub fn update(
        &mut self,
        pot: f32,
        num_frames: usize,
        timing: &Timing,
        current_base_delay: f32,
    ) {
        if pot != self.previous_pot {
            self.stable_samples = 0;
            self.previous_pot = pot;
            self.committed = false;
            return;
        }

        let threshold = timing.stabilization_samples;
        let frames = u32::try_from(num_frames).unwrap_or(u32::MAX);
        self.stable_samples = self.stable_samples.saturating_add(frames).min(threshold);

        if self.stable_samples < threshold || self.committed || self.is_fading() {
            return;
        }

        self.fade = FadeState::Fading {
            old_delay_sec: current_base_delay,
            elapsed: 0,
        };
        self.stable_pot = pot;
        self.committed = true;
    }

    /// Whether the pot has held still long enough for slow smoothing.
    pub fn is_settled(&self, timing: &Timing) -> bool {
        self.stable_samples >= timing.stabilization_samples
    }

    /// The committed pot value.
    pub fn target(&self) -> f32 {
        self.stable_pot
    }

    pub fn is_fading(&self) -> bool {
        matches!(self.fade, FadeState::Fading { .. })
    }

    /// The blend for the current sample, or `None` when idle.
    pub fn crossfade(&self, timing: &Timing) -> Option<Crossfade> {
        match self.fade {
            FadeState::Idle => None,
            FadeState::Fading {
                old_delay_sec,
                elapsed,
            } => Some(Crossfade {
                old_delay_sec,
                position: elapsed as f32 / timing.crossfade_samples as f32,
            }),
        }
    }

    /// Step the crossfade by one sample, returning to idle once
    /// `crossfade_samples` blended samples have been produced.
    pub fn advance(&mut self, timing: &Timing) {
        if let FadeState::Fading {
            old_delay_sec,
            elapsed,
        } = self.fade
        {
            let elapsed = elapsed + 1;
            self.fade = if elapsed >= timing.crossfade_samples {
                FadeState::Idle
            } else {
                FadeState::Fading {
                    old_delay_sec,
                    elapsed,
                }
            };
        }
    }
}
