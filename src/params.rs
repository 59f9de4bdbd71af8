//! # Plugin Parameters
//!
//! Each parameter has a **unique string ID** (`#[id = "..."]`) the host
//! uses to save and recall presets; once published, never change these IDs
//! or existing presets will break.
//!
//! None of the parameters carry a nih-plug smoother. The engine does its
//! own smoothing (and debounces Delay Time before committing it), so it
//! needs the raw values, read once per block into a [`BlockParams`]
//! snapshot.

use std::sync::Arc;

use nih_plug::prelude::*;

use crate::routing::{BusAssignments, MAX_BUSES};

/// How the effect's output lands on the output bus.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Sum into whatever is already on the bus.
    #[id = "add"]
    #[name = "Add"]
    Add,

    /// Overwrite the bus.
    #[id = "replace"]
    #[name = "Replace"]
    Replace,
}

impl OutputMode {
    pub fn write(self, slot: &mut f32, sample: f32) {
        match self {
            OutputMode::Add => *slot += sample,
            OutputMode::Replace => *slot = sample,
        }
    }
}

/// All user-facing parameters for ShiftDelay.
#[derive(Params)]
pub struct PluginParams {
    #[id = "mode"]
    pub output_mode: EnumParam<OutputMode>,

    /// **Phase Offset**: how far, in degrees of the pitch-tracked
    /// frequency, the read tap is shifted from the base delay. Negative
    /// values read ahead of the base delay.
    #[id = "phase"]
    pub phase_offset: IntParam,

    /// **Delay Time**: the base delay, committed only once the control
    /// has held still for 20 ms and then crossfaded in over 50 ms.
    #[id = "delay"]
    pub delay_time: IntParam,

    /// **Dry/Wet Mix**: 0% is the input alone, 100% the delayed tap alone.
    #[id = "mix"]
    pub wet_mix: IntParam,

    /// **Pitch CV**: the frequency the phase offset is measured against,
    /// as 1 V/octave around 440 Hz. The pitch CV input is added to it.
    #[id = "pitch"]
    pub pitch_cv: FloatParam,

    #[nested(group = "Routing")]
    pub routing: RoutingParams,
}

/// Which buses the effect reads from and writes to.
#[derive(Params)]
pub struct RoutingParams {
    #[id = "in"]
    pub audio_input: IntParam,

    #[id = "phase_cv_in"]
    pub phase_cv_input: IntParam,

    #[id = "mix_cv_in"]
    pub dry_wet_cv_input: IntParam,

    #[id = "pitch_cv_in"]
    pub pitch_cv_input: IntParam,

    #[id = "out"]
    pub output: IntParam,
}

/// The parameter values one processing call works from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockParams {
    pub output_mode: OutputMode,
    pub phase_offset_deg: f32,
    pub delay_time_ms: f32,
    pub wet_mix_percent: f32,
    pub pitch_cv: f32,
    pub routing: BusAssignments,
}

impl Default for BlockParams {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::Add,
            phase_offset_deg: 0.0,
            delay_time_ms: 2000.0,
            wet_mix_percent: 50.0,
            pitch_cv: 0.0,
            routing: BusAssignments::default(),
        }
    }
}

impl PluginParams {
    /// Read the current values into a snapshot for one block.
    pub fn snapshot(&self) -> BlockParams {
        BlockParams {
            output_mode: self.output_mode.value(),
            phase_offset_deg: self.phase_offset.value() as f32,
            delay_time_ms: self.delay_time.value() as f32,
            wet_mix_percent: self.wet_mix.value() as f32,
            pitch_cv: self.pitch_cv.value(),
            routing: BusAssignments {
                audio_in: self.routing.audio_input.value(),
                phase_cv: self.routing.phase_cv_input.value(),
                dry_wet_cv: self.routing.dry_wet_cv_input.value(),
                pitch_cv: self.routing.pitch_cv_input.value(),
                output: self.routing.output.value(),
            },
        }
    }
}

impl Default for PluginParams {
    fn default() -> Self {
        let defaults = BlockParams::default();

        Self {
            output_mode: EnumParam::new("Output Mode", defaults.output_mode),

            phase_offset: IntParam::new(
                "Phase Offset",
                defaults.phase_offset_deg as i32,
                IntRange::Linear {
                    min: -360,
                    max: 360,
                },
            )
            .with_unit("°"),

            delay_time: IntParam::new(
                "Delay Time",
                defaults.delay_time_ms as i32,
                IntRange::Linear { min: 5, max: 6000 },
            )
            .with_unit(" ms"),

            wet_mix: IntParam::new(
                "Dry/Wet Mix",
                defaults.wet_mix_percent as i32,
                IntRange::Linear { min: 0, max: 100 },
            )
            .with_unit("%"),

            pitch_cv: FloatParam::new(
                "Pitch CV",
                defaults.pitch_cv,
                FloatRange::Linear {
                    min: -5.0,
                    max: 5.0,
                },
            )
            .with_unit(" V")
            .with_step_size(0.01),

            routing: RoutingParams::default(),
        }
    }
}

impl Default for RoutingParams {
    fn default() -> Self {
        let defaults = BusAssignments::default();

        Self {
            audio_input: bus_param("Audio Input", defaults.audio_in, 1),
            phase_cv_input: bus_param("Phase CV Input", defaults.phase_cv, 0),
            dry_wet_cv_input: bus_param("Dry/Wet CV Input", defaults.dry_wet_cv, 0),
            pitch_cv_input: bus_param("Pitch CV Input", defaults.pitch_cv, 0),
            output: bus_param("Output", defaults.output, 1),
        }
    }
}

/// A bus selector. With `min = 0`, the bottom of the range reads "None".
fn bus_param(name: &'static str, default: i32, min: i32) -> IntParam {
    IntParam::new(
        name,
        default,
        IntRange::Linear {
            min,
            max: MAX_BUSES as i32,
        },
    )
    .with_value_to_string(Arc::new(|bus: i32| match bus {
        0 => String::from("None"),
        bus => format!("Bus {bus}"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_of_defaults() {
        let params = PluginParams::default();
        assert_eq!(params.snapshot(), BlockParams::default());
    }

    #[test]
    fn test_output_modes() {
        let mut slot = 0.25;
        OutputMode::Add.write(&mut slot, 0.5);
        assert_eq!(slot, 0.75);
        OutputMode::Replace.write(&mut slot, -0.5);
        assert_eq!(slot, -0.5);
    }

    #[test]
    fn test_bus_names() {
        let params = RoutingParams::default();
        let shown = |param: &IntParam| {
            param.normalized_value_to_string(param.unmodulated_normalized_value(), false)
        };
        assert_eq!(shown(&params.phase_cv_input), "None");
        assert_eq!(shown(&params.audio_input), "Bus 1");
    }
}
