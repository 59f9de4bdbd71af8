//! # ShiftDelay: Phase Shift and Time Delay with Pitch-Adaptive Control
//!
//! A delay whose read tap sits at a base delay plus a phase offset measured
//! against a pitch-tracked frequency. Built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug) and exported as
//! CLAP, VST3 and (through clap-wrapper) AUv2.
//!
//! The effect was designed for a modular host that hands every algorithm a
//! flat array of 28 audio/CV buses per block. The plugin recreates that
//! model: the three CV inputs land on buses 2-4, the main input on the
//! "Audio Input" bus, the [`engine`] processes them, and the "Output" bus
//! is copied back to the main output.
//!
//! ```text
//! CV 1    ──► bus 2 ─┐
//! CV 2    ──► bus 3 ─┤
//! CV 3    ──► bus 4 ─┼──► [ShiftDelay] ──► Output bus ──► main out
//! main in ──► Audio Input bus ─┘
//!            (other buses silent)
//! ```
//!
//! When the Audio Input bus is one of buses 2-4, the main input overwrites
//! that CV channel.

mod dsp;
mod engine;
mod error;
mod params;
mod routing;
mod status;

use std::num::NonZeroU32;
use std::sync::Arc;

use engine::ShiftDelay;
use nih_plug::prelude::*;
use params::PluginParams;
use routing::{bus_frames, BusRouting, MAX_BUSES};
use status::Status;

/// Channels on the auxiliary "CV" input: phase, dry/wet, pitch.
const CV_CHANNELS: usize = 3;

/// The main plugin struct.
///
/// `params` is shared with the host; everything else is owned by the audio
/// thread and only touched in `initialize()`, `reset()` and `process()`.
struct ShiftDelayPlugin {
    params: Arc<PluginParams>,

    /// Set during `initialize()`.
    sample_rate: f32,

    engine: ShiftDelay,

    /// Bus-major scratch space, `MAX_BUSES * max_buffer_size` samples,
    /// allocated in `initialize()` so `process()` never allocates.
    buses: Vec<f32>,
}

impl Default for ShiftDelayPlugin {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            // Placeholder until the host reports the real configuration.
            sample_rate: 48_000.0,
            engine: ShiftDelay::new(),
            buses: Vec::new(),
        }
    }
}

impl Plugin for ShiftDelayPlugin {
    const NAME: &'static str = "ShiftDelay";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Mono audio in and out, plus one three-channel CV input.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[AudioIOLayout {
        main_input_channels: NonZeroU32::new(1),
        main_output_channels: NonZeroU32::new(1),
        aux_input_ports: &[new_nonzero_u32(CV_CHANNELS as u32)],
        aux_output_ports: &[],
        names: PortNames {
            layout: Some("Mono + CV"),
            main_input: Some("Audio"),
            main_output: Some("Audio"),
            aux_inputs: &["CV"],
            aux_outputs: &[],
        },
    }];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameters are read once per block; the engine smooths them itself.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocate the delay memory (once) and the bus scratch space.
    ///
    /// An unsupported sample rate still loads: the engine passes audio
    /// through untouched, matching how the effect behaves in its native
    /// host.
    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        self.sample_rate = buffer_config.sample_rate;

        if let Err(err) = ShiftDelay::check_sample_rate(self.sample_rate) {
            nih_warn!("{err}; ShiftDelay will pass audio through unprocessed");
        }

        if !self.engine.has_memory() {
            let reqs = ShiftDelay::memory_requirements();
            nih_log!(
                "allocating {} bytes of delay memory ({} samples) for {} bytes of state",
                reqs.delay_bytes,
                reqs.delay_samples,
                reqs.state_bytes
            );
            let memory = vec![0.0; reqs.delay_samples].into_boxed_slice();
            if let Err(err) = self.engine.attach_memory(memory) {
                nih_error!("{err}");
            }
        }

        let max_frames = buffer_config.max_buffer_size as usize;
        self.buses = vec![0.0; MAX_BUSES * max_frames];

        nih_log!("{}", Status::new(&self.engine, &self.params.snapshot()));

        true
    }

    /// Clear the delay line and smoothing state so stale audio doesn't
    /// bleed into the next playback.
    fn reset(&mut self) {
        self.engine.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let num_frames = buffer.samples();
        let bus_len = MAX_BUSES * num_frames;
        if num_frames == 0 || self.buses.len() < bus_len {
            return ProcessStatus::Normal;
        }

        let params = self.params.snapshot();
        let Some(routing) = BusRouting::resolve(&params.routing, MAX_BUSES) else {
            return ProcessStatus::Normal;
        };
        let buses = &mut self.buses[..bus_len];
        buses.fill(0.0);

        // Buses 2-4: CV inputs.
        if let Some(cv) = aux.inputs.first() {
            for (channel, samples) in cv.as_slice_immutable().iter().take(CV_CHANNELS).enumerate() {
                let start = (channel + 1) * num_frames;
                let len = samples.len().min(num_frames);
                buses[start..start + len].copy_from_slice(&samples[..len]);
            }
        }

        if let Some(main) = buffer.as_slice().first() {
            buses[bus_frames(routing.audio_in, num_frames)].copy_from_slice(&main[..num_frames]);
        }

        self.engine
            .process_block(self.sample_rate, buses, num_frames, &params);

        let output = &buses[bus_frames(routing.output, num_frames)];
        for channel in buffer.as_slice().iter_mut() {
            channel.copy_from_slice(output);
        }

        ProcessStatus::Tail(self.engine.tail_samples(self.sample_rate))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for ShiftDelayPlugin {
    const CLAP_ID: &'static str = "com.loveless-audio.shift-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Phase shift and time delay with pitch-adaptive control");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for ShiftDelayPlugin {
    const VST3_CLASS_ID: [u8; 16] = *b"ShiftDelayPhsDly";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

nih_export_clap!(ShiftDelayPlugin);
nih_export_vst3!(ShiftDelayPlugin);

// AUv2 entry point for Logic Pro, wrapping the CLAP export.
clap_wrapper::export_auv2!();
