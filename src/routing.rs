//! Bus routing.
//!
//! The host hands the engine one flat, bus-major array per block: bus `b`
//! occupies `[b * frames, (b + 1) * frames)`. Routing parameters name buses
//! 1-based; `0` on a CV input means "not connected".

use std::ops::Range;

/// Number of buses the routing parameters can address.
pub const MAX_BUSES: usize = 28;

const AUDIO_IN_FALLBACK: usize = 0;
const PHASE_CV_FALLBACK: usize = 1;
const DRY_WET_CV_FALLBACK: usize = 2;
const PITCH_CV_FALLBACK: usize = 3;
const OUTPUT_FALLBACK: usize = 0;

/// Raw 1-based bus selections, as set by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusAssignments {
    pub audio_in: i32,
    pub phase_cv: i32,
    pub dry_wet_cv: i32,
    pub pitch_cv: i32,
    pub output: i32,
}

impl Default for BusAssignments {
    fn default() -> Self {
        Self {
            audio_in: 1,
            phase_cv: 0,
            dry_wet_cv: 0,
            pitch_cv: 0,
            output: 1,
        }
    }
}

/// Zero-based bus indices resolved for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusRouting {
    pub audio_in: usize,
    pub phase_cv: Option<usize>,
    pub dry_wet_cv: Option<usize>,
    pub pitch_cv: Option<usize>,
    pub output: usize,
}

impl BusRouting {
    /// Resolve `assignments` against the `bus_count` buses actually present.
    ///
    /// Out-of-range selections fall back to fixed default buses. Returns
    /// `None` only when there is no bus at all to read from.
    pub fn resolve(assignments: &BusAssignments, bus_count: usize) -> Option<Self> {
        let bus_count = bus_count.min(MAX_BUSES);
        if bus_count == 0 {
            return None;
        }

        Some(Self {
            audio_in: bus_index(assignments.audio_in, AUDIO_IN_FALLBACK, bus_count),
            phase_cv: cv_bus(assignments.phase_cv, PHASE_CV_FALLBACK, bus_count),
            dry_wet_cv: cv_bus(assignments.dry_wet_cv, DRY_WET_CV_FALLBACK, bus_count),
            pitch_cv: cv_bus(assignments.pitch_cv, PITCH_CV_FALLBACK, bus_count),
            output: bus_index(assignments.output, OUTPUT_FALLBACK, bus_count),
        })
    }
}

/// Where bus `bus` sits in a bus-major block of `num_frames` frames.
pub fn bus_frames(bus: usize, num_frames: usize) -> Range<usize> {
    bus * num_frames..(bus + 1) * num_frames
}

fn bus_index(raw: i32, fallback: usize, bus_count: usize) -> usize {
    match usize::try_from(raw) {
        Ok(bus) if (1..=bus_count).contains(&bus) => bus - 1,
        _ => fallback,
    }
}

/// A CV input is live when its selection is positive and its bus exists.
fn cv_bus(raw: i32, fallback: usize, bus_count: usize) -> Option<usize> {
    if raw <= 0 {
        return None;
    }
    Some(bus_index(raw, fallback, bus_count)).filter(|&bus| bus < bus_count)
}
