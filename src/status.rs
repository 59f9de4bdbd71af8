//! Read-only status text: title, phase offset, delay time, and a warning
//! when no delay memory is attached.

use std::fmt;

use crate::engine::ShiftDelay;
use crate::params::BlockParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub phase_offset_deg: i32,
    pub delay_time_ms: i32,
    pub has_memory: bool,
}

impl Status {
    pub fn new(engine: &ShiftDelay, params: &BlockParams) -> Self {
        Self {
            phase_offset_deg: params.phase_offset_deg.round() as i32,
            delay_time_ms: params.delay_time_ms.round() as i32,
            has_memory: engine.has_memory(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ShiftDelay")?;
        writeln!(f, "{} degrees", self.phase_offset_deg)?;
        write!(f, "{} ms", self.delay_time_ms)?;
        if !self.has_memory {
            write!(f, "\nNo delay memory")?;
        }
        Ok(())
    }
}
