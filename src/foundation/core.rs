use serde::{Deserialize, Serialize};

use crate::foundation::error::{StoryError, StoryResult};

/// Pixel dimensions of the output frame; every overlay is rasterized at exactly this size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Construct a validated frame size.
    pub fn new(width: u32, height: u32) -> StoryResult<Self> {
        let size = Self { width, height };
        size.validate()?;
        Ok(size)
    }

    /// Reject zero dimensions and sizes the CPU rasterizer cannot address.
    pub fn validate(&self) -> StoryResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StoryError::validation("frame width/height must be non-zero"));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(StoryError::validation(format!(
                "frame size {}x{} exceeds the rasterizer limit of {}",
                self.width,
                self.height,
                u16::MAX
            )));
        }
        Ok(())
    }

    /// Number of bytes in one RGBA8 frame.
    pub fn rgba_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Validate a duration in seconds: finite and strictly positive.
pub fn ensure_positive_secs(what: &str, secs: f64) -> StoryResult<f64> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(StoryError::validation(format!(
            "{what} must be finite and > 0 (got {secs})"
        )));
    }
    Ok(secs)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
