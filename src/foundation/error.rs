/// Convenience result type used across storyreel.
pub type StoryResult<T> = Result<T, StoryError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// `Font` and `Overlay` are recoverable per fragment: the overlay scheduler logs and drops them.
/// Every other variant aborts the render it occurs in.
#[derive(thiserror::Error, Debug)]
pub enum StoryError {
    /// Invalid caller-provided input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// The narration engine failed to produce an audio file.
    #[error("narration error: {0}")]
    Narration(String),

    /// No usable font could be resolved or measured.
    #[error("font error: {0}")]
    Font(String),

    /// A single subtitle overlay could not be rasterized.
    #[error("overlay error: {0}")]
    Overlay(String),

    /// Media inspection (`ffprobe`) failed.
    #[error("probe error: {0}")]
    Probe(String),

    /// Looping, overlaying or encoding the final video failed.
    #[error("compositing error: {0}")]
    Compositing(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoryError {
    /// Build a [`StoryError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StoryError::Narration`] value.
    pub fn narration(msg: impl Into<String>) -> Self {
        Self::Narration(msg.into())
    }

    /// Build a [`StoryError::Font`] value.
    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    /// Build a [`StoryError::Overlay`] value.
    pub fn overlay(msg: impl Into<String>) -> Self {
        Self::Overlay(msg.into())
    }

    /// Build a [`StoryError::Probe`] value.
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Build a [`StoryError::Compositing`] value.
    pub fn compositing(msg: impl Into<String>) -> Self {
        Self::Compositing(msg.into())
    }

    /// Whether the scheduler may drop this error and continue with the other fragments.
    pub fn is_per_fragment(&self) -> bool {
        matches!(self, Self::Font(_) | Self::Overlay(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
