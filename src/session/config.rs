use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    assets::fonts::FontSource,
    assets::library::default_video_extensions,
    encode::ffmpeg::CodecConfig,
    foundation::error::{StoryError, StoryResult},
    narration::piper::PiperConfig,
    render::overlay::OverlayStyle,
    render::scheduler::DEFAULT_MAX_WORKERS,
    text::segment::SegmentRules,
    text::timeline::TimelineRules,
};

/// Overrides the Piper executable path.
pub const ENV_PIPER: &str = "STORYREEL_PIPER";
/// Overrides the overlay worker count.
pub const ENV_MAX_WORKERS: &str = "STORYREEL_MAX_WORKERS";

/// Everything a story session can be tuned with. Loaded from JSON; missing fields take defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub narration: PiperConfig,
    pub fonts: FontSource,
    pub overlay: OverlayStyle,
    pub segmentation: SegmentRules,
    pub timeline: TimelineRules,
    /// Upper bound on parallel overlay workers.
    pub max_workers: usize,
    pub codec: CodecConfig,
    pub video_extensions: Vec<String>,
    /// Directory for outputs given as a bare file name.
    pub output_dir: PathBuf,
    pub subtitles: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            narration: PiperConfig::default(),
            fonts: FontSource::default(),
            overlay: OverlayStyle::default(),
            segmentation: SegmentRules::default(),
            timeline: TimelineRules::default(),
            max_workers: DEFAULT_MAX_WORKERS,
            codec: CodecConfig::default(),
            video_extensions: default_video_extensions(),
            output_dir: PathBuf::from("output"),
            subtitles: true,
        }
    }
}

impl SessionConfig {
    /// Read a (possibly partial) JSON config file.
    pub fn load(path: &Path) -> StoryResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> StoryResult<Self> {
        let cfg: Self = serde_json::from_str(raw)
            .map_err(|e| StoryError::validation(format!("invalid config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> StoryResult<()> {
        self.overlay.validate()?;
        self.segmentation.validate()?;
        self.timeline.validate()?;
        self.codec.validate()?;
        if self.max_workers == 0 {
            return Err(StoryError::validation("max_workers must be >= 1"));
        }
        if self.video_extensions.is_empty() {
            return Err(StoryError::validation("video_extensions must not be empty"));
        }
        if self.narration.piper_path.as_os_str().is_empty() {
            return Err(StoryError::validation("narration piper_path must not be empty"));
        }
        Ok(())
    }

    /// Apply `STORYREEL_*` overrides read through `lookup`. Unparseable values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(piper) = lookup(ENV_PIPER).filter(|v| !v.trim().is_empty()) {
            self.narration.piper_path = PathBuf::from(piper);
        }
        if let Some(raw) = lookup(ENV_MAX_WORKERS) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.max_workers = n,
                _ => {
                    tracing::warn!(var = ENV_MAX_WORKERS, value = %raw, "ignoring invalid override")
                }
            }
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Where an output file named by the user is written. Bare file names go under
    /// [`SessionConfig::output_dir`].
    pub fn resolve_output_path(&self, requested: &Path) -> PathBuf {
        let has_dir = requested
            .parent()
            .map(|p| !p.as_os_str().is_empty())
            .unwrap_or(false);
        if has_dir {
            requested.to_path_buf()
        } else {
            self.output_dir.join(requested)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
