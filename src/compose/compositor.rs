use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    assets::media::{AudioSourceInfo, VideoSourceInfo},
    encode::ffmpeg::{CodecConfig, EncodePlan, LoopPlan, OverlayInput},
    foundation::core::FrameSize,
    foundation::error::{StoryError, StoryResult},
    render::scheduler::OverlayPair,
};

/// Scratch directory removed with everything in it when dropped.
pub(crate) struct ScratchDir(Option<PathBuf>);

impl ScratchDir {
    pub(crate) fn create(root: &Path, prefix: &str) -> StoryResult<Self> {
        let path = root.join(format!(
            "{prefix}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create scratch dir '{}'", path.display()))?;
        Ok(Self(Some(path)))
    }

    pub(crate) fn path(&self) -> &Path {
        self.0.as_deref().unwrap_or_else(|| Path::new(""))
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_dir_all(path);
        }
    }
}

/// Produces the final video: base video looped or trimmed to the narration, narration audio,
/// subtitle overlays in their time windows.
#[derive(Clone, Debug)]
pub struct Compositor {
    codec: CodecConfig,
    scratch_root: PathBuf,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

impl Compositor {
    pub fn new(codec: CodecConfig) -> Self {
        Self {
            codec,
            scratch_root: std::env::temp_dir(),
        }
    }

    /// Directory under which the per-call scratch directory is created.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    pub fn codec(&self) -> &CodecConfig {
        &self.codec
    }

    /// Write overlay PNGs into `scratch` and assemble the ffmpeg job for an output of `frame`.
    pub fn plan(
        &self,
        video: &VideoSourceInfo,
        audio: &AudioSourceInfo,
        frame: FrameSize,
        overlays: &[OverlayPair],
        scratch: &Path,
        out_path: &Path,
    ) -> StoryResult<EncodePlan> {
        let loop_plan = LoopPlan::new(video.duration_sec, audio.duration_sec)?;
        let scale_to = (video.frame_size()? != frame).then_some(frame);

        let mut inputs = Vec::with_capacity(overlays.len());
        for (i, pair) in overlays.iter().enumerate() {
            if pair.image.size() != frame {
                return Err(StoryError::compositing(format!(
                    "overlay {i} is {} but the output frame is {frame}",
                    pair.image.size()
                )));
            }
            if pair.fragment.start >= loop_plan.trim_to {
                tracing::debug!(
                    index = i,
                    start = pair.fragment.start,
                    "overlay starts after the end, skipped"
                );
                continue;
            }
            let path = scratch.join(format!("overlay_{i:04}.png"));
            pair.image.save_png(&path)?;
            inputs.push(OverlayInput {
                path,
                start: pair.fragment.start,
                end: pair.fragment.end(),
            });
        }

        Ok(EncodePlan {
            video: video.source_path.clone(),
            audio: audio.source_path.clone(),
            loop_plan,
            scale_to,
            overlays: inputs,
            codec: self.codec.clone(),
            out_path: out_path.to_path_buf(),
        })
    }

    /// Composite and encode to `out_path`.
    ///
    /// The scratch directory is removed whatever the outcome; on failure the partial output is
    /// removed too and the cause is returned as [`StoryError::Compositing`].
    #[tracing::instrument(skip_all, fields(out = %out_path.display(), overlays = overlays.len()))]
    pub fn compose(
        &self,
        video: &VideoSourceInfo,
        audio: &AudioSourceInfo,
        frame: FrameSize,
        overlays: &[OverlayPair],
        out_path: &Path,
    ) -> StoryResult<PathBuf> {
        let result = self.compose_inner(video, audio, frame, overlays, out_path);
        match result {
            Ok(()) => {
                tracing::info!(
                    video_secs = video.duration_sec,
                    audio_secs = audio.duration_sec,
                    "video composited"
                );
                Ok(out_path.to_path_buf())
            }
            Err(error) => {
                if out_path.exists() {
                    let _ = std::fs::remove_file(out_path);
                }
                Err(match error {
                    StoryError::Compositing(msg) => StoryError::Compositing(msg),
                    other => StoryError::compositing(other.to_string()),
                })
            }
        }
    }

    fn compose_inner(
        &self,
        video: &VideoSourceInfo,
        audio: &AudioSourceInfo,
        frame: FrameSize,
        overlays: &[OverlayPair],
        out_path: &Path,
    ) -> StoryResult<()> {
        let scratch = ScratchDir::create(&self.scratch_root, "storyreel_overlays")?;
        let plan = self.plan(video, audio, frame, overlays, scratch.path(), out_path)?;
        tracing::debug!(
            iterations = plan.loop_plan.iterations,
            trim_to = plan.loop_plan.trim_to,
            "loop plan"
        );
        plan.run()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/compositor.rs"]
mod tests;
