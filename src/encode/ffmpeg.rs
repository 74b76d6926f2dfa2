use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use serde::{Deserialize, Serialize};

use crate::{
    foundation::core::{FrameSize, ensure_positive_secs},
    foundation::error::{StoryError, StoryResult},
};

/// Fixed encoder settings for the final mp4.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub threads: u32,
    pub pix_fmt: String,
    /// Move the moov atom to the front for progressive playback.
    pub faststart: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "fast".to_string(),
            threads: 4,
            pix_fmt: "yuv420p".to_string(),
            faststart: true,
        }
    }
}

impl CodecConfig {
    pub fn validate(&self) -> StoryResult<()> {
        if self.video_codec.trim().is_empty() || self.audio_codec.trim().is_empty() {
            return Err(StoryError::validation("codec names must be non-empty"));
        }
        if self.threads == 0 {
            return Err(StoryError::validation("encoder threads must be >= 1"));
        }
        Ok(())
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-threads".to_string(),
            self.threads.to_string(),
            "-pix_fmt".to_string(),
            self.pix_fmt.clone(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
        ];
        if self.faststart {
            args.push("-movflags".to_string());
            args.push("+faststart".to_string());
        }
        args
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> StoryResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// How the base video is stretched to the narration length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopPlan {
    /// Total number of times the base video plays (>= 1).
    pub iterations: u32,
    /// Output duration in seconds, always the audio duration.
    pub trim_to: f64,
}

impl LoopPlan {
    /// Loop `ceil(audio / video)` times when the video is shorter than the audio, otherwise play
    /// once. The result is always trimmed to the audio duration.
    pub fn new(video_secs: f64, audio_secs: f64) -> StoryResult<Self> {
        let video_secs = ensure_positive_secs("video duration", video_secs)?;
        let audio_secs = ensure_positive_secs("audio duration", audio_secs)?;

        let iterations = if video_secs < audio_secs {
            let n = (audio_secs / video_secs).ceil();
            if n > f64::from(u32::MAX) {
                return Err(StoryError::validation(format!(
                    "video of {video_secs}s is too short to cover {audio_secs}s of audio"
                )));
            }
            n as u32
        } else {
            1
        };

        Ok(Self {
            iterations,
            trim_to: audio_secs,
        })
    }

    pub fn loops(&self) -> bool {
        self.iterations > 1
    }

    /// Value for ffmpeg's `-stream_loop`, which counts extra plays.
    pub fn extra_plays(&self) -> u32 {
        self.iterations.saturating_sub(1)
    }
}

/// An overlay image on disk with its half-open visibility window.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayInput {
    pub path: PathBuf,
    pub start: f64,
    pub end: f64,
}

impl OverlayInput {
    pub fn enable_expr(&self) -> String {
        format!("gte(t,{:.3})*lt(t,{:.3})", self.start, self.end)
    }
}

/// A complete single-invocation ffmpeg job.
#[derive(Clone, Debug)]
pub struct EncodePlan {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub loop_plan: LoopPlan,
    /// Resize the base video before overlaying, when it differs from the overlay size.
    pub scale_to: Option<FrameSize>,
    pub overlays: Vec<OverlayInput>,
    pub codec: CodecConfig,
    pub out_path: PathBuf,
}

const VIDEO_OUT_LABEL: &str = "[vout]";

impl EncodePlan {
    /// Filter graph chaining every overlay onto the base video, ending in an even-sized frame
    /// as required by yuv420p.
    pub fn filter_graph(&self) -> String {
        let mut chains = Vec::with_capacity(self.overlays.len() + 2);
        let mut current = "[0:v]".to_string();
        if let Some(size) = self.scale_to {
            chains.push(format!("{current}scale={}:{}[base]", size.width, size.height));
            current = "[base]".to_string();
        }

        for (i, overlay) in self.overlays.iter().enumerate() {
            let next = format!("[v{}]", i + 1);
            chains.push(format!(
                "{current}[{}:v]overlay=0:0:enable='{}'{next}",
                i + 2,
                overlay.enable_expr()
            ));
            current = next;
        }

        chains.push(format!(
            "{current}scale=trunc(iw/2)*2:trunc(ih/2)*2{VIDEO_OUT_LABEL}"
        ));
        chains.join(";")
    }

    pub fn args(&self) -> Vec<OsString> {
        let mut args = ["-y", "-loglevel", "error"]
            .into_iter()
            .map(OsString::from)
            .collect::<Vec<_>>();
        if self.loop_plan.loops() {
            args.push("-stream_loop".into());
            args.push(self.loop_plan.extra_plays().to_string().into());
        }
        args.push("-i".into());
        args.push(self.video.clone().into_os_string());
        args.push("-i".into());
        args.push(self.audio.clone().into_os_string());
        for overlay in &self.overlays {
            args.push("-i".into());
            args.push(overlay.path.clone().into_os_string());
        }

        args.push("-filter_complex".into());
        args.push(self.filter_graph().into());
        for s in ["-map", VIDEO_OUT_LABEL, "-map", "1:a:0", "-t"] {
            args.push(s.into());
        }
        args.push(format!("{:.3}", self.loop_plan.trim_to).into());
        args.extend(self.codec.args().into_iter().map(OsString::from));
        args.push(self.out_path.clone().into_os_string());
        args
    }

    /// Run ffmpeg to completion.
    #[tracing::instrument(skip(self), fields(out = %self.out_path.display(), overlays = self.overlays.len()))]
    pub fn run(&self) -> StoryResult<()> {
        self.codec.validate()?;
        ensure_parent_dir(&self.out_path)?;

        if !is_ffmpeg_on_path() {
            return Err(StoryError::compositing(
                "ffmpeg is required for compositing, but was not found on PATH",
            ));
        }

        let output = Command::new("ffmpeg")
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                StoryError::compositing(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StoryError::compositing(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tracing::debug!("ffmpeg finished");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
