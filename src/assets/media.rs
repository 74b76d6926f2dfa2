use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{
    foundation::core::FrameSize,
    foundation::error::{StoryError, StoryResult},
};

/// Probed metadata of a background video.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub duration_sec: f64,
    /// Whether the file carries its own audio (always discarded by the compositor).
    pub has_audio: bool,
}

impl VideoSourceInfo {
    pub fn frame_size(&self) -> StoryResult<FrameSize> {
        FrameSize::new(self.width, self.height)
    }
}

/// Probed metadata of a narration track.
#[derive(Clone, Debug)]
pub struct AudioSourceInfo {
    pub source_path: PathBuf,
    pub duration_sec: f64,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

pub fn is_ffprobe_on_path() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn run_ffprobe(source_path: &Path) -> StoryResult<ProbeOut> {
    if !source_path.is_file() {
        return Err(StoryError::probe(format!(
            "media file not found: '{}'",
            source_path.display()
        )));
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| StoryError::probe(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(StoryError::probe(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    parse_probe_json(&out.stdout)
}

fn parse_probe_json(bytes: &[u8]) -> StoryResult<ProbeOut> {
    serde_json::from_slice(bytes)
        .map_err(|e| StoryError::probe(format!("ffprobe json parse failed: {e}")))
}

fn parse_secs(s: Option<&String>) -> Option<f64> {
    s.and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

fn video_info_from_probe(source_path: &Path, parsed: &ProbeOut) -> StoryResult<VideoSourceInfo> {
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| StoryError::probe("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| StoryError::probe("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| StoryError::probe("missing video height from ffprobe"))?;

    let duration_sec = parse_secs(parsed.format.as_ref().and_then(|f| f.duration.as_ref()))
        .or_else(|| parse_secs(video_stream.duration.as_ref()))
        .ok_or_else(|| {
            StoryError::probe(format!(
                "video '{}' reports no usable duration",
                source_path.display()
            ))
        })?;
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_sec,
        has_audio,
    })
}

fn audio_info_from_probe(source_path: &Path, parsed: &ProbeOut) -> StoryResult<AudioSourceInfo> {
    let audio_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .ok_or_else(|| StoryError::probe("no audio stream found"))?;
    let duration_sec = parse_secs(parsed.format.as_ref().and_then(|f| f.duration.as_ref()))
        .or_else(|| parse_secs(audio_stream.duration.as_ref()))
        .ok_or_else(|| {
            StoryError::probe(format!(
                "audio '{}' reports no usable duration",
                source_path.display()
            ))
        })?;

    Ok(AudioSourceInfo {
        source_path: source_path.to_path_buf(),
        duration_sec,
    })
}

/// Inspect a video file with `ffprobe`.
#[tracing::instrument]
pub fn probe_video(source_path: &Path) -> StoryResult<VideoSourceInfo> {
    let parsed = run_ffprobe(source_path)?;
    video_info_from_probe(source_path, &parsed)
}

/// Inspect an audio file with `ffprobe`.
#[tracing::instrument]
pub fn probe_audio(source_path: &Path) -> StoryResult<AudioSourceInfo> {
    let parsed = run_ffprobe(source_path)?;
    audio_info_from_probe(source_path, &parsed)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
