use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    assets::media::probe_video,
    encode::ffmpeg::CodecConfig,
    foundation::core::ensure_positive_secs,
    foundation::error::{StoryError, StoryResult},
};

/// Pieces shorter than this are not written.
pub const MIN_SEGMENT_SECS: f64 = 3.0;

/// One planned cut of the source video.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentSpan {
    /// 1-based position in the cut sequence.
    pub number: usize,
    pub start: f64,
    pub duration: f64,
}

/// Result of [`split_into_segments`].
#[derive(Clone, Debug)]
pub struct SegmentSet {
    pub folder: PathBuf,
    pub segments: Vec<PathBuf>,
}

/// Consecutive spans of `segment_secs` covering `total_secs`, dropping spans under
/// [`MIN_SEGMENT_SECS`].
pub fn plan_segments(total_secs: f64, segment_secs: f64) -> StoryResult<Vec<SegmentSpan>> {
    let total_secs = ensure_positive_secs("video duration", total_secs)?;
    if !segment_secs.is_finite() || segment_secs <= 0.0 {
        return Err(StoryError::validation(format!(
            "segment duration must be > 0 (got {segment_secs})"
        )));
    }

    let count = (total_secs / segment_secs).ceil() as usize;
    let mut spans = Vec::with_capacity(count);
    for i in 0..count {
        let start = i as f64 * segment_secs;
        let end = ((i + 1) as f64 * segment_secs).min(total_secs);
        let duration = end - start;
        if duration < MIN_SEGMENT_SECS {
            tracing::debug!(number = i + 1, duration, "skipping short segment");
            continue;
        }
        spans.push(SegmentSpan {
            number: i + 1,
            start,
            duration,
        });
    }
    Ok(spans)
}

fn video_stem(video: &Path) -> StoryResult<String> {
    video
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            StoryError::validation(format!("'{}' has no usable file name", video.display()))
        })
}

/// Folder that receives the pieces of `video`: `<stem>_segments` next to it.
pub fn segments_folder(video: &Path) -> StoryResult<PathBuf> {
    let stem = video_stem(video)?;
    let parent = video.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(format!("{stem}_segments")))
}

fn cut_segment(
    video: &Path,
    span: &SegmentSpan,
    codec: &CodecConfig,
    out: &Path,
) -> StoryResult<()> {
    let output = Command::new("ffmpeg")
        .args(["-y", "-loglevel", "error", "-ss"])
        .arg(format!("{:.3}", span.start))
        .arg("-i")
        .arg(video)
        .arg("-t")
        .arg(format!("{:.3}", span.duration))
        .args(codec.args())
        .arg(out)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| StoryError::compositing(format!("failed to spawn ffmpeg: {e}")))?;
    if !output.status.success() {
        let _ = std::fs::remove_file(out);
        return Err(StoryError::compositing(format!(
            "ffmpeg failed to cut segment {}: {}",
            span.number,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

/// Cut a finished video into consecutive pieces of `segment_secs` seconds.
///
/// Pieces land in `<stem>_segments/<stem>_segment_NN.mp4` next to the input. A piece that fails
/// to encode is logged and skipped.
#[tracing::instrument(skip(codec))]
pub fn split_into_segments(
    video: &Path,
    segment_secs: f64,
    codec: &CodecConfig,
) -> StoryResult<SegmentSet> {
    if segment_secs <= 0.0 {
        return Err(StoryError::validation("segment duration must be > 0"));
    }
    let info = probe_video(video)?;
    let spans = plan_segments(info.duration_sec, segment_secs)?;

    let stem = video_stem(video)?;
    let folder = segments_folder(video)?;
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(&folder)
            .with_context(|| format!("failed to create segment folder '{}'", folder.display()))?;
    }

    let mut segments = Vec::with_capacity(spans.len());
    for span in &spans {
        let out = folder.join(format!("{stem}_segment_{:02}.mp4", span.number));
        tracing::debug!(
            number = span.number,
            start = span.start,
            duration = span.duration,
            "cutting segment"
        );
        match cut_segment(video, span, codec, &out) {
            Ok(()) => segments.push(out),
            Err(error) => {
                tracing::warn!(number = span.number, %error, "segment failed, skipping");
            }
        }
    }

    tracing::info!(
        created = segments.len(),
        folder = %folder.display(),
        "video split into segments"
    );
    Ok(SegmentSet { folder, segments })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/segments.rs"]
mod tests;
