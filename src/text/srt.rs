//! SubRip export of an allocated subtitle timeline.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::{foundation::error::StoryResult, text::timeline::TimedFragment};

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
pub fn format_srt_time(secs: f64) -> String {
    let ms = (secs.max(0.0) * 1000.0).round() as u64;
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Render the timeline as SubRip text, one cue per fragment.
pub fn to_srt(timeline: &[TimedFragment]) -> String {
    let mut out = String::new();
    for (i, cue) in timeline.iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}", i + 1);
        let _ = writeln!(
            out,
            "{} --> {}",
            format_srt_time(cue.start),
            format_srt_time(cue.end())
        );
        let _ = writeln!(out, "{}", cue.text());
        let _ = writeln!(out);
    }
    out
}

/// Write the timeline as an `.srt` file, creating parent directories.
pub fn write_srt(timeline: &[TimedFragment], path: &Path) -> StoryResult<()> {
    crate::encode::ffmpeg::ensure_parent_dir(path)?;
    std::fs::write(path, to_srt(timeline))
        .with_context(|| format!("failed to write subtitles to '{}'", path.display()))?;
    tracing::info!(cues = timeline.len(), path = %path.display(), "wrote srt sidecar");
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/text/srt.rs"]
mod tests;
