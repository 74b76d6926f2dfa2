use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rand::seq::SliceRandom as _;

use crate::foundation::error::{StoryError, StoryResult};

/// File extensions accepted as background videos.
pub const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mov", "mkv", "flv", "wmv", "webm"];

pub fn default_video_extensions() -> Vec<String> {
    VIDEO_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

/// Read a story text file, trimmed. An empty story is rejected.
pub fn read_story(path: &Path) -> StoryResult<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read story file '{}'", path.display()))?;
    let text = raw.trim();
    if text.is_empty() {
        return Err(StoryError::validation(format!(
            "story file '{}' is empty",
            path.display()
        )));
    }
    Ok(text.to_string())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
}

/// List files directly inside `dir` whose extension is in `extensions`, sorted by path.
pub fn list_videos(dir: &Path, extensions: &[String]) -> StoryResult<Vec<PathBuf>> {
    let rd = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list video folder '{}'", dir.display()))?;

    let mut videos = rd
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| has_extension(p, extensions))
        .collect::<Vec<_>>();
    videos.sort();
    Ok(videos)
}

/// Pick one background video from `dir` at random.
pub fn pick_random_video(dir: &Path, extensions: &[String]) -> StoryResult<PathBuf> {
    pick_video_with(dir, extensions, &mut rand::thread_rng())
}

pub(crate) fn pick_video_with<R: rand::Rng + ?Sized>(
    dir: &Path,
    extensions: &[String],
    rng: &mut R,
) -> StoryResult<PathBuf> {
    let videos = list_videos(dir, extensions)?;
    let picked = videos.choose(rng).cloned().ok_or_else(|| {
        StoryError::validation(format!("no video files found in '{}'", dir.display()))
    })?;
    tracing::info!(candidates = videos.len(), video = %picked.display(), "picked background video");
    Ok(picked)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/library.rs"]
mod tests;
