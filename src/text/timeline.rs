use serde::{Deserialize, Serialize};

use crate::{
    foundation::core::ensure_positive_secs,
    foundation::error::{StoryError, StoryResult},
    text::segment::{Fragment, FragmentKind},
};

/// A fragment placed on the output timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedFragment {
    /// The fragment being shown.
    #[serde(flatten)]
    pub fragment: Fragment,
    /// Start time in seconds.
    pub start: f64,
    /// Display duration in seconds.
    pub duration: f64,
}

impl TimedFragment {
    /// End of the display window (exclusive).
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn text(&self) -> &str {
        &self.fragment.text
    }
}

/// Inclusive duration bounds in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClampBounds {
    pub min: f64,
    pub max: f64,
}

impl ClampBounds {
    pub fn apply(&self, secs: f64) -> f64 {
        secs.clamp(self.min, self.max)
    }

    pub fn contains(&self, secs: f64) -> bool {
        secs >= self.min && secs <= self.max
    }

    fn validate(&self, what: &str) -> StoryResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min <= 0.0 || self.min > self.max
        {
            return Err(StoryError::validation(format!(
                "{what} clamp must satisfy 0 < min <= max (got [{}, {}])",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Per-kind duration clamps.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineRules {
    /// Bounds for whole sentences.
    pub sentence: ClampBounds,
    /// Bounds for word groups cut from oversized sentences.
    pub chunk: ClampBounds,
}

impl Default for TimelineRules {
    fn default() -> Self {
        Self {
            sentence: ClampBounds { min: 1.0, max: 8.0 },
            chunk: ClampBounds { min: 1.5, max: 6.0 },
        }
    }
}

impl TimelineRules {
    pub fn validate(&self) -> StoryResult<()> {
        self.sentence.validate("sentence")?;
        self.chunk.validate("chunk")
    }

    /// Clamp bounds applying to fragments of `kind`.
    pub fn bounds_for(&self, kind: FragmentKind) -> ClampBounds {
        match kind {
            FragmentKind::Sentence => self.sentence,
            FragmentKind::Chunk => self.chunk,
        }
    }
}

/// Lay fragments end-to-end from zero, each lasting a word-count share of `total_duration`.
///
/// Durations are clamped per fragment kind and the running start accumulates the clamped values,
/// so the last fragment may end before or after `total_duration`. An input without words yields an
/// empty timeline.
#[tracing::instrument(skip(fragments, rules), fields(fragments = fragments.len()))]
pub fn allocate(
    fragments: &[Fragment],
    total_duration: f64,
    rules: &TimelineRules,
) -> StoryResult<Vec<TimedFragment>> {
    ensure_positive_secs("timeline total duration", total_duration)?;

    let total_words: usize = fragments.iter().map(|f| f.word_count).sum();
    if total_words == 0 {
        tracing::warn!("no words to time; subtitle timeline is empty");
        return Ok(Vec::new());
    }

    let mut out = Vec::with_capacity(fragments.len());
    let mut cursor = 0.0_f64;
    for fragment in fragments {
        let share = fragment.word_count as f64 / total_words as f64;
        let duration = rules.bounds_for(fragment.kind).apply(share * total_duration);
        out.push(TimedFragment {
            fragment: fragment.clone(),
            start: cursor,
            duration,
        });
        cursor += duration;
    }

    let drift = cursor - total_duration;
    if drift.abs() > 0.5 {
        tracing::debug!(
            timeline_end = cursor,
            total_duration,
            "clamped timeline diverges from audio duration"
        );
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/text/timeline.rs"]
mod tests;
