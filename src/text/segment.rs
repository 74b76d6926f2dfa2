use serde::{Deserialize, Serialize};

use crate::foundation::error::{StoryError, StoryResult};

/// How a fragment was produced; selects its duration clamp in the timeline allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// A whole sentence shown at once.
    Sentence,
    /// A fixed-size word group cut from an oversized sentence.
    Chunk,
}

/// A span of narration text displayed on screen at once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Display text, trimmed, words joined by single spaces for chunks.
    pub text: String,
    /// Number of whitespace-delimited words, always >= 1.
    pub word_count: usize,
    /// Origin of the fragment.
    pub kind: FragmentKind,
}

impl Fragment {
    /// Build a fragment, counting its words. Returns `None` for text without words.
    pub fn new(text: impl Into<String>, kind: FragmentKind) -> Option<Self> {
        let text = text.into();
        let word_count = text.split_whitespace().count();
        if word_count == 0 {
            return None;
        }
        Some(Self {
            text,
            word_count,
            kind,
        })
    }
}

/// Thresholds for subdividing long sentences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentRules {
    /// Sentences longer than this many characters are cut into word groups.
    pub max_sentence_chars: usize,
    /// Words per group when a sentence is cut.
    pub chunk_words: usize,
}

impl Default for SegmentRules {
    fn default() -> Self {
        Self {
            max_sentence_chars: 100,
            chunk_words: 8,
        }
    }
}

impl SegmentRules {
    pub fn validate(&self) -> StoryResult<()> {
        if self.chunk_words == 0 {
            return Err(StoryError::validation("segment chunk_words must be >= 1"));
        }
        Ok(())
    }
}

fn is_sentence_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split narration text into display fragments in reading order.
///
/// Sentences end at runs of `.`, `!` or `?`. Abbreviations, decimals and quoted punctuation are
/// not special-cased.
pub fn segment(text: &str, rules: &SegmentRules) -> Vec<Fragment> {
    let chunk_words = rules.chunk_words.max(1);
    let mut out = Vec::new();

    for candidate in text.split(is_sentence_terminal) {
        let sentence = candidate.trim();
        if sentence.is_empty() {
            continue;
        }

        if sentence.chars().count() > rules.max_sentence_chars {
            let words = sentence.split_whitespace().collect::<Vec<_>>();
            for group in words.chunks(chunk_words) {
                if let Some(fragment) = Fragment::new(group.join(" "), FragmentKind::Chunk) {
                    out.push(fragment);
                }
            }
        } else if let Some(fragment) = Fragment::new(sentence, FragmentKind::Sentence) {
            out.push(fragment);
        }
    }

    if out.is_empty() && !text.trim().is_empty() {
        tracing::warn!("narration text produced no subtitle fragments");
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/text/segment.rs"]
mod tests;
