use crate::foundation::error::StoryResult;

/// Greedy word wrap.
///
/// Words are appended to the current line while `measure(line)` stays within `max_width`. A word
/// that does not fit on an empty line is placed on a line by itself rather than split.
pub fn wrap_words<F>(text: &str, max_width: f32, mut measure: F) -> StoryResult<Vec<String>>
where
    F: FnMut(&str) -> StoryResult<f32>,
{
    let mut lines = Vec::<String>::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if measure(&candidate)? <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}

#[cfg(test)]
#[path = "../../tests/unit/render/wrap.rs"]
mod tests;
