use super::*;

// One unit per char keeps expectations readable.
fn chars(s: &str) -> StoryResult<f32> {
    Ok(s.chars().count() as f32)
}

#[test]
fn short_text_stays_on_one_line() {
    assert_eq!(wrap_words("Hello world", 20.0, chars).unwrap(), vec!["Hello world"]);
}

#[test]
fn breaks_greedily_at_width() {
    let lines = wrap_words("the quick brown fox jumps over", 10.0, chars).unwrap();
    assert_eq!(lines, vec!["the quick", "brown fox", "jumps over"]);
    assert!(lines.iter().all(|l| l.chars().count() <= 10));
}

#[test]
fn overlong_word_gets_its_own_line() {
    let lines = wrap_words("a supercalifragilistic b", 6.0, chars).unwrap();
    assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
}

#[test]
fn whitespace_is_normalized() {
    let lines = wrap_words("  one \n two\tthree  ", 100.0, chars).unwrap();
    assert_eq!(lines, vec!["one two three"]);
    assert!(wrap_words("   ", 10.0, chars).unwrap().is_empty());
}

#[test]
fn measure_errors_propagate() {
    let res = wrap_words("a b", 10.0, |_| {
        Err(crate::foundation::error::StoryError::overlay("measure failed"))
    });
    assert!(res.is_err());
}
