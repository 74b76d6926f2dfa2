use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        StoryError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        StoryError::narration("x")
            .to_string()
            .contains("narration error:")
    );
    assert!(StoryError::font("x").to_string().contains("font error:"));
    assert!(
        StoryError::overlay("x")
            .to_string()
            .contains("overlay error:")
    );
    assert!(StoryError::probe("x").to_string().contains("probe error:"));
    assert!(
        StoryError::compositing("x")
            .to_string()
            .contains("compositing error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StoryError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn only_font_and_overlay_are_per_fragment() {
    assert!(StoryError::font("x").is_per_fragment());
    assert!(StoryError::overlay("x").is_per_fragment());
    assert!(!StoryError::compositing("x").is_per_fragment());
    assert!(!StoryError::validation("x").is_per_fragment());
    assert!(!StoryError::narration("x").is_per_fragment());
}
