use std::collections::HashMap;

use super::*;

#[test]
fn defaults_are_valid() {
    let cfg = SessionConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.max_workers, 4);
    assert_eq!(cfg.codec.video_codec, "libx264");
    assert_eq!(cfg.video_extensions.len(), 7);
    assert!(cfg.subtitles);
}

#[test]
fn partial_json_keeps_defaults() {
    let cfg = SessionConfig::from_json(
        r#"{"max_workers": 2, "overlay": {"bottom_margin_px": 80}, "narration": {"use_gpu": false}}"#,
    )
    .unwrap();
    assert_eq!(cfg.max_workers, 2);
    assert_eq!(cfg.overlay.bottom_margin_px, 80);
    assert_eq!(cfg.overlay.max_font_px, 48);
    assert!(!cfg.narration.use_gpu);
    assert_eq!(cfg.narration.piper_path, PathBuf::from("piper"));
    assert_eq!(cfg.timeline, TimelineRules::default());
}

#[test]
fn invalid_values_are_rejected() {
    assert!(SessionConfig::from_json(r#"{"max_workers": 0}"#).is_err());
    assert!(SessionConfig::from_json(r#"{"segmentation": {"chunk_words": 0}}"#).is_err());
    assert!(SessionConfig::from_json(r#"{"video_extensions": []}"#).is_err());
    assert!(matches!(
        SessionConfig::from_json("{not json"),
        Err(StoryError::Validation(_))
    ));
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    std::fs::write(&path, r#"{"subtitles": false}"#).unwrap();
    assert!(!SessionConfig::load(&path).unwrap().subtitles);
    assert!(SessionConfig::load(&dir.path().join("missing.json")).is_err());
}

#[test]
fn env_overrides_apply_and_ignore_garbage() {
    let vars = HashMap::from([
        (ENV_PIPER, "/opt/piper/piper".to_string()),
        (ENV_MAX_WORKERS, "8".to_string()),
    ]);
    let mut cfg = SessionConfig::default();
    cfg.apply_env_with(|k| vars.get(k).cloned());
    assert_eq!(cfg.narration.piper_path, PathBuf::from("/opt/piper/piper"));
    assert_eq!(cfg.max_workers, 8);

    let garbage = HashMap::from([(ENV_MAX_WORKERS, "zero".to_string())]);
    cfg.apply_env_with(|k| garbage.get(k).cloned());
    assert_eq!(cfg.max_workers, 8);
}

#[test]
fn bare_output_names_go_under_output_dir() {
    let cfg = SessionConfig::default();
    assert_eq!(
        cfg.resolve_output_path(Path::new("story.mp4")),
        PathBuf::from("output/story.mp4")
    );
    assert_eq!(
        cfg.resolve_output_path(Path::new("renders/story.mp4")),
        PathBuf::from("renders/story.mp4")
    );
}
