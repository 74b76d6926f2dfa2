use super::*;
use crate::{narration::piper::PrerecordedAudio, text::segment::FragmentKind};

fn fontless_session() -> StorySession {
    let fonts = Arc::new(FontCache::with_database(
        usvg::fontdb::Database::new(),
        vec![],
    ));
    StorySession::with_fonts(SessionConfig::default(), fonts)
}

#[test]
fn text_input_is_segmented_and_timed() {
    let session = fontless_session();
    let timeline = session
        .timeline(&StoryInput::Text("Hello world. This is a test.".into()), 10.0)
        .unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].text(), "Hello world");
    assert_eq!(timeline[0].start, 0.0);
    assert!((timeline[0].duration - 10.0 / 3.0).abs() < 1e-9);
    assert!((timeline[1].start - 10.0 / 3.0).abs() < 1e-9);
    assert!((timeline[1].duration - 20.0 / 3.0).abs() < 1e-9);
}

#[test]
fn prebuilt_fragments_pass_through() {
    let session = fontless_session();
    let fragments = vec![
        Fragment::new("one two", FragmentKind::Chunk).unwrap(),
        Fragment::new("three", FragmentKind::Sentence).unwrap(),
    ];
    let timeline = session
        .timeline(&StoryInput::Fragments(fragments.clone()), 6.0)
        .unwrap();
    let back = timeline.iter().map(|t| t.fragment.clone()).collect::<Vec<_>>();
    assert_eq!(back, fragments);
}

#[test]
fn empty_story_gives_empty_timeline() {
    let session = fontless_session();
    assert!(
        session
            .timeline(&StoryInput::Text(String::new()), 5.0)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn missing_fonts_degrade_to_no_overlays() {
    let session = fontless_session();
    let timeline = session
        .timeline(&StoryInput::Text("One. Two. Three.".into()), 6.0)
        .unwrap();
    let set = session
        .overlays(&timeline, FrameSize::new(64, 64).unwrap())
        .unwrap();
    assert!(set.pairs.is_empty());
    assert_eq!(set.failures.len(), 3);
}

#[test]
fn zero_segment_duration_fails_before_any_work() {
    let session = fontless_session();
    let err = session
        .create_story_video(
            Path::new("missing-story.txt"),
            Path::new("missing-videos"),
            Path::new("out.mp4"),
            &PrerecordedAudio::new("missing.wav"),
            Some(0.0),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, StoryError::Validation(_)));
}

#[test]
fn empty_story_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let story = dir.path().join("story.txt");
    std::fs::write(&story, "   ").unwrap();
    let err = fontless_session()
        .create_story_video(
            &story,
            dir.path(),
            &dir.path().join("out.mp4"),
            &PrerecordedAudio::new("missing.wav"),
            None,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, StoryError::Validation(_)));
}

#[test]
fn narration_failure_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let story = dir.path().join("story.txt");
    std::fs::write(&story, "Hello world.").unwrap();
    let err = fontless_session()
        .create_story_video(
            &story,
            dir.path(),
            &dir.path().join("out.mp4"),
            &PrerecordedAudio::new(dir.path().join("missing.wav")),
            None,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, StoryError::Narration(_)));
}

#[test]
fn render_reports_missing_inputs_as_probe_errors() {
    let request = RenderRequest::new(
        StoryInput::Text("Hello.".into()),
        "no/such/video.mp4",
        "no/such/audio.wav",
        "out.mp4",
    );
    let err = fontless_session().render(&request).unwrap_err();
    assert!(matches!(err, StoryError::Probe(_)));
}

#[test]
fn request_defaults() {
    let request = RenderRequest::new(StoryInput::Text("a".into()), "v.mp4", "a.wav", "o.mp4");
    assert!(request.subtitles);
    assert!(request.total_duration.is_none());
    assert!(request.frame_size.is_none());
    assert!(request.srt_path.is_none());
}
