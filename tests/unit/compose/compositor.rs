use super::*;
use crate::{
    foundation::core::FrameSize,
    render::overlay::OverlayImage,
    text::segment::{Fragment, FragmentKind},
    text::timeline::TimedFragment,
};

fn video(secs: f64) -> VideoSourceInfo {
    VideoSourceInfo {
        source_path: PathBuf::from("bg.mp4"),
        width: 16,
        height: 8,
        duration_sec: secs,
        has_audio: true,
    }
}

fn audio(secs: f64) -> AudioSourceInfo {
    AudioSourceInfo {
        source_path: PathBuf::from("voice.wav"),
        duration_sec: secs,
    }
}

fn frame() -> FrameSize {
    FrameSize::new(16, 8).unwrap()
}

fn pair(text: &str, start: f64, duration: f64) -> OverlayPair {
    OverlayPair {
        fragment: TimedFragment {
            fragment: Fragment::new(text, FragmentKind::Sentence).unwrap(),
            start,
            duration,
        },
        image: OverlayImage::transparent(frame()),
    }
}

#[test]
fn plan_writes_one_png_per_overlay_with_windows() {
    let dir = tempfile::tempdir().unwrap();
    let overlays = vec![pair("Hello world", 0.0, 3.5), pair("Second", 3.5, 6.5)];
    let plan = Compositor::default()
        .plan(&video(3.0), &audio(10.0), frame(), &overlays, dir.path(), Path::new("o.mp4"))
        .unwrap();

    assert_eq!(plan.loop_plan.iterations, 4);
    assert_eq!(plan.loop_plan.trim_to, 10.0);
    assert_eq!(plan.overlays.len(), 2);
    assert_eq!(plan.overlays[1].start, 3.5);
    assert_eq!(plan.overlays[1].end, 10.0);
    for input in &plan.overlays {
        assert!(input.path.starts_with(dir.path()));
        assert!(input.path.is_file());
    }
}

#[test]
fn empty_overlays_give_a_plain_plan() {
    let dir = tempfile::tempdir().unwrap();
    let plan = Compositor::default()
        .plan(&video(30.0), &audio(10.0), frame(), &[], dir.path(), Path::new("o.mp4"))
        .unwrap();
    assert!(plan.overlays.is_empty());
    assert_eq!(plan.loop_plan.iterations, 1);
    assert!(!plan.filter_graph().contains("overlay"));
    assert_eq!(plan.scale_to, None);
}

#[test]
fn other_frame_sizes_scale_the_base_and_must_match_overlays() {
    let dir = tempfile::tempdir().unwrap();
    let portrait = FrameSize::new(8, 16).unwrap();
    let plan = Compositor::default()
        .plan(&video(30.0), &audio(10.0), portrait, &[], dir.path(), Path::new("o.mp4"))
        .unwrap();
    assert_eq!(plan.scale_to, Some(portrait));

    let err = Compositor::default()
        .plan(
            &video(30.0),
            &audio(10.0),
            portrait,
            &[pair("mismatch", 0.0, 1.0)],
            dir.path(),
            Path::new("o.mp4"),
        )
        .unwrap_err();
    assert!(matches!(err, StoryError::Compositing(_)));
}

#[test]
fn overlays_starting_after_the_audio_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let overlays = vec![pair("kept", 0.0, 2.0), pair("late", 12.0, 1.0)];
    let plan = Compositor::default()
        .plan(&video(30.0), &audio(10.0), frame(), &overlays, dir.path(), Path::new("o.mp4"))
        .unwrap();
    assert_eq!(plan.overlays.len(), 1);
}

#[test]
fn scratch_dir_is_removed_on_drop() {
    let root = tempfile::tempdir().unwrap();
    let path = {
        let scratch = ScratchDir::create(root.path(), "t").unwrap();
        std::fs::write(scratch.path().join("x.png"), b"x").unwrap();
        scratch.path().to_path_buf()
    };
    assert!(!path.exists());
}

#[test]
fn failed_compose_cleans_up_and_reports_compositing() {
    let root = tempfile::tempdir().unwrap();
    let scratch_root = root.path().join("scratch");
    std::fs::create_dir_all(&scratch_root).unwrap();
    let out = root.path().join("out.mp4");
    std::fs::write(&out, b"stale partial output").unwrap();

    let mut missing_video = video(3.0);
    missing_video.source_path = root.path().join("missing.mp4");
    let err = Compositor::default()
        .with_scratch_root(&scratch_root)
        .compose(&missing_video, &audio(10.0), frame(), &[pair("a", 0.0, 1.0)], &out)
        .unwrap_err();

    assert!(matches!(err, StoryError::Compositing(_)));
    assert!(!out.exists());
    assert_eq!(std::fs::read_dir(&scratch_root).unwrap().count(), 0);
}

#[test]
fn invalid_durations_surface_as_compositing() {
    let root = tempfile::tempdir().unwrap();
    let err = Compositor::default()
        .with_scratch_root(root.path())
        .compose(&video(0.0), &audio(10.0), frame(), &[], &root.path().join("o.mp4"))
        .unwrap_err();
    assert!(matches!(err, StoryError::Compositing(_)));
}
