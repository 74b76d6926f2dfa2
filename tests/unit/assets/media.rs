use super::*;

const VIDEO_JSON: &str = r#"{
  "streams": [
    {"codec_type": "video", "width": 1280, "height": 720, "duration": "12.500000"},
    {"codec_type": "audio", "duration": "12.480000"}
  ],
  "format": {"duration": "12.512000"}
}"#;

#[test]
fn video_probe_prefers_container_duration() {
    let parsed = parse_probe_json(VIDEO_JSON.as_bytes()).unwrap();
    let info = video_info_from_probe(Path::new("bg.mp4"), &parsed).unwrap();
    assert_eq!(info.width, 1280);
    assert_eq!(info.height, 720);
    assert!((info.duration_sec - 12.512).abs() < 1e-9);
    assert!(info.has_audio);
    assert_eq!(info.frame_size().unwrap(), FrameSize::new(1280, 720).unwrap());
}

#[test]
fn video_probe_falls_back_to_stream_duration() {
    let json = r#"{"streams":[{"codec_type":"video","width":64,"height":64,"duration":"3.0"}],"format":{}}"#;
    let parsed = parse_probe_json(json.as_bytes()).unwrap();
    let info = video_info_from_probe(Path::new("bg.webm"), &parsed).unwrap();
    assert_eq!(info.duration_sec, 3.0);
    assert!(!info.has_audio);
}

#[test]
fn video_probe_requires_a_video_stream_and_duration() {
    let json = r#"{"streams":[{"codec_type":"audio"}],"format":{"duration":"1.0"}}"#;
    let parsed = parse_probe_json(json.as_bytes()).unwrap();
    assert!(video_info_from_probe(Path::new("x"), &parsed).is_err());

    let json = r#"{"streams":[{"codec_type":"video","width":2,"height":2}],"format":{"duration":"N/A"}}"#;
    let parsed = parse_probe_json(json.as_bytes()).unwrap();
    let err = video_info_from_probe(Path::new("x"), &parsed).unwrap_err();
    assert!(matches!(err, StoryError::Probe(_)));
}

#[test]
fn audio_probe_reads_duration() {
    let json = r#"{"streams":[{"codec_type":"audio","duration":"10.0"}],"format":{"duration":"10.0"}}"#;
    let parsed = parse_probe_json(json.as_bytes()).unwrap();
    let info = audio_info_from_probe(Path::new("n.wav"), &parsed).unwrap();
    assert_eq!(info.duration_sec, 10.0);
}

#[test]
fn malformed_json_is_a_probe_error() {
    assert!(matches!(
        parse_probe_json(b"not json"),
        Err(StoryError::Probe(_))
    ));
}

#[test]
fn missing_file_is_reported_before_spawning() {
    let err = probe_video(Path::new("no/such/video.mp4")).unwrap_err();
    assert!(err.to_string().contains("not found"));
}
