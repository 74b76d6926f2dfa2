use super::*;

#[test]
fn frame_size_rejects_zero_and_oversized() {
    assert!(FrameSize::new(0, 10).is_err());
    assert!(FrameSize::new(10, 0).is_err());
    assert!(FrameSize::new(70_000, 10).is_err());
    assert!(FrameSize::new(1920, 1080).is_ok());
}

#[test]
fn frame_size_display_and_len() {
    let size = FrameSize::new(4, 2).unwrap();
    assert_eq!(size.to_string(), "4x2");
    assert_eq!(size.rgba_len(), 32);
}

#[test]
fn positive_secs_guard() {
    assert_eq!(ensure_positive_secs("d", 1.5).unwrap(), 1.5);
    assert!(ensure_positive_secs("d", 0.0).is_err());
    assert!(ensure_positive_secs("d", -1.0).is_err());
    assert!(ensure_positive_secs("d", f64::NAN).is_err());
    assert!(ensure_positive_secs("d", f64::INFINITY).is_err());
}
