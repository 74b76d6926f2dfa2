//! Storyreel turns a narrated story into a subtitled short video.
//!
//! # Pipeline overview
//!
//! 1. **Segment**: story text -> [`Fragment`]s (sentences, or word groups for long sentences)
//! 2. **Time**: fragments + narration duration -> [`TimedFragment`]s laid end-to-end from zero
//! 3. **Render**: each timed fragment -> one transparent, frame-sized [`OverlayImage`], on a bounded
//!    worker pool ([`render_overlays`])
//! 4. **Composite**: base video looped or trimmed to the narration, narration audio attached,
//!    overlays enabled in their time windows, encoded by the system `ffmpeg` ([`Compositor`])
//!
//! Narration is produced by an external engine behind [`NarrationEngine`] (Piper by default).
//! Per-fragment overlay failures are logged and dropped; the video is still produced.
//!
//! The single-call entry point is [`render`]; [`StorySession`] keeps the font cache and settings
//! alive across renders.
#![forbid(unsafe_code)]

mod assets;
mod compose;
mod encode;
mod foundation;
mod narration;
mod render;
mod session;
mod text;

pub use assets::fonts::{
    DEFAULT_FONT_FAMILIES, FontCache, FontHandle, FontSource, responsive_font_size,
};
pub use assets::library::{
    VIDEO_EXTENSIONS, default_video_extensions, list_videos, pick_random_video, read_story,
};
pub use assets::media::{
    AudioSourceInfo, VideoSourceInfo, is_ffprobe_on_path, probe_audio, probe_video,
};
pub use compose::compositor::Compositor;
pub use encode::ffmpeg::{
    CodecConfig, EncodePlan, LoopPlan, OverlayInput, ensure_parent_dir, is_ffmpeg_on_path,
};
pub use encode::segments::{
    MIN_SEGMENT_SECS, SegmentSet, SegmentSpan, plan_segments, segments_folder, split_into_segments,
};
pub use foundation::core::{FrameSize, ensure_positive_secs};
pub use foundation::error::{StoryError, StoryResult};
pub use narration::piper::{Accel, NarrationEngine, PiperConfig, PiperEngine, PrerecordedAudio};
pub use render::overlay::{
    OverlayImage, OverlayRenderer, OverlayStyle, TextBrush, TextOverlayRenderer, TextScratch,
};
pub use render::scheduler::{
    DEFAULT_MAX_WORKERS, OverlayFailure, OverlayPair, OverlaySet, render_overlays,
};
pub use render::wrap::wrap_words;
pub use session::config::{ENV_MAX_WORKERS, ENV_PIPER, SessionConfig};
pub use session::pipeline::{RenderRequest, StoryInput, StoryOutput, StorySession, render};
pub use text::segment::{Fragment, FragmentKind, SegmentRules, segment};
pub use text::srt::{format_srt_time, to_srt, write_srt};
pub use text::timeline::{ClampBounds, TimedFragment, TimelineRules, allocate};
