use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    assets::fonts::FontCache,
    assets::library::{pick_random_video, read_story},
    assets::media::{probe_audio, probe_video},
    compose::compositor::{Compositor, ScratchDir},
    encode::segments::{SegmentSet, split_into_segments},
    foundation::core::FrameSize,
    foundation::error::{StoryError, StoryResult},
    narration::piper::{NarrationEngine, PiperEngine},
    render::overlay::TextOverlayRenderer,
    render::scheduler::{OverlaySet, render_overlays},
    session::config::SessionConfig,
    text::segment::{Fragment, SegmentRules, segment},
    text::srt::write_srt,
    text::timeline::{TimedFragment, allocate},
};

/// Subtitle source for a render.
#[derive(Clone, Debug, PartialEq)]
pub enum StoryInput {
    /// Raw narration text, segmented with the session rules.
    Text(String),
    /// Fragments segmented by the caller.
    Fragments(Vec<Fragment>),
}

impl StoryInput {
    pub fn fragments(&self, rules: &SegmentRules) -> Vec<Fragment> {
        match self {
            Self::Text(text) => segment(text, rules),
            Self::Fragments(fragments) => fragments.clone(),
        }
    }
}

/// Everything one render needs.
#[derive(Clone, Debug)]
pub struct RenderRequest {
    pub input: StoryInput,
    /// Seconds the subtitles are spread over. Defaults to the probed audio duration.
    pub total_duration: Option<f64>,
    pub video: PathBuf,
    pub audio: PathBuf,
    /// Output frame size. Defaults to the probed video size.
    pub frame_size: Option<FrameSize>,
    pub out_path: PathBuf,
    pub subtitles: bool,
    /// Also write the timeline as SubRip here.
    pub srt_path: Option<PathBuf>,
}

impl RenderRequest {
    pub fn new(
        input: StoryInput,
        video: impl Into<PathBuf>,
        audio: impl Into<PathBuf>,
        out_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input,
            total_duration: None,
            video: video.into(),
            audio: audio.into(),
            frame_size: None,
            out_path: out_path.into(),
            subtitles: true,
            srt_path: None,
        }
    }
}

/// What a full story run produced.
#[derive(Clone, Debug)]
pub struct StoryOutput {
    pub video: PathBuf,
    pub background: PathBuf,
    pub segments: Option<SegmentSet>,
}

/// Render with default settings.
pub fn render(request: RenderRequest) -> StoryResult<PathBuf> {
    StorySession::new(SessionConfig::default())?.render(&request)
}

/// Long-lived rendering context. Owns the font cache shared by overlay workers.
#[derive(Debug)]
pub struct StorySession {
    cfg: SessionConfig,
    renderer: TextOverlayRenderer,
    compositor: Compositor,
}

impl StorySession {
    pub fn new(cfg: SessionConfig) -> StoryResult<Self> {
        cfg.validate()?;
        let fonts = Arc::new(FontCache::new(&cfg.fonts));
        if fonts.face_count() == 0 {
            tracing::warn!("no fonts found; subtitles will be skipped");
        }
        Ok(Self::with_fonts(cfg, fonts))
    }

    /// Build a session around an existing font cache.
    pub fn with_fonts(cfg: SessionConfig, fonts: Arc<FontCache>) -> Self {
        let renderer = TextOverlayRenderer::new(fonts, cfg.overlay.clone());
        let compositor = Compositor::new(cfg.codec.clone());
        Self {
            cfg,
            renderer,
            compositor,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.cfg
    }

    pub fn renderer(&self) -> &TextOverlayRenderer {
        &self.renderer
    }

    pub fn fonts(&self) -> &Arc<FontCache> {
        self.renderer.fonts()
    }

    /// Segment and time `input` over `total_duration` seconds.
    pub fn timeline(
        &self,
        input: &StoryInput,
        total_duration: f64,
    ) -> StoryResult<Vec<TimedFragment>> {
        let fragments = input.fragments(&self.cfg.segmentation);
        tracing::debug!(fragments = fragments.len(), "segmented story");
        allocate(&fragments, total_duration, &self.cfg.timeline)
    }

    /// Render overlays for `timeline` with this session's renderer and worker bound.
    pub fn overlays(
        &self,
        timeline: &[TimedFragment],
        size: FrameSize,
    ) -> StoryResult<OverlaySet> {
        render_overlays(&self.renderer, timeline, size, self.cfg.max_workers)
    }

    /// Probe inputs, build subtitles and composite the final video.
    #[tracing::instrument(skip_all, fields(out = %request.out_path.display()))]
    pub fn render(&self, request: &RenderRequest) -> StoryResult<PathBuf> {
        let video = probe_video(&request.video)?;
        let audio = probe_audio(&request.audio)?;
        let frame = match request.frame_size {
            Some(size) => {
                size.validate()?;
                size
            }
            None => video.frame_size()?,
        };
        let total_duration = request.total_duration.unwrap_or(audio.duration_sec);
        tracing::info!(
            video_secs = video.duration_sec,
            audio_secs = audio.duration_sec,
            %frame,
            "inputs probed"
        );

        let timeline = self.timeline(&request.input, total_duration)?;
        if let Some(srt) = &request.srt_path {
            write_srt(&timeline, srt)?;
        }

        let overlays = if request.subtitles && self.cfg.subtitles {
            let set = self.overlays(&timeline, frame)?;
            if !set.is_complete() {
                tracing::warn!(
                    missing = set.failures.len(),
                    total = timeline.len(),
                    "some subtitles could not be rendered"
                );
            }
            set.pairs
        } else {
            tracing::info!("subtitles disabled");
            Vec::new()
        };

        self.compositor
            .compose(&video, &audio, frame, &overlays, &request.out_path)
    }

    /// Full story flow: read the story, narrate it, pick a background, render, and optionally
    /// split the result.
    #[tracing::instrument(skip(self, narration))]
    pub fn create_story_video(
        &self,
        story: &Path,
        video_folder: &Path,
        output: &Path,
        narration: &dyn NarrationEngine,
        segment_secs: Option<f64>,
        srt_path: Option<&Path>,
    ) -> StoryResult<StoryOutput> {
        if let Some(secs) = segment_secs
            && (!secs.is_finite() || secs <= 0.0)
        {
            return Err(StoryError::validation("segment duration must be > 0"));
        }
        let text = read_story(story)?;
        let out_path = self.cfg.resolve_output_path(output);

        let scratch = ScratchDir::create(&std::env::temp_dir(), "storyreel_narration")?;
        let audio = narration.generate(&text, &scratch.path().join("story_audio.wav"))?;
        let background = pick_random_video(video_folder, &self.cfg.video_extensions)?;

        let mut request = RenderRequest::new(StoryInput::Text(text), &background, audio, &out_path);
        request.srt_path = srt_path.map(Path::to_path_buf);
        let video = self.render(&request)?;

        let segments = match segment_secs {
            Some(secs) => Some(split_into_segments(&video, secs, &self.cfg.codec)?),
            None => None,
        };

        Ok(StoryOutput {
            video,
            background,
            segments,
        })
    }

    /// Narration engine configured by this session.
    pub fn piper(&self) -> PiperEngine {
        PiperEngine::new(self.cfg.narration.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/pipeline.rs"]
mod tests;
