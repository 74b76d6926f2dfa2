use rayon::prelude::*;

use crate::{
    foundation::core::FrameSize,
    foundation::error::{StoryError, StoryResult},
    render::overlay::{OverlayImage, OverlayRenderer},
    text::timeline::TimedFragment,
};

/// Default upper bound on concurrent overlay workers.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// A rendered overlay together with the fragment it belongs to.
#[derive(Clone, Debug)]
pub struct OverlayPair {
    pub fragment: TimedFragment,
    pub image: OverlayImage,
}

/// One fragment that could not be rendered.
#[derive(Debug)]
pub struct OverlayFailure {
    pub index: usize,
    pub text: String,
    pub error: StoryError,
}

/// Outcome of rendering a whole timeline.
#[derive(Debug, Default)]
pub struct OverlaySet {
    /// Successful overlays, in timeline order.
    pub pairs: Vec<OverlayPair>,
    pub failures: Vec<OverlayFailure>,
}

impl OverlaySet {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

fn build_thread_pool(workers: usize) -> StoryResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("overlay-{i}"))
        .build()
        .map_err(|e| StoryError::overlay(format!("failed to build rayon thread pool: {e}")))
}

/// Render one overlay per timed fragment on a bounded pool of `min(max_workers, n)` threads.
///
/// Per-fragment failures are logged and collected in [`OverlaySet::failures`]; they never cancel
/// sibling jobs or fail the call. Only pool construction and a zero `max_workers` are errors.
#[tracing::instrument(skip(renderer, timeline), fields(fragments = timeline.len()))]
pub fn render_overlays<R>(
    renderer: &R,
    timeline: &[TimedFragment],
    size: FrameSize,
    max_workers: usize,
) -> StoryResult<OverlaySet>
where
    R: OverlayRenderer,
{
    if max_workers == 0 {
        return Err(StoryError::validation("max_workers must be >= 1"));
    }
    size.validate()?;
    if timeline.is_empty() {
        tracing::debug!("empty timeline, no overlays to render");
        return Ok(OverlaySet::default());
    }

    let workers = max_workers.min(timeline.len());
    let pool = build_thread_pool(workers)?;
    tracing::debug!(workers, "rendering overlays");

    let results = pool.install(|| {
        timeline
            .par_iter()
            .enumerate()
            .map_init(
                || renderer.scratch(),
                |scratch, (index, fragment)| {
                    (index, renderer.render(scratch, fragment.text(), size))
                },
            )
            .collect::<Vec<_>>()
    });

    let mut out = OverlaySet::default();
    for (index, result) in results {
        let fragment = &timeline[index];
        match result {
            Ok(image) => out.pairs.push(OverlayPair {
                fragment: fragment.clone(),
                image,
            }),
            Err(error) => {
                tracing::warn!(
                    index,
                    text = %fragment.text(),
                    %error,
                    "overlay render failed, dropping fragment"
                );
                out.failures.push(OverlayFailure {
                    index,
                    text: fragment.text().to_string(),
                    error,
                });
            }
        }
    }

    tracing::info!(
        rendered = out.pairs.len(),
        failed = out.failures.len(),
        "overlay rendering finished"
    );
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/scheduler.rs"]
mod tests;
