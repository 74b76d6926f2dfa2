use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    assets::fonts::{FontCache, FontHandle, responsive_font_size},
    foundation::core::FrameSize,
    foundation::error::{StoryError, StoryResult},
    render::wrap::wrap_words,
};

/// Transparent subtitle raster covering a whole frame, straight (non-premultiplied) alpha.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayImage {
    image: image::RgbaImage,
}

impl OverlayImage {
    pub fn new(image: image::RgbaImage) -> Self {
        Self { image }
    }

    /// Fully transparent raster of `size`.
    pub fn transparent(size: FrameSize) -> Self {
        Self::new(image::RgbaImage::new(size.width, size.height))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> FrameSize {
        FrameSize {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn as_image(&self) -> &image::RgbaImage {
        &self.image
    }

    /// True when no pixel has any coverage.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p.0[3] == 0)
    }

    pub fn save_png(&self, path: &Path) -> StoryResult<()> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write overlay png '{}'", path.display()))?;
        Ok(())
    }
}

/// Visual parameters of subtitle overlays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Font size is `frame_width / font_size_divisor` before clamping.
    pub font_size_divisor: u32,
    pub min_font_px: u32,
    pub max_font_px: u32,
    /// Fraction of the frame width available to a wrapped line.
    pub wrap_ratio: f32,
    /// Distance between the bottom of the text block and the bottom of the frame.
    pub bottom_margin_px: u32,
    /// Outline reach in pixels on each axis.
    pub outline_px: u32,
    pub fill_rgba: [u8; 4],
    pub outline_rgba: [u8; 4],
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font_size_divisor: 25,
            min_font_px: 24,
            max_font_px: 48,
            wrap_ratio: 0.9,
            bottom_margin_px: 50,
            outline_px: 2,
            fill_rgba: [255, 255, 255, 255],
            outline_rgba: [0, 0, 0, 255],
        }
    }
}

impl OverlayStyle {
    pub fn validate(&self) -> StoryResult<()> {
        if self.font_size_divisor == 0 {
            return Err(StoryError::validation("overlay font_size_divisor must be >= 1"));
        }
        if self.min_font_px == 0 || self.min_font_px > self.max_font_px {
            return Err(StoryError::validation(
                "overlay font bounds must satisfy 0 < min_font_px <= max_font_px",
            ));
        }
        if !self.wrap_ratio.is_finite() || self.wrap_ratio <= 0.0 || self.wrap_ratio > 1.0 {
            return Err(StoryError::validation("overlay wrap_ratio must be in (0, 1]"));
        }
        Ok(())
    }

    pub fn font_size_for(&self, size: FrameSize) -> u32 {
        responsive_font_size(
            size.width,
            self.font_size_divisor,
            self.min_font_px,
            self.max_font_px,
        )
    }
}

/// Turns one fragment of text into one overlay image.
///
/// Implementations are shared across scheduler workers; per-worker mutable state lives in
/// `Scratch`, created once per worker.
pub trait OverlayRenderer: Sync {
    type Scratch;

    fn scratch(&self) -> Self::Scratch;

    fn render(
        &self,
        scratch: &mut Self::Scratch,
        text: &str,
        size: FrameSize,
    ) -> StoryResult<OverlayImage>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush carried through parley layouts.
pub struct TextBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Per-worker shaping state.
pub struct TextScratch {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    registered: HashMap<(usize, u32), RegisteredFont>,
    draw_fonts: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
}

#[derive(Clone)]
struct RegisteredFont {
    family_name: String,
}

impl Default for TextScratch {
    fn default() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: HashMap::new(),
            draw_fonts: HashMap::new(),
        }
    }
}

impl TextScratch {
    fn register(&mut self, handle: &FontHandle) -> StoryResult<RegisteredFont> {
        let key = (Arc::as_ptr(&handle.bytes) as usize, handle.face_index);
        if let Some(hit) = self.registered.get(&key) {
            return Ok(hit.clone());
        }

        let shared: Arc<dyn AsRef<[u8]> + Send + Sync> = handle.bytes.clone();
        let blob = parley::fontique::Blob::new(shared.clone());
        let families = self.font_ctx.collection.register_fonts(blob.clone(), None);

        // Collections register one family per distinct name; pick the one holding our face.
        let family_id = families
            .iter()
            .find(|(_, fonts)| fonts.iter().any(|f| f.index() == handle.face_index))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| {
                StoryError::font(format!("font '{}' registered no families", handle.family))
            })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| StoryError::font("registered font family has no name"))?
            .to_string();

        self.draw_fonts.insert(
            (blob.id(), handle.face_index),
            vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::new(shared),
                handle.face_index,
            ),
        );
        let registered = RegisteredFont { family_name };
        self.registered.insert(key, registered.clone());
        Ok(registered)
    }

    /// Raster font for a shaped run, keyed by the blob and face parley shaped it with.
    fn draw_font(
        &mut self,
        blob_id: u64,
        index: u32,
        bytes: &[u8],
    ) -> vello_cpu::peniko::FontData {
        self.draw_fonts
            .entry((blob_id, index))
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(bytes.to_vec()),
                    index,
                )
            })
            .clone()
    }

    fn layout_line(
        &mut self,
        family_name: &str,
        text: &str,
        size_px: f32,
        brush: TextBrush,
    ) -> parley::Layout<TextBrush> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name.to_string())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

/// Advance width and stacked line height of a layout.
fn measure(layout: &parley::Layout<TextBrush>) -> (f32, f32) {
    let mut w = 0.0f32;
    let mut h = 0.0f32;
    for line in layout.lines() {
        let m = line.metrics();
        w = w.max(m.advance);
        h += m.ascent + m.descent + m.leading;
    }
    (w, h)
}

struct ShapedRun {
    font: vello_cpu::peniko::FontData,
    font_size: f32,
    glyphs: Vec<vello_cpu::Glyph>,
}

struct ShapedLine {
    width: f32,
    height: f32,
    runs: Vec<ShapedRun>,
}

impl ShapedLine {
    fn from_layout(layout: &parley::Layout<TextBrush>, scratch: &mut TextScratch) -> Self {
        let mut runs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run
                    .positioned_glyphs()
                    .map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    })
                    .collect::<Vec<_>>();
                let shaped_with = run.run().font();
                let font = scratch.draw_font(
                    shaped_with.data.id(),
                    shaped_with.index,
                    shaped_with.data.data(),
                );
                runs.push(ShapedRun {
                    font,
                    font_size: run.run().font_size(),
                    glyphs,
                });
            }
        }
        let (width, height) = measure(layout);
        Self {
            width,
            height,
            runs,
        }
    }
}

/// Renders subtitles with parley shaping and vello_cpu rasterization: a black outline pass at
/// every offset within `outline_px`, then a white fill pass.
#[derive(Clone, Debug)]
pub struct TextOverlayRenderer {
    fonts: Arc<FontCache>,
    style: OverlayStyle,
}

impl TextOverlayRenderer {
    pub fn new(fonts: Arc<FontCache>, style: OverlayStyle) -> Self {
        Self { fonts, style }
    }

    pub fn fonts(&self) -> &Arc<FontCache> {
        &self.fonts
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    fn shape_block(
        &self,
        scratch: &mut TextScratch,
        text: &str,
        size: FrameSize,
    ) -> StoryResult<Vec<ShapedLine>> {
        let font_px = self.style.font_size_for(size);
        let handle = self.fonts.get(font_px)?;
        let font = scratch.register(&handle)?;
        let size_px = font_px as f32;
        let brush = TextBrush::default();

        let max_width = size.width as f32 * self.style.wrap_ratio;
        let lines = wrap_words(text, max_width, |candidate| {
            let layout = scratch.layout_line(&font.family_name, candidate, size_px, brush);
            Ok(measure(&layout).0)
        })?;
        if lines.is_empty() {
            return Err(StoryError::overlay("fragment has no drawable text"));
        }

        let shaped = lines
            .iter()
            .map(|line| {
                let layout = scratch.layout_line(&font.family_name, line, size_px, brush);
                ShapedLine::from_layout(&layout, scratch)
            })
            .collect::<Vec<_>>();
        Ok(shaped)
    }
}

impl OverlayRenderer for TextOverlayRenderer {
    type Scratch = TextScratch;

    fn scratch(&self) -> Self::Scratch {
        TextScratch::default()
    }

    fn render(
        &self,
        scratch: &mut Self::Scratch,
        text: &str,
        size: FrameSize,
    ) -> StoryResult<OverlayImage> {
        size.validate()?;
        let lines = self.shape_block(scratch, text, size)?;

        let width_u16 = u16::try_from(size.width)
            .map_err(|_| StoryError::overlay("frame width exceeds raster limits"))?;
        let height_u16 = u16::try_from(size.height)
            .map_err(|_| StoryError::overlay("frame height exceeds raster limits"))?;

        let block_height = lines.iter().map(|l| l.height).sum::<f32>();
        let block_top =
            (size.height as f32 - self.style.bottom_margin_px as f32 - block_height).max(0.0);
        let frame_w = size.width as f32;

        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);

        let reach = self.style.outline_px as i32;
        ctx.set_paint(paint(self.style.outline_rgba));
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if dx == 0 && dy == 0 {
                    continue;
                }
                draw_block(&mut ctx, &lines, frame_w, block_top, dx, dy);
            }
        }

        ctx.set_paint(paint(self.style.fill_rgba));
        draw_block(&mut ctx, &lines, frame_w, block_top, 0, 0);

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
        ctx.render_to_pixmap(&mut pixmap);

        let rgba = unpremultiply_rgba8(pixmap.data_as_u8_slice());
        let image = image::RgbaImage::from_raw(size.width, size.height, rgba)
            .ok_or_else(|| StoryError::overlay("rasterized buffer does not match frame size"))?;
        Ok(OverlayImage::new(image))
    }
}

fn paint(rgba: [u8; 4]) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

fn draw_block(
    ctx: &mut vello_cpu::RenderContext,
    lines: &[ShapedLine],
    frame_w: f32,
    block_top: f32,
    dx: i32,
    dy: i32,
) {
    let mut line_top = block_top;
    for line in lines {
        let x = ((frame_w - line.width) / 2.0).max(0.0);
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            f64::from(x) + f64::from(dx),
            f64::from(line_top) + f64::from(dy),
        )));
        for run in &line.runs {
            ctx.glyph_run(&run.font)
                .font_size(run.font_size)
                .fill_glyphs(run.glyphs.iter().copied());
        }
        line_top += line.height;
    }
}

/// Convert premultiplied RGBA8 to straight alpha.
pub(crate) fn unpremultiply_rgba8(premul: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(premul.len());
    for px in premul.chunks_exact(4) {
        let a = px[3];
        if a == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        let a16 = u16::from(a);
        for &c in &px[..3] {
            let v = (u16::from(c) * 255 + a16 / 2) / a16;
            out.push(v.min(255) as u8);
        }
        out.push(a);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;
