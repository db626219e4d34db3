use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::error::{StudioError, StudioResult};

/// Rgba8 brush carried through Parley styling into glyph drawing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// A shaped, ready-to-draw text run.
pub struct ShapedText {
    layout: parley::Layout<TextBrush>,
    font: vello_cpu::peniko::FontData,
}

impl ShapedText {
    pub fn width(&self) -> f32 {
        self.layout.width()
    }

    pub fn height(&self) -> f32 {
        self.layout.height()
    }

    /// Draw at (x, y) = top-left of the layout box, in the context's canvas
    /// coordinates.
    pub fn draw(&self, ctx: &mut vello_cpu::RenderContext, x: f64, y: f64) {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, y)));

        for line in self.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }
}

struct LoadedFont {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Font loading plus Parley shaping, with per-path caching. Fonts come from
/// explicit file sources; a path that fails to load is reported once and
/// text for it is skipped thereafter.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    fonts: HashMap<PathBuf, LoadedFont>,
    failed: HashSet<PathBuf>,
    missing_notified: bool,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            fonts: HashMap::new(),
            failed: HashSet::new(),
            missing_notified: false,
        }
    }

    /// Shape `text` with the font at `font_path`. Errors out on unloadable
    /// fonts or degenerate sizes.
    pub fn shape(
        &mut self,
        text: &str,
        font_path: &Path,
        size_px: f32,
        brush: TextBrush,
        max_width_px: Option<f32>,
    ) -> StudioResult<ShapedText> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(StudioError::validation("text size_px must be finite and > 0"));
        }

        let loaded = self.load_font(font_path)?;
        let family = loaded.family.clone();
        let font = loaded.data.clone();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        if let Some(w) = max_width_px {
            layout.break_all_lines(Some(w));
            layout.align(
                Some(w),
                parley::Alignment::Start,
                parley::AlignmentOptions::default(),
            );
        } else {
            layout.break_all_lines(None);
        }

        Ok(ShapedText { layout, font })
    }

    /// Like [`TextEngine::shape`], but degrades to `None`, logging the first
    /// failure per font path and once when no font source is configured at
    /// all. Used on the per-frame path where a bad font must not take down
    /// the render loop.
    pub fn shape_or_skip(
        &mut self,
        text: &str,
        font_path: Option<&Path>,
        size_px: f32,
        brush: TextBrush,
    ) -> Option<ShapedText> {
        let Some(path) = font_path else {
            if !self.missing_notified {
                self.missing_notified = true;
                tracing::warn!("no font source configured; text layers will not be drawn");
            }
            return None;
        };
        match self.shape(text, path, size_px, brush, None) {
            Ok(shaped) => Some(shaped),
            Err(err) => {
                if self.failed.insert(path.to_path_buf()) {
                    tracing::warn!(font = %path.display(), %err, "skipping text drawing");
                }
                None
            }
        }
    }

    fn load_font(&mut self, path: &Path) -> StudioResult<&LoadedFont> {
        if !self.fonts.contains_key(path) {
            let bytes = std::fs::read(path).map_err(|e| {
                StudioError::raster(format!("failed to read font '{}': {e}", path.display()))
            })?;
            let bytes = Arc::new(bytes);

            let families = self
                .font_ctx
                .collection
                .register_fonts(parley::fontique::Blob::from(bytes.as_ref().clone()), None);
            let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
                StudioError::raster(format!(
                    "no font families registered from '{}'",
                    path.display()
                ))
            })?;
            let family = self
                .font_ctx
                .collection
                .family_name(family_id)
                .ok_or_else(|| StudioError::raster("registered font family has no name"))?
                .to_string();

            let data = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
                0,
            );
            self.fonts
                .insert(path.to_path_buf(), LoadedFont { family, data });
        }
        Ok(&self.fonts[path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_rejects_bad_size() {
        let mut engine = TextEngine::new();
        let err = engine.shape(
            "x",
            Path::new("/nonexistent.ttf"),
            0.0,
            TextBrush::default(),
            None,
        );
        assert!(matches!(err, Err(StudioError::Validation(_))));
    }

    #[test]
    fn missing_font_errors_and_skip_degrades_quietly() {
        let mut engine = TextEngine::new();
        let missing = Path::new("/definitely/not/here.ttf");
        assert!(
            engine
                .shape("x", missing, 32.0, TextBrush::default(), None)
                .is_err()
        );
        assert!(
            engine
                .shape_or_skip("x", Some(missing), 32.0, TextBrush::default())
                .is_none()
        );
        // Second skip goes through the already-failed set.
        assert!(
            engine
                .shape_or_skip("x", Some(missing), 32.0, TextBrush::default())
                .is_none()
        );
    }

    #[test]
    fn no_font_source_skips_and_notifies_once() {
        let mut engine = TextEngine::new();
        assert!(!engine.missing_notified);
        assert!(
            engine
                .shape_or_skip("x", None, 32.0, TextBrush::default())
                .is_none()
        );
        assert!(engine.missing_notified);
        assert!(
            engine
                .shape_or_skip("y", None, 32.0, TextBrush::default())
                .is_none()
        );
    }
}
