//! The per-frame draw routine.
//!
//! Every frame is rebuilt from scratch on a fixed 1920x1080 premultiplied
//! rgba8 canvas: background fill, then the two elements in ascending
//! z-order (drop shadow, content, rounded mask, selection gizmo), then the
//! lower-third bar. Element content is rendered into a full-canvas layer
//! buffer so the blur and rounded-mask passes can run as plain pixel ops
//! before the layer is composited over the base.

use std::time::Instant;

use vello_cpu::kurbo::{Affine, Circle, Rect as KRect, Shape as _};

use crate::{
    camera::{CameraFrame, cover_crop},
    composite_cpu::over_in_place,
    core::{
        BAR_HEIGHT, Bitmap, CANVAS_HEIGHT, CANVAS_WIDTH, IRect, Rgba8,
    },
    error::StudioResult,
    scene::{ElementId, Scene, VisualConfig},
    slide::SlideSource,
    text::{TextBrush, TextEngine},
    transition::{Transition, fade_params},
};

const SHADOW_PREMUL: [u8; 4] = [0, 0, 0, 38]; // rgba(0,0,0,0.15)
const BAR_SHADOW_PREMUL: [u8; 4] = [0, 0, 0, 51]; // rgba(0,0,0,0.2)

const ACCENT: Rgba8 = Rgba8::opaque(0x63, 0x66, 0xf1);
const GIZMO_LINE_WIDTH: f64 = 4.0;
const GIZMO_DASH: f64 = 10.0;
const HANDLE_RADIUS: f64 = 12.0;

const SLIDE_PLACEHOLDER_FILL: Rgba8 = Rgba8::opaque(0xf1, 0xf5, 0xf9);
const SLIDE_PLACEHOLDER_TEXT: Rgba8 = Rgba8::opaque(0x94, 0xa3, 0xb8);
const CAMERA_PLACEHOLDER_FILL: Rgba8 = Rgba8::opaque(0xff, 0xff, 0xff);
const CAMERA_PLACEHOLDER_TEXT: Rgba8 = Rgba8::opaque(0xcc, 0xcc, 0xcc);

const BAR_PADDING_LEFT: f64 = 60.0;
const BAR_PADDING_TOP: f64 = 40.0;

/// Everything one frame reads. The compositor never mutates any of it; the
/// only state it advances is the transition clock.
pub struct FrameInputs<'a> {
    pub scene: &'a Scene,
    pub config: &'a VisualConfig,
    pub slide: &'a SlideSource,
    pub camera: Option<&'a CameraFrame>,
    pub selected: Option<ElementId>,
    pub capturing: bool,
}

pub struct Compositor {
    text: TextEngine,
    base: Vec<u8>,
    layer: Vec<u8>,
    scratch: Vec<u8>,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        let len = CANVAS_WIDTH as usize * CANVAS_HEIGHT as usize * 4;
        Self {
            text: TextEngine::new(),
            base: vec![0u8; len],
            layer: vec![0u8; len],
            scratch: vec![0u8; len],
        }
    }

    /// Composite one frame at `now`, advancing the transition clock first.
    pub fn render_frame(
        &mut self,
        inputs: &FrameInputs<'_>,
        transition: &mut Transition,
        now: Instant,
    ) -> StudioResult<Bitmap> {
        let cfg = inputs.config;
        let progress = transition.tick(now, cfg.crossfade_ms);

        let bg = cfg.bg_color.to_premul();
        for px in self.base.chunks_exact_mut(4) {
            px.copy_from_slice(&bg);
        }

        for el in inputs.scene.ordered_by_z() {
            let ir = el.rect.floored();
            if ir.w <= 0 || ir.h <= 0 {
                continue;
            }
            let radius = cfg.roundness_for(el.id);

            if cfg.shadow_intensity > 0 {
                self.draw_shadow(ir, radius, cfg.shadow_intensity)?;
            }

            self.layer.fill(0);
            match el.id {
                ElementId::Slide => {
                    if let Some(current) = inputs.slide.current() {
                        match (progress, transition.snapshot()) {
                            (Some(p), Some(snapshot)) => {
                                let fade = fade_params(p);
                                draw_bitmap_blurred(
                                    &mut self.layer,
                                    &mut self.scratch,
                                    snapshot,
                                    ir,
                                    None,
                                    fade.out_blur_px,
                                    fade.out_alpha,
                                )?;
                                draw_bitmap_blurred(
                                    &mut self.layer,
                                    &mut self.scratch,
                                    current,
                                    ir,
                                    None,
                                    fade.in_blur_px,
                                    fade.in_alpha,
                                )?;
                            }
                            _ => draw_bitmap(&mut self.layer, current, ir, None)?,
                        }
                    } else {
                        draw_placeholder(
                            &mut self.layer,
                            &mut self.text,
                            ir,
                            SLIDE_PLACEHOLDER_FILL,
                            SLIDE_PLACEHOLDER_TEXT,
                            &[("SLIDE", 80.0, 0.0), ("Drag & Drop PDF", 30.0, 60.0)],
                            cfg.ui_font.as_deref(),
                        )?;
                    }
                }
                ElementId::Camera => {
                    match inputs.camera {
                        Some(frame) if frame.is_ready() => {
                            let crop =
                                cover_crop(frame.bitmap.width, frame.bitmap.height, ir.w, ir.h);
                            draw_bitmap(&mut self.layer, &frame.bitmap, ir, Some(crop))?;
                        }
                        _ => draw_placeholder(
                            &mut self.layer,
                            &mut self.text,
                            ir,
                            CAMERA_PLACEHOLDER_FILL,
                            CAMERA_PLACEHOLDER_TEXT,
                            &[("CAM", 40.0, 0.0)],
                            cfg.ui_font.as_deref(),
                        )?,
                    }
                }
            }

            crate::mask_cpu::mask_rounded_rect(
                &mut self.layer,
                CANVAS_WIDTH,
                CANVAS_HEIGHT,
                ir,
                radius,
            )?;
            over_in_place(&mut self.base, &self.layer, 1.0)?;

            if !inputs.capturing {
                draw_gizmo(&mut self.base, ir, inputs.selected == Some(el.id))?;
            }
        }

        if cfg.bar_visible() {
            self.draw_bar(cfg)?;
        }

        Bitmap::new(CANVAS_WIDTH, CANVAS_HEIGHT, self.base.clone())
    }

    fn draw_shadow(&mut self, ir: IRect, radius: f64, intensity: u8) -> StudioResult<()> {
        let blur_px = 10.0 + f64::from(intensity) * 0.5;
        let offset_y = (5.0 + f64::from(intensity) * 0.3).round() as i32;

        self.scratch.fill(0);
        crate::mask_cpu::fill_rounded_rect(
            &mut self.scratch,
            CANVAS_WIDTH,
            CANVAS_HEIGHT,
            IRect {
                y: ir.y + offset_y,
                ..ir
            },
            radius,
            SHADOW_PREMUL,
        )?;

        let (r, sigma) = crate::blur_cpu::blur_px_to_kernel(blur_px as f32);
        let blurred =
            crate::blur_cpu::blur_rgba8_premul(&self.scratch, CANVAS_WIDTH, CANVAS_HEIGHT, r, sigma)?;
        over_in_place(&mut self.base, &blurred, 1.0)
    }

    fn draw_bar(&mut self, cfg: &VisualConfig) -> StudioResult<()> {
        let bar_y = (CANVAS_HEIGHT - BAR_HEIGHT) as i32;

        // Upward shadow: the bar silhouette shifted up, blurred, under the
        // opaque band.
        self.scratch.fill(0);
        fill_rect_bytes(
            &mut self.scratch,
            IRect {
                x: 0,
                y: bar_y - 5,
                w: CANVAS_WIDTH as i32,
                h: BAR_HEIGHT as i32,
            },
            BAR_SHADOW_PREMUL,
        );
        let (r, sigma) = crate::blur_cpu::blur_px_to_kernel(20.0);
        let blurred =
            crate::blur_cpu::blur_rgba8_premul(&self.scratch, CANVAS_WIDTH, CANVAS_HEIGHT, r, sigma)?;
        over_in_place(&mut self.base, &blurred, 1.0)?;

        fill_bar_gradient(&mut self.base, cfg.bar_color_start, cfg.bar_color_end);

        let title_offset = if cfg.title.is_empty() {
            0.0
        } else {
            cfg.title_size * 1.2
        };

        let mut texts: Vec<(crate::text::ShapedText, f64)> = Vec::new();
        if !cfg.title.is_empty()
            && let Some(shaped) = self.text.shape_or_skip(
                &cfg.title,
                cfg.title_font.as_deref(),
                cfg.title_size as f32,
                brush(cfg.title_color),
            )
        {
            texts.push((shaped, f64::from(bar_y) + BAR_PADDING_TOP));
        }
        if !cfg.subtitle.is_empty()
            && let Some(shaped) = self.text.shape_or_skip(
                &cfg.subtitle,
                cfg.subtitle_font.as_deref(),
                cfg.subtitle_size as f32,
                brush(cfg.subtitle_color),
            )
        {
            texts.push((shaped, f64::from(bar_y) + BAR_PADDING_TOP + title_offset));
        }

        if !texts.is_empty() {
            with_ctx(&mut self.base, |ctx| {
                for (shaped, y) in &texts {
                    shaped.draw(ctx, BAR_PADDING_LEFT, *y);
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}

fn brush(c: Rgba8) -> TextBrush {
    TextBrush {
        r: c.r,
        g: c.g,
        b: c.b,
        a: c.a,
    }
}

/// Run vello draw calls on a cleared offscreen surface, then composite the
/// result over `buf`. `render_to_pixmap` replaces the target's contents, so
/// the live buffer is never handed to the context directly.
fn with_ctx(
    buf: &mut [u8],
    draw: impl FnOnce(&mut vello_cpu::RenderContext) -> StudioResult<()>,
) -> StudioResult<()> {
    let mut surface = vello_cpu::Pixmap::new(CANVAS_WIDTH as u16, CANVAS_HEIGHT as u16);
    let mut ctx = vello_cpu::RenderContext::new(CANVAS_WIDTH as u16, CANVAS_HEIGHT as u16);
    ctx.set_paint_transform(Affine::IDENTITY);
    draw(&mut ctx)?;
    ctx.flush();
    ctx.render_to_pixmap(&mut surface);
    over_in_place(buf, surface.data_as_u8_slice(), 1.0)
}

/// Draw `bitmap` stretched to `dst`, optionally from a source-space crop
/// rectangle (cover fit).
fn draw_bitmap(
    buf: &mut [u8],
    bitmap: &Bitmap,
    dst: IRect,
    crop: Option<(f64, f64, f64, f64)>,
) -> StudioResult<()> {
    let image = bitmap.to_image()?;
    let (cx, cy, cw, ch) =
        crop.unwrap_or((0.0, 0.0, f64::from(bitmap.width), f64::from(bitmap.height)));
    if cw <= 0.0 || ch <= 0.0 {
        return Ok(());
    }

    with_ctx(buf, |ctx| {
        let affine = Affine::translate((f64::from(dst.x), f64::from(dst.y)))
            * Affine::scale_non_uniform(f64::from(dst.w) / cw, f64::from(dst.h) / ch)
            * Affine::translate((-cx, -cy));
        ctx.set_transform(affine);
        ctx.set_paint(image);
        ctx.fill_rect(&KRect::new(cx, cy, cx + cw, cy + ch));
        Ok(())
    })
}

/// One crossfade layer: render at full alpha into a scratch buffer, blur,
/// then composite over `buf` at the layer's opacity.
fn draw_bitmap_blurred(
    buf: &mut [u8],
    scratch: &mut [u8],
    bitmap: &Bitmap,
    dst: IRect,
    crop: Option<(f64, f64, f64, f64)>,
    blur_px: f32,
    alpha: f32,
) -> StudioResult<()> {
    if alpha <= 0.0 {
        return Ok(());
    }
    scratch.fill(0);
    draw_bitmap(scratch, bitmap, dst, crop)?;

    let (radius, sigma) = crate::blur_cpu::blur_px_to_kernel(blur_px);
    if radius == 0 {
        return over_in_place(buf, scratch, alpha);
    }
    let blurred = crate::blur_cpu::blur_rgba8_premul(
        scratch,
        CANVAS_WIDTH,
        CANVAS_HEIGHT,
        radius,
        sigma,
    )?;
    over_in_place(buf, &blurred, alpha)
}

fn draw_placeholder(
    buf: &mut [u8],
    text: &mut TextEngine,
    ir: IRect,
    fill: Rgba8,
    label_color: Rgba8,
    labels: &[(&str, f32, f64)],
    ui_font: Option<&std::path::Path>,
) -> StudioResult<()> {
    fill_rect_bytes(buf, ir, fill.to_premul());

    let mut shaped = Vec::new();
    for &(label, size, dy) in labels {
        if let Some(s) = text.shape_or_skip(label, ui_font, size, brush(label_color)) {
            shaped.push((s, dy));
        }
    }
    if shaped.is_empty() {
        return Ok(());
    }

    let center_x = f64::from(ir.x) + f64::from(ir.w) / 2.0;
    let center_y = f64::from(ir.y) + f64::from(ir.h) / 2.0;
    with_ctx(buf, |ctx| {
        for (s, dy) in &shaped {
            let x = center_x - f64::from(s.width()) / 2.0;
            let y = center_y - f64::from(s.height()) / 2.0 + dy;
            s.draw(ctx, x, y);
        }
        Ok(())
    })
}

/// Opaque axis-aligned fill clipped to the canvas.
fn fill_rect_bytes(buf: &mut [u8], ir: IRect, premul: [u8; 4]) {
    let w = CANVAS_WIDTH as i32;
    let h = CANVAS_HEIGHT as i32;
    let x0 = ir.x.clamp(0, w) as usize;
    let y0 = ir.y.clamp(0, h) as usize;
    let x1 = (ir.x + ir.w).clamp(0, w) as usize;
    let y1 = (ir.y + ir.h).clamp(0, h) as usize;

    let row_bytes = CANVAS_WIDTH as usize * 4;
    for y in y0..y1 {
        let row = &mut buf[y * row_bytes + x0 * 4..y * row_bytes + x1 * 4];
        for px in row.chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }
    }
}

fn fill_bar_gradient(base: &mut [u8], start: Rgba8, end: Rgba8) {
    let w = CANVAS_WIDTH as usize;
    let bar_y = (CANVAS_HEIGHT - BAR_HEIGHT) as usize;

    let mut row = vec![0u8; w * 4];
    for x in 0..w {
        let t = x as f32 / (w - 1) as f32;
        let lerp = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        let c = Rgba8::opaque(lerp(start.r, end.r), lerp(start.g, end.g), lerp(start.b, end.b));
        row[x * 4..x * 4 + 4].copy_from_slice(&c.to_premul());
    }
    for y in bar_y..CANVAS_HEIGHT as usize {
        base[y * w * 4..(y + 1) * w * 4].copy_from_slice(&row);
    }
}

/// Selection affordance: dashed translucent outline when unselected, solid
/// accent outline plus a filled corner handle when selected. Drawn over the
/// composited element, never while capturing.
fn draw_gizmo(buf: &mut [u8], ir: IRect, selected: bool) -> StudioResult<()> {
    with_ctx(buf, |ctx| {
        ctx.set_transform(Affine::IDENTITY);
        if selected {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                ACCENT.r, ACCENT.g, ACCENT.b, 255,
            ));
            for r in outline_rects(ir) {
                ctx.fill_rect(&r);
            }
            let circle = Circle::new(
                (f64::from(ir.x + ir.w), f64::from(ir.y + ir.h)),
                HANDLE_RADIUS,
            );
            ctx.fill_path(&circle.to_path(0.1));
        } else {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 77));
            for r in dashed_outline_rects(ir) {
                ctx.fill_rect(&r);
            }
        }
        Ok(())
    })
}

/// Four edge rects approximating a 4px stroke centered on the border.
fn outline_rects(ir: IRect) -> [KRect; 4] {
    let half = GIZMO_LINE_WIDTH / 2.0;
    let (x0, y0) = (f64::from(ir.x), f64::from(ir.y));
    let (x1, y1) = (f64::from(ir.x + ir.w), f64::from(ir.y + ir.h));
    [
        KRect::new(x0 - half, y0 - half, x1 + half, y0 + half),
        KRect::new(x0 - half, y1 - half, x1 + half, y1 + half),
        KRect::new(x0 - half, y0 + half, x0 + half, y1 - half),
        KRect::new(x1 - half, y0 + half, x1 + half, y1 - half),
    ]
}

/// 10-on/10-off dash segments along each edge.
fn dashed_outline_rects(ir: IRect) -> Vec<KRect> {
    let half = GIZMO_LINE_WIDTH / 2.0;
    let (x0, y0) = (f64::from(ir.x), f64::from(ir.y));
    let (x1, y1) = (f64::from(ir.x + ir.w), f64::from(ir.y + ir.h));
    let step = GIZMO_DASH * 2.0;

    let mut rects = Vec::new();
    let mut x = x0;
    while x < x1 {
        let end = (x + GIZMO_DASH).min(x1);
        rects.push(KRect::new(x, y0 - half, end, y0 + half));
        rects.push(KRect::new(x, y1 - half, end, y1 + half));
        x += step;
    }
    let mut y = y0;
    while y < y1 {
        let end = (y + GIZMO_DASH).min(y1);
        rects.push(KRect::new(x0 - half, y, x0 + half, end));
        rects.push(KRect::new(x1 - half, y, x1 + half, end));
        y += step;
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::Rect, slide::PageRasterizer};

    struct SolidDeck {
        pages: Vec<[u8; 4]>,
    }

    impl PageRasterizer for SolidDeck {
        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn rasterize(&self, page: u32) -> StudioResult<Bitmap> {
            let premul = self.pages[(page - 1) as usize];
            Ok(Bitmap::filled(8, 8, premul))
        }
    }

    fn pixel(frame: &Bitmap, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * frame.width + x) * 4) as usize;
        [
            frame.data[i],
            frame.data[i + 1],
            frame.data[i + 2],
            frame.data[i + 3],
        ]
    }

    fn flat_config() -> VisualConfig {
        VisualConfig {
            shadow_intensity: 0,
            ..VisualConfig::default()
        }
    }

    fn render(
        compositor: &mut Compositor,
        scene: &Scene,
        cfg: &VisualConfig,
        slide: &SlideSource,
        camera: Option<&CameraFrame>,
        transition: &mut Transition,
        capturing: bool,
    ) -> Bitmap {
        compositor
            .render_frame(
                &FrameInputs {
                    scene,
                    config: cfg,
                    slide,
                    camera,
                    selected: None,
                    capturing,
                },
                transition,
                Instant::now(),
            )
            .unwrap()
    }

    #[test]
    fn vello_pass_preserves_existing_canvas_content() {
        let mut buf = vec![0u8; (CANVAS_WIDTH * CANVAS_HEIGHT * 4) as usize];
        for px in buf.chunks_exact_mut(4) {
            px.copy_from_slice(&[255, 0, 0, 255]);
        }
        with_ctx(&mut buf, |ctx| {
            ctx.set_transform(Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 255, 0, 255));
            ctx.fill_rect(&KRect::new(100.0, 100.0, 200.0, 200.0));
            Ok(())
        })
        .unwrap();

        let at = |x: u32, y: u32| {
            let i = ((y * CANVAS_WIDTH + x) * 4) as usize;
            [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
        };
        assert_eq!(at(150, 150), [0, 255, 0, 255]);
        assert_eq!(at(500, 500), [255, 0, 0, 255]);
    }

    #[test]
    fn background_fills_uncovered_pixels() {
        let mut c = Compositor::new();
        let frame = render(
            &mut c,
            &Scene::default(),
            &flat_config(),
            &SlideSource::new(),
            None,
            &mut Transition::new(),
            true,
        );
        assert_eq!(pixel(&frame, 0, 0), Rgba8::opaque(0xfd, 0xf5, 0xf2).to_premul());
        assert_eq!(pixel(&frame, 1919, 0), Rgba8::opaque(0xfd, 0xf5, 0xf2).to_premul());
    }

    #[test]
    fn placeholders_fill_element_interiors() {
        let mut c = Compositor::new();
        let frame = render(
            &mut c,
            &Scene::default(),
            &flat_config(),
            &SlideSource::new(),
            None,
            &mut Transition::new(),
            true,
        );
        // Slide center (80+600, 150+337) and camera center (1350+225, 300+225).
        assert_eq!(pixel(&frame, 680, 487), SLIDE_PLACEHOLDER_FILL.to_premul());
        assert_eq!(pixel(&frame, 1575, 525), CAMERA_PLACEHOLDER_FILL.to_premul());
    }

    #[test]
    fn drawing_uses_floored_rect_edges() {
        let mut c = Compositor::new();
        let mut scene = Scene::default();
        scene.set_rect(ElementId::Slide, Rect::new(80.9, 150.0, 1200.4, 675.0));
        let frame = render(
            &mut c,
            &scene,
            &flat_config(),
            &SlideSource::new(),
            None,
            &mut Transition::new(),
            true,
        );
        let bg = Rgba8::opaque(0xfd, 0xf5, 0xf2).to_premul();
        // Mid-height, far from corner rounding: content starts at x=80.
        assert_eq!(pixel(&frame, 79, 487), bg);
        assert_eq!(pixel(&frame, 80, 487), SLIDE_PLACEHOLDER_FILL.to_premul());
    }

    #[test]
    fn rounded_corners_keep_background_visible() {
        let mut c = Compositor::new();
        let frame = render(
            &mut c,
            &Scene::default(),
            &flat_config(),
            &SlideSource::new(),
            None,
            &mut Transition::new(),
            true,
        );
        // Slide corner pixel (80, 150) lies outside the radius-35 arc.
        assert_eq!(
            pixel(&frame, 80, 150),
            Rgba8::opaque(0xfd, 0xf5, 0xf2).to_premul()
        );
    }

    #[test]
    fn loaded_slide_page_is_stretched_into_its_rect() {
        let mut c = Compositor::new();
        let mut slide = SlideSource::new();
        let mut tr = Transition::new();
        slide.load(Box::new(SolidDeck {
            pages: vec![[255, 0, 0, 255]],
        }));
        slide.sync(&mut tr, 0, Instant::now());

        let frame = render(
            &mut c,
            &Scene::default(),
            &flat_config(),
            &slide,
            None,
            &mut tr,
            true,
        );
        assert_eq!(pixel(&frame, 680, 487), [255, 0, 0, 255]);
    }

    #[test]
    fn camera_cover_crop_samples_source_center() {
        let mut c = Compositor::new();
        // 900x450 source, left half green, right half blue. The 450x450
        // destination crops the centered 450x450 region, so the destination
        // left half shows green and the right half blue.
        let mut data = vec![0u8; 900 * 450 * 4];
        for y in 0..450usize {
            for x in 0..900usize {
                let i = (y * 900 + x) * 4;
                let color: [u8; 4] = if x < 450 { [0, 255, 0, 255] } else { [0, 0, 255, 255] };
                data[i..i + 4].copy_from_slice(&color);
            }
        }
        let camera = CameraFrame {
            bitmap: Bitmap::new(900, 450, data).unwrap(),
            ready_state: crate::camera::ReadyState::EnoughData,
        };

        let frame = render(
            &mut c,
            &Scene::default(),
            &flat_config(),
            &SlideSource::new(),
            Some(&camera),
            &mut Transition::new(),
            true,
        );
        // Camera rect 1350..1800 x 300..750.
        assert_eq!(pixel(&frame, 1400, 525), [0, 255, 0, 255]);
        assert_eq!(pixel(&frame, 1750, 525), [0, 0, 255, 255]);
    }

    #[test]
    fn bar_gradient_spans_configured_colors() {
        let mut c = Compositor::new();
        let mut cfg = flat_config();
        cfg.title = "On Air".to_string();
        let frame = render(
            &mut c,
            &Scene::default(),
            &cfg,
            &SlideSource::new(),
            None,
            &mut Transition::new(),
            true,
        );
        assert_eq!(pixel(&frame, 0, 1000), cfg.bar_color_start.to_premul());
        assert_eq!(pixel(&frame, 1919, 1000), cfg.bar_color_end.to_premul());
    }

    #[test]
    fn no_bar_without_title_or_subtitle() {
        let mut c = Compositor::new();
        let frame = render(
            &mut c,
            &Scene::default(),
            &flat_config(),
            &SlideSource::new(),
            None,
            &mut Transition::new(),
            true,
        );
        assert_eq!(
            pixel(&frame, 10, 1000),
            Rgba8::opaque(0xfd, 0xf5, 0xf2).to_premul()
        );
    }

    #[test]
    fn selection_handle_is_drawn_outside_capture() {
        let mut c = Compositor::new();
        let frame = c
            .render_frame(
                &FrameInputs {
                    scene: &Scene::default(),
                    config: &flat_config(),
                    slide: &SlideSource::new(),
                    camera: None,
                    selected: Some(ElementId::Slide),
                    capturing: false,
                },
                &mut Transition::new(),
                Instant::now(),
            )
            .unwrap();
        // Handle circle centered on the slide's bottom-right corner (1280, 825).
        assert_eq!(pixel(&frame, 1280, 825), ACCENT.to_premul());
    }

    #[test]
    fn gizmos_are_hidden_while_capturing() {
        let mut c = Compositor::new();
        let frame = c
            .render_frame(
                &FrameInputs {
                    scene: &Scene::default(),
                    config: &flat_config(),
                    slide: &SlideSource::new(),
                    camera: None,
                    selected: Some(ElementId::Slide),
                    capturing: true,
                },
                &mut Transition::new(),
                Instant::now(),
            )
            .unwrap();
        assert_ne!(pixel(&frame, 1280, 825), ACCENT.to_premul());
    }

    #[test]
    fn crossfade_midpoint_blends_both_pages() {
        let mut c = Compositor::new();
        let mut slide = SlideSource::new();
        let mut tr = Transition::new();
        slide.load(Box::new(SolidDeck {
            pages: vec![[255, 0, 0, 255], [0, 0, 255, 255]],
        }));
        let t0 = Instant::now();
        slide.sync(&mut tr, 800, t0);
        slide.next_page();
        slide.sync(&mut tr, 800, t0);
        assert!(tr.is_running());

        let frame = c
            .render_frame(
                &FrameInputs {
                    scene: &Scene::default(),
                    config: &flat_config(),
                    slide: &slide,
                    camera: None,
                    selected: None,
                    capturing: true,
                },
                &mut tr,
                t0 + std::time::Duration::from_millis(400),
            )
            .unwrap();

        // Mid-fade: neither pure red nor pure blue, fully opaque.
        let px = pixel(&frame, 680, 487);
        assert_eq!(px[3], 255);
        assert!(px[0] > 30 && px[0] < 225, "red channel mid-blend: {px:?}");
        assert!(px[2] > 30 && px[2] < 225, "blue channel mid-blend: {px:?}");
    }
}
