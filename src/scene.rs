use std::path::PathBuf;

use crate::{
    core::{BAR_HEIGHT, CANVAS_HEIGHT, CANVAS_WIDTH, Rect, Rgba8},
    error::{StudioError, StudioResult},
};

/// The two element kinds. The tag is fixed for the lifetime of the scene;
/// only geometry and stacking are mutable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementId {
    Slide,
    Camera,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub rect: Rect,
    pub z_index: i32,
}

/// The scene geometry model: exactly two positioned elements.
///
/// Storage order is fixed at `[slide, camera]`. Paint order is ascending
/// `z_index`; pointer hit-testing scans storage in reverse (camera first),
/// independent of `z_index`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    elements: [Element; 2],
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            elements: [
                Element {
                    id: ElementId::Slide,
                    rect: Rect::new(80.0, 150.0, 1200.0, 675.0),
                    z_index: 1,
                },
                Element {
                    id: ElementId::Camera,
                    rect: Rect::new(1350.0, 300.0, 450.0, 450.0),
                    z_index: 2,
                },
            ],
        }
    }
}

impl Scene {
    pub fn elements(&self) -> &[Element; 2] {
        &self.elements
    }

    pub fn element(&self, id: ElementId) -> &Element {
        self.elements
            .iter()
            .find(|e| e.id == id)
            .unwrap_or(&self.elements[0])
    }

    pub fn element_mut(&mut self, id: ElementId) -> &mut Element {
        let idx = if self.elements[0].id == id { 0 } else { 1 };
        &mut self.elements[idx]
    }

    pub fn set_rect(&mut self, id: ElementId, rect: Rect) {
        self.element_mut(id).rect = rect;
    }

    pub fn set_z_index(&mut self, id: ElementId, z: i32) {
        self.element_mut(id).z_index = z;
    }

    /// Elements in paint order (ascending z, storage order breaking ties).
    pub fn ordered_by_z(&self) -> [&Element; 2] {
        let [a, b] = &self.elements;
        if b.z_index < a.z_index { [b, a] } else { [a, b] }
    }

    /// Recompute both element positions from their current widths: equal
    /// thirds of the leftover horizontal space, vertically centered in the
    /// area above the overlay bar. Pure recompute, so applying it twice in a
    /// row yields the same geometry.
    pub fn auto_align(&mut self) {
        let slide_w = self.element(ElementId::Slide).rect.w;
        let camera_w = self.element(ElementId::Camera).rect.w;
        let gap = (f64::from(CANVAS_WIDTH) - (slide_w + camera_w)) / 3.0;

        let usable_h = f64::from(CANVAS_HEIGHT - BAR_HEIGHT);

        let slide = self.element_mut(ElementId::Slide);
        slide.rect.x = gap;
        slide.rect.y = (usable_h - slide.rect.h) / 2.0;

        let camera = self.element_mut(ElementId::Camera);
        camera.rect.x = gap * 2.0 + slide_w;
        camera.rect.y = (usable_h - camera.rect.h) / 2.0;
    }
}

/// Global visual configuration. Plain data: setters are field assignments,
/// and the compositor observes changes on its next scheduled frame.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub bg_color: Rgba8,
    pub slide_roundness: f64,
    pub camera_roundness: f64,
    /// 0..=100; 0 disables the element drop shadow entirely.
    pub shadow_intensity: u8,

    pub bar_color_start: Rgba8,
    pub bar_color_end: Rgba8,

    pub title: String,
    pub title_size: f64,
    pub title_color: Rgba8,
    pub title_font: Option<PathBuf>,

    pub subtitle: String,
    pub subtitle_size: f64,
    pub subtitle_color: Rgba8,
    pub subtitle_font: Option<PathBuf>,

    /// Font used for the SLIDE/CAM placeholder labels. Labels are skipped
    /// when unset or unloadable.
    pub ui_font: Option<PathBuf>,

    /// Slide crossfade duration in milliseconds; 0 disables transitions.
    pub crossfade_ms: u64,

    pub prompter_font_size: f64,
    /// Raw wheel delta multiplier for the teleprompter scroll.
    pub scroll_sensitivity: f64,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            bg_color: Rgba8::opaque(0xfd, 0xf5, 0xf2),
            slide_roundness: 35.0,
            camera_roundness: 40.0,
            shadow_intensity: 60,
            bar_color_start: Rgba8::opaque(0xf1, 0x9b, 0x7c),
            bar_color_end: Rgba8::opaque(0xd9, 0x6d, 0x4e),
            title: String::new(),
            title_size: 42.0,
            title_color: Rgba8::opaque(0x2c, 0x0e, 0x04),
            title_font: None,
            subtitle: String::new(),
            subtitle_size: 24.0,
            subtitle_color: Rgba8::opaque(0xff, 0xff, 0xff),
            subtitle_font: None,
            ui_font: None,
            crossfade_ms: 800,
            prompter_font_size: 32.0,
            scroll_sensitivity: 1.2,
        }
    }
}

impl VisualConfig {
    pub fn roundness_for(&self, id: ElementId) -> f64 {
        match id {
            ElementId::Slide => self.slide_roundness,
            ElementId::Camera => self.camera_roundness,
        }
    }

    pub fn validate(&self) -> StudioResult<()> {
        if self.shadow_intensity > 100 {
            return Err(StudioError::validation("shadow_intensity must be <= 100"));
        }
        if !self.slide_roundness.is_finite() || self.slide_roundness < 0.0 {
            return Err(StudioError::validation("slide_roundness must be >= 0"));
        }
        if !self.camera_roundness.is_finite() || self.camera_roundness < 0.0 {
            return Err(StudioError::validation("camera_roundness must be >= 0"));
        }
        if !self.title_size.is_finite() || self.title_size <= 0.0 {
            return Err(StudioError::validation("title_size must be > 0"));
        }
        if !self.subtitle_size.is_finite() || self.subtitle_size <= 0.0 {
            return Err(StudioError::validation("subtitle_size must be > 0"));
        }
        Ok(())
    }

    pub fn bar_visible(&self) -> bool {
        !self.title.is_empty() || !self.subtitle.is_empty()
    }
}
