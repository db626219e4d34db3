//! Ties the whole stage together: scene editing, slide paging, the render
//! tick, and the capture session lifecycle.

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use crate::{
    camera::CameraFrame,
    capture::{CaptureConfig, CaptureSession, EncoderSupport},
    compositor::{Compositor, FrameInputs},
    core::Bitmap,
    error::{StudioError, StudioResult},
    interaction::{InteractionController, Viewport},
    pdf::PdfDocument,
    scene::{ElementId, Scene, VisualConfig},
    script::ScrollState,
    slide::{PageRasterizer, SlideSource},
    transition::Transition,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureStatus {
    Idle,
    Recording,
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// The studio session. Pointer events and config edits mutate state
/// synchronously; `tick` reads it all and produces the next frame. During
/// capture the pointer repurposes to slide paging: primary advances,
/// secondary retreats.
pub struct Studio {
    pub scene: Scene,
    pub config: VisualConfig,
    slide: SlideSource,
    transition: Transition,
    interaction: InteractionController,
    scroll: ScrollState,
    compositor: Compositor,
    capture: Option<CaptureSession>,
    status: CaptureStatus,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new()
    }
}

impl Studio {
    pub fn new() -> Self {
        Self {
            scene: Scene::default(),
            config: VisualConfig::default(),
            slide: SlideSource::new(),
            transition: Transition::new(),
            interaction: InteractionController::new(),
            scroll: ScrollState::default(),
            compositor: Compositor::new(),
            capture: None,
            status: CaptureStatus::Idle,
        }
    }

    pub fn status(&self) -> CaptureStatus {
        self.status
    }

    pub fn is_capturing(&self) -> bool {
        self.status != CaptureStatus::Idle
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.interaction.selected()
    }

    pub fn slide(&self) -> &SlideSource {
        &self.slide
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll.offset()
    }

    /// Open a PDF from disk and make it the slide deck. Non-PDF files are
    /// rejected before any rasterization happens.
    pub fn load_pdf(&mut self, path: impl AsRef<Path>) -> StudioResult<()> {
        let doc = PdfDocument::open(path)?;
        self.slide.load(Box::new(doc));
        Ok(())
    }

    pub fn load_deck(&mut self, rasterizer: Box<dyn PageRasterizer>) {
        self.slide.load(rasterizer);
    }

    pub fn set_page(&mut self, page: u32) {
        self.slide.set_page(page);
    }

    pub fn pointer_down(&mut self, viewport: &Viewport, px: f64, py: f64, button: PointerButton) {
        if self.is_capturing() {
            match button {
                PointerButton::Primary => self.slide.next_page(),
                PointerButton::Secondary => self.slide.prev_page(),
            }
            return;
        }
        self.interaction
            .pointer_down(&self.scene, viewport, px, py, false);
    }

    pub fn pointer_move(&mut self, viewport: &Viewport, px: f64, py: f64) {
        let capturing = self.is_capturing();
        self.interaction
            .pointer_move(&mut self.scene, viewport, px, py, capturing);
    }

    pub fn pointer_up(&mut self) {
        self.interaction.pointer_up();
    }

    pub fn wheel(&mut self, delta: f64) {
        let capturing = self.is_capturing();
        self.scroll
            .wheel(delta, self.config.scroll_sensitivity, capturing);
    }

    pub fn start_capture(
        &mut self,
        cfg: &CaptureConfig,
        support: &EncoderSupport,
    ) -> StudioResult<()> {
        if self.capture.is_some() {
            return Err(StudioError::capture("a capture is already running"));
        }
        self.capture = Some(CaptureSession::start(cfg, support)?);
        self.status = CaptureStatus::Recording;
        self.scroll.reset();
        Ok(())
    }

    /// Pausing stops feeding frames to the encoder; rendering never pauses.
    pub fn pause_capture(&mut self) {
        if self.status == CaptureStatus::Recording {
            self.status = CaptureStatus::Paused;
        }
    }

    pub fn resume_capture(&mut self) {
        if self.status == CaptureStatus::Paused {
            self.status = CaptureStatus::Recording;
        }
    }

    /// Finalize the recording and return the published file path.
    pub fn stop_capture(&mut self) -> StudioResult<PathBuf> {
        let session = self
            .capture
            .take()
            .ok_or_else(|| StudioError::capture("no capture is running"))?;
        self.status = CaptureStatus::Idle;
        session.finish()
    }

    /// One frame: pick up any pending page change, composite, and feed the
    /// encoder when recording. A failing encoder aborts the take but never
    /// the render loop.
    pub fn tick(&mut self, now: Instant, camera: Option<&CameraFrame>) -> StudioResult<Bitmap> {
        self.slide
            .sync(&mut self.transition, self.config.crossfade_ms, now);

        let frame = self.compositor.render_frame(
            &FrameInputs {
                scene: &self.scene,
                config: &self.config,
                slide: &self.slide,
                camera,
                selected: self.interaction.selected(),
                capturing: self.is_capturing(),
            },
            &mut self.transition,
            now,
        )?;

        if self.status == CaptureStatus::Recording
            && let Some(session) = self.capture.as_mut()
            && let Err(err) = session.push_frame(&frame)
        {
            tracing::warn!(%err, "encoder rejected frame, aborting capture");
            if let Some(session) = self.capture.take() {
                session.abort();
            }
            self.status = CaptureStatus::Idle;
        }

        Ok(frame)
    }
}
