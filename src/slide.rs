use std::time::Instant;

use crate::{core::Bitmap, error::StudioResult, transition::Transition};

/// External page-rasterizer contract. Pages are 1-based.
pub trait PageRasterizer {
    fn page_count(&self) -> u32;
    fn rasterize(&self, page: u32) -> StudioResult<Bitmap>;
}

/// Owns the current slide bitmap and drives page changes, including the
/// crossfade trigger. The transition snapshot buffer lives in
/// [`Transition`]; this type decides when it gets overwritten.
#[derive(Default)]
pub struct SlideSource {
    rasterizer: Option<Box<dyn PageRasterizer>>,
    current: Option<Bitmap>,
    page: u32,
    last_rendered: Option<u32>,
}

impl SlideSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly decoded document and reset to page 1. The old
    /// bitmap is dropped; the next sync renders without a transition.
    pub fn load(&mut self, rasterizer: Box<dyn PageRasterizer>) {
        self.rasterizer = Some(rasterizer);
        self.current = None;
        self.page = 1;
        self.last_rendered = None;
    }

    pub fn has_document(&self) -> bool {
        self.rasterizer.is_some()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_count(&self) -> u32 {
        self.rasterizer.as_ref().map_or(0, |r| r.page_count())
    }

    pub fn current(&self) -> Option<&Bitmap> {
        self.current.as_ref()
    }

    pub fn set_page(&mut self, page: u32) {
        let count = self.page_count();
        if count == 0 {
            return;
        }
        self.page = page.clamp(1, count);
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page.saturating_sub(1).max(1));
    }

    /// Bring the rendered bitmap in line with the requested page. Called
    /// once per frame before compositing; a page change is therefore
    /// visible no later than the next scheduled frame.
    ///
    /// A crossfade starts only when this is not the very first rendered
    /// page and `crossfade_ms > 0`; the snapshot taken is the bitmap
    /// currently on screen. Rasterization failure keeps the previous
    /// bitmap and starts no transition, but the page is not retried.
    pub fn sync(&mut self, transition: &mut Transition, crossfade_ms: u64, now: Instant) {
        let Some(rasterizer) = self.rasterizer.as_ref() else {
            return;
        };
        if self.last_rendered == Some(self.page) {
            return;
        }

        let page = self.page;
        let rendered = match rasterizer.rasterize(page) {
            Ok(bitmap) => bitmap,
            Err(err) => {
                tracing::warn!(page, %err, "slide page rasterization failed");
                self.last_rendered = Some(page);
                return;
            }
        };

        if self.last_rendered.is_some()
            && crossfade_ms > 0
            && let Some(prev) = self.current.take()
        {
            transition.begin(prev, now);
        }
        self.current = Some(rendered);
        self.last_rendered = Some(page);
    }
}
