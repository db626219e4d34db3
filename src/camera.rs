use crate::core::Bitmap;

/// Readiness ladder reported by a live video source. Ordered: a frame is
/// usable once the source has reached at least [`ReadyState::CurrentData`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    Nothing,
    Metadata,
    CurrentData,
    FutureData,
    EnoughData,
}

/// One live frame handed in by an external camera source. The compositor
/// only ever reads it; production of new frames happens elsewhere.
#[derive(Clone, Debug)]
pub struct CameraFrame {
    pub bitmap: Bitmap,
    pub ready_state: ReadyState,
}

impl CameraFrame {
    /// Ready means at least two readiness levels reported and a real pixel
    /// area; anything less renders as the placeholder.
    pub fn is_ready(&self) -> bool {
        self.ready_state >= ReadyState::CurrentData
            && self.bitmap.width > 0
            && self.bitmap.height > 0
    }
}

/// External live-frame producer. Returns the latest frame, if any has ever
/// arrived; acquisition failures simply keep returning `None`.
pub trait CameraSource {
    fn latest_frame(&self) -> Option<&CameraFrame>;
}

/// Centered cover-fit crop: the largest source region whose aspect ratio
/// matches the destination. Returned as (x, y, w, h) in source pixels.
pub fn cover_crop(src_w: u32, src_h: u32, dst_w: i32, dst_h: i32) -> (f64, f64, f64, f64) {
    let sw = f64::from(src_w);
    let sh = f64::from(src_h);
    let dst_ratio = f64::from(dst_w.max(1)) / f64::from(dst_h.max(1));
    let src_ratio = sw / sh;

    if src_ratio > dst_ratio {
        // Source is wider: crop width.
        let crop_w = sh * dst_ratio;
        ((sw - crop_w) / 2.0, 0.0, crop_w, sh)
    } else {
        let crop_h = sw / dst_ratio;
        (0.0, (sh - crop_h) / 2.0, sw, crop_h)
    }
}
