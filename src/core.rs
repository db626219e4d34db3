use crate::error::{StudioError, StudioResult};

/// Logical canvas size. Display scaling is cosmetic; every coordinate in the
/// system is expressed in these units.
pub const CANVAS_WIDTH: u32 = 1920;
pub const CANVAS_HEIGHT: u32 = 1080;

/// Height of the lower-third overlay band, anchored to the bottom edge.
pub const BAR_HEIGHT: u32 = 160;

/// Resize floor for both element dimensions.
pub const MIN_ELEMENT_SIZE: f64 = 100.0;

/// Radius of the circular resize hot-zone around an element's bottom-right
/// corner, in canvas units.
pub const RESIZE_HANDLE_RADIUS: f64 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Component-wise floor. Drawing always goes through this to avoid
    /// sub-pixel seams between adjacent fills.
    pub fn floored(self) -> IRect {
        IRect {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
            w: self.w.floor() as i32,
            h: self.h.floor() as i32,
        }
    }

    pub fn contains(self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }

    pub fn bottom_right(self) -> (f64, f64) {
        (self.x + self.w, self.y + self.h)
    }
}

/// Integer rect produced by [`Rect::floored`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Straight (non-premultiplied) RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(s: &str) -> StudioResult<Self> {
        let hex = s.trim().trim_start_matches('#');
        let bytes = match hex.len() {
            6 | 8 => u32::from_str_radix(hex, 16)
                .map_err(|_| StudioError::validation(format!("invalid hex color '{s}'")))?,
            _ => {
                return Err(StudioError::validation(format!(
                    "hex color '{s}' must have 6 or 8 digits"
                )));
            }
        };
        Ok(if hex.len() == 6 {
            Self {
                r: (bytes >> 16) as u8,
                g: (bytes >> 8) as u8,
                b: bytes as u8,
                a: 255,
            }
        } else {
            Self {
                r: (bytes >> 24) as u8,
                g: (bytes >> 16) as u8,
                b: (bytes >> 8) as u8,
                a: bytes as u8,
            }
        })
    }

    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            (((u16::from(c) * u16::from(a)) + 127) / 255) as u8
        }
        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

/// Premultiplied RGBA8 pixel buffer. The single pixel container shared by
/// slide pages, camera frames, and composited output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> StudioResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| StudioError::validation("bitmap size overflow"))?;
        if data.len() != expected {
            return Err(StudioError::validation(format!(
                "bitmap data length {} does not match {}x{}x4",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: u32, height: u32, premul_rgba: [u8; 4]) -> Self {
        let mut data = vec![0u8; (width as usize) * (height as usize) * 4];
        for px in data.chunks_exact_mut(4) {
            px.copy_from_slice(&premul_rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn to_image(&self) -> StudioResult<vello_cpu::Image> {
        let pixmap = premul_bytes_to_pixmap(&self.data, self.width, self.height)?;
        Ok(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        })
    }
}

pub(crate) fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> StudioResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StudioError::raster("bitmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StudioError::raster("bitmap height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(StudioError::raster("bitmap byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}
