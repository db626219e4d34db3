#![forbid(unsafe_code)]

pub mod blur_cpu;
pub mod camera;
pub mod capture;
pub mod composite_cpu;
pub mod compositor;
pub mod core;
pub mod device;
pub mod error;
pub mod interaction;
pub mod mask_cpu;
pub mod pdf;
pub mod scene;
pub mod script;
pub mod slide;
pub mod studio;
pub mod text;
pub mod transition;

pub use core::{Bitmap, CANVAS_HEIGHT, CANVAS_WIDTH, Rect, Rgba8};
pub use error::{StudioError, StudioResult};
pub use scene::{Element, ElementId, Scene, VisualConfig};
pub use studio::{CaptureStatus, PointerButton, Studio};
