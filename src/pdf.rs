//! PDF page rasterization through the poppler command-line tools.
//!
//! Pages are rasterized one at a time with `pdftoppm` and decoded from PNG;
//! the page count comes from `pdfinfo`. Both binaries must be on `PATH`.

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    core::Bitmap,
    error::{StudioError, StudioResult},
    slide::PageRasterizer,
};

/// Raster width for slide pages. Matches the slide region of the canvas so a
/// typical 16:9 deck needs no upscaling when composited.
const PAGE_RASTER_WIDTH: u32 = 1200;

pub fn are_poppler_tools_on_path() -> bool {
    ["pdfinfo", "pdftoppm"].iter().all(|bin| {
        Command::new(bin)
            .arg("-v")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

/// A PDF file on disk, opened by validating its header and querying the page
/// count up front so later failures are per-page only.
#[derive(Debug)]
pub struct PdfDocument {
    path: PathBuf,
    page_count: u32,
}

impl PdfDocument {
    pub fn open(path: impl AsRef<Path>) -> StudioResult<Self> {
        let path = path.as_ref().to_path_buf();

        let mut header = [0u8; 5];
        {
            use std::io::Read;
            let mut f = std::fs::File::open(&path)
                .map_err(|e| StudioError::raster(format!("cannot open {}: {e}", path.display())))?;
            f.read_exact(&mut header).map_err(|e| {
                StudioError::raster(format!("cannot read {}: {e}", path.display()))
            })?;
        }
        if &header != b"%PDF-" {
            return Err(StudioError::validation(format!(
                "{} is not a PDF file",
                path.display()
            )));
        }

        let page_count = query_page_count(&path)?;
        if page_count == 0 {
            return Err(StudioError::raster(format!(
                "{} has no pages",
                path.display()
            )));
        }

        Ok(Self { path, page_count })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageRasterizer for PdfDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn rasterize(&self, page: u32) -> StudioResult<Bitmap> {
        if page == 0 || page > self.page_count {
            return Err(StudioError::validation(format!(
                "page {page} out of range 1..={}",
                self.page_count
            )));
        }

        // -singlefile writes the PNG to stdout instead of numbered files.
        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-singlefile")
            .args(["-f", &page.to_string(), "-l", &page.to_string()])
            .args(["-scale-to-x", &PAGE_RASTER_WIDTH.to_string()])
            .args(["-scale-to-y", "-1"])
            .arg(&self.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| StudioError::raster(format!("failed to run pdftoppm: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StudioError::raster(format!(
                "pdftoppm exited with status {} on page {page}: {}",
                output.status,
                stderr.trim()
            )));
        }

        decode_png_to_bitmap(&output.stdout)
    }
}

fn query_page_count(path: &Path) -> StudioResult<u32> {
    let output = Command::new("pdfinfo")
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| StudioError::raster(format!("failed to run pdfinfo: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(StudioError::raster(format!(
            "pdfinfo exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_page_count(&stdout).ok_or_else(|| {
        StudioError::raster(format!(
            "pdfinfo output for {} has no page count",
            path.display()
        ))
    })
}

fn parse_page_count(pdfinfo_stdout: &str) -> Option<u32> {
    pdfinfo_stdout.lines().find_map(|line| {
        let rest = line.strip_prefix("Pages:")?;
        rest.trim().parse().ok()
    })
}

fn decode_png_to_bitmap(png: &[u8]) -> StudioResult<Bitmap> {
    let decoded = image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .map_err(|e| StudioError::raster(format!("failed to decode rasterized page: {e}")))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a != 255 {
            px[0] = crate::composite_cpu::mul_div255(u16::from(px[0]), a);
            px[1] = crate::composite_cpu::mul_div255(u16::from(px[1]), a);
            px[2] = crate::composite_cpu::mul_div255(u16::from(px[2]), a);
        }
    }

    Bitmap::new(width, height, data)
}
