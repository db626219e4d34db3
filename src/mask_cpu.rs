use crate::{
    core::IRect,
    error::{StudioError, StudioResult},
};

/// Analytic rounded-rectangle coverage over premultiplied rgba8 buffers.
///
/// Straight edges land on integer pixel boundaries (rects are floored before
/// drawing), so only the corner arcs need anti-aliasing: coverage falls off
/// linearly over one pixel of signed distance to the arc.

/// Fill `rect` with `premul` scaled by rounded coverage. Pixels outside the
/// shape are left untouched.
pub fn fill_rounded_rect(
    buf: &mut [u8],
    buf_w: u32,
    buf_h: u32,
    rect: IRect,
    radius: f64,
    premul: [u8; 4],
) -> StudioResult<()> {
    check_buf(buf, buf_w, buf_h)?;
    for_each_covered(buf_w, buf_h, rect, radius, |idx, cov| {
        let px = &mut buf[idx..idx + 4];
        for c in 0..4 {
            px[c] = ((f32::from(premul[c]) * cov).round() as u32).min(255) as u8;
        }
    });
    Ok(())
}

/// Multiply every channel by rounded coverage, zeroing everything outside
/// `rect`. This is the pixel-level equivalent of a rounded clip.
pub fn mask_rounded_rect(
    buf: &mut [u8],
    buf_w: u32,
    buf_h: u32,
    rect: IRect,
    radius: f64,
) -> StudioResult<()> {
    check_buf(buf, buf_w, buf_h)?;

    let w = buf_w as i32;
    let h = buf_h as i32;
    let x0 = rect.x.clamp(0, w);
    let y0 = rect.y.clamp(0, h);
    let x1 = (rect.x + rect.w).clamp(0, w);
    let y1 = (rect.y + rect.h).clamp(0, h);

    // Zero rows above/below, then the left/right margins of interior rows.
    let row_bytes = (buf_w as usize) * 4;
    buf[..(y0 as usize) * row_bytes].fill(0);
    buf[(y1 as usize) * row_bytes..].fill(0);
    for y in y0..y1 {
        let row = (y as usize) * row_bytes;
        buf[row..row + (x0 as usize) * 4].fill(0);
        buf[row + (x1 as usize) * 4..row + row_bytes].fill(0);
    }

    // Corner arcs: attenuate by coverage.
    let r = effective_radius(rect, radius);
    if r > 0.0 {
        let ri = r.ceil() as i32;
        for (cx, cy, sx_range, sy_range) in corner_regions(rect, r, ri) {
            for y in sy_range.0.max(y0)..sy_range.1.min(y1) {
                for x in sx_range.0.max(x0)..sx_range.1.min(x1) {
                    let cov = corner_coverage(x, y, cx, cy, r);
                    if cov >= 1.0 {
                        continue;
                    }
                    let idx = ((y as usize) * (buf_w as usize) + (x as usize)) * 4;
                    let px = &mut buf[idx..idx + 4];
                    for c in 0..4 {
                        px[c] = ((f32::from(px[c]) * cov).round() as u32).min(255) as u8;
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_buf(buf: &[u8], buf_w: u32, buf_h: u32) -> StudioResult<()> {
    if buf.len() != (buf_w as usize) * (buf_h as usize) * 4 {
        return Err(StudioError::raster(
            "mask buffer length does not match width*height*4",
        ));
    }
    Ok(())
}

fn effective_radius(rect: IRect, radius: f64) -> f64 {
    let max_r = f64::from(rect.w.min(rect.h).max(0)) / 2.0;
    radius.clamp(0.0, max_r)
}

/// Corner circle centers plus the pixel region each corner influences:
/// (cx, cy, (x0, x1), (y0, y1)).
type CornerRegion = (f64, f64, (i32, i32), (i32, i32));

fn corner_regions(rect: IRect, r: f64, ri: i32) -> [CornerRegion; 4] {
    let (l, t) = (rect.x, rect.y);
    let (rgt, bot) = (rect.x + rect.w, rect.y + rect.h);
    let rf = r;
    [
        (f64::from(l) + rf, f64::from(t) + rf, (l, l + ri), (t, t + ri)),
        (
            f64::from(rgt) - rf,
            f64::from(t) + rf,
            (rgt - ri, rgt),
            (t, t + ri),
        ),
        (
            f64::from(l) + rf,
            f64::from(bot) - rf,
            (l, l + ri),
            (bot - ri, bot),
        ),
        (
            f64::from(rgt) - rf,
            f64::from(bot) - rf,
            (rgt - ri, rgt),
            (bot - ri, bot),
        ),
    ]
}

fn corner_coverage(x: i32, y: i32, cx: f64, cy: f64, r: f64) -> f32 {
    let px = f64::from(x) + 0.5;
    let py = f64::from(y) + 0.5;
    let d = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
    ((r + 0.5 - d).clamp(0.0, 1.0)) as f32
}

fn for_each_covered(
    buf_w: u32,
    buf_h: u32,
    rect: IRect,
    radius: f64,
    mut f: impl FnMut(usize, f32),
) {
    let w = buf_w as i32;
    let h = buf_h as i32;
    let x0 = rect.x.clamp(0, w);
    let y0 = rect.y.clamp(0, h);
    let x1 = (rect.x + rect.w).clamp(0, w);
    let y1 = (rect.y + rect.h).clamp(0, h);

    let r = effective_radius(rect, radius);
    let ri = r.ceil() as i32;
    let corners = corner_regions(rect, r, ri);

    for y in y0..y1 {
        for x in x0..x1 {
            let mut cov = 1.0f32;
            if r > 0.0 {
                for &(cx, cy, xs, ys) in &corners {
                    if x >= xs.0 && x < xs.1 && y >= ys.0 && y < ys.1 {
                        cov = corner_coverage(x, y, cx, cy, r);
                        break;
                    }
                }
            }
            if cov > 0.0 {
                f(((y as usize) * (buf_w as usize) + (x as usize)) * 4, cov);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(buf: &[u8], w: u32, x: i32, y: i32) -> [u8; 4] {
        let idx = ((y as usize) * (w as usize) + (x as usize)) * 4;
        [buf[idx], buf[idx + 1], buf[idx + 2], buf[idx + 3]]
    }

    #[test]
    fn fill_covers_interior_and_skips_outside() {
        let (w, h) = (32u32, 32u32);
        let mut buf = vec![0u8; (w * h * 4) as usize];
        let rect = IRect {
            x: 4,
            y: 4,
            w: 20,
            h: 20,
        };
        fill_rounded_rect(&mut buf, w, h, rect, 6.0, [255, 0, 0, 255]).unwrap();

        assert_eq!(px(&buf, w, 14, 14), [255, 0, 0, 255]);
        assert_eq!(px(&buf, w, 0, 0), [0, 0, 0, 0]);
        // Corner pixel sits fully outside the arc.
        assert_eq!(px(&buf, w, 4, 4), [0, 0, 0, 0]);
    }

    #[test]
    fn mask_zeroes_outside_and_corners() {
        let (w, h) = (32u32, 32u32);
        let mut buf = vec![255u8; (w * h * 4) as usize];
        let rect = IRect {
            x: 8,
            y: 8,
            w: 16,
            h: 16,
        };
        mask_rounded_rect(&mut buf, w, h, rect, 5.0).unwrap();

        assert_eq!(px(&buf, w, 0, 0), [0, 0, 0, 0]);
        assert_eq!(px(&buf, w, 7, 16), [0, 0, 0, 0]);
        assert_eq!(px(&buf, w, 16, 16), [255, 255, 255, 255]);
        assert_eq!(px(&buf, w, 8, 8), [0, 0, 0, 0]);
        // Straight edge pixels keep full coverage.
        assert_eq!(px(&buf, w, 16, 8), [255, 255, 255, 255]);
    }

    #[test]
    fn zero_radius_is_a_plain_rect() {
        let (w, h) = (16u32, 16u32);
        let mut buf = vec![255u8; (w * h * 4) as usize];
        let rect = IRect {
            x: 2,
            y: 2,
            w: 12,
            h: 12,
        };
        mask_rounded_rect(&mut buf, w, h, rect, 0.0).unwrap();
        assert_eq!(px(&buf, w, 2, 2), [255, 255, 255, 255]);
        assert_eq!(px(&buf, w, 13, 13), [255, 255, 255, 255]);
        assert_eq!(px(&buf, w, 1, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn offcanvas_rect_is_clipped_safely() {
        let (w, h) = (16u32, 16u32);
        let mut buf = vec![255u8; (w * h * 4) as usize];
        let rect = IRect {
            x: -8,
            y: -8,
            w: 12,
            h: 12,
        };
        mask_rounded_rect(&mut buf, w, h, rect, 4.0).unwrap();
        assert_eq!(px(&buf, w, 1, 1), [255, 255, 255, 255]);
        assert_eq!(px(&buf, w, 4, 4), [0, 0, 0, 0]);
    }

    #[test]
    fn radius_clamps_to_half_extent() {
        let (w, h) = (16u32, 16u32);
        let mut buf = vec![0u8; (w * h * 4) as usize];
        let rect = IRect {
            x: 2,
            y: 2,
            w: 8,
            h: 8,
        };
        // Huge radius degenerates to a circle inscribed in the rect.
        fill_rounded_rect(&mut buf, w, h, rect, 100.0, [0, 0, 0, 255]).unwrap();
        assert_eq!(px(&buf, w, 6, 6), [0, 0, 0, 255]);
        assert_eq!(px(&buf, w, 2, 2), [0, 0, 0, 0]);
    }
}
