//! Per-pixel distance comparator.
//!
//! Two pixels are the same when every channel matches, when both are fully
//! transparent, or when the mean absolute channel delta is within `tolerance`.
//! The default tolerance (255 of 65535) absorbs lossy re-encoding noise.

use image::Rgba;

use super::{DiffStats, PixelBuffer, common_bounds};

/// Marker written at differing coordinates in the highlight render.
const MARKER: Rgba<u16> = Rgba([65535, 0, 0, 65535]);

/// Written everywhere else.
const CLEAR: Rgba<u16> = Rgba([0, 0, 0, 0]);

/// Mean absolute channel delta over R, G, B, A.
fn mean_delta(a: &Rgba<u16>, b: &Rgba<u16>) -> u16 {
    let sum: u32 = a
        .0
        .iter()
        .zip(b.0.iter())
        .map(|(&x, &y)| u32::from(x.abs_diff(y)))
        .sum();
    // Four deltas of at most 65535 average back into u16 range.
    (sum / 4) as u16
}

/// Classify one pixel pair.
pub fn same_pixel(a: &Rgba<u16>, b: &Rgba<u16>, tolerance: u16) -> bool {
    if a[3] == 0 && b[3] == 0 {
        return true;
    }
    a == b || mean_delta(a, b) <= tolerance
}

fn walk(
    left: &PixelBuffer,
    right: &PixelBuffer,
    tolerance: u16,
    mut on_pixel: impl FnMut(u32, u32, bool),
) -> DiffStats {
    let (w, h) = common_bounds(left, right);
    let mut stats = DiffStats {
        num_pixels: u64::from(w) * u64::from(h),
        diff_pixels: 0,
        exact_same: true,
    };
    for y in 0..h {
        for x in 0..w {
            let same = same_pixel(left.get_pixel(x, y), right.get_pixel(x, y), tolerance);
            if !same {
                stats.exact_same = false;
                stats.diff_pixels += 1;
            }
            on_pixel(x, y, same);
        }
    }
    stats
}

pub fn compare(left: &PixelBuffer, right: &PixelBuffer, tolerance: u16) -> DiffStats {
    walk(left, right, tolerance, |_, _, _| {})
}

/// Compare and render an opaque red marker at every differing pixel on a
/// transparent canvas the size of `left`.
pub fn compare_highlight(
    left: &PixelBuffer,
    right: &PixelBuffer,
    tolerance: u16,
) -> (DiffStats, PixelBuffer) {
    let mut out = PixelBuffer::from_pixel(left.width(), left.height(), CLEAR);
    let stats = walk(left, right, tolerance, |x, y, same| {
        if !same {
            out.put_pixel(x, y, MARKER);
        }
    });
    (stats, out)
}
