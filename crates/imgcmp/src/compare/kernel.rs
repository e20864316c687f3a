//! Block-averaged comparator.
//!
//! Every anchor `(x, y)` with `x < w - K` and `y < h - K` owns the
//! `(K+1)x(K+1)` block starting at it. Raw channel values of the block are
//! summed, averaged and compressed to 8 bits, and the two averaged tuples are
//! compared against `threshold`. Sub-pixel shifts and anti-aliasing noise
//! mostly vanish in the average; the last K rows and columns get no anchor.
//!
//! `diff_pixels` counts anchors over the threshold. `exact_same` is stricter:
//! it turns false as soon as any block sum differs at all, so a pair can
//! report zero differing pixels and still not be an exact match.

use super::{DiffStats, PixelBuffer, common_bounds};

type BlockSum = [u64; 4];

fn block_sum(img: &PixelBuffer, x: u32, y: u32, size: u32) -> BlockSum {
    let mut sum = [0u64; 4];
    for j in 0..=size {
        for i in 0..=size {
            let px = img.get_pixel(x + i, y + j);
            for (acc, &channel) in sum.iter_mut().zip(px.0.iter()) {
                *acc += u64::from(channel);
            }
        }
    }
    sum
}

/// Average over the block, then drop to 8-bit range.
fn compress(sum: BlockSum, cells: u64) -> BlockSum {
    sum.map(|s| (s / cells) >> 8)
}

fn block_delta(a: BlockSum, b: BlockSum) -> u64 {
    let total: u64 = a.iter().zip(b.iter()).map(|(&x, &y)| x.abs_diff(y)).sum();
    total >> 2
}

pub fn compare(left: &PixelBuffer, right: &PixelBuffer, size: u32, threshold: u32) -> DiffStats {
    let (w, h) = common_bounds(left, right);
    let mut stats = DiffStats {
        num_pixels: u64::from(w) * u64::from(h),
        diff_pixels: 0,
        exact_same: true,
    };
    let size = size.max(1);
    let side = u64::from(size) + 1;
    let cells = side * side;

    for y in 0..h.saturating_sub(size) {
        for x in 0..w.saturating_sub(size) {
            let raw_left = block_sum(left, x, y, size);
            let raw_right = block_sum(right, x, y, size);
            if raw_left != raw_right {
                stats.exact_same = false;
            }

            let delta = block_delta(compress(raw_left, cells), compress(raw_right, cells));
            if delta > u64::from(threshold) {
                stats.diff_pixels += 1;
            }
        }
    }

    stats
}
