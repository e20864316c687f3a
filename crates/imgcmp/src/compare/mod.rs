pub mod distance;
pub mod kernel;

use image::{ImageBuffer, Rgba};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decoded image with 16 bits per RGBA channel.
pub type PixelBuffer = ImageBuffer<Rgba<u16>, Vec<u16>>;

/// Default per-pixel tolerance: mean channel delta, in 16-bit units.
pub const DEFAULT_TOLERANCE: u16 = 255;

/// Default kernel size K. Blocks are (K+1)x(K+1).
pub const DEFAULT_KERNEL_SIZE: u32 = 3;

/// Largest accepted kernel size.
pub const MAX_KERNEL_SIZE: u32 = 255;

/// Default threshold for averaged block deltas (8-bit compressed units).
pub const DEFAULT_KERNEL_THRESHOLD: u32 = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    #[error("dimension mismatch: {left_w}x{left_h} vs {right_w}x{right_h}")]
    DimensionMismatch {
        left_w: u32,
        left_h: u32,
        right_w: u32,
        right_h: u32,
    },
}

/// Summary of one image-pair comparison.
///
/// Wire names match the report format consumed by existing tooling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    #[serde(rename = "numpixels")]
    pub num_pixels: u64,
    #[serde(rename = "diffpixels")]
    pub diff_pixels: u64,
    #[serde(rename = "exactsame")]
    pub exact_same: bool,
}

impl DiffStats {
    /// Share of differing pixels, 0.0-100.0.
    pub fn diff_percent(&self) -> f64 {
        if self.num_pixels == 0 {
            0.0
        } else {
            self.diff_pixels as f64 / self.num_pixels as f64 * 100.0
        }
    }
}

/// Comparison policy, chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Per-pixel mean channel distance (see [`distance`]).
    Distance { tolerance: u16, highlight: bool },
    /// Block-averaged comparison (see [`kernel`]).
    Kernel { size: u32, threshold: u32 },
}

impl Default for Strategy {
    fn default() -> Self {
        Self::Distance {
            tolerance: DEFAULT_TOLERANCE,
            highlight: false,
        }
    }
}

pub struct Comparison {
    pub stats: DiffStats,
    /// Rendered only by `Strategy::Distance { highlight: true, .. }`.
    pub highlight: Option<PixelBuffer>,
}

/// Reject pairs that cannot be compared pixel for pixel.
pub fn check_dimensions(left: &PixelBuffer, right: &PixelBuffer) -> Result<(), DiffError> {
    if left.dimensions() != right.dimensions() {
        return Err(DiffError::DimensionMismatch {
            left_w: left.width(),
            left_h: left.height(),
            right_w: right.width(),
            right_h: right.height(),
        });
    }
    Ok(())
}

/// Compare two same-sized buffers.
///
/// Callers validate dimensions with [`check_dimensions`] first; for mismatched
/// inputs the result is bounded by the smaller buffer and carries no meaning.
///
/// Runs synchronously. Call via `spawn_blocking` from async code.
pub fn compare(left: &PixelBuffer, right: &PixelBuffer, strategy: &Strategy) -> Comparison {
    match *strategy {
        Strategy::Distance {
            tolerance,
            highlight: true,
        } => {
            let (stats, image) = distance::compare_highlight(left, right, tolerance);
            Comparison {
                stats,
                highlight: Some(image),
            }
        }
        Strategy::Distance {
            tolerance,
            highlight: false,
        } => Comparison {
            stats: distance::compare(left, right, tolerance),
            highlight: None,
        },
        Strategy::Kernel { size, threshold } => Comparison {
            stats: kernel::compare(left, right, size, threshold),
            highlight: None,
        },
    }
}

/// Width and height shared by both buffers.
fn common_bounds(left: &PixelBuffer, right: &PixelBuffer) -> (u32, u32) {
    (
        left.width().min(right.width()),
        left.height().min(right.height()),
    )
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn identical_red_images_match() {
        let a = solid(10, 10, RED);
        let b = solid(10, 10, RED);
        let r = compare(&a, &b, &Strategy::default());
        assert_eq!(
            r.stats,
            DiffStats {
                num_pixels: 100,
                diff_pixels: 0,
                exact_same: true,
            }
        );
        assert!(r.highlight.is_none());
    }

    #[test]
    fn red_vs_blue_differs_everywhere() {
        let a = solid(10, 10, RED);
        let b = solid(10, 10, BLUE);
        let r = compare(&a, &b, &Strategy::default());
        assert_eq!(r.stats.diff_pixels, 100);
        assert!(!r.stats.exact_same);
        assert_eq!(r.stats.diff_percent(), 100.0);
    }

    #[test]
    fn highlight_only_when_requested() {
        let a = solid(4, 4, RED);
        let b = solid(4, 4, BLUE);
        let with = compare(
            &a,
            &b,
            &Strategy::Distance {
                tolerance: DEFAULT_TOLERANCE,
                highlight: true,
            },
        );
        assert_eq!(with.highlight.map(|h| h.dimensions()), Some((4, 4)));

        let kernel = compare(
            &a,
            &b,
            &Strategy::Kernel {
                size: DEFAULT_KERNEL_SIZE,
                threshold: DEFAULT_KERNEL_THRESHOLD,
            },
        );
        assert!(kernel.highlight.is_none());
    }

    #[test]
    fn dimension_mismatch_detected_before_comparing() {
        let a = solid(10, 10, RED);
        let b = solid(12, 12, RED);
        assert_eq!(
            check_dimensions(&a, &b),
            Err(DiffError::DimensionMismatch {
                left_w: 10,
                left_h: 10,
                right_w: 12,
                right_h: 12,
            })
        );
        assert_eq!(
            check_dimensions(&a, &b).unwrap_err().to_string(),
            "dimension mismatch: 10x10 vs 12x12"
        );
        assert!(check_dimensions(&a, &a).is_ok());
    }

    #[test]
    fn diff_percent_of_empty_image_is_zero() {
        assert_eq!(DiffStats::default().diff_percent(), 0.0);
    }

    #[test]
    fn stats_use_report_field_names() {
        let stats = DiffStats {
            num_pixels: 4,
            diff_pixels: 1,
            exact_same: false,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"numpixels": 4, "diffpixels": 1, "exactsame": false})
        );
    }
}
