use std::path::Path;

use anyhow::{Context, Result, bail};
use image::ImageFormat;
use tracing::{debug, info, warn};

use super::{EXIT_DIFFERS, EXIT_OK};
use crate::compare::{self, Comparison};
use crate::config::{ComparatorKind, ResolvedRunConfig};
use crate::report::terminal;
use crate::source::{FileOrUrlSource, ImageSource};

/// `imgcmp compare`: compare one pair of images.
/// Returns exit code: 0 = same, 98 = different (including dimension mismatch).
pub async fn compare(
    config: &ResolvedRunConfig,
    left: &str,
    right: &str,
    output: Option<&Path>,
) -> Result<i32> {
    if output.is_some() && config.comparator == ComparatorKind::Kernel {
        bail!("--output needs the distance comparator; the kernel comparator renders no highlight");
    }

    let source = FileOrUrlSource::new();
    let left_img = source.load(left).await?;
    let right_img = source.load(right).await?;

    if let Err(e) = compare::check_dimensions(&left_img, &right_img) {
        warn!("image dimensions differ ({e})");
        return Ok(EXIT_DIFFERS);
    }
    debug!(
        width = left_img.width(),
        height = left_img.height(),
        "image dimensions"
    );

    let strategy = config.strategy(output.is_some());
    let Comparison { stats, highlight } = tokio::task::spawn_blocking(move || {
        compare::compare(&left_img, &right_img, &strategy)
    })
    .await
    .context("Diff task panicked")?;

    if let (Some(path), Some(rendered)) = (output, highlight) {
        rendered
            .save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "diff image written");
    }

    terminal::print_stats(&mut std::io::stdout().lock(), &stats)?;

    Ok(if stats.exact_same { EXIT_OK } else { EXIT_DIFFERS })
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::config::{BatchConfig, DiffConfig};

    fn config(comparator: ComparatorKind) -> ResolvedRunConfig {
        ResolvedRunConfig::from_layers(
            &DiffConfig {
                comparator: Some(comparator),
                ..DiffConfig::default()
            },
            &BatchConfig::default(),
        )
    }

    fn write_png(dir: &Path, name: &str, w: u32, h: u32, color: [u8; 4]) -> String {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba(color)).save(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn same_images_exit_ok() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 10, 10, [255, 0, 0, 255]);
        let b = write_png(dir.path(), "b.png", 10, 10, [255, 0, 0, 255]);
        let code = compare(&config(ComparatorKind::Distance), &a, &b, None)
            .await
            .unwrap();
        assert_eq!(code, EXIT_OK);
    }

    #[tokio::test]
    async fn different_images_write_highlight() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 10, 10, [255, 0, 0, 255]);
        let b = write_png(dir.path(), "b.png", 10, 10, [0, 0, 255, 255]);
        let out = dir.path().join("diff.png");
        let code = compare(&config(ComparatorKind::Distance), &a, &b, Some(&out))
            .await
            .unwrap();
        assert_eq!(code, EXIT_DIFFERS);

        let diff = image::open(&out).unwrap().to_rgba16();
        assert_eq!(diff.dimensions(), (10, 10));
        assert_eq!(*diff.get_pixel(5, 5), Rgba([65535, 0, 0, 65535]));
    }

    #[tokio::test]
    async fn dimension_mismatch_differs() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 10, 10, [255, 0, 0, 255]);
        let b = write_png(dir.path(), "b.png", 12, 12, [255, 0, 0, 255]);
        let code = compare(&config(ComparatorKind::Distance), &a, &b, None)
            .await
            .unwrap();
        assert_eq!(code, EXIT_DIFFERS);
    }

    #[tokio::test]
    async fn kernel_with_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 10, 10, [255, 0, 0, 255]);
        let out = dir.path().join("diff.png");
        assert!(
            compare(&config(ComparatorKind::Kernel), &a, &a, Some(&out))
                .await
                .is_err()
        );
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn unreadable_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 4, 4, [0, 0, 0, 255]);
        let missing = dir.path().join("missing.png");
        let result = compare(
            &config(ComparatorKind::Distance),
            &a,
            missing.to_str().unwrap(),
            None,
        )
        .await;
        assert!(result.is_err());
    }
}
