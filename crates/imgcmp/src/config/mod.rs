pub mod resolve;
pub mod template;

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::compare::MAX_KERNEL_SIZE;
pub use self::resolve::{CliOverrides, ResolvedRunConfig};
pub use self::template::{config_file_exists, write_template};

pub(crate) const CONFIG_FILE: &str = "imgcmp.toml";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparatorKind {
    /// Per-pixel mean channel distance
    #[default]
    Distance,
    /// Averaged 4x4 blocks, tolerant of sub-pixel shifts
    Kernel,
}

/// Comparison settings.
///
/// Fields are `Option`; `None` means "use default".
/// Serves both TOML deserialization (`[diff]`) and CLI argument parsing.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Comparison strategy
    #[arg(long, value_enum)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparator: Option<ComparatorKind>,

    /// Max mean channel delta (0-65535) for pixels to count as equal
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<u16>,

    /// Kernel size K (1-255); blocks span (K+1)x(K+1) pixels
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_size: Option<u32>,

    /// Max averaged block delta (0-255) for blocks to count as equal
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_threshold: Option<u32>,
}

impl DiffConfig {
    /// Overlay non-None fields from `other` onto self.
    pub fn merge(&mut self, other: &DiffConfig) {
        if other.comparator.is_some() {
            self.comparator = other.comparator;
        }
        if other.tolerance.is_some() {
            self.tolerance = other.tolerance;
        }
        if other.kernel_size.is_some() {
            self.kernel_size = other.kernel_size;
        }
        if other.kernel_threshold.is_some() {
            self.kernel_threshold = other.kernel_threshold;
        }
    }
}

/// Batch orchestration settings (`[batch]`).
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of parallel workers (default: host parallelism)
    #[arg(long, short = 'j')]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Give up on a single job after this many seconds
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_timeout_secs: Option<u64>,
}

impl BatchConfig {
    pub fn merge(&mut self, other: &BatchConfig) {
        if other.workers.is_some() {
            self.workers = other.workers;
        }
        if other.job_timeout_secs.is_some() {
            self.job_timeout_secs = other.job_timeout_secs;
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        validate(&config.diff, &config.batch)?;
        Ok(config)
    }
}

/// Validate semantic constraints that serde cannot express.
pub fn validate(diff: &DiffConfig, batch: &BatchConfig) -> Result<()> {
    match diff.kernel_size {
        Some(0) => bail!("diff.kernel_size must be at least 1"),
        Some(k) if k > MAX_KERNEL_SIZE => {
            bail!("diff.kernel_size must be at most {MAX_KERNEL_SIZE}, got {k}")
        }
        _ => {}
    }
    if batch.workers == Some(0) {
        bail!("batch.workers must be at least 1");
    }
    if batch.job_timeout_secs == Some(0) {
        bail!("batch.job_timeout_secs must be at least 1 (omit it to disable the timeout)");
    }
    Ok(())
}

/// Load the file layer.
///
/// An explicit path must exist. Without one, `imgcmp.toml` in the working
/// directory is used when present, defaults otherwise.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p,
        None if config_file_exists() => Path::new(CONFIG_FILE),
        None => return Ok(Config::default()),
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Config::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_sections() {
        let config = Config::parse(
            r#"
            [diff]
            comparator = "kernel"
            tolerance = 300
            kernel_size = 2
            kernel_threshold = 20

            [batch]
            workers = 3
            job_timeout_secs = 45
            "#,
        )
        .unwrap();
        assert_eq!(config.diff.comparator, Some(ComparatorKind::Kernel));
        assert_eq!(config.diff.tolerance, Some(300));
        assert_eq!(config.diff.kernel_size, Some(2));
        assert_eq!(config.diff.kernel_threshold, Some(20));
        assert_eq!(config.batch.workers, Some(3));
        assert_eq!(config.batch.job_timeout_secs, Some(45));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.diff.comparator.is_none());
        assert!(config.batch.workers.is_none());
    }

    #[test]
    fn rejects_zero_values() {
        assert!(Config::parse("[batch]\nworkers = 0").is_err());
        assert!(Config::parse("[diff]\nkernel_size = 0").is_err());
        assert!(Config::parse("[batch]\njob_timeout_secs = 0").is_err());
    }

    #[test]
    fn rejects_oversized_kernel() {
        let err = Config::parse("[diff]\nkernel_size = 300").unwrap_err();
        assert!(err.to_string().contains("diff.kernel_size"));
        assert!(Config::parse("[diff]\nkernel_size = 255").is_ok());
    }

    #[test]
    fn rejects_out_of_range_tolerance() {
        assert!(Config::parse("[diff]\ntolerance = 70000").is_err());
        assert!(Config::parse("[diff]\ncomparator = \"ssim\"").is_err());
    }

    #[test]
    fn merge_overlays_set_fields_only() {
        let mut base = DiffConfig {
            comparator: Some(ComparatorKind::Kernel),
            tolerance: Some(100),
            ..DiffConfig::default()
        };
        base.merge(&DiffConfig {
            tolerance: Some(500),
            ..DiffConfig::default()
        });
        assert_eq!(base.comparator, Some(ComparatorKind::Kernel));
        assert_eq!(base.tolerance, Some(500));

        let mut batch = BatchConfig {
            workers: Some(2),
            job_timeout_secs: Some(9),
        };
        batch.merge(&BatchConfig {
            workers: Some(8),
            job_timeout_secs: None,
        });
        assert_eq!(batch.workers, Some(8));
        assert_eq!(batch.job_timeout_secs, Some(9));
    }

    #[test]
    fn explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("absent.toml"));
    }

    #[test]
    fn explicit_path_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[diff]\ntolerance = 7\n").unwrap();
        assert_eq!(load(Some(&path)).unwrap().diff.tolerance, Some(7));
    }
}
