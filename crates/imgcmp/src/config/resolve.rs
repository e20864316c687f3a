use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;

use super::{BatchConfig, ComparatorKind, DiffConfig, load, validate};
use crate::batch::runner::{BatchOptions, default_workers};
use crate::compare::{
    DEFAULT_KERNEL_SIZE, DEFAULT_KERNEL_THRESHOLD, DEFAULT_TOLERANCE, Strategy,
};

/// Values extracted from the CLI that participate in the merge.
#[derive(Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub diff: DiffConfig,
    pub batch: BatchConfig,
}

/// Fully resolved config after CLI > env > file > defaults merge.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRunConfig {
    pub comparator: ComparatorKind,
    pub tolerance: u16,
    pub kernel_size: u32,
    pub kernel_threshold: u32,
    pub workers: usize,
    pub job_timeout: Option<Duration>,
}

/// Read one environment variable through `parse`, naming it on failure.
fn env_var<T>(name: &str, parse: impl FnOnce(&str) -> Result<T, String>) -> Result<Option<T>> {
    std::env::var(name)
        .ok()
        .map(|v| parse(&v).map_err(|e| anyhow!("{name} is invalid: {e}")))
        .transpose()
}

/// Environment layer: `IMGCMP_COMPARATOR`, `IMGCMP_TOLERANCE`, `IMGCMP_WORKERS`.
fn env_layer() -> Result<(DiffConfig, BatchConfig)> {
    let diff = DiffConfig {
        comparator: env_var("IMGCMP_COMPARATOR", |v| ComparatorKind::from_str(v, true))?,
        tolerance: env_var("IMGCMP_TOLERANCE", |v| v.parse::<u16>().map_err(|e| e.to_string()))?,
        ..DiffConfig::default()
    };
    let batch = BatchConfig {
        workers: env_var("IMGCMP_WORKERS", |v| v.parse::<usize>().map_err(|e| e.to_string()))?,
        ..BatchConfig::default()
    };
    Ok((diff, batch))
}

impl ResolvedRunConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        // 1. File layer
        let file = load(cli.config.as_deref()).context("Failed to load configuration")?;
        let (mut diff, mut batch) = (file.diff, file.batch);

        // 2. Env layer
        let (env_diff, env_batch) = env_layer()?;
        diff.merge(&env_diff);
        batch.merge(&env_batch);

        // 3. CLI layer
        diff.merge(&cli.diff);
        batch.merge(&cli.batch);

        validate(&diff, &batch)?;
        Ok(Self::from_layers(&diff, &batch))
    }

    /// Fill whatever the merged layers left unset with defaults.
    pub fn from_layers(diff: &DiffConfig, batch: &BatchConfig) -> Self {
        Self {
            comparator: diff.comparator.unwrap_or_default(),
            tolerance: diff.tolerance.unwrap_or(DEFAULT_TOLERANCE),
            kernel_size: diff.kernel_size.unwrap_or(DEFAULT_KERNEL_SIZE),
            kernel_threshold: diff.kernel_threshold.unwrap_or(DEFAULT_KERNEL_THRESHOLD),
            workers: batch.workers.unwrap_or_else(default_workers),
            job_timeout: batch.job_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn strategy(&self, highlight: bool) -> Strategy {
        match self.comparator {
            ComparatorKind::Distance => Strategy::Distance {
                tolerance: self.tolerance,
                highlight,
            },
            ComparatorKind::Kernel => Strategy::Kernel {
                size: self.kernel_size,
                threshold: self.kernel_threshold,
            },
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            workers: self.workers,
            strategy: self.strategy(false),
            job_timeout: self.job_timeout,
        }
    }
}
