pub mod job;
pub mod runner;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Result, bail};
use tracing::info;

use self::job::{DiffJob, Manifest};
use self::runner::{BatchOptions, diff_all};
use crate::report::{BatchSummary, DiffReport};
use crate::source::ImageSource;

/// A loaded manifest, ready to run.
pub struct BatchPlan {
    jobs: Vec<DiffJob>,
}

impl BatchPlan {
    pub fn new(jobs: Vec<DiffJob>) -> Self {
        Self { jobs }
    }

    /// Read and parse the manifest. Failure here aborts the whole run.
    pub fn load(path: &Path) -> Result<Self> {
        let manifest = Manifest::load(path)?;
        Ok(Self::new(manifest.diffs))
    }

    pub fn total(&self) -> usize {
        self.jobs.len()
    }

    /// Run every job and aggregate. Consumes self.
    ///
    /// Drains exactly one result per job. Clean matches are counted in the
    /// summary but left out of `results`.
    pub async fn execute<S: ImageSource>(
        self,
        source: Arc<S>,
        options: &BatchOptions,
    ) -> Result<DiffReport> {
        let total = self.total();
        let start = Instant::now();
        let mut rx = diff_all(source, self.jobs, options);

        let mut summary = BatchSummary::default();
        let mut results = Vec::new();
        for received in 0..total {
            let Some(result) = rx.recv().await else {
                bail!("Worker pool stopped after {received} of {total} results");
            };
            summary.record(&result);
            if result.needs_attention() {
                results.push(result);
            }
        }

        let report = DiffReport::new(results, summary, start.elapsed());
        info!(
            jobs = total,
            differed = summary.differed,
            errored = summary.errored,
            "diffed {total} images in {}",
            report.elapsed
        );
        Ok(report)
    }
}
