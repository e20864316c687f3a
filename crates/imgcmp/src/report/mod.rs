pub mod terminal;

use std::fmt::Display;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::batch::job::{DiffJob, Passthrough, label_for};
use crate::compare::DiffStats;

/// Outcome of resolving one [`DiffJob`].
///
/// `stats` is meaningful only when `err` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    #[serde(flatten)]
    pub passthrough: Passthrough,
    /// Primary image reference of the job.
    #[serde(rename = "img")]
    pub image: String,
    pub stats: DiffStats,
    #[serde(default)]
    pub err: String,
    /// Baselines actually compared against, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compared: Vec<String>,
}

/// Result fields a job's passthrough may not shadow.
const RESERVED_KEYS: [&str; 4] = ["img", "stats", "err", "compared"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Matched,
    Differed,
    Errored,
}

impl DiffResult {
    /// Empty result for `job`. Passthrough keys that collide with result
    /// fields are dropped.
    pub fn for_job(job: &DiffJob) -> Self {
        let mut passthrough = job.passthrough.clone();
        for key in RESERVED_KEYS {
            passthrough.remove(key);
        }
        Self {
            passthrough,
            image: job.image.clone(),
            stats: DiffStats::default(),
            err: String::new(),
            compared: Vec::new(),
        }
    }

    pub fn label(&self) -> String {
        label_for(&self.passthrough, &self.image)
    }

    /// Record a job-scoped failure. The job stops here.
    pub fn set_error(&mut self, err: impl Display, reference: &str) {
        warn!(reference, error = %err, "diff failed");
        self.err = err.to_string();
    }

    pub fn outcome(&self) -> Outcome {
        if !self.err.is_empty() {
            Outcome::Errored
        } else if self.stats.exact_same {
            Outcome::Matched
        } else {
            Outcome::Differed
        }
    }

    /// Clean matches are summarized by their absence from the report.
    pub fn needs_attention(&self) -> bool {
        self.outcome() != Outcome::Matched
    }
}

/// Counts over every result drained from a batch, retained or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub matched: usize,
    pub differed: usize,
    pub errored: usize,
}

impl BatchSummary {
    pub fn record(&mut self, result: &DiffResult) {
        self.total += 1;
        match result.outcome() {
            Outcome::Matched => self.matched += 1,
            Outcome::Differed => self.differed += 1,
            Outcome::Errored => self.errored += 1,
        }
    }
}

/// Aggregate of one batch run. Only results worth attention are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffReport {
    pub results: Vec<DiffResult>,
    /// Wall-clock time of the run, e.g. `"1.234s"`.
    pub elapsed: String,
    pub elapsed_ms: u64,
    pub summary: BatchSummary,
}

impl DiffReport {
    pub fn new(results: Vec<DiffResult>, summary: BatchSummary, elapsed: Duration) -> Self {
        let elapsed_ms = round_to_millis(elapsed);
        Self {
            results,
            elapsed: format_millis(elapsed_ms),
            elapsed_ms,
            summary,
        }
    }

    /// True when every job matched one of its baselines.
    pub fn is_clean(&self) -> bool {
        self.results.is_empty()
    }

    /// Serialize as tab-indented JSON to `output`, or stdout when `None`.
    pub fn write(&self, output: Option<&Path>) -> Result<()> {
        match output {
            Some(path) => {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                let mut writer = std::io::BufWriter::new(file);
                self.write_to(&mut writer)
                    .with_context(|| format!("Failed to write {}", path.display()))
            }
            None => {
                let stdout = std::io::stdout();
                self.write_to(&mut stdout.lock())
                    .context("Failed to write report to stdout")
            }
        }
    }

    pub fn write_to(&self, writer: &mut impl Write) -> Result<()> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut *writer, formatter);
        self.serialize(&mut ser)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Round to the nearest whole millisecond, halves up.
pub fn round_to_millis(d: Duration) -> u64 {
    ((d.as_micros() + 500) / 1000) as u64
}

fn format_millis(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{}.{:03}s", ms / 1000, ms % 1000)
    }
}
