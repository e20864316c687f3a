use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use super::{EXIT_DIFFERS, EXIT_OK};
use crate::batch::BatchPlan;
use crate::config::ResolvedRunConfig;
use crate::report::terminal;
use crate::source::FileOrUrlSource;

/// `imgcmp batch`: run a manifest and write the JSON report.
/// Returns exit code: 0 = every job matched, 98 = any job differed or errored.
pub async fn batch(
    config: &ResolvedRunConfig,
    manifest: &Path,
    output: Option<&Path>,
) -> Result<i32> {
    let plan = BatchPlan::load(manifest)?;
    info!(
        jobs = plan.total(),
        workers = config.workers,
        comparator = ?config.comparator,
        "loaded manifest"
    );

    let source = Arc::new(FileOrUrlSource::new());
    let report = plan.execute(source, &config.batch_options()).await?;
    report.write(output)?;

    // stdout may carry the report; keep the human summary on stderr.
    let mut err = std::io::stderr().lock();
    for result in &report.results {
        terminal::print_result_line(&mut err, result)?;
    }
    terminal::print_summary(
        &mut err,
        &report.summary,
        Duration::from_millis(report.elapsed_ms),
    )?;

    Ok(if report.is_clean() { EXIT_OK } else { EXIT_DIFFERS })
}
