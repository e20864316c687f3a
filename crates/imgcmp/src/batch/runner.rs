use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tracing::{Instrument, debug, debug_span, info_span, warn};

use super::job::DiffJob;
use crate::compare::{self, DiffError, DiffStats, PixelBuffer, Strategy};
use crate::report::DiffResult;
use crate::source::ImageSource;

/// Knobs for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub workers: usize,
    /// Applied to every comparison in the batch. Highlight rendering is ignored.
    pub strategy: Strategy,
    /// Per-job limit. `None` waits as long as the job takes.
    pub job_timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            strategy: Strategy::default(),
            job_timeout: None,
        }
    }
}

/// Host parallelism, or 1 if it cannot be determined.
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

enum CompareFailure {
    Diff(DiffError),
    Panicked,
}

/// Compare on the blocking pool so the async workers keep pulling I/O.
async fn compare_blocking(
    primary: Arc<PixelBuffer>,
    candidate: PixelBuffer,
    strategy: Strategy,
) -> Result<DiffStats, CompareFailure> {
    tokio::task::spawn_blocking(move || -> Result<DiffStats, DiffError> {
        compare::check_dimensions(&primary, &candidate)?;
        Ok(compare::compare(&primary, &candidate, &strategy).stats)
    })
    .await
    .map_err(|_| CompareFailure::Panicked)?
    .map_err(CompareFailure::Diff)
}

/// Resolve one job end to end: load the primary, then walk the baselines
/// until one matches exactly. Any failure is sticky and ends the job.
pub async fn resolve_job<S: ImageSource>(
    source: &S,
    job: &DiffJob,
    strategy: Strategy,
) -> DiffResult {
    let mut result = DiffResult::for_job(job);

    let primary = match source.load(&job.image).await {
        Ok(img) => Arc::new(img),
        Err(e) => {
            result.set_error(e, &job.image);
            return result;
        }
    };

    if job.baselines.is_empty() {
        result.set_error("job has no baselines", &job.image);
        return result;
    }

    for baseline in &job.baselines {
        let candidate = match source.load(baseline).await {
            Ok(img) => img,
            Err(e) => {
                result.set_error(e, baseline);
                break;
            }
        };

        result.compared.push(baseline.clone());
        match compare_blocking(primary.clone(), candidate, strategy).await {
            Ok(stats) => {
                debug!(
                    baseline = %baseline,
                    diff_pixels = stats.diff_pixels,
                    exact_same = stats.exact_same,
                    "compared"
                );
                result.stats = stats;
                if stats.exact_same {
                    break;
                }
            }
            Err(CompareFailure::Diff(e)) => {
                result.set_error(e, baseline);
                break;
            }
            Err(CompareFailure::Panicked) => {
                result.set_error("diff task panicked", baseline);
                break;
            }
        }
    }

    result
}

/// Fan `jobs` out to a fixed pool of workers sharing one intake queue.
///
/// Every job yields exactly one [`DiffResult`] on the returned channel, in
/// completion order. The channel closes once all workers have exited.
pub fn diff_all<S: ImageSource>(
    source: Arc<S>,
    jobs: Vec<DiffJob>,
    options: &BatchOptions,
) -> mpsc::Receiver<DiffResult> {
    let job_count = jobs.len();
    let worker_count = job_count.min(options.workers.max(1));
    debug!(jobs = job_count, workers = worker_count, "starting batch");

    let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));
    // Every result fits, so workers never wait on a slow consumer.
    let (tx, rx) = mpsc::channel(job_count.max(1));

    let mut set = tokio::task::JoinSet::new();
    for idx in 0..worker_count {
        let queue = queue.clone();
        let tx = tx.clone();
        let source = source.clone();
        let strategy = options.strategy;
        let job_timeout = options.job_timeout;
        let span = info_span!("worker", id = idx);
        set.spawn(
            async move {
                debug!("started");
                loop {
                    let (job, remaining) = {
                        let mut q = queue.lock().await;
                        match q.pop_front() {
                            Some(j) => {
                                let remaining = q.len();
                                (j, remaining)
                            }
                            None => {
                                debug!("queue empty, exiting");
                                break;
                            }
                        }
                    };
                    debug!(job = %job.label(), remaining, "picked job");

                    let job_span = debug_span!("job", image = %job.image);
                    let work = resolve_job(source.as_ref(), &job, strategy).instrument(job_span);
                    let result = match job_timeout {
                        Some(limit) => match tokio::time::timeout(limit, work).await {
                            Ok(result) => result,
                            Err(_) => {
                                let mut result = DiffResult::for_job(&job);
                                result.set_error(
                                    format!("timed out after {}s", limit.as_secs()),
                                    &job.image,
                                );
                                result
                            }
                        },
                        None => work.await,
                    };

                    if tx.send(result).await.is_err() {
                        warn!("channel send failed (receiver dropped), stopping");
                        break;
                    }
                }
                debug!("exiting");
            }
            .instrument(span),
        );
    }

    // Channel closes when the worker clones drop.
    drop(tx);

    tokio::spawn(async move {
        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "worker task panicked");
            }
        }
        debug!("all workers done");
    });

    rx
}
