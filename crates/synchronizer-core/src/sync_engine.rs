use crate::config::{ConfigError, MirrorSpec};
use crate::git_tool::GitTool;
use crate::job_queue::JobQueue;
use crate::mirror_job::MirrorJob;
use crate::paths::local_path;
use crate::sync_engine_types::{RunFailure, RunReport};
use crate::sync_engine_workers::run_workers;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

#[derive(Clone, Copy, Debug)]
pub struct RunOptions {
    pub concurrency: NonZeroUsize,
    /// Extra rounds for jobs that failed in the previous round.
    pub retries: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::MIN,
            retries: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum MirrorRunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    JobsFailed(#[from] RunFailure),
}

/// Owns a fully built queue and drains it with a pool of worker threads.
pub struct Dispatcher<'t> {
    queue: JobQueue,
    tool: &'t dyn GitTool,
}

impl<'t> Dispatcher<'t> {
    pub fn new(queue: JobQueue, tool: &'t dyn GitTool) -> Self {
        Self { queue, tool }
    }

    /// Runs every queued job on exactly `concurrency` workers and fails with
    /// the full list of per-job failures if any job did not synchronize.
    pub fn process(self, concurrency: NonZeroUsize) -> Result<RunReport, RunFailure> {
        self.run(concurrency).into_result()
    }

    /// Like [`Dispatcher::process`] but returns the report whatever the outcome.
    pub fn run(self, concurrency: NonZeroUsize) -> RunReport {
        let started = Instant::now();
        let total = self.queue.len();
        info!(
            jobs = total,
            workers = concurrency.get(),
            "processing mirror jobs"
        );

        let mut slots: Vec<_> = run_workers(&self.queue, self.tool, concurrency.get())
            .into_iter()
            .map(|report| (report.index, report))
            .collect();
        slots.sort_by_key(|(index, _)| *index);
        let report = RunReport {
            jobs: slots.into_iter().map(|(_, report)| report).collect(),
        };

        let summary = report.summary();
        info!(
            synchronized = summary.synchronized,
            failed = summary.failed,
            cloned = summary.cloned,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "mirror jobs processed"
        );
        report
    }
}

/// Turns parsed config lines into jobs rooted at `root`. Two sources that
/// would share a working copy are rejected.
pub fn build_jobs(specs: &[MirrorSpec], root: &Path) -> Result<Vec<MirrorJob>, ConfigError> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    let mut jobs = Vec::with_capacity(specs.len());
    for spec in specs {
        let path =
            local_path(root, &spec.source_url).ok_or_else(|| ConfigError::UnnamedSource {
                source_url: spec.source_url.clone(),
            })?;
        if let Some(first) = seen.insert(path.clone(), &spec.source_url) {
            return Err(ConfigError::DuplicateLocalPath {
                first: first.to_string(),
                second: spec.source_url.clone(),
                path,
            });
        }
        jobs.push(MirrorJob::new(
            spec.source_url.clone(),
            spec.destination_urls.clone(),
            path,
        ));
    }
    Ok(jobs)
}

/// Builds, queues and processes one job per spec, re-running failed jobs up
/// to `options.retries` more times.
pub fn run_mirror(
    specs: &[MirrorSpec],
    root: &Path,
    tool: &dyn GitTool,
    options: RunOptions,
) -> Result<RunReport, MirrorRunError> {
    let jobs = build_jobs(specs, root)?;
    let mut report = dispatch(jobs, tool, options.concurrency);

    for attempt in 1..=options.retries {
        let failed: Vec<usize> = report
            .jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| job.is_failed())
            .map(|(slot, _)| slot)
            .collect();
        if failed.is_empty() {
            break;
        }
        info!(
            attempt,
            failed = failed.len(),
            "retrying failed repositories"
        );
        let retry_jobs: Vec<MirrorJob> = failed
            .iter()
            .map(|&slot| report.jobs[slot].to_job())
            .collect();
        let retried = dispatch(retry_jobs, tool, options.concurrency);
        for (slot, mut job) in failed.into_iter().zip(retried.jobs) {
            let previous = &report.jobs[slot];
            job.index = previous.index;
            job.attempts = previous.attempts + 1;
            job.cloned |= previous.cloned;
            report.jobs[slot] = job;
        }
    }

    report.into_result().map_err(MirrorRunError::from)
}

fn dispatch(
    jobs: impl IntoIterator<Item = MirrorJob>,
    tool: &dyn GitTool,
    concurrency: NonZeroUsize,
) -> RunReport {
    let queue = JobQueue::new();
    for job in jobs {
        queue.enqueue(job);
    }
    Dispatcher::new(queue, tool).run(concurrency)
}
