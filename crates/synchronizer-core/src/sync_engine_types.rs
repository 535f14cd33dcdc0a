use crate::git_tool::redact_credentials;
use crate::mirror_job::{JobStatus, MirrorJob, SyncError, SyncStep};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a job did not reach `Synchronized`.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("mirror job panicked: {0}")]
    Panicked(String),
}

impl JobError {
    pub fn step(&self) -> Option<SyncStep> {
        match self {
            JobError::Sync(err) => Some(err.step),
            JobError::Panicked(_) => None,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            JobError::Sync(err) => err.source.exit_code(),
            JobError::Panicked(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobReport {
    pub index: usize,
    pub source_url: String,
    pub destination_urls: Vec<String>,
    pub local_path: PathBuf,
    pub status: JobStatus,
    pub cloned: bool,
    pub attempts: u32,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<JobError>,
}

impl JobReport {
    pub(crate) fn from_finished(
        index: usize,
        job: &MirrorJob,
        result: Result<(), JobError>,
        duration: Duration,
    ) -> Self {
        Self {
            index,
            source_url: job.source_url().to_string(),
            destination_urls: job.destination_urls().to_vec(),
            local_path: job.local_path().to_path_buf(),
            status: job.status(),
            cloned: job.was_cloned(),
            attempts: 1,
            duration,
            error: result.err(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// A fresh job for the same source, destinations and working copy.
    pub(crate) fn to_job(&self) -> MirrorJob {
        MirrorJob::new(
            self.source_url.clone(),
            self.destination_urls.clone(),
            self.local_path.clone(),
        )
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

fn serialize_error<S: Serializer>(
    error: &Option<JobError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.serialize_some(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub cloned: usize,
    pub synchronized: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, job: &JobReport) {
        self.total += 1;
        if job.cloned {
            self.cloned += 1;
        }
        match job.status {
            JobStatus::Synchronized => self.synchronized += 1,
            _ => self.failed += 1,
        }
    }
}

/// Per-job results in submission order.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub jobs: Vec<JobReport>,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for job in &self.jobs {
            summary.record(job);
        }
        summary
    }

    pub fn failed_jobs(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|job| job.is_failed())
    }

    pub fn is_success(&self) -> bool {
        self.failed_jobs().next().is_none()
    }

    pub fn into_result(self) -> Result<RunReport, RunFailure> {
        if self.is_success() {
            return Ok(self);
        }
        let failures = self
            .failed_jobs()
            .filter_map(|job| {
                job.error.as_ref().map(|error| JobFailure {
                    index: job.index,
                    source_url: job.source_url.clone(),
                    step: error.step(),
                    exit_code: error.exit_code(),
                    message: error.to_string(),
                })
            })
            .collect();
        Err(RunFailure {
            failures,
            report: self,
        })
    }
}

/// One failed repository: which source, and what went wrong.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct JobFailure {
    pub index: usize,
    pub source_url: String,
    pub step: Option<SyncStep>,
    pub exit_code: Option<i32>,
    pub message: String,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            redact_credentials(&self.source_url),
            self.message
        )
    }
}

/// Every failure of a run, in submission order, plus the full report.
#[derive(Debug)]
pub struct RunFailure {
    pub failures: Vec<JobFailure>,
    pub report: RunReport,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} repositories failed to mirror",
            self.failures.len(),
            self.report.jobs.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  - {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RunFailure {}
