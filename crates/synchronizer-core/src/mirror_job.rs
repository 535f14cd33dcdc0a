use crate::git_tool::{CloneOutcome, GitTool, ToolError, redact_credentials};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Cloned,
    Synchronized,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Cloned => "cloned",
            JobStatus::Synchronized => "synchronized",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Synchronized | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStep {
    Clone,
    Fetch,
    PushBranches,
    PushTags,
}

impl SyncStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStep::Clone => "clone",
            SyncStep::Fetch => "fetch",
            SyncStep::PushBranches => "push branches",
            SyncStep::PushTags => "push tags",
        }
    }
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first step of a job that failed, and what the tool reported.
#[derive(Debug, Error)]
#[error("{step}{} failed: {source}", destination_suffix(.destination))]
pub struct SyncError {
    pub step: SyncStep,
    pub destination: Option<String>,
    #[source]
    pub source: ToolError,
}

fn destination_suffix(destination: &Option<String>) -> String {
    match destination {
        Some(url) => format!(" to {}", redact_credentials(url)),
        None => String::new(),
    }
}

/// One repository to mirror: fetched from `source_url` into a bare mirror at
/// `local_path`, then pushed to every destination in order.
#[derive(Debug)]
pub struct MirrorJob {
    source_url: String,
    destination_urls: Vec<String>,
    local_path: PathBuf,
    status: JobStatus,
    cloned: bool,
}

impl MirrorJob {
    pub fn new(source_url: String, destination_urls: Vec<String>, local_path: PathBuf) -> Self {
        Self {
            source_url,
            destination_urls,
            local_path,
            status: JobStatus::Pending,
            cloned: false,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn destination_urls(&self) -> &[String] {
        &self.destination_urls
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Whether the last `synchronize` created the working copy.
    pub fn was_cloned(&self) -> bool {
        self.cloned
    }

    pub(crate) fn mark_failed(&mut self) {
        self.status = JobStatus::Failed;
    }

    /// Clone (if needed), fetch, push all branches, push all tags. Stops at
    /// the first failing step; later steps and destinations are skipped.
    pub fn synchronize(&mut self, tool: &dyn GitTool) -> Result<(), SyncError> {
        info!(
            source = %redact_credentials(&self.source_url),
            path = %self.local_path.display(),
            destinations = self.destination_urls.len(),
            "mirroring repository"
        );
        let result = self.run_steps(tool);
        match &result {
            Ok(()) => {
                self.status = JobStatus::Synchronized;
                info!(
                    source = %redact_credentials(&self.source_url),
                    cloned = self.cloned,
                    "repository synchronized"
                );
            }
            Err(err) => {
                self.status = JobStatus::Failed;
                warn!(
                    source = %redact_credentials(&self.source_url),
                    step = %err.step,
                    error = %err.source,
                    "repository sync failed"
                );
            }
        }
        result
    }

    fn run_steps(&mut self, tool: &dyn GitTool) -> Result<(), SyncError> {
        self.cloned = false;
        let outcome = tool
            .ensure_mirror_clone(&self.source_url, &self.local_path)
            .map_err(|source| SyncError {
                step: SyncStep::Clone,
                destination: None,
                source,
            })?;
        self.cloned = outcome == CloneOutcome::Cloned;
        self.status = JobStatus::Cloned;

        debug!(path = %self.local_path.display(), "fetching origin");
        tool.fetch(&self.local_path).map_err(|source| SyncError {
            step: SyncStep::Fetch,
            destination: None,
            source,
        })?;

        for destination in &self.destination_urls {
            debug!(destination = %redact_credentials(destination), "pushing branches");
            tool.push_all_branches(&self.local_path, destination)
                .map_err(|source| SyncError {
                    step: SyncStep::PushBranches,
                    destination: Some(destination.clone()),
                    source,
                })?;
        }
        for destination in &self.destination_urls {
            debug!(destination = %redact_credentials(destination), "pushing tags");
            tool.push_all_tags(&self.local_path, destination)
                .map_err(|source| SyncError {
                    step: SyncStep::PushTags,
                    destination: Some(destination.clone()),
                    source,
                })?;
        }
        Ok(())
    }
}
