use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use synchronizer_core::config::{ConfigError, parse_config};
use synchronizer_core::git_tool::GitCli;
use synchronizer_core::sync_engine::{MirrorRunError, RunOptions, run_mirror};
use synchronizer_core::sync_engine_types::{JobReport, RunReport, RunSummary};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod app;
mod args;
mod report;

use args::*;

#[cfg(test)]
use app::{execute, exit_code_for};
use report::{print_summary, write_report};

const EXIT_JOBS_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

pub fn run() -> ExitCode {
    app::run()
}
