use super::*;
pub(super) fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub(super) fn execute(cli: &Cli) -> anyhow::Result<()> {
    let specs = parse_config(&cli.config)?;
    info!(
        config = %cli.config.display(),
        repos = specs.len(),
        "loaded mirror configuration"
    );

    let tool = GitCli::new(&cli.git);
    let options = RunOptions {
        concurrency: cli.threads,
        retries: cli.retries,
    };
    let started_at = OffsetDateTime::now_utc();
    let result = run_mirror(&specs, &cli.clone_dir, &tool, options);

    let report = match &result {
        Ok(report) => Some(report),
        Err(MirrorRunError::JobsFailed(failure)) => Some(&failure.report),
        Err(MirrorRunError::Config(_)) => None,
    };
    if let (Some(report), Some(path)) = (report, cli.report.as_deref()) {
        write_report(path, started_at, report)
            .with_context(|| format!("write run report {}", path.display()))?;
    }

    match result {
        Ok(report) => {
            print_summary(&report.summary());
            Ok(())
        }
        Err(MirrorRunError::Config(err)) => Err(err.into()),
        Err(MirrorRunError::JobsFailed(failure)) => {
            print_summary(&failure.report.summary());
            warn!(failed = failure.failures.len(), "some repositories were not mirrored");
            Err(failure.into())
        }
    }
}

pub(super) fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        EXIT_CONFIG
    } else {
        EXIT_JOBS_FAILED
    }
}
