use super::*;
#[derive(Serialize)]
struct ReportDocument<'a> {
    started_at: String,
    finished_at: String,
    summary: RunSummary,
    jobs: &'a [JobReport],
}

pub(super) fn write_report(
    path: &Path,
    started_at: OffsetDateTime,
    report: &RunReport,
) -> anyhow::Result<()> {
    let document = ReportDocument {
        started_at: started_at.format(&Rfc3339).context("format timestamp")?,
        finished_at: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("format timestamp")?,
        summary: report.summary(),
        jobs: &report.jobs,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context("create report directory")?;
    }
    let data = serde_json::to_string_pretty(&document).context("serialize run report")?;
    fs::write(path, data).context("write run report")?;
    Ok(())
}

pub(super) fn print_summary(summary: &RunSummary) {
    println!(
        "Mirrored {}/{} repositories: cloned={} failed={}",
        summary.synchronized, summary.total, summary.cloned, summary.failed
    );
}
