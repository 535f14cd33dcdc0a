use crate::git_tool::{GitTool, redact_credentials};
use crate::job_queue::{JobQueue, QueuedJob};
use crate::sync_engine_types::{JobError, JobReport};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Runs `workers` threads against `queue` until it is drained and every
/// in-flight job has returned. Reports come back in completion order.
pub(crate) fn run_workers(queue: &JobQueue, tool: &dyn GitTool, workers: usize) -> Vec<JobReport> {
    let total = queue.len();
    let (tx, rx) = mpsc::channel::<JobReport>();
    let mut reports = Vec::with_capacity(total);

    std::thread::scope(|scope| {
        for worker in 0..workers {
            let tx = tx.clone();
            scope.spawn(move || worker_loop(worker, queue, tool, &tx));
        }
        drop(tx);

        while let Ok(report) = rx.recv() {
            info!(
                processed = reports.len() + 1,
                total,
                source = %redact_credentials(&report.source_url),
                status = %report.status,
                "repository finished"
            );
            reports.push(report);
        }
        queue.join();
    });

    reports
}

fn worker_loop(worker: usize, queue: &JobQueue, tool: &dyn GitTool, tx: &mpsc::Sender<JobReport>) {
    debug!(worker, "worker started");
    while let Some(QueuedJob { index, mut job }) = queue.try_dequeue() {
        let started = Instant::now();
        let result = match panic::catch_unwind(AssertUnwindSafe(|| job.synchronize(tool))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(JobError::Sync(err)),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    worker,
                    source = %redact_credentials(job.source_url()),
                    panic = %message,
                    "mirror job panicked"
                );
                job.mark_failed();
                Err(JobError::Panicked(message))
            }
        };
        let report = JobReport::from_finished(index, &job, result, started.elapsed());
        let _ = tx.send(report);
        queue.task_done();
    }
    debug!(worker, "queue drained; worker exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
