use crate::fetch::{Fetcher, RequestHeaders};
use crate::resolve::ResolvedResource;
use crate::worker::{process_resource, Outcome};
use crate::{EngineError, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Ceiling on simultaneous resource fetches for one run.
pub const MAX_IN_FLIGHT: usize = 10;

/// Downloads `resources` into `dir` on a bounded pool of scoped workers and
/// returns the URLs that were written, in completion order.
///
/// Returns only after every dispatched resource produced an outcome. A
/// failed write stops workers from taking new jobs and is returned once
/// the in-flight ones have finished.
pub fn run_downloads<F: Fetcher + ?Sized>(
    fetcher: &F,
    headers: &RequestHeaders,
    resources: Vec<ResolvedResource>,
    dir: &Path,
    max_in_flight: usize,
) -> Result<Vec<String>> {
    if resources.is_empty() {
        return Ok(Vec::new());
    }

    let workers = max_in_flight.clamp(1, MAX_IN_FLIGHT).min(resources.len());
    let total = resources.len();

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<ResolvedResource>();
    for resource in resources {
        if job_tx.send(resource).is_err() {
            break;
        }
    }
    drop(job_tx);

    let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded::<Result<Outcome>>();
    let abort = AtomicBool::new(false);

    let (downloaded, failed, fatal) = thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let outcome_tx = outcome_tx.clone();
            let abort = &abort;
            scope.spawn(move || {
                for resource in job_rx.iter() {
                    if abort.load(Ordering::SeqCst) {
                        break;
                    }
                    let outcome = process_resource(fetcher, headers, &resource, dir);
                    if outcome.is_err() {
                        abort.store(true, Ordering::SeqCst);
                    }
                    if outcome_tx.send(outcome).is_err() {
                        break;
                    }
                }
            });
        }
        drop(outcome_tx);

        let mut downloaded: Vec<String> = Vec::new();
        let mut failed = 0_usize;
        let mut fatal: Option<EngineError> = None;
        for outcome in outcome_rx.iter() {
            match outcome {
                Ok(Outcome::Success { url }) => downloaded.push(url),
                Ok(Outcome::Failure { .. }) => failed += 1,
                Err(err) => {
                    if fatal.is_none() {
                        fatal = Some(err);
                    }
                }
            }
        }
        (downloaded, failed, fatal)
    });

    if let Some(err) = fatal {
        tracing::error!(
            dir = %dir.display(),
            error = %err,
            "download_run_aborted"
        );
        return Err(err);
    }

    tracing::info!(
        candidates = total,
        downloaded = downloaded.len(),
        failed,
        workers,
        "download_run_finished"
    );
    Ok(downloaded)
}
