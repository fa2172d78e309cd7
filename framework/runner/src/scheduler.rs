use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use lakebench_core::prelude::ClusterUnreachableError;
use lakebench_instruments::{Reporter, ResourceSample, ResourceSampler, RunRecord};

use crate::backend::ClusterBackend;
use crate::config::SweepSettings;
use crate::corpus::QuerySpec;
use crate::executor::Executor;
use crate::progress::sweep_progress_bar;
use crate::run_executor::RunExecutor;
use crate::shutdown::start_shutdown_listener;

/// Knobs for one sweep, resolved from the configuration before the scheduler starts.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub concurrency: usize,
    pub iterations: u32,
    pub timeout: Duration,
    pub sample_interval: Duration,
    pub no_progress: bool,
}

impl SweepOptions {
    pub fn from_settings(settings: &SweepSettings, no_progress: bool) -> Self {
        Self {
            concurrency: settings.concurrency,
            iterations: settings.iterations,
            timeout: Duration::from_secs(settings.timeout_secs),
            sample_interval: Duration::from_millis(settings.sample_interval_ms),
            no_progress,
        }
    }
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self::from_settings(&SweepSettings::default(), true)
    }
}

/// Overall result of a sweep, used for the operator summary and the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStatus {
    /// Every scheduled run completed successfully.
    AllSucceeded,
    /// The sweep completed but some runs failed or timed out.
    CompletedWithFailures,
}

/// Everything a sweep produced. Records are the raw input to the summariser.
#[derive(Debug)]
pub struct SweepOutcome {
    pub run_id: String,
    pub records: Vec<RunRecord>,
    pub skipped_clusters: Vec<String>,
    pub expected_runs: usize,
}

impl SweepOutcome {
    pub fn status(&self) -> SweepStatus {
        let complete = self.records.len() == self.expected_runs;
        if complete && self.records.iter().all(RunRecord::is_success) {
            SweepStatus::AllSucceeded
        } else {
            SweepStatus::CompletedWithFailures
        }
    }

    pub fn successes(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }
}

struct WorkItem {
    cluster: String,
    query_index: usize,
    iteration: u32,
}

/// Run the full sweep: every configured query against every reachable cluster, `iterations`
/// times, with exactly `concurrency` runs in flight at most.
///
/// Fails only when the sweep cannot start at all: nothing to run, or no cluster passed the
/// pre-flight check. An unreachable cluster does not abort the others, its work items are
/// recorded as failures up front without consuming a worker slot.
pub fn run_sweep(
    backend: Arc<dyn ClusterBackend>,
    clusters: &[String],
    queries: &[QuerySpec],
    options: &SweepOptions,
    reporter: Arc<Reporter>,
) -> anyhow::Result<SweepOutcome> {
    anyhow::ensure!(!clusters.is_empty(), "Sweep could not start: no clusters configured");
    anyhow::ensure!(!queries.is_empty(), "Sweep could not start: no queries to run");
    anyhow::ensure!(options.concurrency >= 1, "Sweep could not start: concurrency must be at least 1");
    anyhow::ensure!(options.iterations >= 1, "Sweep could not start: iterations must be at least 1");

    let run_id = nanoid::nanoid!();
    let expected_runs = clusters.len() * queries.len() * options.iterations as usize;
    log::info!(
        "Starting sweep {run_id}: {} clusters x {} queries x {} iterations ({expected_runs} runs), concurrency {}",
        clusters.len(),
        queries.len(),
        options.iterations,
        options.concurrency,
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime)?;
    let executor = Arc::new(Executor::new(runtime, shutdown_handle.clone()));

    // Pre-flight: one probe per cluster. A cluster that cannot be reached at all is taken out
    // of the sweep here, and all of its runs are recorded as failures.
    let mut reachable = Vec::new();
    let mut skipped_clusters = Vec::new();
    let mut records = Vec::new();
    for cluster in clusters {
        match executor.execute_in_place(backend.probe(cluster)) {
            Ok(()) => reachable.push(cluster.clone()),
            Err(e) => {
                let error = ClusterUnreachableError::new(cluster, format!("{e:#}"));
                log::error!("{error}");
                skipped_clusters.push(cluster.clone());
                for query in queries {
                    for iteration in 0..options.iterations {
                        let record = RunRecord::failure(
                            cluster,
                            &query.id,
                            iteration,
                            chrono::Utc::now(),
                            0.0,
                            error.to_string(),
                            ResourceSample::unavailable(),
                        );
                        reporter.add_run(&record);
                        records.push(record);
                    }
                }
            }
        }
    }

    if reachable.is_empty() {
        anyhow::bail!(
            "Sweep could not start: none of the {} configured clusters are reachable",
            clusters.len()
        );
    }

    // Iteration indices are assigned here, before dispatch, so they stay a stable identifier
    // no matter which order the runs complete in.
    let mut items = VecDeque::new();
    for iteration in 0..options.iterations {
        for query_index in 0..queries.len() {
            for cluster in &reachable {
                items.push_back(WorkItem {
                    cluster: cluster.clone(),
                    query_index,
                    iteration,
                });
            }
        }
    }
    let queued_runs = items.len();
    let queue = Arc::new(parking_lot::Mutex::new(items));

    let progress = if options.no_progress {
        indicatif::ProgressBar::hidden()
    } else {
        sweep_progress_bar(queued_runs as u64)
    };

    let run_executor = Arc::new(RunExecutor::new(
        executor.clone(),
        backend.clone(),
        ResourceSampler::new(options.sample_interval),
    ));
    let queries = Arc::new(queries.to_vec());

    let worker_count = options.concurrency.min(queued_runs);
    let mut handles = Vec::new();
    for worker_index in 0..worker_count {
        let queue = queue.clone();
        let queries = queries.clone();
        let run_executor = run_executor.clone();
        let reporter = reporter.clone();
        let progress = progress.clone();
        let timeout = options.timeout;
        let mut shutdown_listener = shutdown_handle.new_listener();

        handles.push(
            std::thread::Builder::new()
                .name(format!("worker-{worker_index}"))
                .spawn(move || {
                    let mut local = Vec::new();
                    loop {
                        if shutdown_listener.should_shutdown() {
                            log::debug!("Stopping worker {worker_index}");
                            break;
                        }

                        let Some(item) = queue.lock().pop_front() else {
                            break;
                        };

                        let query = &queries[item.query_index];
                        let record =
                            run_executor.run(&item.cluster, query, item.iteration, timeout);
                        reporter.add_run(&record);
                        progress.inc(1);
                        local.push(record);
                    }
                    local
                })
                .expect("Failed to spawn worker thread"),
        );
    }

    for handle in handles {
        let local = handle
            .join()
            .map_err(|e| anyhow::anyhow!("Error joining worker thread: {e:?}"))?;
        records.extend(local);
    }
    progress.finish_and_clear();

    reporter.finalize();

    let outcome = SweepOutcome {
        run_id,
        records,
        skipped_clusters,
        expected_runs,
    };
    let failures = outcome.records.len() - outcome.successes();
    log::info!(
        "Sweep {} finished: {} of {} runs completed, {} succeeded, {} failed or timed out, {} clusters skipped",
        outcome.run_id,
        outcome.records.len(),
        outcome.expected_runs,
        outcome.successes(),
        failures,
        outcome.skipped_clusters.len(),
    );

    Ok(outcome)
}
