use std::sync::Arc;
use std::time::{Duration, Instant};

use lakebench_client::{ClientError, QueryResult};
use lakebench_instruments::{ResourceSampler, RunRecord};

use crate::backend::ClusterBackend;
use crate::corpus::QuerySpec;
use crate::executor::Executor;

/// Executes one (cluster, query, iteration) work item and assembles its [RunRecord].
///
/// This is a no-throw boundary: whatever the client or the sampler does, the caller gets a
/// record back. A single bad query must never abort the rest of the sweep.
pub struct RunExecutor {
    executor: Arc<Executor>,
    backend: Arc<dyn ClusterBackend>,
    sampler: ResourceSampler,
}

enum CallOutcome {
    Completed(QueryResult),
    TimedOut,
    Failed(String),
}

impl RunExecutor {
    pub fn new(
        executor: Arc<Executor>,
        backend: Arc<dyn ClusterBackend>,
        sampler: ResourceSampler,
    ) -> Self {
        Self {
            executor,
            backend,
            sampler,
        }
    }

    pub fn run(
        &self,
        cluster: &str,
        query: &QuerySpec,
        iteration: u32,
        timeout: Duration,
    ) -> RunRecord {
        log::debug!(
            "Running {} iteration {} against cluster {}",
            query.id,
            iteration,
            cluster
        );

        let started_at = chrono::Utc::now();
        let started = Instant::now();
        let sampler_handle = self.sampler.start();

        let call = async {
            let outcome =
                match tokio::time::timeout(timeout, self.backend.execute(cluster, &query.sql, timeout))
                    .await
                {
                    Ok(Ok(result)) => CallOutcome::Completed(result),
                    Ok(Err(e)) if is_client_timeout(&e) => CallOutcome::TimedOut,
                    Ok(Err(e)) => CallOutcome::Failed(format!("{e:#}")),
                    Err(_) => CallOutcome::TimedOut,
                };
            Ok(outcome)
        };

        let outcome = self.executor.execute_in_place(call);
        let duration_s = started.elapsed().as_secs_f64();
        let resources = sampler_handle.finish();

        match outcome {
            Ok(CallOutcome::Completed(result)) => {
                log::debug!(
                    "Query {} returned {} rows from cluster {} in {:.2}s",
                    query.id,
                    result.row_count,
                    cluster,
                    duration_s
                );
                RunRecord::success(
                    cluster,
                    &query.id,
                    iteration,
                    started_at,
                    duration_s,
                    result.row_count,
                    resources,
                )
            }
            Ok(CallOutcome::TimedOut) => {
                log::warn!(
                    "Query {} timed out on cluster {} after {:?}",
                    query.id,
                    cluster,
                    timeout
                );
                RunRecord::timeout(
                    cluster,
                    &query.id,
                    iteration,
                    started_at,
                    duration_s,
                    format!("query exceeded the {timeout:?} timeout"),
                    resources,
                )
            }
            Ok(CallOutcome::Failed(detail)) => {
                log::warn!("Query {} failed on cluster {}: {}", query.id, cluster, detail);
                RunRecord::failure(
                    cluster,
                    &query.id,
                    iteration,
                    started_at,
                    duration_s,
                    detail,
                    resources,
                )
            }
            // The shutdown signal cancelled the call mid-flight.
            Err(e) => RunRecord::failure(
                cluster,
                &query.id,
                iteration,
                started_at,
                duration_s,
                format!("{e:#}"),
                resources,
            ),
        }
    }
}

fn is_client_timeout(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<ClientError>(),
        Some(ClientError::TimedOut { .. })
    )
}
