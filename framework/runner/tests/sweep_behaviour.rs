use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use lakebench_client::QueryResult;
use lakebench_instruments::{ReportConfig, Reporter, RunOutcome};
use lakebench_runner::prelude::{run_sweep, ClusterBackend, QuerySpec, SweepOptions, SweepStatus};

fn query(id: &str) -> QuerySpec {
    QuerySpec {
        id: id.to_string(),
        sql: format!("SELECT '{id}'"),
        path: PathBuf::from(format!("{id}.sql")),
    }
}

fn reporter() -> Arc<Reporter> {
    Arc::new(ReportConfig::new().init().unwrap())
}

fn options(concurrency: usize, iterations: u32, timeout: Duration) -> SweepOptions {
    SweepOptions {
        concurrency,
        iterations,
        timeout,
        sample_interval: Duration::from_millis(50),
        no_progress: true,
    }
}

#[derive(Default)]
struct StubBackend {
    /// Clusters that fail their pre-flight probe.
    unreachable: Vec<String>,
    /// (cluster, sql) pairs that fail with an engine error.
    failing: Vec<(String, String)>,
    /// (cluster, sql) pairs that take longer than any timeout used in these tests.
    slow: Vec<(String, String)>,
    /// Time every successful call takes.
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Decrements the in-flight count even when the call future is dropped by a timeout.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ClusterBackend for StubBackend {
    fn probe<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, anyhow::Result<()>> {
        let refused = self.unreachable.iter().any(|c| c == cluster);
        Box::pin(async move {
            if refused {
                anyhow::bail!("connection refused");
            }
            Ok(())
        })
    }

    fn execute<'a>(
        &'a self,
        cluster: &'a str,
        sql: &'a str,
        _timeout: Duration,
    ) -> BoxFuture<'a, anyhow::Result<QueryResult>> {
        Box::pin(async move {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            let _guard = InFlightGuard(&self.in_flight);

            let key = (cluster.to_string(), sql.to_string());
            if self.slow.contains(&key) {
                tokio::time::sleep(Duration::from_secs(5)).await;
            } else {
                tokio::time::sleep(self.delay).await;
            }

            if self.failing.contains(&key) {
                anyhow::bail!("SYNTAX ERROR: table not found");
            }

            Ok(QueryResult {
                row_count: 100,
                columns: vec!["c0".to_string()],
                engine_elapsed: Duration::from_millis(5),
            })
        })
    }
}

#[test]
fn sweep_produces_the_full_cartesian_product_despite_failures() {
    let queries = vec![query("q1"), query("q2"), query("q3")];
    let clusters = vec!["alpha".to_string(), "beta".to_string()];
    let backend = Arc::new(StubBackend {
        failing: vec![("beta".to_string(), "SELECT 'q2'".to_string())],
        ..StubBackend::default()
    });

    let outcome = run_sweep(
        backend,
        &clusters,
        &queries,
        &options(2, 2, Duration::from_secs(10)),
        reporter(),
    )
    .unwrap();

    // 2 clusters x 3 queries x 2 iterations, failures included.
    assert_eq!(outcome.records.len(), 12);
    assert_eq!(outcome.expected_runs, 12);
    assert_eq!(outcome.status(), SweepStatus::CompletedWithFailures);

    let on = |cluster: &str, query: &str| {
        outcome
            .records
            .iter()
            .filter(|r| r.cluster == cluster && r.query == query)
            .collect::<Vec<_>>()
    };

    let broken = on("beta", "q2");
    assert_eq!(broken.len(), 2);
    assert!(broken.iter().all(|r| r.outcome == RunOutcome::Failure));
    assert!(broken
        .iter()
        .all(|r| r.error.as_deref().is_some_and(|e| !e.is_empty())));

    let healthy = on("alpha", "q2");
    assert_eq!(healthy.len(), 2);
    assert!(healthy.iter().all(|r| r.outcome == RunOutcome::Success));
    assert!(healthy.iter().all(|r| r.rows == Some(100)));
    assert!(healthy.iter().all(|r| r.duration_s >= 0.0));

    // Iteration indices were assigned before dispatch and stay a stable identifier.
    for cluster in ["alpha", "beta"] {
        for query in ["q1", "q2", "q3"] {
            let mut iterations = on(cluster, query)
                .iter()
                .map(|r| r.iteration)
                .collect::<Vec<_>>();
            iterations.sort_unstable();
            assert_eq!(iterations, vec![0, 1], "({cluster}, {query})");
        }
    }
}

#[test]
fn worker_pool_never_exceeds_the_concurrency_bound() {
    let queries = (1..=5).map(|i| query(&format!("q{i}"))).collect::<Vec<_>>();
    let clusters = vec!["alpha".to_string()];
    let backend = Arc::new(StubBackend {
        delay: Duration::from_millis(25),
        ..StubBackend::default()
    });

    let outcome = run_sweep(
        backend.clone(),
        &clusters,
        &queries,
        &options(2, 2, Duration::from_secs(10)),
        reporter(),
    )
    .unwrap();

    assert_eq!(outcome.records.len(), 10);
    let max_in_flight = backend.max_in_flight.load(Ordering::SeqCst);
    assert!(
        max_in_flight <= 2,
        "observed {max_in_flight} concurrent runs with a bound of 2"
    );
}

#[test]
fn slow_queries_are_recorded_as_timeouts_not_failures() {
    let queries = vec![query("q1")];
    let clusters = vec!["alpha".to_string()];
    let backend = Arc::new(StubBackend {
        slow: vec![("alpha".to_string(), "SELECT 'q1'".to_string())],
        ..StubBackend::default()
    });

    let outcome = run_sweep(
        backend,
        &clusters,
        &queries,
        &options(1, 1, Duration::from_millis(100)),
        reporter(),
    )
    .unwrap();

    assert_eq!(outcome.records.len(), 1);
    let record = &outcome.records[0];
    assert_eq!(record.outcome, RunOutcome::Timeout);
    assert!(record.error.as_deref().unwrap().contains("timeout"));
    assert_eq!(record.rows, None);
}

#[test]
fn unreachable_cluster_is_skipped_without_aborting_the_sweep() {
    let queries = vec![query("q1"), query("q2")];
    let clusters = vec!["alpha".to_string(), "beta".to_string()];
    let backend = Arc::new(StubBackend {
        unreachable: vec!["beta".to_string()],
        ..StubBackend::default()
    });

    let outcome = run_sweep(
        backend,
        &clusters,
        &queries,
        &options(2, 2, Duration::from_secs(10)),
        reporter(),
    )
    .unwrap();

    assert_eq!(outcome.records.len(), 8);
    assert_eq!(outcome.skipped_clusters, vec!["beta".to_string()]);

    let beta_records = outcome
        .records
        .iter()
        .filter(|r| r.cluster == "beta")
        .collect::<Vec<_>>();
    assert_eq!(beta_records.len(), 4);
    assert!(beta_records.iter().all(|r| r.outcome == RunOutcome::Failure));
    assert!(beta_records
        .iter()
        .all(|r| r.error.as_deref().unwrap().contains("unreachable")));

    assert!(outcome
        .records
        .iter()
        .filter(|r| r.cluster == "alpha")
        .all(|r| r.outcome == RunOutcome::Success));
}

#[test]
fn sweep_with_nothing_to_run_fails_fast() {
    let backend = Arc::new(StubBackend::default());

    let no_queries = run_sweep(
        backend.clone(),
        &["alpha".to_string()],
        &[],
        &SweepOptions::default(),
        reporter(),
    );
    assert!(no_queries.is_err());

    let no_clusters = run_sweep(
        backend,
        &[],
        &[query("q1")],
        &SweepOptions::default(),
        reporter(),
    );
    assert!(no_clusters.is_err());
}

#[test]
fn sweep_with_no_reachable_cluster_fails_fast() {
    let backend = Arc::new(StubBackend {
        unreachable: vec!["alpha".to_string(), "beta".to_string()],
        ..StubBackend::default()
    });

    let result = run_sweep(
        backend,
        &["alpha".to_string(), "beta".to_string()],
        &[query("q1")],
        &SweepOptions::default(),
        reporter(),
    );

    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("could not start"));
}

#[test]
fn clean_sweep_reports_all_succeeded() {
    let backend = Arc::new(StubBackend::default());

    let outcome = run_sweep(
        backend,
        &["alpha".to_string()],
        &[query("q1")],
        &SweepOptions::default(),
        reporter(),
    )
    .unwrap();

    assert_eq!(outcome.status(), SweepStatus::AllSucceeded);
    assert_eq!(outcome.successes(), 1);
}
