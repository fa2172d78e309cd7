use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Distribution of wall clock durations over the successful runs of one (cluster, query) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub mean_s: f64,
    pub min_s: f64,
    pub max_s: f64,
    pub median_s: f64,
    pub p95_s: f64,
}

/// Mean resource utilisation over the runs of a group that carried samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResourceUsage {
    pub mean_cpu_pct: Option<f64>,
    pub mean_mem_mb: Option<f64>,
}

/// Statistical summary of every run sharing one (cluster, query) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStat {
    pub cluster: String,
    pub query: String,
    pub runs: usize,
    pub successes: usize,
    pub success_rate: f64,
    /// `None` is the explicit no-data marker for a group with zero successful runs. Duration
    /// statistics are never silently coerced to zero.
    pub duration: Option<DurationStats>,
    pub resources: ResourceUsage,
}

/// Relative speed of one query on two clusters.
///
/// `speedup` is `mean(baseline) / mean(candidate)`: a value above 1 means the candidate ran the
/// query faster than the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterComparison {
    pub query: String,
    pub baseline: String,
    pub candidate: String,
    pub speedup: f64,
}

/// Everything the summariser derives from one sweep's run records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchReport {
    pub generated_at: DateTime<Utc>,
    pub aggregates: Vec<AggregateStat>,
    pub comparisons: Vec<ClusterComparison>,
}
