use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod report;
pub mod sampler;

pub use report::{ReportCollector, ReportConfig, Reporter};
pub use sampler::{ResourceSample, ResourceSampler, SamplerHandle};

/// How a single run ended. Timeouts are tracked separately from failures so that reporting can
/// tell "slow" apart from "broken".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failure,
    Timeout,
}

/// The atomic unit of measurement: one query, against one cluster, one iteration.
///
/// Created exactly once per (cluster, query, iteration) triple by the run executor and immutable
/// afterwards. The constructors keep the cross-field invariants; [RunRecord::validate] re-checks
/// them at aggregation time and a violation there means a bug in the executor, not a runtime
/// condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub cluster: String,
    pub query: String,
    pub iteration: u32,
    pub started_at: DateTime<Utc>,
    pub duration_s: f64,
    pub outcome: RunOutcome,
    /// Engine or transport error, verbatim. Present iff the outcome is not a success.
    pub error: Option<String>,
    /// Rows returned. Present iff the outcome is a success.
    pub rows: Option<u64>,
    pub resources: ResourceSample,
}

impl RunRecord {
    pub fn success(
        cluster: impl Into<String>,
        query: impl Into<String>,
        iteration: u32,
        started_at: DateTime<Utc>,
        duration_s: f64,
        rows: u64,
        resources: ResourceSample,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            query: query.into(),
            iteration,
            started_at,
            duration_s: duration_s.max(0.0),
            outcome: RunOutcome::Success,
            error: None,
            rows: Some(rows),
            resources,
        }
    }

    pub fn failure(
        cluster: impl Into<String>,
        query: impl Into<String>,
        iteration: u32,
        started_at: DateTime<Utc>,
        duration_s: f64,
        error: impl Into<String>,
        resources: ResourceSample,
    ) -> Self {
        let error = error.into();
        Self {
            cluster: cluster.into(),
            query: query.into(),
            iteration,
            started_at,
            duration_s: duration_s.max(0.0),
            outcome: RunOutcome::Failure,
            error: Some(if error.is_empty() {
                "unspecified failure".to_string()
            } else {
                error
            }),
            rows: None,
            resources,
        }
    }

    pub fn timeout(
        cluster: impl Into<String>,
        query: impl Into<String>,
        iteration: u32,
        started_at: DateTime<Utc>,
        duration_s: f64,
        error: impl Into<String>,
        resources: ResourceSample,
    ) -> Self {
        let mut record = Self::failure(
            cluster, query, iteration, started_at, duration_s, error, resources,
        );
        record.outcome = RunOutcome::Timeout;
        record
    }

    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Success
    }

    /// Check the cross-field invariants. Aggregation calls this and treats a violation as fatal.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.duration_s.is_finite() || self.duration_s < 0.0 {
            anyhow::bail!(
                "run ({}, {}, {}) has invalid duration {}",
                self.cluster,
                self.query,
                self.iteration,
                self.duration_s
            );
        }

        match self.outcome {
            RunOutcome::Success => {
                if self.rows.is_none() || self.error.is_some() {
                    anyhow::bail!(
                        "successful run ({}, {}, {}) must carry rows and no error",
                        self.cluster,
                        self.query,
                        self.iteration
                    );
                }
            }
            RunOutcome::Failure | RunOutcome::Timeout => {
                if self.error.as_deref().map_or(true, str::is_empty) || self.rows.is_some() {
                    anyhow::bail!(
                        "unsuccessful run ({}, {}, {}) must carry an error and no rows",
                        self.cluster,
                        self.query,
                        self.iteration
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn constructors_satisfy_validate() {
        let sample = ResourceSample::unavailable();

        RunRecord::success("a", "q1", 0, now(), 1.5, 10, sample.clone())
            .validate()
            .unwrap();
        RunRecord::failure("a", "q1", 1, now(), 0.2, "boom", sample.clone())
            .validate()
            .unwrap();
        RunRecord::timeout("a", "q1", 2, now(), 5.0, "gave up after 5s", sample)
            .validate()
            .unwrap();
    }

    #[test]
    fn empty_failure_detail_is_replaced() {
        let record = RunRecord::failure("a", "q1", 0, now(), 0.0, "", ResourceSample::unavailable());

        assert_eq!(record.error.as_deref(), Some("unspecified failure"));
    }

    #[test]
    fn validate_rejects_success_without_rows() {
        let mut record =
            RunRecord::success("a", "q1", 0, now(), 1.0, 1, ResourceSample::unavailable());
        record.rows = None;

        assert!(record.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_duration() {
        let mut record =
            RunRecord::success("a", "q1", 0, now(), 1.0, 1, ResourceSample::unavailable());
        record.duration_s = -0.5;

        assert!(record.validate().is_err());
    }

    #[test]
    fn outcome_serializes_to_lowercase_labels() {
        assert_eq!(
            serde_json::to_string(&RunOutcome::Timeout).unwrap(),
            "\"timeout\""
        );
        assert_eq!(
            serde_json::from_str::<RunOutcome>("\"failure\"").unwrap(),
            RunOutcome::Failure
        );
    }
}
