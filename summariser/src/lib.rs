pub mod analyze;
pub mod compare;
pub mod emit;
pub mod model;

use lakebench_instruments::RunRecord;

use crate::model::BenchReport;

/// Derive the full report, aggregates plus cross-cluster comparisons, from one sweep's records.
pub fn summarise_records(records: &[RunRecord]) -> anyhow::Result<BenchReport> {
    let aggregates = analyze::aggregate(records)?;
    let comparisons = compare::compare(&aggregates);

    Ok(BenchReport {
        generated_at: chrono::Utc::now(),
        aggregates,
        comparisons,
    })
}
