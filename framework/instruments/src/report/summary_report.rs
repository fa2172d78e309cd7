use std::collections::HashMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::report::ReportCollector;
use crate::{RunOutcome, RunRecord};

/// Keeps per-cluster run totals in memory and prints the operator summary when the sweep ends.
///
/// This is the "did the benchmark run at all" view: attempted/succeeded/failed/timed-out counts
/// per cluster. The per-query statistics are the summariser's job.
pub struct SummaryReportCollector {
    records: Vec<RunRecord>,
}

#[derive(Tabled)]
struct ClusterRow {
    cluster: String,
    runs: usize,
    succeeded: usize,
    failed: usize,
    timed_out: usize,
    #[tabled(display = "float2")]
    avg_success_time_s: f64,
}

fn float2(n: &f64) -> String {
    if n.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.2}", n)
    }
}

impl SummaryReportCollector {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    fn print_summary_of_runs(&self) {
        println!("\nSummary of runs");
        let mut rows = self
            .records
            .iter()
            .fold(HashMap::new(), |mut acc, record| {
                match acc.entry(record.cluster.clone()) {
                    std::collections::hash_map::Entry::Vacant(entry) => {
                        entry.insert(vec![record]);
                    }
                    std::collections::hash_map::Entry::Occupied(mut entry) => {
                        entry.get_mut().push(record);
                    }
                }
                acc
            })
            .into_iter()
            .map(|(cluster, runs)| {
                let succeeded = runs.iter().filter(|r| r.is_success()).count();
                let failed = runs
                    .iter()
                    .filter(|r| r.outcome == RunOutcome::Failure)
                    .count();
                let timed_out = runs
                    .iter()
                    .filter(|r| r.outcome == RunOutcome::Timeout)
                    .count();
                let total_success_time = runs
                    .iter()
                    .filter(|r| r.is_success())
                    .map(|r| r.duration_s)
                    .sum::<f64>();

                ClusterRow {
                    cluster,
                    runs: runs.len(),
                    succeeded,
                    failed,
                    timed_out,
                    avg_success_time_s: total_success_time / succeeded as f64,
                }
            })
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| a.cluster.cmp(&b.cluster));

        let mut table = Table::new(rows);
        table.with(Style::modern());

        println!("{table}");
    }
}

impl Default for SummaryReportCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportCollector for SummaryReportCollector {
    fn add_run(&mut self, record: &RunRecord) {
        self.records.push(record.clone());
    }

    fn finalize(&self) {
        if self.records.is_empty() {
            log::warn!("No runs were recorded, nothing to summarise");
            return;
        }
        self.print_summary_of_runs();
    }
}
