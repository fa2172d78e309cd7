mod jsonl_report;
mod summary_report;

use std::path::PathBuf;

use parking_lot::Mutex;

use crate::RunRecord;

pub use jsonl_report::{load_run_records, JsonlReportCollector};
pub use summary_report::SummaryReportCollector;

/// Sink for run records as they are produced by the workers.
pub trait ReportCollector {
    fn add_run(&mut self, record: &RunRecord);

    /// Called once, after the sweep has completed and every record has been added.
    fn finalize(&self);
}

/// Selects which collectors a sweep reports to.
#[derive(Debug, Default)]
pub struct ReportConfig {
    enable_summary: bool,
    jsonl_path: Option<PathBuf>,
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print a per-cluster summary table to the console when the sweep finishes.
    pub fn enable_summary(mut self) -> Self {
        self.enable_summary = true;
        self
    }

    /// Stream every run record to a JSONL file, one JSON object per line.
    pub fn with_jsonl(mut self, path: impl Into<PathBuf>) -> Self {
        self.jsonl_path = Some(path.into());
        self
    }

    pub fn init(self) -> anyhow::Result<Reporter> {
        let mut collectors: Vec<Box<dyn ReportCollector + Send>> = Vec::new();

        if self.enable_summary {
            collectors.push(Box::new(SummaryReportCollector::new()));
        }
        if let Some(path) = self.jsonl_path {
            collectors.push(Box::new(JsonlReportCollector::create(path)?));
        }

        Ok(Reporter {
            collectors: Mutex::new(collectors),
        })
    }
}

/// Fans run records out to every configured collector. Shared between workers behind an `Arc`.
pub struct Reporter {
    collectors: Mutex<Vec<Box<dyn ReportCollector + Send>>>,
}

impl Reporter {
    pub fn add_run(&self, record: &RunRecord) {
        let mut collectors = self.collectors.lock();
        for collector in collectors.iter_mut() {
            collector.add_run(record);
        }
    }

    pub fn finalize(&self) {
        let collectors = self.collectors.lock();
        for collector in collectors.iter() {
            collector.finalize();
        }
    }
}
