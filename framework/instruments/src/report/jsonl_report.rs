use std::fs::File;
use std::io::{LineWriter, Write};
use std::path::PathBuf;

use crate::report::ReportCollector;
use crate::RunRecord;

/// Streams run records to a file as they complete, one JSON object per line.
///
/// The file is the machine-readable output of a sweep and the input to the summariser.
pub struct JsonlReportCollector {
    path: PathBuf,
    writer: LineWriter<File>,
}

impl JsonlReportCollector {
    pub fn create(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let writer = LineWriter::new(File::create(&path)?);

        Ok(Self { path, writer })
    }
}

impl ReportCollector for JsonlReportCollector {
    fn add_run(&mut self, record: &RunRecord) {
        match serde_json::to_string(record) {
            Ok(line) => {
                if let Err(e) = writeln!(self.writer, "{line}") {
                    log::warn!("Failed to write run record to {}: {e}", self.path.display());
                }
            }
            Err(e) => log::warn!("Failed to serialize run record: {e}"),
        }
    }

    fn finalize(&self) {
        log::info!("Run records written to {}", self.path.display());
    }
}

/// Load every record from a JSONL file written by [JsonlReportCollector].
pub fn load_run_records(path: impl Into<PathBuf>) -> anyhow::Result<Vec<RunRecord>> {
    use std::io::BufRead;

    let path = path.into();
    let file = File::open(&path)
        .map_err(|e| anyhow::anyhow!("Cannot open run records at {}: {e}", path.display()))?;

    let mut records = Vec::new();
    for (index, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: RunRecord = serde_json::from_str(&line).map_err(|e| {
            anyhow::anyhow!("Invalid run record on line {} of {}: {e}", index + 1, path.display())
        })?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceSample;
    use pretty_assertions::assert_eq;

    #[test]
    fn records_round_trip_through_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_records.jsonl");

        let records = vec![
            RunRecord::success(
                "alpha",
                "q01",
                0,
                chrono::Utc::now(),
                1.25,
                100,
                ResourceSample::unavailable(),
            ),
            RunRecord::timeout(
                "beta",
                "q01",
                1,
                chrono::Utc::now(),
                60.0,
                "query timed out after 60s",
                ResourceSample::unavailable(),
            ),
        ];

        let mut collector = JsonlReportCollector::create(&path).unwrap();
        for record in &records {
            collector.add_run(record);
        }
        drop(collector);

        let loaded = load_run_records(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn load_rejects_garbage_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "not json\n").unwrap();

        assert!(load_run_records(&path).is_err());
    }
}
