use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::model::{AggregateStat, BenchReport, ClusterComparison};

/// Column set of the summary CSV. Downstream charting keys on these names, the order and
/// spelling are part of the output contract.
pub const SUMMARY_COLUMNS: [&str; 12] = [
    "cluster",
    "query",
    "runs",
    "successes",
    "success_rate",
    "mean_s",
    "min_s",
    "max_s",
    "median_s",
    "p95_s",
    "mean_cpu_pct",
    "mean_mem_mb",
];

/// Write one row per (cluster, query). Groups with no successful runs leave their duration
/// cells empty, the no-data marker is never rendered as a zero.
pub fn write_summary_csv(stats: &[AggregateStat], path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create summary file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", SUMMARY_COLUMNS.join(","))?;
    for stat in stats {
        let duration_cells = match &stat.duration {
            Some(d) => [
                d.mean_s.to_string(),
                d.min_s.to_string(),
                d.max_s.to_string(),
                d.median_s.to_string(),
                d.p95_s.to_string(),
            ],
            None => Default::default(),
        };

        let cells = [
            csv_field(&stat.cluster),
            csv_field(&stat.query),
            stat.runs.to_string(),
            stat.successes.to_string(),
            stat.success_rate.to_string(),
            duration_cells[0].clone(),
            duration_cells[1].clone(),
            duration_cells[2].clone(),
            duration_cells[3].clone(),
            duration_cells[4].clone(),
            stat.resources
                .mean_cpu_pct
                .map(|v| v.to_string())
                .unwrap_or_default(),
            stat.resources
                .mean_mem_mb
                .map(|v| v.to_string())
                .unwrap_or_default(),
        ];
        writeln!(writer, "{}", cells.join(","))?;
    }
    writer.flush()?;

    log::info!("Summary written to {}", path.display());
    Ok(())
}

pub fn write_comparison_csv(
    comparisons: &[ClusterComparison],
    path: &Path,
) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create comparison file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "query,baseline,candidate,speedup")?;
    for comparison in comparisons {
        writeln!(
            writer,
            "{},{},{},{}",
            csv_field(&comparison.query),
            csv_field(&comparison.baseline),
            csv_field(&comparison.candidate),
            comparison.speedup
        )?;
    }
    writer.flush()?;

    log::info!("Comparisons written to {}", path.display());
    Ok(())
}

pub fn write_report_json(report: &BenchReport, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create report file {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)?;

    log::info!("Report written to {}", path.display());
    Ok(())
}

#[derive(Tabled)]
struct StatRow {
    cluster: String,
    query: String,
    runs: usize,
    successes: usize,
    success_rate: String,
    mean_s: String,
    median_s: String,
    p95_s: String,
}

pub fn print_summary_table(stats: &[AggregateStat]) {
    println!("\nPer-query statistics");
    let rows = stats
        .iter()
        .map(|stat| {
            let duration_cell = |value: Option<f64>| {
                value
                    .map(|v| format!("{v:.3}"))
                    .unwrap_or_else(|| "n/a".to_string())
            };

            StatRow {
                cluster: stat.cluster.clone(),
                query: stat.query.clone(),
                runs: stat.runs,
                successes: stat.successes,
                success_rate: format!("{:.0}%", stat.success_rate * 100.0),
                mean_s: duration_cell(stat.duration.as_ref().map(|d| d.mean_s)),
                median_s: duration_cell(stat.duration.as_ref().map(|d| d.median_s)),
                p95_s: duration_cell(stat.duration.as_ref().map(|d| d.p95_s)),
            }
        })
        .collect::<Vec<_>>();

    let mut table = Table::new(rows);
    table.with(Style::modern());

    println!("{table}");
}

/// Quote a field when it would break the delimited format. Identifiers are normally file stems
/// and cluster ids, so this is rarely exercised.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DurationStats, ResourceUsage};
    use pretty_assertions::assert_eq;

    fn stats() -> Vec<AggregateStat> {
        vec![
            AggregateStat {
                cluster: "alpha".to_string(),
                query: "q1".to_string(),
                runs: 4,
                successes: 4,
                success_rate: 1.0,
                duration: Some(DurationStats {
                    mean_s: 2.5,
                    min_s: 1.0,
                    max_s: 4.0,
                    median_s: 2.5,
                    p95_s: 3.85,
                }),
                resources: ResourceUsage {
                    mean_cpu_pct: Some(42.5),
                    mean_mem_mb: None,
                },
            },
            AggregateStat {
                cluster: "beta".to_string(),
                query: "q1".to_string(),
                runs: 4,
                successes: 0,
                success_rate: 0.0,
                duration: None,
                resources: ResourceUsage::default(),
            },
        ]
    }

    #[test]
    fn summary_csv_has_stable_columns_and_empty_no_data_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        write_summary_csv(&stats(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let expected = "\
cluster,query,runs,successes,success_rate,mean_s,min_s,max_s,median_s,p95_s,mean_cpu_pct,mean_mem_mb
alpha,q1,4,4,1,2.5,1,4,2.5,3.85,42.5,
beta,q1,4,0,0,,,,,,,
";
        assert_eq!(written, expected);
    }

    #[test]
    fn comparison_csv_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comparison.csv");

        write_comparison_csv(
            &[ClusterComparison {
                query: "q1".to_string(),
                baseline: "alpha".to_string(),
                candidate: "beta".to_string(),
                speedup: 2.0,
            }],
            &path,
        )
        .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "query,baseline,candidate,speedup\nq1,alpha,beta,2\n");
    }

    #[test]
    fn awkward_identifiers_are_quoted() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("with,comma"), "\"with,comma\"");
        assert_eq!(csv_field("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn report_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = BenchReport {
            generated_at: chrono::Utc::now(),
            aggregates: stats(),
            comparisons: vec![],
        };

        write_report_json(&report, &path).unwrap();

        let loaded: BenchReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);
    }
}
