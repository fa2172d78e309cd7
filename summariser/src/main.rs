use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use lakebench_instruments::report::load_run_records;
use lakebench_summariser::{emit, summarise_records};

/// Reduce the run records of one sweep into per-query, per-cluster statistics.
#[derive(Parser)]
#[command(about, long_about = None)]
struct Cli {
    /// Run records produced by a sweep, one JSON object per line
    #[clap(short, long, default_value = "results/run_records.jsonl")]
    records: PathBuf,

    /// Directory the summary, comparison and report files are written to
    #[clap(short, long, default_value = "results")]
    output_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let records = load_run_records(&cli.records)?;
    anyhow::ensure!(
        !records.is_empty(),
        "No run records found in {}",
        cli.records.display()
    );
    log::info!("Loaded {} run records", records.len());

    let report = summarise_records(&records)?;

    std::fs::create_dir_all(&cli.output_dir)?;
    emit::write_summary_csv(&report.aggregates, &cli.output_dir.join("summary.csv"))?;
    emit::write_comparison_csv(&report.comparisons, &cli.output_dir.join("comparison.csv"))?;
    emit::write_report_json(
        &report,
        &cli.output_dir.join(format!(
            "lakebench-report-{}.json",
            Utc::now().format("%Y-%m-%dT%H.%M.%S%.fZ")
        )),
    )?;

    emit::print_summary_table(&report.aggregates);

    Ok(())
}
