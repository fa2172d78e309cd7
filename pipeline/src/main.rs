use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};

use lakebench_client::ClusterClient;
use lakebench_instruments::report::load_run_records;
use lakebench_instruments::ReportConfig;
use lakebench_pipeline::config::load_pipeline_config;
use lakebench_pipeline::constants::TPC_DS_TABLES;
use lakebench_pipeline::convert::FormatConverter;
use lakebench_pipeline::datagen::DataGenerator;
use lakebench_pipeline::{ddl, link};
use lakebench_pipeline::upload::HdfsUploader;
use lakebench_runner::prelude::{
    load_config, load_queries, run_sweep, HttpBackend, SweepArgs, SweepOptions, SweepStatus,
};
use lakebench_summariser::{emit, summarise_records};

/// Cross-cluster query benchmark for analytic engines.
#[derive(Parser)]
#[command(name = "lakebench", about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate TPC-DS source data with dsdgen
    Data(ConfigArgs),
    /// Convert the generated data into the benchmark formats
    Convert(ConfigArgs),
    /// Upload the formatted data to the configured distributed filesystems
    Upload(ConfigArgs),
    /// Generate, and optionally execute, the table DDL for every cluster
    Ddl(DdlArgs),
    /// Register each cluster as a catalog source on the others
    Link(ConfigArgs),
    /// Run the benchmark sweep
    Sweep(SweepArgs),
    /// Aggregate the latest sweep's run records into summary statistics
    Report(ConfigArgs),
    /// Run several pipeline steps in order
    Pipeline(PipelineArgs),
}

#[derive(Debug, Clone, clap::Args)]
struct ConfigArgs {
    /// Path to the benchmark configuration file
    #[clap(short, long, default_value = "lakebench.yaml")]
    config: PathBuf,
}

#[derive(Debug, Clone, clap::Args)]
struct DdlArgs {
    /// Path to the benchmark configuration file
    #[clap(short, long, default_value = "lakebench.yaml")]
    config: PathBuf,

    /// Submit the generated DDL to every configured cluster
    #[clap(long, default_value = "false")]
    execute: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Step {
    Data,
    Convert,
    Upload,
    Ddl,
    Link,
    Sweep,
    Report,
}

#[derive(Debug, Clone, clap::Args)]
struct PipelineArgs {
    /// Path to the benchmark configuration file
    #[clap(short, long, default_value = "lakebench.yaml")]
    config: PathBuf,

    /// Steps to run, in pipeline order
    #[clap(
        long,
        value_delimiter = ',',
        default_value = "data,convert,upload,ddl,link,sweep,report"
    )]
    steps: Vec<Step>,

    /// Submit the generated DDL instead of only writing the files
    #[clap(long, default_value = "false")]
    execute_ddl: bool,

    /// Do not show a progress bar during the sweep
    #[clap(long, default_value = "false")]
    no_progress: bool,
}

// CTAS over the raw uploaded files can legitimately run for a long time, so DDL execution does
// not reuse the per-query benchmark timeout.
const DDL_TIMEOUT: Duration = Duration::from_secs(3600);

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let code = match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            2
        }
    };
    std::process::exit(code);
}

fn run(command: Command) -> anyhow::Result<i32> {
    match command {
        Command::Data(args) => cmd_data(&args.config).map(|_| 0),
        Command::Convert(args) => cmd_convert(&args.config).map(|_| 0),
        Command::Upload(args) => cmd_upload(&args.config).map(|_| 0),
        Command::Ddl(args) => cmd_ddl(&args.config, args.execute).map(|_| 0),
        Command::Link(args) => cmd_link(&args.config).map(|_| 0),
        Command::Sweep(args) => cmd_sweep(&args),
        Command::Report(args) => cmd_report(&args.config).map(|_| 0),
        Command::Pipeline(args) => cmd_pipeline(&args),
    }
}

fn cmd_data(config_path: &PathBuf) -> anyhow::Result<()> {
    let pipeline = load_pipeline_config(config_path)?;
    let generator = DataGenerator::new(pipeline.data_generation.dsdgen_path.as_deref())?;
    generator.generate_all(&pipeline.pipeline.data_dir, &pipeline.pipeline.scale_factors)
}

fn cmd_convert(config_path: &PathBuf) -> anyhow::Result<()> {
    let pipeline = load_pipeline_config(config_path)?;
    let converter = FormatConverter::new(pipeline.convert.converter_bin.as_deref())?;
    converter.convert(
        &pipeline.pipeline.data_dir,
        &pipeline.pipeline.formatted_dir,
        &pipeline.pipeline.scale_factors,
        &pipeline.pipeline.formats,
    )
}

fn cmd_upload(config_path: &PathBuf) -> anyhow::Result<()> {
    let pipeline = load_pipeline_config(config_path)?;
    let endpoints = [
        ("simple-auth", &pipeline.hdfs.simple_auth),
        ("kerberized", &pipeline.hdfs.kerberized),
    ];
    anyhow::ensure!(
        endpoints.iter().any(|(_, endpoint)| endpoint.is_some()),
        "No hdfs endpoints configured, nothing to upload to"
    );

    for (label, endpoint) in endpoints {
        let Some(endpoint) = endpoint else {
            continue;
        };
        log::info!("Uploading to the {label} filesystem");
        let uploader = HdfsUploader::from_endpoint(endpoint)?;
        uploader.upload_tree(
            &pipeline.pipeline.formatted_dir,
            &pipeline.pipeline.hdfs_target_dir,
            &pipeline.pipeline.scale_factors,
            &pipeline.pipeline.formats,
        )?;
    }

    Ok(())
}

fn cmd_ddl(config_path: &PathBuf, execute: bool) -> anyhow::Result<()> {
    let pipeline = load_pipeline_config(config_path)?;
    let statements = ddl::generate_ddl(
        &pipeline.pipeline.hdfs_target_dir,
        &pipeline.pipeline.scale_factors,
        &pipeline.pipeline.formats,
        &TPC_DS_TABLES,
    );
    ddl::write_ddl_files(&statements, &pipeline.pipeline.ddl_dir)?;

    if !execute {
        return Ok(());
    }

    let config = load_config(config_path)?;
    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    for target in &config.clusters {
        let client = ClusterClient::connect(target.clone())?;
        let executed = runtime.block_on(ddl::execute_ddl(&client, &statements, DDL_TIMEOUT))?;
        log::info!("Executed {executed} DDL statements on cluster {}", target.id);
    }

    Ok(())
}

fn cmd_link(config_path: &PathBuf) -> anyhow::Result<()> {
    let pipeline = load_pipeline_config(config_path)?;
    let settings = pipeline
        .cross_cluster
        .context("No cross_cluster section configured")?;

    let config = load_config(config_path)?;
    anyhow::ensure!(
        config.clusters.len() >= 2,
        "Cross-cluster linking needs at least two clusters"
    );

    let clients = config
        .clusters
        .iter()
        .map(|target| ClusterClient::connect(target.clone()))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    runtime.block_on(link::link_all(&clients, &settings))
}

fn cmd_sweep(args: &SweepArgs) -> anyhow::Result<i32> {
    let mut config = load_config(&args.config)?;
    args.apply_to(&mut config.sweep);
    config.validate()?;

    let queries = load_queries(&config.sweep.query_dir)?;
    std::fs::create_dir_all(&config.sweep.output_dir)?;

    let reporter = Arc::new(
        ReportConfig::new()
            .enable_summary()
            .with_jsonl(config.sweep.output_dir.join("run_records.jsonl"))
            .init()?,
    );
    let backend = Arc::new(HttpBackend::connect(&config.clusters)?);
    let options = SweepOptions::from_settings(&config.sweep, args.no_progress);

    let outcome = run_sweep(
        backend,
        &config.cluster_ids(),
        &queries,
        &options,
        reporter,
    )?;

    if !outcome.skipped_clusters.is_empty() {
        log::warn!(
            "Clusters skipped entirely: {}",
            outcome.skipped_clusters.join(", ")
        );
    }

    Ok(match outcome.status() {
        SweepStatus::AllSucceeded => 0,
        SweepStatus::CompletedWithFailures => 1,
    })
}

fn cmd_report(config_path: &PathBuf) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let output_dir = &config.sweep.output_dir;

    let records = load_run_records(output_dir.join("run_records.jsonl"))?;
    anyhow::ensure!(!records.is_empty(), "No run records to report on");

    let report = summarise_records(&records)?;
    emit::write_summary_csv(&report.aggregates, &output_dir.join("summary.csv"))?;
    emit::write_comparison_csv(&report.comparisons, &output_dir.join("comparison.csv"))?;
    emit::write_report_json(
        &report,
        &output_dir.join(format!(
            "lakebench-report-{}.json",
            Utc::now().format("%Y-%m-%dT%H.%M.%S%.fZ")
        )),
    )?;
    emit::print_summary_table(&report.aggregates);

    Ok(())
}

fn cmd_pipeline(args: &PipelineArgs) -> anyhow::Result<i32> {
    let mut sweep_code = 0;

    for step in &args.steps {
        log::info!("=== Pipeline step: {step:?} ===");
        match step {
            Step::Data => cmd_data(&args.config)?,
            Step::Convert => cmd_convert(&args.config)?,
            Step::Upload => cmd_upload(&args.config)?,
            Step::Ddl => cmd_ddl(&args.config, args.execute_ddl)?,
            Step::Link => cmd_link(&args.config)?,
            Step::Sweep => {
                let sweep_args = SweepArgs {
                    config: args.config.clone(),
                    concurrency: None,
                    iterations: None,
                    timeout_secs: None,
                    query_dir: None,
                    output_dir: None,
                    no_progress: args.no_progress,
                };
                sweep_code = cmd_sweep(&sweep_args)?;
            }
            Step::Report => cmd_report(&args.config)?,
        }
    }

    Ok(sweep_code)
}
