use std::path::PathBuf;

use crate::config::SweepSettings;

/// Command line flags for a benchmark sweep. Flags override the configuration file.
#[derive(Debug, Clone, clap::Args)]
pub struct SweepArgs {
    /// Path to the benchmark configuration file
    #[clap(short, long, default_value = "lakebench.yaml")]
    pub config: PathBuf,

    /// Maximum number of runs in flight at once
    #[clap(long)]
    pub concurrency: Option<usize>,

    /// Number of times each query is run against each cluster
    #[clap(long)]
    pub iterations: Option<u32>,

    /// Per-run timeout in seconds
    #[clap(long)]
    pub timeout_secs: Option<u64>,

    /// Directory of .sql files, one query per file
    #[clap(long)]
    pub query_dir: Option<PathBuf>,

    /// Directory that run records, summaries and reports are written to
    #[clap(long)]
    pub output_dir: Option<PathBuf>,

    /// Do not show a progress bar on the CLI.
    ///
    /// Recommended for CI/CD environments where the progress bar is just adding noise to the
    /// logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,
}

impl SweepArgs {
    pub fn apply_to(&self, settings: &mut SweepSettings) {
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(iterations) = self.iterations {
            settings.iterations = iterations;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            settings.timeout_secs = timeout_secs;
        }
        if let Some(query_dir) = &self.query_dir {
            settings.query_dir = query_dir.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            settings.output_dir = output_dir.clone();
        }
    }
}
