use std::path::{Path, PathBuf};

use anyhow::Context;
use lakebench_client::ClusterTarget;
use serde::Deserialize;

/// Benchmark configuration, resolved once before the scheduler starts.
///
/// Resolution order is fixed: values come from the YAML file, credential fields may then be
/// overridden from the environment, and CLI flags are applied on top by the caller. The result
/// is immutable for the rest of the session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenchConfig {
    pub clusters: Vec<ClusterTarget>,
    #[serde(default)]
    pub sweep: SweepSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    /// Maximum number of runs in flight at once.
    pub concurrency: usize,
    /// Number of times each query is run against each cluster.
    pub iterations: u32,
    /// Per-run timeout in seconds.
    pub timeout_secs: u64,
    /// Directory of `.sql` files, one query per file.
    pub query_dir: PathBuf,
    /// Directory that run records, summaries and reports are written to.
    pub output_dir: PathBuf,
    /// Resource sampling interval in milliseconds.
    pub sample_interval_ms: u64,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            iterations: 1,
            timeout_secs: 300,
            query_dir: PathBuf::from("queries"),
            output_dir: PathBuf::from("results"),
            sample_interval_ms: 500,
        }
    }
}

/// Load the configuration file and apply environment overrides.
pub fn load_config(path: &Path) -> anyhow::Result<BenchConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read configuration file {}", path.display()))?;
    let mut config: BenchConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    config.apply_env_overrides(|name| std::env::var(name).ok());
    config.validate()?;

    log::info!(
        "Loaded configuration for {} clusters from {}",
        config.clusters.len(),
        path.display()
    );

    Ok(config)
}

impl BenchConfig {
    /// Credential fields can be supplied as `LAKEBENCH_<CLUSTER_ID>_USERNAME` / `_PASSWORD`
    /// instead of being written into the file. Environment values win over file values.
    pub(crate) fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        for cluster in &mut self.clusters {
            let key = cluster.id.to_uppercase().replace('-', "_");
            if let Some(username) = var(&format!("LAKEBENCH_{key}_USERNAME")) {
                cluster.username = username;
            }
            if let Some(password) = var(&format!("LAKEBENCH_{key}_PASSWORD")) {
                cluster.password = password;
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.clusters.is_empty(), "No clusters configured");
        anyhow::ensure!(self.sweep.concurrency >= 1, "concurrency must be at least 1");
        anyhow::ensure!(self.sweep.iterations >= 1, "iterations must be at least 1");
        anyhow::ensure!(self.sweep.timeout_secs >= 1, "timeout_secs must be at least 1");

        let mut seen = std::collections::HashSet::new();
        for cluster in &self.clusters {
            anyhow::ensure!(
                seen.insert(cluster.id.as_str()),
                "Duplicate cluster id {}",
                cluster.id
            );
        }

        Ok(())
    }

    pub fn cluster_ids(&self) -> Vec<String> {
        self.clusters.iter().map(|c| c.id.clone()).collect()
    }
}
