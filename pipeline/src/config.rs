use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::constants::{DATA_FORMATS, DEFAULT_SCALE_FACTORS};

/// Pipeline sections of the configuration file.
///
/// This deliberately reads the same YAML document as the sweep configuration, unknown sections
/// are ignored by both sides, so one `lakebench.yaml` drives the whole pipeline.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub data_generation: DataGenSettings,
    #[serde(default)]
    pub convert: ConvertSettings,
    #[serde(default)]
    pub hdfs: HdfsSettings,
    pub cross_cluster: Option<CrossClusterSettings>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    /// Data volumes to generate and benchmark against, in gigabytes.
    pub scale_factors: Vec<u32>,
    /// Storage formats the source data is converted into.
    pub formats: Vec<String>,
    /// Base directory on the distributed filesystem the data is uploaded to.
    pub hdfs_target_dir: String,
    /// Local directory the raw generated data lands in.
    pub data_dir: PathBuf,
    /// Local directory the converted data lands in.
    pub formatted_dir: PathBuf,
    /// Directory the generated DDL files are written to.
    pub ddl_dir: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            scale_factors: DEFAULT_SCALE_FACTORS.to_vec(),
            formats: DATA_FORMATS.iter().map(|f| f.to_string()).collect(),
            hdfs_target_dir: "/benchmark/tpcds".to_string(),
            data_dir: PathBuf::from("data"),
            formatted_dir: PathBuf::from("data/formatted"),
            ddl_dir: PathBuf::from("results/ddl"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DataGenSettings {
    /// Path to the dsdgen binary. Searched on PATH when not set.
    pub dsdgen_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ConvertSettings {
    /// Path to the format converter binary. Searched on PATH when not set.
    pub converter_bin: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct HdfsSettings {
    pub simple_auth: Option<HdfsEndpoint>,
    pub kerberized: Option<HdfsEndpoint>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HdfsEndpoint {
    /// Path to the hadoop binary. Searched on PATH when not set.
    pub hadoop_bin: Option<PathBuf>,
    pub hadoop_conf: PathBuf,
    /// Filesystem user for simple-auth endpoints.
    pub user: Option<String>,
    /// Keytab and principal for kerberized endpoints.
    pub keytab: Option<PathBuf>,
    pub principal: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CrossClusterSettings {
    /// Name the remote cluster is registered under in the local catalog.
    #[serde(default = "default_source_name")]
    pub source_name: String,
    pub user: String,
    pub password: String,
}

fn default_source_name() -> String {
    "remote".to_string()
}

/// Load the pipeline sections from the shared configuration file.
pub fn load_pipeline_config(path: &Path) -> anyhow::Result<PipelineConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read configuration file {}", path.display()))?;
    serde_yaml::from_str(&raw)
        .with_context(|| format!("Invalid pipeline configuration in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: PipelineConfig = serde_yaml::from_str("clusters: []").unwrap();

        assert_eq!(config.pipeline, PipelineSettings::default());
        assert_eq!(config.pipeline.scale_factors, vec![1, 10]);
        assert_eq!(config.pipeline.formats.len(), 5);
        assert!(config.cross_cluster.is_none());
    }

    #[test]
    fn pipeline_sections_parse_alongside_sweep_sections() {
        let config: PipelineConfig = serde_yaml::from_str(
            r#"
clusters:
  - id: alpha
sweep:
  concurrency: 4
pipeline:
  scale_factors: [1]
  formats: [parquet]
  hdfs_target_dir: /bench
data_generation:
  dsdgen_path: /opt/tpcds/dsdgen
hdfs:
  kerberized:
    hadoop_conf: /etc/hadoop/conf
    keytab: /etc/security/bench.keytab
    principal: bench@EXAMPLE.COM
cross_cluster:
  user: cross
  password: secret
"#,
        )
        .unwrap();

        assert_eq!(config.pipeline.scale_factors, vec![1]);
        assert_eq!(config.pipeline.formats, vec!["parquet"]);
        assert_eq!(
            config.data_generation.dsdgen_path,
            Some(PathBuf::from("/opt/tpcds/dsdgen"))
        );
        let kerberized = config.hdfs.kerberized.unwrap();
        assert_eq!(kerberized.principal.as_deref(), Some("bench@EXAMPLE.COM"));
        let cross = config.cross_cluster.unwrap();
        assert_eq!(cross.source_name, "remote");
        assert_eq!(cross.user, "cross");
    }
}
