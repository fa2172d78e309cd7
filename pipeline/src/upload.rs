use std::path::{Path, PathBuf};

use crate::command::{locate_tool, CommandRunner};
use crate::config::HdfsEndpoint;
use crate::constants::TPC_DS_TABLES;

/// Uploads formatted benchmark data to one cluster's distributed filesystem via the `hadoop`
/// CLI. Supports a simple-auth filesystem (user name only) and a kerberized one (kinit with a
/// keytab before any transfer).
pub struct HdfsUploader {
    hadoop: PathBuf,
    conf_dir: PathBuf,
    user: Option<String>,
    kerberos: Option<(PathBuf, String)>,
}

impl HdfsUploader {
    pub fn from_endpoint(endpoint: &HdfsEndpoint) -> anyhow::Result<Self> {
        let kerberos = match (&endpoint.keytab, &endpoint.principal) {
            (Some(keytab), Some(principal)) => Some((keytab.clone(), principal.clone())),
            (None, None) => None,
            _ => anyhow::bail!("A kerberized filesystem needs both a keytab and a principal"),
        };

        Ok(Self {
            hadoop: locate_tool("hadoop", endpoint.hadoop_bin.as_deref())?,
            conf_dir: endpoint.hadoop_conf.clone(),
            user: endpoint.user.clone(),
            kerberos,
        })
    }

    fn runner(&self) -> CommandRunner {
        let mut runner =
            CommandRunner::new().with_env("HADOOP_CONF_DIR", self.conf_dir.display().to_string());
        if let Some(user) = &self.user {
            runner = runner.with_env("HADOOP_USER_NAME", user.clone());
        }
        runner
    }

    /// Obtain a Kerberos ticket when the endpoint needs one. A no-op for simple auth.
    pub fn authenticate(&self) -> anyhow::Result<()> {
        let Some((keytab, principal)) = &self.kerberos else {
            return Ok(());
        };

        let kinit = locate_tool("kinit", None)?;
        let args = vec![
            "-kt".to_string(),
            keytab.display().to_string(),
            principal.clone(),
        ];
        let output = self
            .runner()
            .run(&kinit, &args, &format!("Kerberos login as {principal}"))?;
        anyhow::ensure!(
            output.success,
            "kinit failed for {principal}: {}",
            output.stderr.trim()
        );

        Ok(())
    }

    pub fn mkdir(&self, hdfs_path: &str) -> anyhow::Result<()> {
        let args = vec![
            "fs".to_string(),
            "-mkdir".to_string(),
            "-p".to_string(),
            hdfs_path.to_string(),
        ];
        let output = self
            .runner()
            .run(&self.hadoop, &args, &format!("Creating {hdfs_path}"))?;
        anyhow::ensure!(
            output.success,
            "hadoop fs -mkdir failed for {hdfs_path}: {}",
            output.stderr.trim()
        );
        Ok(())
    }

    pub fn put(&self, local: &Path, hdfs_path: &str) -> anyhow::Result<()> {
        let args = vec![
            "fs".to_string(),
            "-put".to_string(),
            "-f".to_string(),
            local.display().to_string(),
            hdfs_path.to_string(),
        ];
        let output = self.runner().run(
            &self.hadoop,
            &args,
            &format!("Uploading {} to {hdfs_path}", local.display()),
        )?;
        anyhow::ensure!(
            output.success,
            "hadoop fs -put failed for {}: {}",
            local.display(),
            output.stderr.trim()
        );
        Ok(())
    }

    /// Upload every (scale factor, format, table) directory that exists locally. Missing
    /// directories are skipped with a warning, a partially converted data set is usable.
    pub fn upload_tree(
        &self,
        local_dir: &Path,
        target_dir: &str,
        scale_factors: &[u32],
        formats: &[String],
    ) -> anyhow::Result<usize> {
        self.authenticate()?;

        let mut uploaded = 0;
        for &scale_factor in scale_factors {
            for format in formats {
                for table in TPC_DS_TABLES {
                    let local = local_dir
                        .join(format!("{scale_factor}gb"))
                        .join(format)
                        .join(table);
                    if !local.exists() {
                        log::warn!("Skipping missing local directory {}", local.display());
                        continue;
                    }

                    let remote = format!("{target_dir}/{scale_factor}gb/{format}/{table}");
                    self.mkdir(&remote)?;
                    self.put(&local, &remote)?;
                    uploaded += 1;
                }
            }
        }

        log::info!("Uploaded {uploaded} table directories to {target_dir}");
        Ok(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keytab_without_principal_is_rejected() {
        let endpoint = HdfsEndpoint {
            hadoop_bin: Some(PathBuf::from("/bin/true")),
            hadoop_conf: PathBuf::from("/etc/hadoop/conf"),
            user: None,
            keytab: Some(PathBuf::from("/etc/security/bench.keytab")),
            principal: None,
        };

        assert!(HdfsUploader::from_endpoint(&endpoint).is_err());
    }
}
