use std::path::{Path, PathBuf};

use crate::command::{locate_tool, CommandRunner};

/// Adapter around the external TPC-DS `dsdgen` generator.
///
/// dsdgen writes pipe-delimited `.dat` files, one per table, into the target directory. It
/// insists on being run from its own directory because it loads `tpcds.idx` from there.
pub struct DataGenerator {
    dsdgen: PathBuf,
}

impl DataGenerator {
    pub fn new(configured: Option<&Path>) -> anyhow::Result<Self> {
        Ok(Self {
            dsdgen: locate_tool("dsdgen", configured)?,
        })
    }

    pub fn generate(&self, output_dir: &Path, scale_factor: u32) -> anyhow::Result<()> {
        let scale_dir = output_dir.join(format!("{scale_factor}gb"));
        std::fs::create_dir_all(&scale_dir)?;

        let runner = match self.dsdgen.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                CommandRunner::new().with_cwd(parent)
            }
            _ => CommandRunner::new(),
        };

        let args = vec![
            "-SCALE".to_string(),
            scale_factor.to_string(),
            "-DIR".to_string(),
            scale_dir
                .canonicalize()
                .unwrap_or(scale_dir.clone())
                .display()
                .to_string(),
            "-FORCE".to_string(),
        ];

        let output = runner.run(
            &self.dsdgen,
            &args,
            &format!("TPC-DS data generation at {scale_factor}GB"),
        )?;
        anyhow::ensure!(
            output.success,
            "dsdgen failed at scale factor {scale_factor}: {}",
            output.stderr.trim()
        );

        Ok(())
    }

    pub fn generate_all(&self, output_dir: &Path, scale_factors: &[u32]) -> anyhow::Result<()> {
        for &scale_factor in scale_factors {
            self.generate(output_dir, scale_factor)?;
        }
        log::info!(
            "Generated data for {} scale factors under {}",
            scale_factors.len(),
            output_dir.display()
        );
        Ok(())
    }
}
