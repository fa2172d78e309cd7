use std::path::{Path, PathBuf};

use crate::command::{locate_tool, CommandRunner};

/// Adapter around the external converter that turns dsdgen's pipe-delimited output into the
/// benchmark formats. One invocation per (scale factor, format).
pub struct FormatConverter {
    converter: PathBuf,
}

impl FormatConverter {
    pub fn new(configured: Option<&Path>) -> anyhow::Result<Self> {
        Ok(Self {
            converter: locate_tool("tpcds-convert", configured)?,
        })
    }

    pub fn convert(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        scale_factors: &[u32],
        formats: &[String],
    ) -> anyhow::Result<()> {
        let runner = CommandRunner::new();

        for &scale_factor in scale_factors {
            for format in formats {
                let target_dir = output_dir.join(format!("{scale_factor}gb")).join(format);
                std::fs::create_dir_all(&target_dir)?;

                let args = vec![
                    "--input-dir".to_string(),
                    input_dir.join(format!("{scale_factor}gb")).display().to_string(),
                    "--output-dir".to_string(),
                    target_dir.display().to_string(),
                    "--format".to_string(),
                    format.clone(),
                ];

                let output = runner.run(
                    &self.converter,
                    &args,
                    &format!("Conversion to {format} at {scale_factor}GB"),
                )?;
                anyhow::ensure!(
                    output.success,
                    "Conversion to {format} at scale factor {scale_factor} failed: {}",
                    output.stderr.trim()
                );
            }
        }

        Ok(())
    }
}
