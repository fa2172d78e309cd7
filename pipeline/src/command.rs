use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use anyhow::Context;

/// Structured result of one external process invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Runs the external tools the pipeline leans on (dsdgen, hadoop, kinit, converters) and turns
/// their exits into structured results instead of scattered subprocess calls.
#[derive(Debug, Default, Clone)]
pub struct CommandRunner {
    env: Vec<(String, String)>,
    cwd: Option<PathBuf>,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Run the program to completion, capturing its output.
    ///
    /// A non-zero exit is not an error here, it is reported through [CommandOutput::success] so
    /// that callers decide whether a step is fatal. Only failing to start the process at all is
    /// an `Err`.
    pub fn run(
        &self,
        program: &Path,
        args: &[String],
        description: &str,
    ) -> anyhow::Result<CommandOutput> {
        log::info!("Running {description}...");
        log::debug!("Command: {} {}", program.display(), args.join(" "));

        let mut command = Command::new(program);
        command.args(args);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        let started = Instant::now();
        let output = command
            .output()
            .with_context(|| format!("Failed to start {}", program.display()))?;
        let duration = started.elapsed();

        let result = CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration,
        };

        if result.success {
            log::info!("{description} completed in {:.1}s", duration.as_secs_f64());
        } else {
            log::error!(
                "{description} failed with exit code {:?}: {}",
                result.exit_code,
                result.stderr.trim()
            );
        }

        Ok(result)
    }
}

/// Resolve an external tool: an explicitly configured path wins, otherwise search `PATH`.
pub fn locate_tool(name: &str, configured: Option<&Path>) -> anyhow::Result<PathBuf> {
    match configured {
        Some(path) => {
            anyhow::ensure!(
                path.exists(),
                "Configured path for {name} does not exist: {}",
                path.display()
            );
            Ok(path.to_path_buf())
        }
        None => which::which(name)
            .with_context(|| format!("{name} not found on PATH and no path configured")),
    }
}
