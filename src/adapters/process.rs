use crate::domain::model::{ToolCommand, ToolOutput};
use crate::domain::ports::Runner;
use crate::utils::error::{Result, ScaffoldError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Runs tools as child processes, killing any that outlive `timeout`.
#[derive(Debug, Clone)]
pub struct TokioRunner {
    timeout: Duration,
}

impl TokioRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Runner for TokioRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        tracing::debug!("Running: {}", command.display());

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &command.env {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|source| ScaffoldError::ToolSpawnError {
            tool: command.program.clone(),
            source,
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ScaffoldError::ToolTimeout {
                    tool: command.program.clone(),
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        // Killed by a signal: no code, report as generic failure.
        let status = output.status.code().unwrap_or(1);
        tracing::debug!("{} exited with status {}", command.program, status);

        Ok(ToolOutput {
            status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_status_and_output() {
        let runner = TokioRunner::new(Duration::from_secs(10));
        let command = ToolCommand::new("sh")
            .arg("-c")
            .arg("echo out; echo err >&2; exit 3");

        let output = runner.run(&command).await.unwrap();
        assert_eq!(output.status, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn test_passes_env_and_cwd() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let runner = TokioRunner::new(Duration::from_secs(10));
        let command = ToolCommand::new("sh")
            .args(["-c", "echo $GREETING; pwd"])
            .env("GREETING", "hello")
            .current_dir(temp_dir.path());

        let output = runner.run(&command).await.unwrap();
        let lines: Vec<&str> = output.stdout.lines().collect();
        assert_eq!(lines[0], "hello");
        assert!(lines[1].ends_with(
            temp_dir.path().file_name().unwrap().to_str().unwrap()
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let runner = TokioRunner::new(Duration::from_secs(10));
        let err = runner
            .run(&ToolCommand::new("cscaffold-no-such-tool"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::ToolSpawnError { .. }));
    }

    #[tokio::test]
    async fn test_slow_tool_times_out() {
        let runner = TokioRunner::new(Duration::from_millis(100));
        let err = runner
            .run(&ToolCommand::new("sleep").arg("5"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::ToolTimeout { ref tool, .. } if tool == "sleep"));
    }
}
