use crate::adapters::workspace::Workspace;
use crate::domain::model::ToolCommand;
use crate::domain::ports::Runner;
use crate::utils::error::Result;
use std::path::PathBuf;

/// gcov → lcov → genhtml over the artifacts left in the workspace.
pub struct CoverageReporter<'a, R: Runner> {
    runner: &'a R,
    workspace: &'a Workspace,
}

impl<'a, R: Runner> CoverageReporter<'a, R> {
    pub fn new(runner: &'a R, workspace: &'a Workspace) -> Self {
        Self { runner, workspace }
    }

    fn steps(&self, artifact: &str) -> Vec<(&'static str, ToolCommand)> {
        let root = self.workspace.root();
        let coverage_data = self.workspace.coverage_data_path();
        vec![
            (
                "gcov",
                ToolCommand::new("gcov")
                    .args(["-b", "-c", artifact])
                    .current_dir(root),
            ),
            (
                "lcov",
                ToolCommand::new("lcov")
                    .arg("--capture")
                    .arg("--directory")
                    .arg(root.to_string_lossy())
                    .arg("--output-file")
                    .arg(coverage_data.to_string_lossy())
                    .current_dir(root),
            ),
            (
                "genhtml",
                ToolCommand::new("genhtml")
                    .arg(coverage_data.to_string_lossy())
                    .arg("--output-directory")
                    .arg(self.workspace.report_path().to_string_lossy())
                    .current_dir(root),
            ),
        ]
    }

    /// Returns the report's `index.html`. Stops at the first failing tool.
    pub async fn report(&self, artifact: &str) -> Result<PathBuf> {
        for (tool, command) in self.steps(artifact) {
            tracing::info!("Coverage step: {}", command.display());
            let output = self.runner.run(&command).await?.check(tool)?;
            if !output.stdout.trim().is_empty() {
                tracing::debug!("{} output:\n{}", tool, output.stdout.trim_end());
            }
        }

        Ok(self.workspace.report_path().join("index.html"))
    }
}
