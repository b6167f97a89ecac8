use crate::adapters::workspace::Workspace;
use crate::domain::model::{GeneratedTestModule, ToolCommand, ToolOutput};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn git_repo_url(&self) -> &str;
    fn unittest_c_file(&self) -> &str;
    fn unittest_header_file(&self) -> &str;
    /// `None` selects the bundled template.
    fn template_file(&self) -> Option<&Path>;
    fn test_command(&self) -> &[String];
    fn coverage_artifact(&self) -> Option<&str>;
    fn tool_timeout(&self) -> Duration;
}

/// Executes external programs. Non-zero exits are reported in `ToolOutput`, not as errors.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Checks the configuration. Runs before the workspace is locked or touched.
    async fn validate(&self) -> Result<()>;
    /// Clears stale state and clones the repository; returns the clone root.
    async fn prepare(&self) -> Result<PathBuf>;
    /// Locates, extracts and synthesizes; the module is written into the workspace.
    async fn generate(&self, repo_root: &Path) -> Result<GeneratedTestModule>;
    async fn execute(&self, module: &GeneratedTestModule) -> Result<ToolOutput>;
    /// Returns the entry document of the HTML coverage report.
    async fn report(&self, module: &GeneratedTestModule) -> Result<PathBuf>;
    async fn cleanup(&self) -> Result<()>;
    fn workspace(&self) -> &Workspace;
}
