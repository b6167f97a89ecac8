use crate::core::Pipeline;
use crate::domain::model::RunSummary;
use crate::utils::error::Result;

pub struct ScaffoldEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ScaffoldEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Validates, then runs every stage in order under the workspace lock.
    /// Once the lock is held, the clone and build artifacts are removed
    /// afterwards whether or not a stage failed.
    pub async fn run(&self) -> Result<RunSummary> {
        self.pipeline.validate().await?;

        let _lock = self.pipeline.workspace().lock()?;

        let outcome = self.run_stages().await;

        if let Err(e) = self.pipeline.cleanup().await {
            tracing::warn!("Workspace cleanup failed: {}", e);
        }

        outcome
    }

    async fn run_stages(&self) -> Result<RunSummary> {
        tracing::info!("Preparing workspace...");
        let repo_root = self.pipeline.prepare().await?;

        tracing::info!("Generating test module...");
        let module = self.pipeline.generate(&repo_root).await?;

        tracing::info!("Running generated tests...");
        let output = self.pipeline.execute(&module).await?;
        if !output.stdout.trim().is_empty() {
            tracing::debug!("Test output:\n{}", output.stdout.trim_end());
        }
        if !output.stderr.trim().is_empty() {
            tracing::debug!("Test diagnostics:\n{}", output.stderr.trim_end());
        }

        tracing::info!("Collecting coverage...");
        let report_index = self.pipeline.report(&module).await?;

        Ok(RunSummary {
            module_path: self.pipeline.workspace().module_path(&module.file_name),
            report_index,
        })
    }
}
