use crate::adapters::workspace::Workspace;
use crate::core::coverage::CoverageReporter;
use crate::core::synthesizer::{self, BUNDLED_TEMPLATE};
use crate::core::{extractor, locator};
use crate::domain::model::{FileKind, GeneratedTestModule, SourceFile, ToolCommand, ToolOutput};
use crate::domain::ports::{ConfigProvider, Pipeline, Runner};
use crate::utils::error::Result;
use crate::utils::validation::validate_git_url;
use std::path::{Path, PathBuf};

pub struct ScaffoldPipeline<R: Runner, C: ConfigProvider> {
    runner: R,
    config: C,
    workspace: Workspace,
}

impl<R: Runner, C: ConfigProvider> ScaffoldPipeline<R, C> {
    pub fn new(runner: R, config: C, workspace: Workspace) -> Self {
        Self {
            runner,
            config,
            workspace,
        }
    }

    /// Template text plus the extension generated modules inherit from it.
    fn load_template(&self) -> Result<(String, String)> {
        match self.config.template_file() {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                let extension = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| format!(".{}", e))
                    .unwrap_or_default();
                Ok((text, extension))
            }
            None => Ok((BUNDLED_TEMPLATE.to_string(), ".py".to_string())),
        }
    }

    fn coverage_artifact(&self, module: &GeneratedTestModule) -> String {
        match self.config.coverage_artifact() {
            Some(artifact) => artifact.to_string(),
            // The bundled template compiles into `_<module stem>.c`.
            None => {
                let stem = Path::new(&module.file_name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(&module.file_name);
                format!("_{}.c", stem)
            }
        }
    }
}

#[async_trait::async_trait]
impl<R: Runner, C: ConfigProvider> Pipeline for ScaffoldPipeline<R, C> {
    async fn validate(&self) -> Result<()> {
        validate_git_url("git_repo_url", self.config.git_repo_url())
    }

    async fn prepare(&self) -> Result<PathBuf> {
        self.workspace.clean()?;
        std::fs::create_dir_all(self.workspace.root())?;

        let repo_path = self.workspace.repo_path();
        let clone = ToolCommand::new("git")
            .args(["clone", "--depth", "1", self.config.git_repo_url()])
            .arg(repo_path.to_string_lossy())
            .current_dir(self.workspace.root());

        tracing::info!("Cloning {}", self.config.git_repo_url());
        self.runner.run(&clone).await?.check("git")?;

        Ok(repo_path)
    }

    async fn generate(&self, repo_root: &Path) -> Result<GeneratedTestModule> {
        let c_path = locator::locate(
            repo_root,
            self.config.unittest_c_file(),
            FileKind::Implementation.extension(),
        )?;
        let h_path = locator::locate(
            repo_root,
            self.config.unittest_header_file(),
            FileKind::Header.extension(),
        )?;
        tracing::info!("Implementation: {}", c_path.display());
        tracing::info!("Header: {}", h_path.display());

        let implementation = SourceFile::read(&c_path, FileKind::Implementation)?;
        let header = SourceFile::read(&h_path, FileKind::Header)?;
        for file in [&implementation, &header] {
            tracing::debug!(
                "Read {:?} file {} ({} bytes)",
                file.kind(),
                file.path().display(),
                file.content().len()
            );
        }

        let extraction = extractor::extract(header.content());
        if extraction.is_empty() {
            tracing::warn!("No declarations found in {}", header.path().display());
        }

        let (template, extension) = self.load_template()?;
        let content = synthesizer::synthesize(
            &template,
            &extraction.declarations(),
            implementation.content(),
        )?;

        let module = GeneratedTestModule {
            file_name: GeneratedTestModule::file_name_for(implementation.stem(), &extension),
            content,
            source_name: c_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        let module_path = self.workspace.module_path(&module.file_name);
        std::fs::write(&module_path, &module.content)?;
        tracing::info!(
            "Wrote {} ({} declarations)",
            module_path.display(),
            extraction.len()
        );

        Ok(module)
    }

    async fn execute(&self, module: &GeneratedTestModule) -> Result<ToolOutput> {
        let (program, extra) = match self.config.test_command().split_first() {
            Some((program, extra)) => (program.clone(), extra.to_vec()),
            None => ("python3".to_string(), Vec::new()),
        };

        let header_dir = locator::locate(
            &self.workspace.repo_path(),
            self.config.unittest_header_file(),
            FileKind::Header.extension(),
        )
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| self.workspace.repo_path());

        let command = ToolCommand::new(program.clone())
            .args(extra)
            .arg(module.file_name.clone())
            .env("CSCAFFOLD_INCLUDE_DIR", header_dir.to_string_lossy())
            .current_dir(self.workspace.root());

        tracing::info!("Running tests for {}: {}", module.source_name, command.display());
        let output = self.runner.run(&command).await?.check(&program)?;
        Ok(output)
    }

    async fn report(&self, module: &GeneratedTestModule) -> Result<PathBuf> {
        let artifact = self.coverage_artifact(module);
        CoverageReporter::new(&self.runner, &self.workspace)
            .report(&artifact)
            .await
    }

    async fn cleanup(&self) -> Result<()> {
        self.workspace.clean()
    }

    fn workspace(&self) -> &Workspace {
        &self.workspace
    }
}
