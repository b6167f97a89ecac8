use crate::adapters::workspace::Workspace;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, ScaffoldError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "cscaffold.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub project: ProjectConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub git_repo_url: Option<String>,
    pub unittest_c_file: Option<String>,
    pub unittest_header_file: Option<String>,
    pub template_file: Option<PathBuf>,
    pub workspace_dir: Option<PathBuf>,
    pub repo_dir: Option<String>,
    pub report_dir: Option<String>,
    pub test_command: Option<Vec<String>>,
    pub coverage_artifact: Option<String>,
    pub tool_timeout_secs: Option<u64>,
}

fn default_test_command() -> &'static [String] {
    static CMD: OnceLock<Vec<String>> = OnceLock::new();
    CMD.get_or_init(|| vec!["python3".to_string()])
}

impl ProjectConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ScaffoldError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        let file: ConfigFile =
            toml::from_str(&processed_content).map_err(|e| ScaffoldError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;
        Ok(file.project)
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex is valid"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        let url = validation::validate_required_field("git_repo_url", &self.git_repo_url)?;
        validation::validate_git_url("git_repo_url", url)?;

        let c_file = validation::validate_required_field("unittest_c_file", &self.unittest_c_file)?;
        validation::validate_file_name("unittest_c_file", c_file, "c")?;

        let header = validation::validate_required_field(
            "unittest_header_file",
            &self.unittest_header_file,
        )?;
        validation::validate_file_name("unittest_header_file", header, "h")?;

        if let Some(template) = &self.template_file {
            validation::validate_path("template_file", &template.to_string_lossy())?;
        }
        if let Some(dir) = &self.workspace_dir {
            validation::validate_path("workspace_dir", &dir.to_string_lossy())?;
        }
        for (field, value) in [("repo_dir", &self.repo_dir), ("report_dir", &self.report_dir)] {
            if let Some(value) = value {
                validation::validate_non_empty_string(field, value)?;
                if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
                    return Err(ScaffoldError::ValidationError {
                        field: field.to_string(),
                        value: value.clone(),
                        reason: "Expected a directory name inside the workspace".to_string(),
                    });
                }
            }
        }
        if let Some(command) = &self.test_command {
            let program = command.first().map(String::as_str).unwrap_or_default();
            validation::validate_non_empty_string("test_command", program)?;
        }
        if let Some(artifact) = &self.coverage_artifact {
            validation::validate_non_empty_string("coverage_artifact", artifact)?;
        }
        if let Some(timeout) = self.tool_timeout_secs {
            validation::validate_positive_number("tool_timeout_secs", timeout, 1)?;
        }

        Ok(())
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(
            self.workspace_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
            self.repo_dir.as_deref().unwrap_or("cloned_repo"),
            self.report_dir.as_deref().unwrap_or("coverage_report"),
        )
    }
}

impl ConfigProvider for ProjectConfig {
    fn git_repo_url(&self) -> &str {
        self.git_repo_url.as_deref().unwrap_or_default()
    }

    fn unittest_c_file(&self) -> &str {
        self.unittest_c_file.as_deref().unwrap_or_default()
    }

    fn unittest_header_file(&self) -> &str {
        self.unittest_header_file.as_deref().unwrap_or_default()
    }

    fn template_file(&self) -> Option<&Path> {
        self.template_file.as_deref()
    }

    fn test_command(&self) -> &[String] {
        self.test_command
            .as_deref()
            .unwrap_or_else(|| default_test_command())
    }

    fn coverage_artifact(&self) -> Option<&str> {
        self.coverage_artifact.as_deref()
    }

    fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs.unwrap_or(600))
    }
}

impl Validate for ProjectConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
