use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration key: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    ValidationError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("No '.{extension}' file found under {}", .root.display())]
    NotFoundError { root: PathBuf, extension: String },

    #[error("Cannot read source file {}: {source}", .path.display())]
    ExtractionError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template error: placeholder {placeholder} occurs {occurrences} times, expected exactly once")]
    TemplateError {
        placeholder: String,
        occurrences: usize,
    },

    #[error("`{tool}` exited with status {status}")]
    ExternalToolError {
        tool: String,
        status: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Failed to start `{tool}`: {source}")]
    ToolSpawnError {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{tool}` timed out after {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },

    #[error("Workspace {} is locked by another run", .lock_file.display())]
    WorkspaceLocked { lock_file: PathBuf },
}

impl ScaffoldError {
    /// Process exit code for this failure. External tools pass their own status through.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScaffoldError::ExternalToolError { status, .. } => {
                if *status == 0 {
                    1
                } else {
                    *status
                }
            }
            ScaffoldError::ConfigError { .. }
            | ScaffoldError::MissingConfigError { .. }
            | ScaffoldError::ValidationError { .. } => 2,
            ScaffoldError::NotFoundError { .. }
            | ScaffoldError::ExtractionError { .. }
            | ScaffoldError::TemplateError { .. } => 3,
            ScaffoldError::ToolSpawnError { .. } => 127,
            ScaffoldError::ToolTimeout { .. } => 124,
            ScaffoldError::WorkspaceLocked { .. } | ScaffoldError::IoError(_) => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScaffoldError::ExternalToolError {
                tool,
                status,
                stderr,
                ..
            } => {
                let detail = stderr.trim();
                if detail.is_empty() {
                    format!("{} failed with exit status {}", tool, status)
                } else {
                    format!("{} failed with exit status {}:\n{}", tool, status, detail)
                }
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ScaffoldError::ConfigError { .. } | ScaffoldError::MissingConfigError { .. } => {
                "Check that cscaffold.toml exists and defines git_repo_url, unittest_c_file and unittest_header_file under [project]"
            }
            ScaffoldError::ValidationError { .. } => {
                "Use a repository URL of the form https://github.com/<org>/<repo> or git@github.com:<org>/<repo>"
            }
            ScaffoldError::NotFoundError { .. } => {
                "Verify that the repository contains the expected .c and .h files"
            }
            ScaffoldError::ExtractionError { .. } => {
                "Make sure the source file is readable UTF-8 text"
            }
            ScaffoldError::TemplateError { .. } => {
                "The template must contain __HEADER_DEFINITIONS__ and __FUNCTIONS_IMPLEMENTATION__ exactly once each"
            }
            ScaffoldError::ExternalToolError { .. } => {
                "Inspect the tool output above and rerun with --verbose"
            }
            ScaffoldError::ToolSpawnError { .. } => {
                "Install the missing tool (git, python3, gcov, lcov, genhtml) and make sure it is on PATH"
            }
            ScaffoldError::ToolTimeout { .. } => {
                "Raise tool_timeout_secs in cscaffold.toml or check network connectivity"
            }
            ScaffoldError::WorkspaceLocked { .. } => {
                "Wait for the other run to finish, or remove the stale lock file"
            }
            ScaffoldError::IoError(_) => "Check file permissions in the workspace directory",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScaffoldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_tool_status_becomes_exit_code() {
        let err = ScaffoldError::ExternalToolError {
            tool: "lcov".to_string(),
            status: 4,
            stdout: String::new(),
            stderr: "no data".to_string(),
        };
        assert_eq!(err.exit_code(), 4);
        assert!(err.user_friendly_message().contains("no data"));
    }

    #[test]
    fn test_config_errors_share_exit_code() {
        let missing = ScaffoldError::MissingConfigError {
            field: "git_repo_url".to_string(),
        };
        let invalid = ScaffoldError::ValidationError {
            field: "git_repo_url".to_string(),
            value: "ftp://example.com".to_string(),
            reason: "unsupported scheme".to_string(),
        };
        assert_eq!(missing.exit_code(), 2);
        assert_eq!(invalid.exit_code(), 2);
    }
}
