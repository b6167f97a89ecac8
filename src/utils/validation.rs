use crate::utils::error::{Result, ScaffoldError};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn scp_like_github() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^git@github\.com:[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$")
            .expect("static regex is valid")
    })
}

/// Accepts `https://github.com/<org>/<repo>` and `git@github.com:<org>/<repo>`.
pub fn validate_git_url(field_name: &str, url_str: &str) -> Result<()> {
    let invalid = |reason: String| ScaffoldError::ValidationError {
        field: field_name.to_string(),
        value: url_str.to_string(),
        reason,
    };

    if url_str.trim().is_empty() {
        return Err(invalid("URL cannot be empty".to_string()));
    }

    if url_str.starts_with("git@") {
        return if scp_like_github().is_match(url_str) {
            Ok(())
        } else {
            Err(invalid(
                "SSH URLs must look like git@github.com:<org>/<repo>".to_string(),
            ))
        };
    }

    let url = Url::parse(url_str).map_err(|e| invalid(format!("Invalid URL format: {}", e)))?;

    if url.scheme() != "https" {
        return Err(invalid(format!("Unsupported URL scheme: {}", url.scheme())));
    }

    if url.host_str() != Some("github.com") {
        return Err(invalid(format!(
            "Unsupported host: {}",
            url.host_str().unwrap_or("<none>")
        )));
    }

    let segments = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).count())
        .unwrap_or(0);
    if segments < 2 {
        return Err(invalid(
            "URL must name an organisation and a repository".to_string(),
        ));
    }

    Ok(())
}

/// File names only; directories are searched, not configured.
pub fn validate_file_name(field_name: &str, value: &str, extension: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    if value.contains('/') || value.contains('\\') || value.contains('\0') {
        return Err(ScaffoldError::ValidationError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Expected a bare file name".to_string(),
        });
    }

    let actual = std::path::Path::new(value)
        .extension()
        .and_then(|ext| ext.to_str());
    if actual != Some(extension) {
        return Err(ScaffoldError::ValidationError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("File must have the .{} extension", extension),
        });
    }

    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ScaffoldError::ValidationError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ScaffoldError::ValidationError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(ScaffoldError::ValidationError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| ScaffoldError::MissingConfigError {
            field: field_name.to_string(),
        })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ScaffoldError::ValidationError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_git_url() {
        assert!(validate_git_url("git_repo_url", "https://github.com/org/repo.git").is_ok());
        assert!(validate_git_url("git_repo_url", "https://github.com/org/repo").is_ok());
        assert!(validate_git_url("git_repo_url", "git@github.com:org/repo.git").is_ok());

        assert!(validate_git_url("git_repo_url", "http://github.com/org/repo.git").is_err());
        assert!(validate_git_url("git_repo_url", "ftp://example.com/repo").is_err());
        assert!(validate_git_url("git_repo_url", "https://gitlab.com/org/repo").is_err());
        assert!(validate_git_url("git_repo_url", "https://github.com/org").is_err());
        assert!(validate_git_url("git_repo_url", "git@gitlab.com:org/repo.git").is_err());
        assert!(validate_git_url("git_repo_url", "").is_err());
        assert!(validate_git_url("git_repo_url", "not a url").is_err());
    }

    #[test]
    fn test_rejected_url_is_a_validation_error() {
        let err = validate_git_url("git_repo_url", "http://github.com/org/repo.git").unwrap_err();
        assert!(matches!(err, ScaffoldError::ValidationError { ref field, .. } if field == "git_repo_url"));
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("unittest_c_file", "math.c", "c").is_ok());
        assert!(validate_file_name("unittest_header_file", "math.h", "h").is_ok());
        assert!(validate_file_name("unittest_c_file", "math.h", "c").is_err());
        assert!(validate_file_name("unittest_c_file", "src/math.c", "c").is_err());
        assert!(validate_file_name("unittest_c_file", "  ", "c").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("tool_timeout_secs", 5, 1).is_ok());
        assert!(validate_positive_number("tool_timeout_secs", 0, 1).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("x".to_string());
        let absent: Option<String> = None;
        assert_eq!(validate_required_field("a", &present).unwrap(), "x");
        assert!(matches!(
            validate_required_field("a", &absent),
            Err(ScaffoldError::MissingConfigError { .. })
        ));
    }
}
