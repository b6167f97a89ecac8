use crate::utils::error::{Result, ScaffoldError};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const LOCK_FILE: &str = ".cscaffold.lock";
const COVERAGE_DATA: &str = "coverage.info";
const BUILD_EXTENSIONS: &[&str] = &["so", "o", "gcda", "gcno", "gcov"];

/// The directory one run clones into, builds in and reports from.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    repo_dir: String,
    report_dir: String,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, repo_dir: impl Into<String>, report_dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            repo_dir: repo_dir.into(),
            report_dir: report_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repo_path(&self) -> PathBuf {
        self.root.join(&self.repo_dir)
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(&self.report_dir)
    }

    pub fn coverage_data_path(&self) -> PathBuf {
        self.root.join(COVERAGE_DATA)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    pub fn module_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Exclusive per-workspace lock; released when the guard drops.
    pub fn lock(&self) -> Result<WorkspaceLock> {
        fs::create_dir_all(&self.root)?;
        let path = self.lock_path();
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                tracing::debug!("Acquired workspace lock {}", path.display());
                Ok(WorkspaceLock { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(ScaffoldError::WorkspaceLocked { lock_file: path })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the cloned repository and build/coverage artifacts. The
    /// generated test module and the HTML report are kept.
    pub fn clean(&self) -> Result<()> {
        let repo = self.repo_path();
        match fs::remove_dir_all(&repo) {
            Ok(()) => tracing::debug!("Removed {}", repo.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if !self.root.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Skipping workspace entry: {}", err);
                    continue;
                }
            };
            if entry.file_type().is_file() && is_build_artifact(entry.path()) {
                fs::remove_file(entry.path())?;
                tracing::debug!("Removed {}", entry.path().display());
            }
        }

        Ok(())
    }
}

fn is_build_artifact(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

    name == COVERAGE_DATA
        || BUILD_EXTENSIONS.contains(&extension)
        || (name.starts_with("_test_") && extension == "c")
}

#[derive(Debug)]
pub struct WorkspaceLock {
    path: PathBuf,
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}
