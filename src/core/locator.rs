use crate::utils::error::{Result, ScaffoldError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds the file named `filename_hint` among all `.extension` files under
/// `root`, falling back to the lexicographically first match.
pub fn locate(root: &Path, filename_hint: &str, extension: &str) -> Result<PathBuf> {
    // Surface a missing root as IO rather than "nothing found".
    std::fs::read_dir(root)?;

    let mut matches = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                continue;
            }
        };

        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(extension)
        {
            matches.push(entry.into_path());
        }
    }
    matches.sort();

    tracing::debug!(
        "Found {} '.{}' files under {}",
        matches.len(),
        extension,
        root.display()
    );

    let preferred = matches
        .iter()
        .position(|p| p.file_name().and_then(|n| n.to_str()) == Some(filename_hint));

    match preferred {
        Some(index) => Ok(matches.swap_remove(index)),
        None => {
            let first = matches.into_iter().next().ok_or_else(|| ScaffoldError::NotFoundError {
                root: root.to_path_buf(),
                extension: extension.to_string(),
            })?;
            tracing::warn!(
                "{} not found, using {} instead",
                filename_hint,
                first.display()
            );
            Ok(first)
        }
    }
}
