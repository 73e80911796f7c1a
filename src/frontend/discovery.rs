//! Test discovery
//!
//! Resolves the CLI's positional argument into an ordered list of test files:
//!
//! - a file: taken as-is (must be a `.f90` source)
//! - a directory: `test_*.f90` then `module_test_*.f90` directly inside it, each group sorted
//! - anything else: a file-name pattern (`*`, `?`, `[...]`), matched recursively under the pattern's
//!   wildcard-free parent directory (or the working directory)
//!
//! Hidden directories and `build`/`target` trees are never walked. Results are absolute and deduplicated.

use std::fs;
use std::path::{Path, PathBuf};

use fortest_core::lang::conventions;
use thiserror::Error;
use walkdir::WalkDir;

/// Directory names never descended into while matching a pattern.
const SKIPPED_DIRS: &[&str] = &["build", "target"];

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("'{}' is not a Fortran source file (expected .{})", .0.display(), conventions::SOURCE_EXTENSION)]
    NotFortranSource(PathBuf),

    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

/// Discover test files for `target`, resolving relative paths against `cwd`.
#[tracing::instrument(skip_all, fields(target = target))]
pub fn discover_test_files(target: &str, cwd: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let path = cwd.join(target);

    let mut files = if path.is_file() {
        if !has_source_extension(&path) {
            return Err(DiscoveryError::NotFortranSource(path));
        }
        vec![path]
    } else if path.is_dir() {
        discover_in_directory(&path)?
    } else {
        discover_by_pattern(target, cwd)?
    };

    let mut seen = std::collections::HashSet::new();
    files.retain(|f| seen.insert(f.clone()));
    tracing::debug!(count = files.len(), "discovered test files");
    Ok(files)
}

fn discover_in_directory(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let entries = fs::read_dir(dir).map_err(|e| DiscoveryError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| conventions::is_test_file_name(name))
        .collect();

    let mut files = Vec::new();
    for prefix in conventions::TEST_FILE_PREFIXES {
        let mut group: Vec<&String> = names.iter().filter(|n| n.starts_with(prefix)).collect();
        group.sort();
        files.extend(group.into_iter().map(|n| dir.join(n)));
    }
    Ok(files)
}

fn discover_by_pattern(target: &str, cwd: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let target_path = Path::new(target);
    let name_pattern = target_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| target.to_string());
    let base = match target_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !has_wildcard(&parent.to_string_lossy()) => cwd.join(parent),
        _ => cwd.to_path_buf(),
    };

    let pattern = glob::Pattern::new(&name_pattern).map_err(|e| DiscoveryError::InvalidPattern {
        pattern: target.to_string(),
        message: e.to_string(),
    })?;

    let mut files: Vec<PathBuf> = WalkDir::new(&base)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !is_skipped_dir(&e.file_name().to_string_lossy()))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            pattern.matches(&name) && has_source_extension(e.path()) && name != conventions::ASSERTION_MODULE_SOURCE
        })
        .map(|e| e.into_path())
        .collect();

    files.sort();
    Ok(files)
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(conventions::SOURCE_EXTENSION))
}

fn has_wildcard(text: &str) -> bool {
    text.contains(['*', '?', '['])
}

fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.') || SKIPPED_DIRS.iter().any(|d| d.eq_ignore_ascii_case(name))
}
