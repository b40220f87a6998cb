//! # Makefile Discovery
//!
//! Locates Makefiles in a project directory.
//!
//! The standard GNU Make lookup order is honored (`Makefile`, `makefile`,
//! `GNUmakefile`); [`find_makefiles`] additionally walks subdirectories for
//! multi-Makefile workspaces, depth-capped the same way script discovery
//! works elsewhere in the codebase.

use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

/// File names that make(1) recognizes, in its preference order.
const MAKEFILE_NAMES: &[&str] = &["Makefile", "makefile", "GNUmakefile"];

/// Maximum directory depth for recursive discovery.
const MAX_DISCOVERY_DEPTH: usize = 3;

/// Find the Makefile in a single directory, honoring make's lookup order.
pub fn find_makefile(dir: &Path) -> Option<PathBuf> {
    MAKEFILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Find all Makefiles under a directory tree (depth-capped).
///
/// Unreadable entries are skipped with a warning rather than failing the
/// whole walk.
pub fn find_makefiles(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    if !dir.exists() {
        return Ok(found);
    }
    if !dir.is_dir() {
        anyhow::bail!("Path '{}' exists but is not a directory", dir.display());
    }

    for entry in WalkDir::new(dir)
        .max_depth(MAX_DISCOVERY_DEPTH)
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                eprintln!("Warning: Failed to read directory entry: {err}");
                None
            }
        })
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|f| f.to_str()) {
            if MAKEFILE_NAMES.contains(&name) {
                found.push(path.to_path_buf());
            }
        }
    }

    found.sort();
    Ok(found)
}
