//! Locating downloaded module trees in a module cache.
//!
//! The download tool stores `github.com/Owner/Repo@v1.0.0` as
//! `github.com/!owner/!repo@v1.0.0` so the cache is safe on case-insensitive
//! filesystems. Graph identifiers are not escaped, so lookups escape them
//! with [`normalize_module_path`] before comparing.

use crate::error::{ChainjackError, Result};
use crate::model::strip_version;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Marker placed before each escaped uppercase letter.
const CASE_ESCAPE: char = '!';

/// Replaces every uppercase ASCII letter with `!` followed by its lowercase
/// form. Already-escaped input has no uppercase letters left, so applying
/// this twice is the same as applying it once.
pub fn normalize_module_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            normalized.push(CASE_ESCAPE);
            normalized.push(c.to_ascii_lowercase());
        } else {
            normalized.push(c);
        }
    }
    normalized
}

/// Maps unversioned, escaped module paths to the first versioned directory
/// found for them under one cache root.
///
/// Built with a single walk; lookups afterwards are map hits.
#[derive(Debug, Clone)]
pub struct ModuleCacheIndex {
    entries: HashMap<String, PathBuf>,
}

impl ModuleCacheIndex {
    pub fn build(root: &Path) -> Self {
        let mut entries = HashMap::new();
        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable cache entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative = slash_path(relative);

            if let Some((unversioned, rest)) = relative.split_once('@') {
                let version = rest.split('/').next().unwrap_or(rest);
                entries
                    .entry(unversioned.to_string())
                    .or_insert_with(|| root.join(format!("{}@{}", unversioned, version)));
                // Everything below a versioned directory maps to the same key.
                walker.skip_current_dir();
            }
        }

        Self { entries }
    }

    /// Returns the versioned directory holding `module`, ignoring any
    /// version the identifier itself carries.
    pub fn locate(&self, module: &str) -> Option<&Path> {
        let expected = normalize_module_path(strip_version(module));
        self.entries.get(&expected).map(PathBuf::as_path)
    }
}

/// One-shot lookup of `module` under `cache_root`.
///
/// A `module@version` whose exact directory is present resolves to it;
/// otherwise any cached version of the module is accepted.
pub fn locate_module_dir(module: &str, cache_root: &Path) -> Result<PathBuf> {
    if module.contains('@') {
        let exact = cache_root.join(normalize_module_path(module));
        if exact.is_dir() {
            return Ok(exact);
        }
    }

    ModuleCacheIndex::build(cache_root)
        .locate(module)
        .map(Path::to_path_buf)
        .ok_or_else(|| ChainjackError::Resolution {
            module: module.to_string(),
            root: cache_root.to_path_buf(),
        })
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
