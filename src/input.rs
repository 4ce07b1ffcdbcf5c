//! Collecting module references from the command line.
//!
//! Sources are consulted in order and the first one given wins: explicit
//! URLs, a file of URLs, a path, and finally the current directory when it
//! holds a `go.mod`.

use crate::model::ModuleReference;
use crate::toolchain::MANIFEST_FILE;
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct InputSources {
    pub urls: Vec<String>,
    pub urls_file: Option<PathBuf>,
    pub path: Option<PathBuf>,
}

impl InputSources {
    /// Returns the trimmed, non-empty, deduplicated references to scan.
    ///
    /// # Errors
    ///
    /// Fails when the URL file cannot be read or when no reference is found.
    pub fn collect(&self, current_dir: &Path) -> Result<Vec<ModuleReference>> {
        let raw: Vec<String> = if !self.urls.is_empty() {
            self.urls.clone()
        } else if let Some(file) = &self.urls_file {
            fs::read_to_string(file)
                .with_context(|| format!("Failed to read module list {}", file.display()))?
                .lines()
                .map(str::to_string)
                .collect()
        } else if let Some(path) = &self.path {
            vec![path.to_string_lossy().into_owned()]
        } else if current_dir.join(MANIFEST_FILE).is_file() {
            vec![current_dir.to_string_lossy().into_owned()]
        } else {
            Vec::new()
        };

        let mut seen = HashSet::new();
        let references: Vec<ModuleReference> = raw
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .filter(|r| seen.insert(r.to_string()))
            .map(ModuleReference::new)
            .collect();

        if references.is_empty() {
            bail!(
                "There is no go.mod file in your current working directory. If not provided with specific arguments, please run inside a go package directory"
            );
        }

        Ok(references)
    }
}
