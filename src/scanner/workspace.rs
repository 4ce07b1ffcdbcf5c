use crate::error::{ChainjackError, Result};
use crate::exec::Environment;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Temporary root owned by one batch scan: module cache plus per-module
/// staging directories.
///
/// Dropping it removes the tree silently; [`Workspace::close`] does the same
/// but reports failures.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("chainjacking-")
            .tempdir()
            .map_err(|e| ChainjackError::io(std::env::temp_dir(), e))?;
        debug!("Created scan workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Where the download tool places module trees.
    pub fn module_cache(&self) -> PathBuf {
        self.root().join("pkg").join("mod")
    }

    /// Overrides that point the build tool at this workspace's cache.
    pub fn environment(&self) -> Environment {
        Environment::new()
            .with("GOPATH", self.root().to_string_lossy())
            .with("GOMODCACHE", self.module_cache().to_string_lossy())
            // The cache must stay writable or the workspace cannot be removed.
            .with("GOFLAGS", "-modcacherw")
    }

    /// A staging directory private to the module at `index` in the batch.
    pub fn staging_dir(&self, index: usize) -> PathBuf {
        self.root().join("staging").join(format!("mod-{}", index))
    }

    pub fn close(self) {
        let path = self.root().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!(
                "Failed to clear temporary directory=\"{}\" ({}). please manually delete it",
                path.display(),
                e
            );
        }
    }
}

/// Copies the contents of `src` into `dst`, following symlinks.
///
/// Only file contents are copied, not permissions, so the copy is always
/// writable even when the source lives in a read-only cache.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| ChainjackError::io(dst, e))?;

    for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            ChainjackError::io(path, io::Error::from(e))
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| ChainjackError::io(&target, e))?;
        } else {
            copy_file_contents(entry.path(), &target)?;
        }
    }

    Ok(())
}

fn copy_file_contents(src: &Path, dst: &Path) -> Result<()> {
    let mut reader = File::open(src).map_err(|e| ChainjackError::io(src, e))?;
    let mut writer = File::create(dst).map_err(|e| ChainjackError::io(dst, e))?;
    io::copy(&mut reader, &mut writer).map_err(|e| ChainjackError::io(dst, e))?;
    Ok(())
}
