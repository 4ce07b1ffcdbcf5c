//! The build tool that materializes module trees and dependency graphs.
//!
//! The scan pipeline only needs four operations from it, captured by
//! [`ModuleToolchain`]. [`GoToolchain`] drives the `go` command.

mod go;

pub use go::GoToolchain;

use crate::error::Result;
use crate::exec::Environment;
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

pub const MANIFEST_FILE: &str = "go.mod";
pub const LOCK_FILE: &str = "go.sum";

#[async_trait]
pub trait ModuleToolchain: Send + Sync {
    fn name(&self) -> &'static str;

    /// Downloads `module` into the cache configured by `env`, running in `work_dir`.
    async fn download(&self, module: &str, work_dir: &Path, env: &Environment) -> Result<()>;

    /// Writes a minimal manifest in `dir`.
    async fn init_manifest(&self, dir: &Path, env: &Environment) -> Result<()>;

    /// Writes a lock file in `dir`, tolerating dependencies that do not resolve cleanly.
    async fn tidy(&self, dir: &Path, env: &Environment) -> Result<()>;

    /// Returns the `<parent> <child>` edge list for the module in `dir`.
    async fn dependency_graph(&self, dir: &Path, env: &Environment) -> Result<String>;
}

/// Makes `dir` a self-contained module the graph dump can run against.
pub async fn normalize_workspace(
    toolchain: &dyn ModuleToolchain,
    dir: &Path,
    env: &Environment,
) -> Result<()> {
    if !dir.join(MANIFEST_FILE).is_file() {
        debug!("No {} in {}, initializing one with {}", MANIFEST_FILE, dir.display(), toolchain.name());
        toolchain.init_manifest(dir, env).await?;
    }

    if !dir.join(LOCK_FILE).is_file() {
        debug!("No {} in {}, tidying with {}", LOCK_FILE, dir.display(), toolchain.name());
        toolchain.tidy(dir, env).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingToolchain {
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingToolchain {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModuleToolchain for RecordingToolchain {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn download(&self, _module: &str, _work_dir: &Path, _env: &Environment) -> Result<()> {
            self.calls.lock().unwrap().push("download");
            Ok(())
        }

        async fn init_manifest(&self, dir: &Path, _env: &Environment) -> Result<()> {
            self.calls.lock().unwrap().push("init");
            std::fs::write(dir.join(MANIFEST_FILE), "module mod\n").unwrap();
            Ok(())
        }

        async fn tidy(&self, dir: &Path, _env: &Environment) -> Result<()> {
            self.calls.lock().unwrap().push("tidy");
            std::fs::write(dir.join(LOCK_FILE), "").unwrap();
            Ok(())
        }

        async fn dependency_graph(&self, _dir: &Path, _env: &Environment) -> Result<String> {
            self.calls.lock().unwrap().push("graph");
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_bare_tree_gets_manifest_and_lock() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.go"), "package main\n").unwrap();
        let toolchain = RecordingToolchain::default();

        normalize_workspace(&toolchain, dir.path(), &Environment::new())
            .await
            .unwrap();

        assert_eq!(toolchain.calls(), vec!["init", "tidy"]);
        assert!(dir.path().join(MANIFEST_FILE).is_file());
        assert!(dir.path().join(LOCK_FILE).is_file());
    }

    #[tokio::test]
    async fn test_module_without_lock_is_only_tidied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "module example.com/app\n").unwrap();
        let toolchain = RecordingToolchain::default();

        normalize_workspace(&toolchain, dir.path(), &Environment::new())
            .await
            .unwrap();

        assert_eq!(toolchain.calls(), vec!["tidy"]);
    }

    #[tokio::test]
    async fn test_complete_module_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "module example.com/app\n").unwrap();
        std::fs::write(dir.path().join(LOCK_FILE), "").unwrap();
        let toolchain = RecordingToolchain::default();

        normalize_workspace(&toolchain, dir.path(), &Environment::new())
            .await
            .unwrap();

        assert!(toolchain.calls().is_empty());
    }
}
