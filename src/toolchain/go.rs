use super::ModuleToolchain;
use crate::error::Result;
use crate::exec::{execute, Environment};
use async_trait::async_trait;
use std::path::Path;

/// Module name written by `go mod init` for trees that lack a manifest.
const SYNTHETIC_MODULE_NAME: &str = "mod";

/// Drives the `go` command line tool.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    binary: String,
}

impl GoToolchain {
    pub fn new() -> Self {
        Self::with_binary("go")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Returns the `go version` line, failing when the tool cannot run.
    pub async fn version(&self) -> Result<String> {
        let cwd = std::env::temp_dir();
        let output = execute(&self.binary, &["version"], &cwd, &Environment::new(), true).await?;
        Ok(output.stdout.trim().to_string())
    }

    async fn go(&self, args: &[&str], dir: &Path, env: &Environment) -> Result<String> {
        let output = execute(&self.binary, args, dir, env, true).await?;
        Ok(output.stdout)
    }
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModuleToolchain for GoToolchain {
    fn name(&self) -> &'static str {
        "go"
    }

    async fn download(&self, module: &str, work_dir: &Path, env: &Environment) -> Result<()> {
        self.go(&["mod", "download", module], work_dir, env).await?;
        Ok(())
    }

    async fn init_manifest(&self, dir: &Path, env: &Environment) -> Result<()> {
        self.go(&["mod", "init", SYNTHETIC_MODULE_NAME], dir, env).await?;
        Ok(())
    }

    async fn tidy(&self, dir: &Path, env: &Environment) -> Result<()> {
        self.go(&["mod", "tidy", "-e"], dir, env).await?;
        Ok(())
    }

    async fn dependency_graph(&self, dir: &Path, env: &Environment) -> Result<String> {
        self.go(&["mod", "graph"], dir, env).await
    }
}
