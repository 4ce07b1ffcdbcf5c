use crate::checker::AccountChecker;
use crate::config::IgnoreConfig;
use crate::error::Result;
use crate::exec::Environment;
use crate::graph::DependencyGraph;
use crate::model::PackageId;
use crate::toolchain::{normalize_workspace, ModuleToolchain};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::debug;

/// Result of scanning one module tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOutcome {
    Scanned(BTreeSet<PackageId>),
    /// The tree could not be analyzed; nothing is known about its dependencies.
    Failed(String),
}

/// Scans a single staged module tree: normalize, dump the graph, check each
/// referenced account once, and keep the packages of accounts that are gone.
pub struct ModuleScanner<'a> {
    toolchain: &'a dyn ModuleToolchain,
    checker: &'a dyn AccountChecker,
    ignore: &'a IgnoreConfig,
}

impl<'a> ModuleScanner<'a> {
    pub fn new(
        toolchain: &'a dyn ModuleToolchain,
        checker: &'a dyn AccountChecker,
        ignore: &'a IgnoreConfig,
    ) -> Self {
        Self {
            toolchain,
            checker,
            ignore,
        }
    }

    /// Failures are contained here and reported as [`ModuleOutcome::Failed`],
    /// except fatal ones (an invalid token), which are returned as errors.
    pub async fn scan(&self, dir: &Path, env: &Environment) -> Result<ModuleOutcome> {
        match self.analyze(dir, env).await {
            Ok(vulnerable) => Ok(ModuleOutcome::Scanned(vulnerable)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                debug!("failed to analyze package {}: {}", dir.display(), e);
                Ok(ModuleOutcome::Failed(e.to_string()))
            }
        }
    }

    async fn analyze(&self, dir: &Path, env: &Environment) -> Result<BTreeSet<PackageId>> {
        normalize_workspace(self.toolchain, dir, env).await?;

        let output = self.toolchain.dependency_graph(dir, env).await?;
        let graph = DependencyGraph::parse(&output)?;
        debug!(
            "{}: {} dependencies across {} {} accounts",
            dir.display(),
            graph.packages.len(),
            graph.accounts.len(),
            self.checker.name()
        );

        let mut vulnerable_accounts = HashSet::new();
        for account in &graph.accounts {
            if self.ignore.should_ignore_account(account) {
                debug!("Skipping ignored account \"{}\"", account);
                continue;
            }
            if !self.checker.exists(account).await? {
                debug!("Account \"{}\" no longer exists", account);
                vulnerable_accounts.insert(account.clone());
            }
        }

        let mut vulnerable = graph.vulnerable_packages(&vulnerable_accounts);
        vulnerable.retain(|package| !self.ignore.should_ignore_package(package));
        Ok(vulnerable)
    }
}
