use super::module::{ModuleOutcome, ModuleScanner};
use super::workspace::{copy_tree, Workspace};
use crate::checker::AccountChecker;
use crate::config::IgnoreConfig;
use crate::error::{ChainjackError, Result};
use crate::exec::Environment;
use crate::model::{ModuleReference, ModuleReport, ScanResult};
use crate::resolver::locate_module_dir;
use crate::toolchain::ModuleToolchain;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Knobs for a batch scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How many modules are scanned at once. `1` scans sequentially.
    pub concurrency: usize,
    pub ignore: IgnoreConfig,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            ignore: IgnoreConfig::default(),
        }
    }
}

/// Scans a batch of module references inside one temporary workspace.
pub struct ChainScanner {
    toolchain: Box<dyn ModuleToolchain>,
    checker: Box<dyn AccountChecker>,
    options: ScanOptions,
}

impl ChainScanner {
    pub fn new(
        toolchain: impl ModuleToolchain + 'static,
        checker: impl AccountChecker + 'static,
    ) -> Self {
        Self {
            toolchain: Box::new(toolchain),
            checker: Box::new(checker),
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Scans every distinct reference and collects one report per reference.
    ///
    /// Per-module failures end up in the report; only a fatal error (an
    /// invalid token) aborts the batch. The workspace is removed either way.
    pub async fn scan(&self, references: &[ModuleReference]) -> Result<ScanResult> {
        let mut seen = HashSet::new();
        let references: Vec<&ModuleReference> = references
            .iter()
            .filter(|reference| seen.insert(reference.as_str()))
            .collect();

        let workspace = Workspace::create()?;
        let reports = self.scan_in(&workspace, &references).await;
        workspace.close();

        Ok(ScanResult::new(reports?))
    }

    async fn scan_in(
        &self,
        workspace: &Workspace,
        references: &[&ModuleReference],
    ) -> Result<Vec<ModuleReport>> {
        let env = workspace.environment();
        let env = &env;

        let mut reports: Vec<(usize, ModuleReport)> = stream::iter(references.iter().enumerate())
            .map(|(index, reference)| async move {
                self.scan_reference(workspace, env, index, reference)
                    .await
                    .map(|report| (index, report))
            })
            .buffer_unordered(self.options.concurrency.max(1))
            .try_collect()
            .await?;

        reports.sort_by_key(|(index, _)| *index);
        Ok(reports.into_iter().map(|(_, report)| report).collect())
    }

    async fn scan_reference(
        &self,
        workspace: &Workspace,
        env: &Environment,
        index: usize,
        reference: &ModuleReference,
    ) -> Result<ModuleReport> {
        debug!("Scanning \"{}\" ...", reference);
        let staging = workspace.staging_dir(index);

        if let Err(e) = self.stage(workspace, env, reference, &staging).await {
            debug!("failed to provision {}: {}", reference, e);
            return Ok(ModuleReport::failed(reference.clone(), e.to_string()));
        }

        debug!("Scanning \"{}\" ...", staging.display());
        let scanner = ModuleScanner::new(
            self.toolchain.as_ref(),
            self.checker.as_ref(),
            &self.options.ignore,
        );
        let outcome = scanner.scan(&staging, env).await;

        if let Err(e) = fs::remove_dir_all(&staging) {
            debug!("Could not remove staging dir {}: {}", staging.display(), e);
        }

        Ok(match outcome? {
            ModuleOutcome::Scanned(vulnerable) => ModuleReport::scanned(reference.clone(), vulnerable),
            ModuleOutcome::Failed(reason) => ModuleReport::failed(reference.clone(), reason),
        })
    }

    /// Puts a disposable copy of the module's source at `staging`.
    async fn stage(
        &self,
        workspace: &Workspace,
        env: &Environment,
        reference: &ModuleReference,
        staging: &Path,
    ) -> Result<()> {
        let source = match reference.local_dir() {
            Some(dir) => fs::canonicalize(dir).map_err(|e| ChainjackError::io(dir, e))?,
            None => {
                self.toolchain
                    .download(&reference.download_target(), workspace.root(), env)
                    .await?;
                locate_module_dir(reference.as_str(), &workspace.module_cache())?
            }
        };

        copy_tree(&source, staging)
    }
}
