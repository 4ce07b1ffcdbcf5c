//! The ChainJacking scan pipeline.
//!
//! | Type | Role |
//! |------|------|
//! | [`ChainScanner`] | Provisions a temporary workspace and scans a batch of module references |
//! | [`ModuleScanner`] | Scans one staged module tree and contains its failures |
//! | [`Workspace`] | Temporary root holding the isolated module cache and staging trees |
//!
//! # Example
//!
//! ```no_run
//! use chainjacking::scanner::{ChainScanner, ScanOptions};
//! use chainjacking::checker::GithubAccountChecker;
//! use chainjacking::toolchain::GoToolchain;
//! use chainjacking::ModuleReference;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let checker = GithubAccountChecker::new(std::env::var("GITHUB_TOKEN")?)?;
//!     let scanner = ChainScanner::new(GoToolchain::new(), checker)
//!         .with_options(ScanOptions::default());
//!
//!     let result = scanner
//!         .scan(&[ModuleReference::new("github.com/spf13/cobra")])
//!         .await?;
//!     for package in result.vulnerable_packages() {
//!         println!("{} can be hijacked", package);
//!     }
//!     Ok(())
//! }
//! ```

mod batch;
mod module;
mod workspace;

pub use batch::{ChainScanner, ScanOptions};
pub use module::{ModuleOutcome, ModuleScanner};
pub use workspace::{copy_tree, Workspace};

use crate::checker::GithubAccountChecker;
use crate::error::Result;
use crate::model::{ModuleReference, ScanResult};
use crate::toolchain::GoToolchain;

/// Scans `references` with the `go` tool on `PATH` and the public GitHub API.
pub async fn scan(references: &[ModuleReference], github_token: &str) -> Result<ScanResult> {
    let checker = GithubAccountChecker::new(github_token)?;
    ChainScanner::new(GoToolchain::new(), checker)
        .scan(references)
        .await
}
