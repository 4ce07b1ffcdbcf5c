//! Core data types for package identifiers, module references, and scan results.
//!
//! - [`PackageId`] - A fully-qualified dependency from a graph dump
//! - [`ModuleReference`] - A local source tree or remote module to scan
//! - [`ModuleReport`] - Outcome of scanning one reference
//! - [`ScanResult`] - Complete batch results
//!
//! # Example
//!
//! ```
//! use chainjacking::{PackageId, ScanResult};
//!
//! let id = PackageId::new("github.com/user-b/toml@v0.3.1");
//! assert_eq!(id.hosting_account(), Some("user-b"));
//!
//! let result = ScanResult::new(Vec::new());
//! assert!(result.is_clean());
//! ```

mod package;
mod report;

pub use package::*;
pub use report::*;
