pub mod checker;
pub mod config;
pub mod error;
pub mod exec;
pub mod graph;
pub mod input;
pub mod model;
pub mod output;
pub mod resolver;
pub mod scanner;
pub mod toolchain;

pub use config::Config;
pub use error::{ChainjackError, Result};
pub use model::{ModuleReference, ModuleReport, PackageId, ScanResult};
pub use scanner::{scan, ChainScanner};
