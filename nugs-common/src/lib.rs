// nugs-common/src/lib.rs
pub mod config;
pub mod dependency;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod model;
pub mod source;

// Re-export key types
pub use config::Config;
pub use dependency::{Resolution, ResolvedSet};
pub use error::{NugsError, Result};
pub use model::{PackageInfo, PackageName, PackageVersion, TargetPlatform};
pub use source::PackageSource;
