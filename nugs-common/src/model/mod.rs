// nugs-common/src/model/mod.rs
pub mod name;
pub mod package;
pub mod version;

pub use name::PackageName;
pub use package::{ArtifactHash, HashAlgorithm, PackageInfo, PlatformGroup, TargetPlatform};
pub use version::PackageVersion;
