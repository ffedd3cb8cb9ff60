// nugs-net/src/lib.rs
pub mod http;
pub mod registry;
pub mod validation;

pub use nugs_common::{Config, NugsError, Result};
pub use registry::{minimum_version, NugetRegistry};
pub use validation::validate_url;
