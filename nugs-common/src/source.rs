// nugs-common/src/source.rs
//! The boundary between the resolution/download engine and wherever package
//! metadata actually comes from.

use async_trait::async_trait;
use url::Url;

use crate::error::Result;
use crate::model::{PackageInfo, PackageName, PackageVersion};

#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Platform groups, dependency declarations and artifact location for one
    /// package version.
    ///
    /// Fails with [`NugsError::NotFound`](crate::NugsError::NotFound) when the
    /// registry has no such pair and with
    /// [`NugsError::MalformedMetadata`](crate::NugsError::MalformedMetadata)
    /// when the answer cannot be structured.
    async fn fetch_package_info(
        &self,
        name: &PackageName,
        version: &PackageVersion,
    ) -> Result<PackageInfo>;

    /// Raw artifact bytes found at `location`.
    async fn fetch_artifact(&self, location: &Url) -> Result<Vec<u8>>;
}
