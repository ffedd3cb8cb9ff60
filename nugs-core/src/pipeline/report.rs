// nugs-core/src/pipeline/report.rs
use std::path::PathBuf;

use serde::Serialize;

use nugs_common::error::NugsError;
use nugs_common::model::{PackageName, PackageVersion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Metadata for the package could not be fetched at download time.
    MetadataUnavailable,
    /// The registry advertises no download location.
    ArtifactUnavailable,
    /// Network or write failure while retrieving the artifact.
    Transfer,
    /// Downloaded bytes do not match the published digest.
    Integrity,
    /// The download task died before reporting.
    Panicked,
}

impl FailureKind {
    pub fn from_error(err: &NugsError) -> Self {
        match err {
            NugsError::ArtifactUnavailable(_) => Self::ArtifactUnavailable,
            NugsError::ChecksumMismatch(_) => Self::Integrity,
            NugsError::NotFound(_) | NugsError::MalformedMetadata(..) => {
                Self::MetadataUnavailable
            }
            _ => Self::Transfer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadStatus {
    Downloaded { path: PathBuf, size_bytes: u64 },
    Failed { kind: FailureKind, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub name: PackageName,
    pub version: PackageVersion,
    #[serde(flatten)]
    pub status: DownloadStatus,
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, DownloadStatus::Downloaded { .. })
    }
}

/// Per-package results of one download run, sorted by package name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadReport {
    pub outcomes: Vec<DownloadOutcome>,
}

impl DownloadReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    /// True when there was something to download and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.success_count() == 0
    }

    pub fn get(&self, name: &PackageName) -> Option<&DownloadOutcome> {
        self.outcomes.iter().find(|o| &o.name == name)
    }
}
