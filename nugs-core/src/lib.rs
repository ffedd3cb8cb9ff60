// nugs-core/src/lib.rs
//! Download stage: fans a resolved package set out to concurrent artifact
//! retrievals.
pub mod pipeline;

pub use pipeline::{
    download_all, DownloadEvent, DownloadOptions, DownloadOutcome, DownloadReport,
    DownloadStatus, FailureKind,
};
