pub mod artifact;
pub mod downloader;
pub mod report;

pub use downloader::{download_all, DownloadCoordinator, DownloadEvent, DownloadOptions};
pub use report::{DownloadOutcome, DownloadReport, DownloadStatus, FailureKind};
