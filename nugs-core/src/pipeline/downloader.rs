// nugs-core/src/pipeline/downloader.rs
use std::any::Any;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use nugs_common::config::Config;
use nugs_common::dependency::ResolvedSet;
use nugs_common::error::{NugsError, Result};
use nugs_common::model::{PackageName, PackageVersion};
use nugs_common::source::PackageSource;

use super::artifact::{artifact_file_name, verify_checksum, write_artifact};
use super::report::{DownloadOutcome, DownloadReport, DownloadStatus, FailureKind};

const DEFAULT_MAX_CONCURRENT: usize = 8;

#[derive(Debug, Clone)]
pub enum DownloadEvent {
    DownloadStarted {
        target_id: String,
        url: String,
    },
    DownloadFinished {
        target_id: String,
        path: PathBuf,
        size_bytes: u64,
    },
    DownloadFailed {
        target_id: String,
        error: String,
    },
}

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Upper bound on transfers in flight at once.
    pub max_concurrent: usize,
    pub event_tx: Option<broadcast::Sender<DownloadEvent>>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            event_tx: None,
        }
    }
}

impl DownloadOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrent: config.max_concurrent_downloads,
            ..Self::default()
        }
    }

    pub fn with_events(mut self, event_tx: broadcast::Sender<DownloadEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }
}

pub struct DownloadCoordinator {
    source: Arc<dyn PackageSource>,
    destination: PathBuf,
    options: DownloadOptions,
}

impl DownloadCoordinator {
    pub fn new(source: Arc<dyn PackageSource>, destination: &Path, options: DownloadOptions) -> Self {
        Self {
            source,
            destination: destination.to_path_buf(),
            options,
        }
    }

    /// Spawns one task per resolved package and waits for all of them. A
    /// failing (or panicking) task is recorded in the report and never affects
    /// its siblings.
    pub async fn coordinate_downloads(self, resolved: &ResolvedSet) -> DownloadReport {
        if let Err(e) = tokio::fs::create_dir_all(&self.destination).await {
            // Every task will report its own write failure.
            error!(
                "Failed to create output directory {}: {}",
                self.destination.display(),
                e
            );
        }

        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent.max(1)));
        let mut download_tasks = JoinSet::new();

        for (name, version) in resolved {
            let task_source = Arc::clone(&self.source);
            let task_semaphore = Arc::clone(&semaphore);
            let task_event_tx = self.options.event_tx.clone();
            let destination = self.destination.clone();
            let name = name.clone();
            let version = *version;

            download_tasks.spawn(async move {
                let _permit = task_semaphore.acquire_owned().await.ok();
                let target_id = format!("{} {}", name, version);

                let result = download_package(
                    task_source.as_ref(),
                    &name,
                    &version,
                    &destination,
                    task_event_tx.as_ref(),
                )
                .await;

                let status = match result {
                    Ok((path, size_bytes)) => {
                        if let Some(tx) = &task_event_tx {
                            tx.send(DownloadEvent::DownloadFinished {
                                target_id,
                                path: path.clone(),
                                size_bytes,
                            })
                            .ok();
                        }
                        DownloadStatus::Downloaded { path, size_bytes }
                    }
                    Err(e) => {
                        warn!("Error downloading package {}: {}", target_id, e);
                        if let Some(tx) = &task_event_tx {
                            tx.send(DownloadEvent::DownloadFailed {
                                target_id,
                                error: e.to_string(),
                            })
                            .ok();
                        }
                        DownloadStatus::Failed {
                            kind: FailureKind::from_error(&e),
                            reason: e.to_string(),
                        }
                    }
                };

                DownloadOutcome {
                    name,
                    version,
                    status,
                }
            });
        }

        let mut outcomes = Vec::with_capacity(resolved.len());
        while let Some(result) = download_tasks.join_next().await {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_error) if join_error.is_panic() => {
                    let panic_message = get_panic_message(join_error.into_panic());
                    error!("[Downloader] Download task panicked: {}", panic_message);
                }
                Err(join_error) => {
                    error!("[Downloader] Download task did not complete: {}", join_error);
                }
            }
        }

        // A task that died never produced an outcome; account for it here.
        let reported: HashSet<PackageName> = outcomes.iter().map(|o| o.name.clone()).collect();
        for (name, version) in resolved {
            if !reported.contains(name) {
                outcomes.push(DownloadOutcome {
                    name: name.clone(),
                    version: *version,
                    status: DownloadStatus::Failed {
                        kind: FailureKind::Panicked,
                        reason: "download task terminated unexpectedly".to_string(),
                    },
                });
            }
        }

        outcomes.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(
            "[Downloader] {} succeeded, {} failed",
            outcomes.iter().filter(|o| o.is_success()).count(),
            outcomes.iter().filter(|o| !o.is_success()).count()
        );
        DownloadReport { outcomes }
    }
}

async fn download_package(
    source: &dyn PackageSource,
    name: &PackageName,
    version: &PackageVersion,
    destination: &Path,
    event_tx: Option<&broadcast::Sender<DownloadEvent>>,
) -> Result<(PathBuf, u64)> {
    let subject = format!("{name} {version}");
    let info = source.fetch_package_info(name, version).await?;
    let location = info
        .artifact_location
        .ok_or_else(|| NugsError::ArtifactUnavailable(subject.clone()))?;

    debug!("Downloading package {} from {}", subject, location);
    if let Some(tx) = event_tx {
        tx.send(DownloadEvent::DownloadStarted {
            target_id: subject.clone(),
            url: location.to_string(),
        })
        .ok();
    }

    let content = source.fetch_artifact(&location).await?;
    match &info.artifact_hash {
        Some(expected) => verify_checksum(&subject, &content, expected)?,
        None => debug!("Skipping checksum verification for {} - none published.", subject),
    }

    let path = write_artifact(destination, &artifact_file_name(name, version), &content).await?;
    debug!("Package {} downloaded to {}", subject, path.display());
    Ok((path, content.len() as u64))
}

/// Downloads every package of `resolved` into `destination` concurrently.
pub async fn download_all(
    source: Arc<dyn PackageSource>,
    resolved: &ResolvedSet,
    destination: &Path,
    options: DownloadOptions,
) -> DownloadReport {
    DownloadCoordinator::new(source, destination, options)
        .coordinate_downloads(resolved)
        .await
}

pub(crate) fn get_panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
