// nugs-common/src/memory.rs
//! In-memory [`PackageSource`] with call counters, for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use crate::dependency::DeclaredDependency;
use crate::error::{NugsError, Result};
use crate::model::{ArtifactHash, PackageInfo, PackageName, PackageVersion, PlatformGroup};
use crate::source::PackageSource;

type Key = (String, PackageVersion);

enum Entry {
    Info(PackageInfo),
    Failure(NugsError),
}

#[derive(Default)]
pub struct MemorySource {
    entries: HashMap<Key, Entry>,
    artifacts: HashMap<String, Vec<u8>>,
    info_calls: Mutex<HashMap<Key, usize>>,
    artifact_calls: AtomicUsize,
}

fn key(name: &str, version: &str) -> Key {
    let version = version
        .parse()
        .unwrap_or_else(|e| panic!("test fixture version {version:?}: {e}"));
    (name.trim().to_lowercase(), version)
}

fn artifact_url(name: &str, version: &PackageVersion) -> Url {
    let lower = name.trim().to_lowercase();
    Url::parse(&format!("memory://packages/{lower}/{version}/{lower}.{version}.nupkg"))
        .unwrap_or_else(|e| panic!("memory artifact url for {lower}: {e}"))
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` `version` declaring `deps` for `platform`. Calling it again
    /// for the same package adds another platform group. The package gets an
    /// artifact whose content is `"{lower-name}.{version}"`.
    pub fn package(mut self, name: &str, version: &str, platform: &str, deps: &[(&str, &str)]) -> Self {
        let group = PlatformGroup::new(
            platform,
            deps.iter()
                .map(|(id, min)| DeclaredDependency::new(*id, *min))
                .collect(),
        );
        let key = key(name, version);
        let location = artifact_url(name, &key.1);
        let content = format!("{}.{}", key.0, key.1).into_bytes();
        self.artifacts.insert(location.to_string(), content);

        match self.entries.get_mut(&key) {
            Some(Entry::Info(info)) => info.platform_groups.push(group),
            _ => {
                self.entries.insert(
                    key,
                    Entry::Info(PackageInfo {
                        platform_groups: vec![group],
                        artifact_location: Some(location),
                        artifact_hash: None,
                    }),
                );
            }
        }
        self
    }

    /// Adds a package that declares no platform groups at all.
    pub fn bare_package(mut self, name: &str, version: &str) -> Self {
        let key = key(name, version);
        let location = artifact_url(name, &key.1);
        self.artifacts
            .insert(location.to_string(), format!("{}.{}", key.0, key.1).into_bytes());
        self.entries.insert(
            key,
            Entry::Info(PackageInfo {
                platform_groups: Vec::new(),
                artifact_location: Some(location),
                artifact_hash: None,
            }),
        );
        self
    }

    /// Metadata for this package cannot be structured.
    pub fn malformed(mut self, name: &str, version: &str) -> Self {
        let key = key(name, version);
        let err = NugsError::MalformedMetadata(format!("{} {}", key.0, key.1), "garbage".into());
        self.entries.insert(key, Entry::Failure(err));
        self
    }

    /// Metadata exists but advertises no download location.
    pub fn without_artifact(mut self, name: &str, version: &str) -> Self {
        if let Some(Entry::Info(info)) = self.entries.get_mut(&key(name, version)) {
            if let Some(location) = info.artifact_location.take() {
                self.artifacts.remove(location.as_str());
            }
        }
        self
    }

    /// The download location is advertised but fetching it fails.
    pub fn broken_artifact(mut self, name: &str, version: &str) -> Self {
        if let Some(Entry::Info(info)) = self.entries.get(&key(name, version)) {
            if let Some(location) = &info.artifact_location {
                self.artifacts.remove(location.as_str());
            }
        }
        self
    }

    pub fn artifact_content(mut self, name: &str, version: &str, content: &[u8]) -> Self {
        if let Some(Entry::Info(info)) = self.entries.get(&key(name, version)) {
            if let Some(location) = &info.artifact_location {
                self.artifacts.insert(location.to_string(), content.to_vec());
            }
        }
        self
    }

    pub fn artifact_hash(mut self, name: &str, version: &str, hash: ArtifactHash) -> Self {
        if let Some(Entry::Info(info)) = self.entries.get_mut(&key(name, version)) {
            info.artifact_hash = Some(hash);
        }
        self
    }

    /// How many times metadata for `name` `version` was requested.
    pub fn info_calls(&self, name: &str, version: &str) -> usize {
        let calls = self.info_calls.lock().unwrap_or_else(|e| e.into_inner());
        calls.get(&key(name, version)).copied().unwrap_or(0)
    }

    pub fn total_info_calls(&self) -> usize {
        let calls = self.info_calls.lock().unwrap_or_else(|e| e.into_inner());
        calls.values().sum()
    }

    pub fn artifact_calls(&self) -> usize {
        self.artifact_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PackageSource for MemorySource {
    async fn fetch_package_info(
        &self,
        name: &PackageName,
        version: &PackageVersion,
    ) -> Result<PackageInfo> {
        let key = (name.normalized().to_string(), *version);
        {
            let mut calls = self.info_calls.lock().unwrap_or_else(|e| e.into_inner());
            *calls.entry(key.clone()).or_default() += 1;
        }
        match self.entries.get(&key) {
            Some(Entry::Info(info)) => Ok(info.clone()),
            Some(Entry::Failure(err)) => Err(err.clone()),
            None => Err(NugsError::NotFound(format!("{name} {version}"))),
        }
    }

    async fn fetch_artifact(&self, location: &Url) -> Result<Vec<u8>> {
        self.artifact_calls.fetch_add(1, Ordering::SeqCst);
        self.artifacts.get(location.as_str()).cloned().ok_or_else(|| {
            NugsError::DownloadError(
                location.path().to_string(),
                location.to_string(),
                "connection reset".to_string(),
            )
        })
    }
}
