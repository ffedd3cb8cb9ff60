// nugs-net/src/registry.rs
//! [`PackageSource`] backed by the NuGet v3 registration and catalog
//! resources.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use nugs_common::config::Config;
use nugs_common::dependency::DeclaredDependency;
use nugs_common::error::{NugsError, Result};
use nugs_common::model::{
    ArtifactHash, HashAlgorithm, PackageInfo, PackageName, PackageVersion, PlatformGroup,
};
use nugs_common::source::PackageSource;

use crate::http::{build_http_client, get_bytes, get_json};
use crate::validation::validate_url;

/// Label used for a dependency group that names no target framework.
pub const ANY_PLATFORM: &str = "any";

// --- wire types ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationLeaf {
    catalog_entry: Option<CatalogRef>,
    package_content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogRef {
    Url(String),
    Inline(Box<CatalogEntry>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    dependency_groups: Option<Vec<CatalogDependencyGroup>>,
    package_hash: Option<String>,
    package_hash_algorithm: Option<String>,
    package_content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDependencyGroup {
    target_framework: Option<String>,
    dependencies: Option<Vec<CatalogDependency>>,
}

#[derive(Debug, Deserialize)]
struct CatalogDependency {
    id: Option<String>,
    range: Option<String>,
}

// --- NugetRegistry ------------------------------------------------------------------

pub struct NugetRegistry {
    client: Client,
    config: Config,
}

impl NugetRegistry {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            config: config.clone(),
        })
    }

    fn validate(&self, url: &str) -> Result<Url> {
        validate_url(url, self.config.allow_insecure)
    }

    fn build_package_info(
        &self,
        subject: &str,
        leaf_content: Option<String>,
        entry: CatalogEntry,
    ) -> Result<PackageInfo> {
        let platform_groups = entry
            .dependency_groups
            .unwrap_or_default()
            .into_iter()
            .map(|group| {
                let platform = group
                    .target_framework
                    .map(|tf| tf.trim().to_string())
                    .filter(|tf| !tf.is_empty())
                    .unwrap_or_else(|| ANY_PLATFORM.to_string());
                let dependencies = group
                    .dependencies
                    .unwrap_or_default()
                    .into_iter()
                    .map(|dep| DeclaredDependency {
                        id: dep.id.map(|id| id.trim().to_string()),
                        min_version: dep.range.as_deref().and_then(minimum_version),
                    })
                    .collect();
                PlatformGroup::new(platform, dependencies)
            })
            .collect();

        let artifact_location = match leaf_content.or(entry.package_content) {
            Some(raw) => Some(self.validate(&raw).map_err(|e| {
                NugsError::MalformedMetadata(subject.to_string(), format!("packageContent: {e}"))
            })?),
            None => None,
        };

        let artifact_hash = match (entry.package_hash, entry.package_hash_algorithm) {
            (Some(value), Some(algorithm)) => match algorithm.to_ascii_uppercase().as_str() {
                "SHA512" => Some(ArtifactHash {
                    algorithm: HashAlgorithm::Sha512,
                    value,
                }),
                "SHA256" => Some(ArtifactHash {
                    algorithm: HashAlgorithm::Sha256,
                    value,
                }),
                other => {
                    debug!("Ignoring unsupported hash algorithm {} for {}", other, subject);
                    None
                }
            },
            _ => None,
        };

        Ok(PackageInfo {
            platform_groups,
            artifact_location,
            artifact_hash,
        })
    }
}

#[async_trait]
impl PackageSource for NugetRegistry {
    async fn fetch_package_info(
        &self,
        name: &PackageName,
        version: &PackageVersion,
    ) -> Result<PackageInfo> {
        let subject = format!("{name} {version}");
        let leaf_url = self.validate(
            &self
                .config
                .registration_leaf_url(name.normalized(), &version.to_string()),
        )?;
        let leaf: RegistrationLeaf = get_json(&self.client, &leaf_url, &subject).await?;

        let entry = match leaf.catalog_entry {
            Some(CatalogRef::Inline(entry)) => *entry,
            Some(CatalogRef::Url(raw)) => {
                let catalog_url = self.validate(&raw).map_err(|e| {
                    NugsError::MalformedMetadata(subject.clone(), format!("catalogEntry: {e}"))
                })?;
                get_json(&self.client, &catalog_url, &subject).await?
            }
            None => {
                return Err(NugsError::MalformedMetadata(
                    subject,
                    "registration leaf has no catalogEntry".to_string(),
                ))
            }
        };

        let info = self.build_package_info(&subject, leaf.package_content, entry)?;
        debug!(
            "{}: {} platform group(s), artifact {}",
            subject,
            info.platform_groups.len(),
            info.artifact_location
                .as_ref()
                .map_or("<none>", |u| u.as_str())
        );
        Ok(info)
    }

    async fn fetch_artifact(&self, location: &Url) -> Result<Vec<u8>> {
        let location = self.validate(location.as_str())?;
        let subject = location
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("artifact")
            .to_string();
        get_bytes(&self.client, &location, &subject).await
    }
}

/// Lower bound of a NuGet version range: `[1.0.0, )` → `1.0.0`,
/// `(1.0, 2.0]` → `1.0`, `1.2.3` → `1.2.3`. Ranges without a lower bound
/// (`(, 2.0)`) give `None`.
pub fn minimum_version(range: &str) -> Option<String> {
    let inner = range
        .trim()
        .trim_start_matches(&['[', '('][..])
        .trim_end_matches(&[']', ')'][..]);
    let lower = inner.split(',').next().unwrap_or_default().trim();
    (!lower.is_empty()).then(|| lower.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_lower_bounds() {
        assert_eq!(minimum_version("[4.3.0, )").as_deref(), Some("4.3.0"));
        assert_eq!(minimum_version("(1.0, 2.0]").as_deref(), Some("1.0"));
        assert_eq!(minimum_version("[1.2.3]").as_deref(), Some("1.2.3"));
        assert_eq!(minimum_version(" 13.0.1 ").as_deref(), Some("13.0.1"));
        assert_eq!(minimum_version("(, 2.0)"), None);
        assert_eq!(minimum_version(""), None);
    }

    #[test]
    fn decodes_catalog_entry() {
        let raw = r#"{
            "dependencyGroups": [
                {
                    "targetFramework": "net8.0",
                    "dependencies": [
                        { "id": "System.Memory", "range": "[4.5.5, )" },
                        { "id": "Broken" }
                    ]
                },
                { "dependencies": [] }
            ],
            "packageHash": "abc==",
            "packageHashAlgorithm": "SHA512"
        }"#;
        let entry: CatalogEntry = serde_json::from_str(raw).unwrap();
        let registry = NugetRegistry::new(&Config::with_registration_url(
            "https://example.test/reg",
            "/tmp/out",
        ))
        .unwrap();

        let info = registry
            .build_package_info(
                "Foo 1.0.0",
                Some("https://example.test/flat/foo.1.0.0.nupkg".into()),
                entry,
            )
            .unwrap();

        assert_eq!(info.platforms(), vec!["net8.0", ANY_PLATFORM]);
        let deps = &info.platform_groups[0].dependencies;
        assert_eq!(deps[0], DeclaredDependency::new("System.Memory", "4.5.5"));
        assert_eq!(deps[1].min_version, None);
        assert_eq!(
            info.artifact_hash,
            Some(ArtifactHash {
                algorithm: HashAlgorithm::Sha512,
                value: "abc==".into()
            })
        );
        assert!(info.artifact_location.is_some());
    }
}
