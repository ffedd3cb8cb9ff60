use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::dependency::DeclaredDependency;

/// Label of a declared dependency group (a NuGet target framework such as
/// `net8.0` or `.NETStandard2.0`). Matching trims and ignores ASCII case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetPlatform(String);

impl TargetPlatform {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, label: &str) -> bool {
        self.0.eq_ignore_ascii_case(label.trim())
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformGroup {
    pub platform: String,
    pub dependencies: Vec<DeclaredDependency>,
}

impl PlatformGroup {
    pub fn new(platform: impl Into<String>, dependencies: Vec<DeclaredDependency>) -> Self {
        Self {
            platform: platform.into(),
            dependencies,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
}

/// Registry-published digest of an artifact, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHash {
    pub algorithm: HashAlgorithm,
    pub value: String,
}

/// Structured metadata for one package version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub platform_groups: Vec<PlatformGroup>,
    pub artifact_location: Option<Url>,
    pub artifact_hash: Option<ArtifactHash>,
}

impl PackageInfo {
    pub fn group_for(&self, platform: &TargetPlatform) -> Option<&PlatformGroup> {
        self.platform_groups
            .iter()
            .find(|group| platform.matches(&group.platform))
    }

    /// Declared platform labels in declaration order, without duplicates.
    pub fn platforms(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::with_capacity(self.platform_groups.len());
        for group in &self.platform_groups {
            let label = group.platform.trim();
            if !label.is_empty() && !labels.iter().any(|l| l.eq_ignore_ascii_case(label)) {
                labels.push(label.to_string());
            }
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_lookup_is_case_insensitive() {
        let info = PackageInfo {
            platform_groups: vec![
                PlatformGroup::new("net6.0", Vec::new()),
                PlatformGroup::new(".NETStandard2.0", Vec::new()),
            ],
            ..Default::default()
        };
        assert!(info.group_for(&TargetPlatform::new(".netstandard2.0")).is_some());
        assert!(info.group_for(&TargetPlatform::new("net8.0")).is_none());
        assert_eq!(info.platforms(), vec!["net6.0", ".NETStandard2.0"]);
    }
}
