// nugs-common/src/dependency/resolver.rs

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_recursion::async_recursion;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dependency::DependencyDeclaration;
use crate::error::{NugsError, Result};
use crate::model::{PackageName, PackageVersion, TargetPlatform};
use crate::source::PackageSource;

// --- ResolvedSet ---
/// Flat name → version mapping produced by a resolution run. Iteration is
/// sorted by normalized name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedSet {
    entries: BTreeMap<PackageName, PackageVersion>,
}

impl ResolvedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &PackageName) -> Option<&PackageVersion> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &PackageName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, PackageName, PackageVersion> {
        self.entries.iter()
    }

    /// Records `version` for `name`, replacing whatever was recorded.
    pub fn insert(&mut self, name: PackageName, version: PackageVersion) -> Option<PackageVersion> {
        self.entries.insert(name, version)
    }
}

impl<'a> IntoIterator for &'a ResolvedSet {
    type Item = (&'a PackageName, &'a PackageVersion);
    type IntoIter = btree_map::Iter<'a, PackageName, PackageVersion>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(PackageName, PackageVersion)> for ResolvedSet {
    fn from_iter<I: IntoIterator<Item = (PackageName, PackageVersion)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// --- ResolutionIssue ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    VersionParse,
    InvalidDeclaration,
    MetadataNotFound,
    MalformedMetadata,
    MetadataUnavailable,
    PlatformNotDeclared,
}

impl IssueKind {
    /// Normal terminal conditions rather than failures.
    pub fn is_informational(self) -> bool {
        matches!(self, Self::PlatformNotDeclared)
    }

    fn from_fetch_error(err: &NugsError) -> Self {
        if err.is_not_found() {
            Self::MetadataNotFound
        } else if err.is_malformed() {
            Self::MalformedMetadata
        } else {
            Self::MetadataUnavailable
        }
    }
}

/// A node-local problem met during the walk. None of these abort resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionIssue {
    pub package: String,
    pub version: Option<String>,
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    pub resolved: ResolvedSet,
    pub issues: Vec<ResolutionIssue>,
}

impl Resolution {
    pub fn failures(&self) -> impl Iterator<Item = &ResolutionIssue> {
        self.issues.iter().filter(|i| !i.kind.is_informational())
    }
}

// --- DependencyResolver ---
/// Depth-first, platform-filtered walk over dependency declarations.
///
/// The walk is sequential and owns its [`ResolvedSet`], so the
/// check-then-insert-or-raise step on each node is never interleaved with
/// another branch.
pub struct DependencyResolver {
    source: Arc<dyn PackageSource>,
    platform: TargetPlatform,
    resolved: ResolvedSet,
    issues: Vec<ResolutionIssue>,
}

impl DependencyResolver {
    pub fn new(source: Arc<dyn PackageSource>, platform: TargetPlatform) -> Self {
        Self {
            source,
            platform,
            resolved: ResolvedSet::new(),
            issues: Vec::new(),
        }
    }

    pub async fn resolve(mut self, root_name: &str, root_version: &str) -> Result<Resolution> {
        let root = PackageName::new(root_name)?;
        debug!(
            "Starting dependency resolution for {} {} (platform {})",
            root, root_version, self.platform
        );

        match root_version.parse::<PackageVersion>() {
            Ok(version) => self.visit(root, version).await,
            Err(e) => self.record(
                &root,
                Some(root_version.to_string()),
                IssueKind::VersionParse,
                &e,
            ),
        }

        debug!(
            "Resolution finished: {} package(s), {} issue(s)",
            self.resolved.len(),
            self.issues.len()
        );
        Ok(Resolution {
            resolved: self.resolved,
            issues: self.issues,
        })
    }

    /// Walk one node
    #[async_recursion]
    async fn visit(&mut self, name: PackageName, version: PackageVersion) {
        // -------- memo / cycle guard --------------------------------------------------
        match self.resolved.get(&name) {
            Some(existing) if *existing >= version => {
                debug!(
                    "Package {} version {} already included (at {}). Skipping.",
                    name, version, existing
                );
                return;
            }
            Some(existing) => {
                debug!(
                    "Raising {} from {} to {} and re-walking its dependencies",
                    name, existing, version
                );
            }
            None => {}
        }
        self.resolved.insert(name.clone(), version);

        // -------- metadata -------------------------------------------------------------
        let info = match self.source.fetch_package_info(&name, &version).await {
            Ok(info) => info,
            Err(e) => {
                let kind = IssueKind::from_fetch_error(&e);
                self.record(&name, Some(version.to_string()), kind, &e);
                return;
            }
        };

        let Some(group) = info.group_for(&self.platform) else {
            info!(
                "No dependencies found for {} version {} for platform {}.",
                name, version, self.platform
            );
            self.issues.push(ResolutionIssue {
                package: name.to_string(),
                version: Some(version.to_string()),
                kind: IssueKind::PlatformNotDeclared,
                message: format!("no dependency group for platform {}", self.platform),
            });
            return;
        };

        let mut declarations = Vec::with_capacity(group.dependencies.len());
        for declared in &group.dependencies {
            match DependencyDeclaration::try_from(declared) {
                Ok(declaration) => declarations.push(declaration),
                Err(e) => {
                    let kind = match e {
                        NugsError::VersionParse(..) => IssueKind::VersionParse,
                        _ => IssueKind::InvalidDeclaration,
                    };
                    let package = declared
                        .id
                        .clone()
                        .unwrap_or_else(|| format!("<unnamed dependency of {name}>"));
                    self.issues.push(ResolutionIssue {
                        package,
                        version: declared.min_version.clone(),
                        kind,
                        message: format!("declared by {name} {version}: {e}"),
                    });
                    warn!("Skipping malformed dependency of {} {}: {}", name, version, e);
                }
            }
        }

        // -------- recurse --------------------------------------------------------------
        for declaration in declarations {
            debug!(
                "Dependency of {} {}: {}, Minimum version: {}",
                name, version, declaration.name, declaration.min_version
            );
            self.visit(declaration.name, declaration.min_version).await;
        }
    }

    fn record(
        &mut self,
        name: &PackageName,
        version: Option<String>,
        kind: IssueKind,
        err: &NugsError,
    ) {
        warn!(
            "Could not resolve {} {}: {}",
            name,
            version.as_deref().unwrap_or("?"),
            err
        );
        self.issues.push(ResolutionIssue {
            package: name.to_string(),
            version,
            kind,
            message: err.to_string(),
        });
    }
}

/// Resolves the transitive dependency set of `root_name` `root_version` for
/// `platform`. Only an empty root name is a hard error; every other failure is
/// reported in [`Resolution::issues`].
pub async fn resolve(
    source: Arc<dyn PackageSource>,
    root_name: &str,
    root_version: &str,
    platform: &TargetPlatform,
) -> Result<Resolution> {
    DependencyResolver::new(source, platform.clone())
        .resolve(root_name, root_version)
        .await
}

/// Platform labels declared by one package version.
pub async fn available_platforms(
    source: &dyn PackageSource,
    name: &str,
    version: &str,
) -> Result<Vec<String>> {
    let name = PackageName::new(name)?;
    let version: PackageVersion = version.parse()?;
    let info = source.fetch_package_info(&name, &version).await?;
    Ok(info.platforms())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySource;

    const NET8: &str = "net8.0";

    fn name(s: &str) -> PackageName {
        PackageName::new(s).unwrap()
    }

    fn ver(s: &str) -> PackageVersion {
        s.parse().unwrap()
    }

    async fn run(source: &Arc<MemorySource>, root: &str, version: &str) -> Resolution {
        resolve(source.clone(), root, version, &TargetPlatform::new(NET8))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn resolves_linear_chain() {
        let source = Arc::new(
            MemorySource::new()
                .package("Foo", "1.0", NET8, &[("Bar", "1.0")])
                .package("Bar", "1.0", NET8, &[("Baz", "1.0")])
                .package("Baz", "1.0", NET8, &[]),
        );

        let resolution = run(&source, "Foo", "1.0").await;

        let expected: ResolvedSet = [
            (name("Foo"), ver("1.0")),
            (name("Bar"), ver("1.0")),
            (name("Baz"), ver("1.0")),
        ]
        .into_iter()
        .collect();
        assert_eq!(resolution.resolved, expected);
        assert_eq!(resolution.failures().count(), 0);
    }

    #[tokio::test]
    async fn highest_requested_version_wins_and_is_rewalked() {
        let source = Arc::new(
            MemorySource::new()
                .package("Foo", "1.0", NET8, &[("Bar", "1.0"), ("Baz", "1.0")])
                .package("Bar", "1.0", NET8, &[])
                .package("Bar", "2.0", NET8, &[("Qux", "3.0")])
                .package("Baz", "1.0", NET8, &[("Bar", "2.0")])
                .package("Qux", "3.0", NET8, &[]),
        );

        let resolution = run(&source, "Foo", "1.0").await;

        assert_eq!(resolution.resolved.get(&name("Bar")), Some(&ver("2.0")));
        assert_eq!(resolution.resolved.get(&name("Qux")), Some(&ver("3.0")));
        assert_eq!(resolution.resolved.len(), 4);
        assert_eq!(source.info_calls("Bar", "1.0"), 1);
        assert_eq!(source.info_calls("Bar", "2.0"), 1);
    }

    #[tokio::test]
    async fn satisfied_requests_are_not_refetched() {
        let source = Arc::new(
            MemorySource::new()
                .package("Root", "1.0", NET8, &[("Shared", "2.0"), ("Left", "1.0")])
                .package("Left", "1.0", NET8, &[("Shared", "1.5"), ("shared", "2.0")])
                .package("Shared", "2.0", NET8, &[]),
        );

        let resolution = run(&source, "Root", "1.0").await;

        assert_eq!(resolution.resolved.get(&name("SHARED")), Some(&ver("2.0")));
        assert_eq!(source.info_calls("Shared", "2.0"), 1);
        assert_eq!(source.info_calls("Shared", "1.5"), 0);
        assert_eq!(source.total_info_calls(), 3);
    }

    #[tokio::test]
    async fn cycles_terminate() {
        let source = Arc::new(
            MemorySource::new()
                .package("A", "1.0", NET8, &[("B", "1.0")])
                .package("B", "1.0", NET8, &[("A", "1.0")]),
        );

        let resolution = run(&source, "A", "1.0").await;

        assert_eq!(resolution.resolved.len(), 2);
        assert_eq!(source.total_info_calls(), 2);
    }

    #[tokio::test]
    async fn other_platform_groups_are_ignored() {
        let source = Arc::new(
            MemorySource::new()
                .package("Foo", "1.0", "net6.0", &[("Bar", "1.0")])
                .package("Bar", "1.0", "net6.0", &[]),
        );

        let resolution = run(&source, "Foo", "1.0").await;

        assert_eq!(resolution.resolved.len(), 1);
        assert!(resolution.resolved.contains(&name("Foo")));
        assert_eq!(resolution.issues.len(), 1);
        assert_eq!(resolution.issues[0].kind, IssueKind::PlatformNotDeclared);
        assert_eq!(resolution.failures().count(), 0);
        assert_eq!(source.info_calls("Bar", "1.0"), 0);
    }

    #[tokio::test]
    async fn package_without_groups_is_a_leaf() {
        let source = Arc::new(
            MemorySource::new()
                .package("Foo", "1.0", NET8, &[("Bare", "2.0")])
                .bare_package("Bare", "2.0"),
        );

        let resolution = run(&source, "Foo", "1.0").await;

        assert_eq!(resolution.resolved.get(&name("Bare")), Some(&ver("2.0")));
        assert_eq!(resolution.issues.len(), 1);
        assert_eq!(resolution.issues[0].package, "Bare");
        assert!(resolution.issues[0].kind.is_informational());
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped_individually() {
        let source = Arc::new(
            MemorySource::new()
                .package(
                    "Foo",
                    "1.0",
                    NET8,
                    &[("Bad", "1.0-preview"), ("", "1.0"), ("Good", "1.0")],
                )
                .package("Good", "1.0", NET8, &[]),
        );

        let resolution = run(&source, "Foo", "1.0").await;

        assert!(resolution.resolved.contains(&name("Good")));
        assert!(!resolution.resolved.contains(&name("Bad")));
        let kinds: Vec<_> = resolution.issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::VersionParse, IssueKind::InvalidDeclaration]);
    }

    #[tokio::test]
    async fn metadata_failures_keep_node_as_leaf() {
        let source = Arc::new(
            MemorySource::new()
                .package(
                    "Foo",
                    "1.0",
                    NET8,
                    &[("Missing", "1.0"), ("Broken", "1.0"), ("Ok", "1.0")],
                )
                .malformed("Broken", "1.0")
                .package("Ok", "1.0", NET8, &[]),
        );

        let resolution = run(&source, "Foo", "1.0").await;

        assert_eq!(resolution.resolved.len(), 4);
        let kinds: Vec<_> = resolution.failures().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![IssueKind::MetadataNotFound, IssueKind::MalformedMetadata]
        );
    }

    #[tokio::test]
    async fn repeated_runs_are_identical() {
        let source = Arc::new(
            MemorySource::new()
                .package("Foo", "1.0", NET8, &[("Bar", "1.0"), ("Baz", "1.0")])
                .package("Bar", "1.0", NET8, &[("Baz", "1.1")])
                .package("Baz", "1.0", NET8, &[])
                .package("Baz", "1.1", NET8, &[]),
        );

        let first = run(&source, "Foo", "1.0").await;
        let second = run(&source, "foo", "1.0.0").await;

        assert_eq!(first.resolved, second.resolved);
    }

    #[tokio::test]
    async fn empty_root_fails_fast() {
        let source = Arc::new(MemorySource::new());
        let err = resolve(source.clone(), "  ", "1.0", &TargetPlatform::new(NET8))
            .await
            .unwrap_err();
        assert!(matches!(err, NugsError::InvalidInput(_)));
        assert_eq!(source.total_info_calls(), 0);
    }

    #[tokio::test]
    async fn unparseable_root_version_is_reported() {
        let source = Arc::new(MemorySource::new().package("Foo", "1.0", NET8, &[]));
        let resolution = run(&source, "Foo", "latest").await;
        assert!(resolution.resolved.is_empty());
        assert_eq!(resolution.issues[0].kind, IssueKind::VersionParse);
    }

    #[tokio::test]
    async fn lists_declared_platforms() {
        let source = MemorySource::new()
            .package("Foo", "1.0", "net6.0", &[])
            .package("Foo", "1.0", NET8, &[]);
        let platforms = available_platforms(&source, "foo", "1.0").await.unwrap();
        assert_eq!(platforms, vec!["net6.0", "net8.0"]);
    }
}
