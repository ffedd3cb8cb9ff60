// nugs-common/src/dependency/definition.rs
use std::fmt;

use crate::error::{NugsError, Result};
use crate::model::{PackageName, PackageVersion};

/// A dependency entry exactly as the metadata source reported it. Either field
/// may be missing; such entries are skipped during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub id: Option<String>,
    pub min_version: Option<String>,
}

impl DeclaredDependency {
    pub fn new(id: impl Into<String>, min_version: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            min_version: Some(min_version.into()),
        }
    }
}

/// "Requires at least `min_version` of `name`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDeclaration {
    pub name: PackageName,
    pub min_version: PackageVersion,
}

impl TryFrom<&DeclaredDependency> for DependencyDeclaration {
    type Error = NugsError;

    fn try_from(declared: &DeclaredDependency) -> Result<Self> {
        let id = declared
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| NugsError::InvalidInput("dependency without a package id".into()))?;
        let name = PackageName::new(id)?;
        let raw_version = declared.min_version.as_deref().ok_or_else(|| {
            NugsError::VersionParse(String::new(), format!("no minimum version for {name}"))
        })?;
        let min_version = raw_version.parse()?;
        Ok(Self { name, min_version })
    }
}

impl fmt::Display for DependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} >= {}", self.name, self.min_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_well_formed_entries() {
        let decl = DependencyDeclaration::try_from(&DeclaredDependency::new("System.Memory", "4.5"))
            .unwrap();
        assert_eq!(decl.name.normalized(), "system.memory");
        assert_eq!(decl.to_string(), "System.Memory >= 4.5.0");
    }

    #[test]
    fn rejects_missing_parts() {
        let no_id = DeclaredDependency {
            id: None,
            min_version: Some("1.0".into()),
        };
        assert!(matches!(
            DependencyDeclaration::try_from(&no_id),
            Err(NugsError::InvalidInput(_))
        ));

        let no_version = DeclaredDependency {
            id: Some("Foo".into()),
            min_version: None,
        };
        assert!(matches!(
            DependencyDeclaration::try_from(&no_version),
            Err(NugsError::VersionParse(..))
        ));

        let bad_version = DeclaredDependency::new("Foo", "1.0-rc");
        assert!(matches!(
            DependencyDeclaration::try_from(&bad_version),
            Err(NugsError::VersionParse(..))
        ));
    }
}
