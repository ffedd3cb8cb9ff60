use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{NugsError, Result};

const MAX_COMPONENTS: usize = 4;

/// A dotted numeric package version (`major[.minor[.patch[.revision]]]`).
///
/// Missing components count as zero, so `1.0` and `1.0.0` are the same
/// version. Rendering follows NuGet normalization: at least three components,
/// the fourth only when it is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageVersion {
    parts: [u64; MAX_COMPONENTS],
}

impl PackageVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            parts: [major, minor, patch, 0],
        }
    }

    pub fn major(&self) -> u64 {
        self.parts[0]
    }

    pub fn minor(&self) -> u64 {
        self.parts[1]
    }

    pub fn patch(&self) -> u64 {
        self.parts[2]
    }

    pub fn revision(&self) -> u64 {
        self.parts[3]
    }
}

impl FromStr for PackageVersion {
    type Err = NugsError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let fail = |reason: &str| NugsError::VersionParse(s.to_string(), reason.to_string());

        if raw.is_empty() {
            return Err(fail("empty version"));
        }

        let mut parts = [0u64; MAX_COMPONENTS];
        let mut count = 0;
        for component in raw.split('.') {
            if count == MAX_COMPONENTS {
                return Err(fail("more than four components"));
            }
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(fail("components must be non-empty decimal numbers"));
            }
            parts[count] = component
                .parse()
                .map_err(|_| fail("component out of range"))?;
            count += 1;
        }

        Ok(Self { parts })
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor, patch, revision] = self.parts;
        write!(f, "{major}.{minor}.{patch}")?;
        if revision != 0 {
            write!(f, ".{revision}")?;
        }
        Ok(())
    }
}

impl Serialize for PackageVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
