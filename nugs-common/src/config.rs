// nugs-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use super::error::{NugsError, Result};

pub const DEFAULT_REGISTRATION_URL: &str = "https://api.nuget.org/v3/registration5-semver1";
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "NuGetPackages";
pub const ARTIFACT_EXTENSION: &str = "nupkg";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 8;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base of the NuGet registration hive, without trailing slash.
    pub registration_url: String,
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_concurrent_downloads: usize,
    /// Accept plain `http` URLs (local mirrors, test servers).
    pub allow_insecure: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading nugs configuration");

        let registration_url = env::var("NUGS_REGISTRATION_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| {
                debug!(
                    "NUGS_REGISTRATION_URL not set, using default: {}",
                    DEFAULT_REGISTRATION_URL
                );
                DEFAULT_REGISTRATION_URL.to_string()
            });

        let output_dir = match env::var("NUGS_OUTPUT_DIR").ok().filter(|s| !s.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => env::current_dir()?.join(DEFAULT_OUTPUT_DIR_NAME),
        };
        debug!("Effective output directory: {}", output_dir.display());

        let request_timeout = Duration::from_secs(env_number(
            "NUGS_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        let connect_timeout = Duration::from_secs(env_number(
            "NUGS_CONNECT_TIMEOUT_SECS",
            DEFAULT_CONNECT_TIMEOUT_SECS,
        )?);
        let max_concurrent_downloads = env_number(
            "NUGS_MAX_CONCURRENT_DOWNLOADS",
            DEFAULT_MAX_CONCURRENT_DOWNLOADS,
        )?
        .max(1);
        let allow_insecure = env::var("NUGS_ALLOW_INSECURE").is_ok_and(|v| v == "1");

        debug!("Configuration loaded successfully.");
        Ok(Self {
            registration_url,
            output_dir,
            request_timeout,
            connect_timeout,
            max_concurrent_downloads,
            allow_insecure,
        })
    }

    /// Configuration pointing at an arbitrary registration hive, with defaults
    /// for everything else.
    pub fn with_registration_url(url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            registration_url: url.into().trim_end_matches('/').to_string(),
            output_dir: output_dir.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            allow_insecure: false,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `{base}/{lower-id}/{version}.json`
    pub fn registration_leaf_url(&self, lower_id: &str, version: &str) -> String {
        format!(
            "{}/{}/{}.json",
            self.registration_url,
            lower_id,
            version.to_ascii_lowercase()
        )
    }
}

fn env_number<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|e| {
            NugsError::Config(format!("{key} must be a non-negative integer, got '{raw}': {e}"))
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_url_is_lower_cased_and_joined() {
        let config = Config::with_registration_url("https://example.test/reg/", "/tmp/out");
        assert_eq!(
            config.registration_leaf_url("newtonsoft.json", "13.0.1-Beta"),
            "https://example.test/reg/newtonsoft.json/13.0.1-beta.json"
        );
    }
}
