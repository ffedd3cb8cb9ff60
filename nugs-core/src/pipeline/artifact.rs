// nugs-core/src/pipeline/artifact.rs
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256, Sha512};
use tokio::fs;
use tracing::{debug, warn};

use nugs_common::config::ARTIFACT_EXTENSION;
use nugs_common::error::{NugsError, Result};
use nugs_common::model::{ArtifactHash, HashAlgorithm, PackageName, PackageVersion};

/// `{lower-name}.{version}.nupkg`
pub fn artifact_file_name(name: &PackageName, version: &PackageVersion) -> String {
    format!("{}.{}.{}", name.normalized(), version, ARTIFACT_EXTENSION)
}

/// Checks `content` against the registry-published digest.
pub fn verify_checksum(subject: &str, content: &[u8], expected: &ArtifactHash) -> Result<()> {
    let actual = match expected.algorithm {
        HashAlgorithm::Sha512 => STANDARD.encode(Sha512::digest(content)),
        HashAlgorithm::Sha256 => STANDARD.encode(Sha256::digest(content)),
    };
    debug!("Calculated {:?}: {} ({} bytes)", expected.algorithm, actual, content.len());
    if actual == expected.value.trim() {
        Ok(())
    } else {
        Err(NugsError::ChecksumMismatch(format!(
            "{subject}: expected {}, got {actual}",
            expected.value
        )))
    }
}

/// Writes `content` to `destination/file_name` through a temporary sibling and
/// a rename, replacing any previous file of that name.
pub async fn write_artifact(destination: &Path, file_name: &str, content: &[u8]) -> Result<PathBuf> {
    let final_path = destination.join(file_name);
    let temp_path = destination.join(format!(".{file_name}.download"));
    debug!("Writing {} bytes to temporary path: {}", content.len(), temp_path.display());

    fs::write(&temp_path, content).await.map_err(|e| {
        NugsError::IoError(format!(
            "Failed to write download to {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    if let Err(e) = fs::rename(&temp_path, &final_path).await {
        if let Err(remove_err) = fs::remove_file(&temp_path).await {
            warn!(
                "Could not remove temporary file {}: {}",
                temp_path.display(),
                remove_err
            );
        }
        return Err(NugsError::IoError(format!(
            "Failed to move temp file {} to {}: {}",
            temp_path.display(),
            final_path.display(),
            e
        )));
    }
    debug!("Moved artifact to final location: {}", final_path.display());
    Ok(final_path)
}
