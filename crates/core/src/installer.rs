//! Artifact installation into the staging dependency directory.
//!
//! The installer resolves a dependency descriptor to its manifest entry,
//! obtains the artifact bytes (a cached copy shipped with the buildpack wins
//! over the network), verifies the manifest checksum, and materializes the
//! result on disk.

use crate::dependency::Dependency;
use crate::error::{Error, Result};
use crate::manifest::{BuildpackManifest, Manifest};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::{debug, info};

/// Materializes manifest dependencies on disk.
#[async_trait]
pub trait Installer {
    /// Install `dep` into `dest_dir`.
    async fn install_dependency(&self, dep: &Dependency, dest_dir: &Path) -> Result<()>;

    /// Install the only version of `name` the manifest carries.
    ///
    /// Fails unless exactly one version is available.
    async fn install_only_version(&self, name: &str, dest_dir: &Path) -> Result<()>;
}

/// Installer backed by the buildpack manifest.
pub struct DownloadInstaller {
    manifest: BuildpackManifest,
    client: reqwest::Client,
}

impl DownloadInstaller {
    /// Create an installer over the given manifest.
    #[must_use]
    pub fn new(manifest: BuildpackManifest) -> Self {
        Self {
            manifest,
            client: reqwest::Client::new(),
        }
    }

    /// Path a cached (offline) buildpack ships this artifact at.
    fn cached_artifact_path(&self, uri: &str) -> PathBuf {
        let digest = format!("{:x}", Sha256::digest(uri.as_bytes()));
        self.manifest
            .root_dir()
            .join("dependencies")
            .join(digest)
            .join(uri_file_name(uri))
    }

    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let cached = self.cached_artifact_path(uri);
        if cached.exists() {
            debug!(path = %cached.display(), "Using cached dependency artifact");
            return std::fs::read(&cached)
                .map_err(|source| Error::io("read cached dependency", &cached, source));
        }

        debug!(%uri, "Downloading dependency artifact");
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|err| Error::Download {
                uri: uri.to_string(),
                message: err.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::Download {
                uri: uri.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|err| Error::Download {
                uri: uri.to_string(),
                message: err.to_string(),
            })
    }

    fn verify(uri: &str, expected: &str, data: &[u8]) -> Result<()> {
        if expected.is_empty() {
            return Ok(());
        }
        let actual = format!("{:x}", Sha256::digest(data));
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(Error::ChecksumMismatch {
                uri: uri.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }

    fn materialize(uri: &str, data: &[u8], dest_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dest_dir)
            .map_err(|source| Error::io("create dependency directory", dest_dir, source))?;

        if uri.ends_with(".tar.gz") || uri.ends_with(".tgz") {
            let mut archive = Archive::new(GzDecoder::new(Cursor::new(data)));
            archive.unpack(dest_dir).map_err(|err| Error::Extract {
                uri: uri.to_string(),
                message: err.to_string(),
            })?;
        } else {
            let target = dest_dir.join(uri_file_name(uri));
            std::fs::write(&target, data)
                .map_err(|source| Error::io("write dependency binary", &target, source))?;
            set_executable(&target)?;
        }

        Ok(())
    }
}

#[async_trait]
impl Installer for DownloadInstaller {
    async fn install_dependency(&self, dep: &Dependency, dest_dir: &Path) -> Result<()> {
        let entry = self
            .manifest
            .entry(&dep.name, &dep.version)
            .ok_or_else(|| Error::UnknownDependency {
                name: dep.name.clone(),
                version: dep.version.clone(),
            })?;

        info!(dependency = %dep, dir = %dest_dir.display(), "Installing dependency");

        let data = self.fetch(&entry.uri).await?;
        Self::verify(&entry.uri, &entry.sha256, &data)?;
        Self::materialize(&entry.uri, &data, dest_dir)
    }

    async fn install_only_version(&self, name: &str, dest_dir: &Path) -> Result<()> {
        let versions = self.manifest.all_dependency_versions(name);
        match versions.as_slice() {
            [version] => {
                self.install_dependency(&Dependency::new(name, version), dest_dir)
                    .await
            }
            other => Err(Error::OnlyVersion {
                name: name.to_string(),
                count: other.len(),
            }),
        }
    }
}

fn uri_file_name(uri: &str) -> &str {
    let without_query = uri.split('?').next().unwrap_or(uri);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(|source| Error::io("read binary permissions", path, source))?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
        .map_err(|source| Error::io("mark binary executable", path, source))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
