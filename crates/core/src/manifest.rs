//! The buildpack dependency manifest (`manifest.yml`).
//!
//! The manifest ships inside the buildpack and lists every artifact the
//! buildpack can install, plus the default version per dependency name.

use crate::dependency::{Dependency, find_matching_version};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Read access to the buildpack's dependency catalog.
pub trait Manifest {
    /// All versions of `name` available in this buildpack, in manifest order.
    fn all_dependency_versions(&self, name: &str) -> Vec<String>;

    /// The default dependency for `name`, resolved against the available
    /// versions (a default may itself be a constraint such as `0.20.x`).
    fn default_version(&self, name: &str) -> Result<Dependency>;
}

/// One installable artifact in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyEntry {
    /// Dependency name.
    pub name: String,
    /// Exact artifact version.
    pub version: String,
    /// Where the artifact is downloaded from.
    pub uri: String,
    /// Expected sha256 of the artifact bytes; empty skips verification.
    #[serde(default)]
    pub sha256: String,
    /// Root filesystems this artifact supports.
    #[serde(default)]
    pub cf_stacks: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DefaultEntry {
    name: String,
    version: String,
}

/// The parsed `manifest.yml` of a buildpack.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildpackManifest {
    /// Buildpack language identifier.
    pub language: String,
    #[serde(default)]
    default_versions: Vec<DefaultEntry>,
    #[serde(default)]
    dependencies: Vec<DependencyEntry>,
    #[serde(skip)]
    root_dir: PathBuf,
}

impl BuildpackManifest {
    /// Load `manifest.yml` from `path`, remembering its directory so the
    /// installer can locate artifacts shipped with a cached buildpack.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| Error::io("read buildpack manifest", path, source))?;
        let mut manifest: Self = serde_yaml::from_str(&raw).map_err(|source| Error::Manifest {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;
        manifest.root_dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(manifest)
    }

    /// Directory the manifest was loaded from (the buildpack root).
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// The manifest entry carrying `name` at exactly `version`.
    #[must_use]
    pub fn entry(&self, name: &str, version: &str) -> Option<&DependencyEntry> {
        self.dependencies
            .iter()
            .find(|dep| dep.name == name && dep.version == version)
    }
}

impl Manifest for BuildpackManifest {
    fn all_dependency_versions(&self, name: &str) -> Vec<String> {
        self.dependencies
            .iter()
            .filter(|dep| dep.name == name)
            .map(|dep| dep.version.clone())
            .collect()
    }

    fn default_version(&self, name: &str) -> Result<Dependency> {
        let default = self
            .default_versions
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| Error::NoDefaultVersion {
                name: name.to_string(),
            })?;

        let version = find_matching_version(&default.version, &self.all_dependency_versions(name))?;
        Ok(Dependency::new(name, &version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MANIFEST: &str = r"---
language: opa
default_versions:
  - name: opa
    version: 0.20.x
dependencies:
  - name: opa
    version: 0.15.0
    uri: https://mirror.example.com/opa/opa-0.15.0.tgz
    sha256: 1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a
    cf_stacks:
      - cflinuxfs4
  - name: opa
    version: 0.20.0
    uri: https://mirror.example.com/opa/opa-0.20.0.tgz
    sha256: 2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b
    cf_stacks:
      - cflinuxfs4
  - name: opa
    version: 0.20.4
    uri: https://mirror.example.com/opa/opa-0.20.4.tgz
    cf_stacks:
      - cflinuxfs4
";

    fn write_manifest(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("manifest.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_parses_manifest_and_remembers_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), MANIFEST);

        let manifest = BuildpackManifest::load(&path).unwrap();
        assert_eq!(manifest.language, "opa");
        assert_eq!(manifest.root_dir(), dir.path());
    }

    #[test]
    fn versions_are_listed_in_manifest_order() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = BuildpackManifest::load(&write_manifest(dir.path(), MANIFEST)).unwrap();

        assert_eq!(
            manifest.all_dependency_versions("opa"),
            vec!["0.15.0", "0.20.0", "0.20.4"]
        );
        assert!(manifest.all_dependency_versions("node").is_empty());
    }

    #[test]
    fn default_version_resolves_constraint_shaped_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = BuildpackManifest::load(&write_manifest(dir.path(), MANIFEST)).unwrap();

        let dep = manifest.default_version("opa").unwrap();
        assert_eq!(dep, Dependency::new("opa", "0.20.4"));
    }

    #[test]
    fn missing_default_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = BuildpackManifest::load(&write_manifest(dir.path(), MANIFEST)).unwrap();

        assert!(matches!(
            manifest.default_version("node"),
            Err(Error::NoDefaultVersion { name }) if name == "node"
        ));
    }

    #[test]
    fn entry_looks_up_exact_version() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = BuildpackManifest::load(&write_manifest(dir.path(), MANIFEST)).unwrap();

        let entry = manifest.entry("opa", "0.20.0").unwrap();
        assert_eq!(entry.uri, "https://mirror.example.com/opa/opa-0.20.0.tgz");
        assert!(manifest.entry("opa", "0.21.0").is_none());
    }

    #[test]
    fn entry_without_checksum_defaults_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = BuildpackManifest::load(&write_manifest(dir.path(), MANIFEST)).unwrap();

        assert!(manifest.entry("opa", "0.20.4").unwrap().sha256.is_empty());
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), "language: [unclosed");

        assert!(matches!(
            BuildpackManifest::load(&path),
            Err(Error::Manifest { .. })
        ));
    }

    #[test]
    fn missing_manifest_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            BuildpackManifest::load(&dir.path().join("manifest.yml")),
            Err(Error::Io { .. })
        ));
    }
}
