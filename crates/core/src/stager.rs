//! Staging directory layout and PATH registration.
//!
//! A supply hook is handed four directories by the platform: the application
//! build directory, a per-buildpack cache, the root of all buildpacks'
//! dependency directories, and this buildpack's index within it. Everything a
//! buildpack installs lives under `<deps dir>/<deps idx>`; binaries linked
//! into its `bin/` subdirectory end up on the PATH of the running application
//! and of later lifecycle phases.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Access to the staging directory layout.
pub trait Stager {
    /// Application build directory.
    fn build_dir(&self) -> &Path;

    /// Root of all buildpacks' dependency directories.
    fn deps_dir(&self) -> &Path;

    /// Index of this buildpack within the deps directory.
    fn deps_idx(&self) -> &str;

    /// This buildpack's own dependency directory (`<deps dir>/<deps idx>`).
    fn dep_dir(&self) -> PathBuf;

    /// Expose `dest` as `<dep dir>/bin/<name>` so the application and later
    /// lifecycle phases can invoke it by name.
    fn add_bin_dependency_link(&self, dest: &Path, name: &str) -> Result<()>;

    /// Write a profile.d script sourced when the application starts.
    fn write_profile_d(&self, script_name: &str, contents: &str) -> Result<()>;
}

/// Stager over the four directories the platform hands to a supply hook.
#[derive(Debug, Clone)]
pub struct DirStager {
    build_dir: PathBuf,
    cache_dir: PathBuf,
    deps_dir: PathBuf,
    deps_idx: String,
}

impl DirStager {
    /// Create a stager from the hook's positional arguments.
    #[must_use]
    pub fn new(build_dir: PathBuf, cache_dir: PathBuf, deps_dir: PathBuf, deps_idx: &str) -> Self {
        Self {
            build_dir,
            cache_dir,
            deps_dir,
            deps_idx: deps_idx.to_string(),
        }
    }

    /// Per-buildpack artifact cache handed over by the platform.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

impl Stager for DirStager {
    fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    fn deps_dir(&self) -> &Path {
        &self.deps_dir
    }

    fn deps_idx(&self) -> &str {
        &self.deps_idx
    }

    fn dep_dir(&self) -> PathBuf {
        self.deps_dir.join(&self.deps_idx)
    }

    fn add_bin_dependency_link(&self, dest: &Path, name: &str) -> Result<()> {
        let bin_dir = self.dep_dir().join("bin");
        std::fs::create_dir_all(&bin_dir)
            .map_err(|source| Error::io("create bin directory", &bin_dir, source))?;

        let link = bin_dir.join(name);
        if link.symlink_metadata().is_ok() {
            std::fs::remove_file(&link)
                .map_err(|source| Error::io("replace existing bin link", &link, source))?;
        }

        // Relative target so the link survives droplet relocation.
        let target = relative_to(&bin_dir, dest);
        debug!(link = %link.display(), target = %target.display(), "Linking binary");
        std::os::unix::fs::symlink(&target, &link)
            .map_err(|source| Error::io("register bin dependency link", &link, source))
    }

    fn write_profile_d(&self, script_name: &str, contents: &str) -> Result<()> {
        let profile_dir = self.dep_dir().join("profile.d");
        std::fs::create_dir_all(&profile_dir)
            .map_err(|source| Error::io("create profile.d directory", &profile_dir, source))?;

        let script = profile_dir.join(script_name);
        std::fs::write(&script, contents)
            .map_err(|source| Error::io("write profile.d script", &script, source))
    }
}

/// Relative path from `base` to `target`.
fn relative_to(base: &Path, target: &Path) -> PathBuf {
    let base_components: Vec<_> = base.components().collect();
    let target_components: Vec<_> = target.components().collect();

    let common = base_components
        .iter()
        .zip(&target_components)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &target_components[common..] {
        relative.push(component);
    }
    relative
}
