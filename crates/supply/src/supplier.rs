//! The supply sequence: resolve, install, and expose the OPA binary.

use crate::config::AdcConfig;
use opa_buildpack_core::{
    Dependency, Error, Installer, Manifest, Result, Stager, find_matching_version,
};
use std::path::PathBuf;
use tracing::{error, info};

/// Name of the dependency this buildpack supplies.
pub const DEP_NAME: &str = "opa";

/// Drives the supply lifecycle step.
///
/// The supplier only talks to its collaborators through their traits, so the
/// whole phase runs against in-memory fakes in tests.
pub struct Supplier<M, I, S> {
    manifest: M,
    installer: I,
    stager: S,
    config: AdcConfig,
}

impl<M: Manifest, I: Installer, S: Stager> Supplier<M, I, S> {
    /// Create a supplier over the given collaborators.
    pub fn new(stager: S, manifest: M, installer: I) -> Self {
        Self {
            manifest,
            installer,
            stager,
            config: AdcConfig::default(),
        }
    }

    /// The configuration loaded by [`Self::setup`].
    pub fn config(&self) -> &AdcConfig {
        &self.config
    }

    /// Run the supply step: setup, then installation. The first failure is
    /// logged and aborts the step.
    pub async fn run(&mut self) -> Result<()> {
        info!("Supplying opa");

        if let Err(err) = self.setup() {
            error!("Could not setup: {err}");
            return Err(err);
        }

        if let Err(err) = self.install_opa().await {
            error!("Could not install opa: {err}");
            return Err(err);
        }

        Ok(())
    }

    /// Load the optional application configuration and create the `logs`
    /// directory under the build directory.
    pub fn setup(&mut self) -> Result<()> {
        self.config = AdcConfig::load(self.stager.build_dir())?;

        let logs_dir = self.stager.build_dir().join("logs");
        std::fs::create_dir(&logs_dir)
            .map_err(|source| Error::io("create 'logs' directory", &logs_dir, source))?;

        Ok(())
    }

    /// Resolve the OPA version, install it into the dependency directory,
    /// and register the binary on the buildpack PATH.
    pub async fn install_opa(&self) -> Result<()> {
        let dep = match self.find_matching_version(DEP_NAME, &self.config.opa_version) {
            Ok(dep) => dep,
            Err(err) => {
                info!(
                    "Available versions: {}",
                    self.available_versions().join(", ")
                );
                return Err(err);
            }
        };

        if self.config.opa_version.is_empty() {
            info!("No OPA version specified - using default => {}", dep.version);
        } else {
            info!(
                "Requested OPA version: {} => {}",
                self.config.opa_version, dep.version
            );
        }

        let dir = self.stager.dep_dir().join("opa");
        self.installer.install_dependency(&dep, &dir).await?;

        let binary: PathBuf = dir.join("opa").join("sbin").join("opa");
        self.stager.add_bin_dependency_link(&binary, "opa")
    }

    fn available_versions(&self) -> Vec<String> {
        self.manifest.all_dependency_versions(DEP_NAME)
    }

    fn find_matching_version(&self, name: &str, requested: &str) -> Result<Dependency> {
        let target = if requested.is_empty() {
            self.manifest.default_version(name)?.version
        } else {
            requested.to_string()
        };

        let versions = self.manifest.all_dependency_versions(name);
        let version = find_matching_version(&target, &versions)?;

        Ok(Dependency::new(name, &version))
    }
}
