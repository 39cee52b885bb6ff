//! Optional application-provided staging configuration.
//!
//! Applications may ship an `ADCConfig.yml` at the root of their build
//! directory to pin the OPA version and tune the admission-control settings.
//! The file is optional and nothing beyond YAML well-formedness is validated
//! here.

use opa_buildpack_core::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Name of the optional configuration file in the application build directory.
pub const CONFIG_FILE: &str = "ADCConfig.yml";

/// User settings for the supply phase, read from [`CONFIG_FILE`].
///
/// Every field defaults to its zero value; an absent file leaves the whole
/// config zeroed. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AdcConfig {
    /// Requested OPA version; empty means "use the buildpack default".
    #[serde(default)]
    pub opa_version: String,

    /// Version of the authorization content bundle.
    #[serde(default)]
    pub authorization_content_version: String,

    /// Port the admission-control endpoint listens on.
    #[serde(default)]
    pub adc_port: u16,

    /// Authorization-bundle settings.
    #[serde(default)]
    pub bundle: BundleConfig,
}

/// Bundle section of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BundleConfig {
    /// Polling policy for the authorization bundle.
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Bundle polling delays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PollingConfig {
    /// Minimum delay between polls, in seconds.
    #[serde(default)]
    pub min_delay_seconds: u64,

    /// Maximum delay between polls, in seconds.
    #[serde(default)]
    pub max_delay_seconds: u64,
}

impl AdcConfig {
    /// Load the configuration from `build_dir`, or the zero value if the
    /// file is absent.
    pub fn load(build_dir: &Path) -> Result<Self> {
        let path = build_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .map_err(|source| Error::io("read configuration", &path, source))?;
        serde_yaml::from_str(&raw).map_err(|source| Error::Config { path, source })
    }
}
