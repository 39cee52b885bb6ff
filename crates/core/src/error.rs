//! Error types for buildpack staging operations.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for staging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while supplying a dependency into the droplet.
///
/// Every variant is fatal to the staging step; nothing here is retried.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The application's optional configuration file is malformed.
    #[error("Failed to parse {}: {source}", path.display())]
    #[diagnostic(
        code(opa_buildpack::config_parse_failed),
        help("Check the YAML syntax of the configuration file in the application directory")
    )]
    Config {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The buildpack's own manifest could not be parsed.
    #[error("Invalid buildpack manifest at {}: {message}", path.display())]
    #[diagnostic(
        code(opa_buildpack::manifest_invalid),
        help("The buildpack packaging is broken; repackage the buildpack with a valid manifest.yml")
    )]
    Manifest {
        /// Path to the manifest file.
        path: PathBuf,
        /// Description of the parse failure.
        message: String,
    },

    /// The manifest declares no default version for a dependency.
    #[error("No default version for dependency '{name}'")]
    #[diagnostic(
        code(opa_buildpack::no_default_version),
        help("Add a default_versions entry for the dependency, or request an explicit version")
    )]
    NoDefaultVersion {
        /// Name of the dependency.
        name: String,
    },

    /// No available version satisfies the requested constraint.
    #[error("No version matching '{constraint}'")]
    #[diagnostic(
        code(opa_buildpack::no_matching_version),
        help("Request one of the versions shipped with this buildpack")
    )]
    NoMatchingVersion {
        /// The constraint that failed to match.
        constraint: String,
    },

    /// The requested version string is not a usable version constraint.
    #[error("Invalid version constraint '{constraint}': {source}")]
    #[diagnostic(
        code(opa_buildpack::invalid_constraint),
        help("Use a full version (1.2.3), a prefix (1.2), or a semver range expression")
    )]
    InvalidConstraint {
        /// The offending constraint.
        constraint: String,
        /// The underlying semver error.
        #[source]
        source: semver::Error,
    },

    /// A resolved dependency has no entry in the manifest.
    #[error("Dependency '{name}' version '{version}' is not in the buildpack manifest")]
    #[diagnostic(
        code(opa_buildpack::unknown_dependency),
        help("The manifest dependency list and the resolved version disagree; repackage the buildpack")
    )]
    UnknownDependency {
        /// Name of the dependency.
        name: String,
        /// The resolved version with no manifest entry.
        version: String,
    },

    /// The manifest carries more or fewer than one version of a dependency
    /// installed through the only-version path.
    #[error("Expected exactly one version of '{name}' in the manifest, found {count}")]
    #[diagnostic(code(opa_buildpack::only_version_ambiguous))]
    OnlyVersion {
        /// Name of the dependency.
        name: String,
        /// How many versions the manifest carries.
        count: usize,
    },

    /// Downloading a dependency artifact failed.
    #[error("Could not download {uri}: {message}")]
    #[diagnostic(
        code(opa_buildpack::download_failed),
        help("Check network access from the staging environment to the dependency mirror")
    )]
    Download {
        /// The artifact URI.
        uri: String,
        /// Description of the failure.
        message: String,
    },

    /// A downloaded artifact does not match its manifest checksum.
    #[error("Checksum mismatch for {uri}: expected {expected}, got {actual}")]
    #[diagnostic(
        code(opa_buildpack::checksum_mismatch),
        help("The artifact was corrupted in transit or the manifest checksum is stale")
    )]
    ChecksumMismatch {
        /// The artifact URI.
        uri: String,
        /// Checksum declared in the manifest.
        expected: String,
        /// Checksum of the downloaded bytes.
        actual: String,
    },

    /// A dependency archive could not be unpacked.
    #[error("Could not extract {uri}: {message}")]
    #[diagnostic(code(opa_buildpack::extract_failed))]
    Extract {
        /// The artifact URI.
        uri: String,
        /// Description of the failure.
        message: String,
    },

    /// I/O failure, with the operation being performed for context.
    #[error("Could not {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(opa_buildpack::io_error),
        help("Check that the staging directories exist and are writable")
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },
}

impl Error {
    /// I/O error carrying the failed operation and path.
    pub fn io(operation: &str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: Some(path.to_path_buf()),
            operation: operation.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "complete a file operation".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_includes_operation_and_path() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = Error::io("create 'logs' directory", Path::new("/app/logs"), source);

        let message = error.to_string();
        assert!(message.contains("Could not create 'logs' directory"));
        assert!(message.contains("/app/logs"));
    }

    #[test]
    fn io_error_without_path_has_no_location() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: Error = source.into();

        let message = error.to_string();
        assert!(message.starts_with("Could not complete a file operation:"));
        assert!(!message.contains(" at "));
    }

    #[test]
    fn no_matching_version_names_the_constraint() {
        let error = Error::NoMatchingVersion {
            constraint: "9.9.9".to_string(),
        };
        assert_eq!(error.to_string(), "No version matching '9.9.9'");
    }

    #[test]
    fn checksum_mismatch_names_both_digests() {
        let error = Error::ChecksumMismatch {
            uri: "https://mirror/opa.tgz".to_string(),
            expected: "aaaa".to_string(),
            actual: "bbbb".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("expected aaaa"));
        assert!(message.contains("got bbbb"));
    }

    #[test]
    fn diagnostic_codes_are_namespaced() {
        use miette::Diagnostic;

        let error = Error::NoDefaultVersion {
            name: "opa".to_string(),
        };
        assert_eq!(
            error.code().map(|c| c.to_string()),
            Some("opa_buildpack::no_default_version".to_string())
        );
        assert!(error.help().is_some());
    }

    #[test]
    fn result_alias_supports_question_mark() {
        fn inner() -> Result<u32> {
            Ok(7)
        }

        fn outer() -> Result<u32> {
            let value = inner()?;
            Ok(value)
        }

        assert_eq!(outer().ok(), Some(7));
    }
}
