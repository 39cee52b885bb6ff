//! Dependency descriptors and version-constraint matching.
//!
//! Version comparison is delegated to the `semver` crate; this module only
//! widens the loose version strings users put in their configuration
//! (`0.15`, `0.15.x`, `1`) into proper requirements and picks the best
//! available candidate.

use crate::error::{Error, Result};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

/// A named, versioned artifact from the buildpack manifest.
///
/// Produced by version resolution, consumed by the installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Dependency name (e.g., "opa").
    pub name: String,
    /// Fully resolved version string.
    pub version: String,
}

impl Dependency {
    /// Create a new dependency descriptor.
    #[must_use]
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Select the highest version in `versions` satisfying `constraint`.
///
/// Bare partial constraints widen by segment count: three segments match
/// exactly, two select the highest patch within the minor, one the highest
/// within the major. Explicit range or wildcard expressions pass through to
/// the matcher untouched. Candidates that are not valid semver are skipped.
pub fn find_matching_version(constraint: &str, versions: &[String]) -> Result<String> {
    let requirement = parse_constraint(constraint)?;

    let mut best: Option<Version> = None;
    for candidate in versions {
        let Ok(version) = Version::parse(candidate) else {
            continue;
        };
        if requirement.matches(&version) && best.as_ref().is_none_or(|b| version > *b) {
            best = Some(version);
        }
    }

    best.map(|v| v.to_string()).ok_or_else(|| Error::NoMatchingVersion {
        constraint: constraint.to_string(),
    })
}

fn parse_constraint(input: &str) -> Result<VersionReq> {
    let trimmed = input.trim();

    let widened = if trimmed.contains(['>', '<', '=', '^', '~', '*', ',']) || has_wildcard(trimmed)
    {
        trimmed.to_string()
    } else {
        match trimmed.split('.').count() {
            3 => format!("={trimmed}"),
            2 => format!("~{trimmed}"),
            _ => format!("^{trimmed}"),
        }
    };

    VersionReq::parse(&widened).map_err(|source| Error::InvalidConstraint {
        constraint: input.to_string(),
        source,
    })
}

fn has_wildcard(constraint: &str) -> bool {
    constraint
        .split('.')
        .any(|segment| segment.eq_ignore_ascii_case("x"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn full_version_matches_exactly() {
        let available = versions(&["0.15.0", "0.15.1", "0.16.0"]);
        assert_eq!(
            find_matching_version("0.15.0", &available).ok(),
            Some("0.15.0".to_string())
        );
    }

    #[test]
    fn minor_prefix_selects_highest_patch() {
        let available = versions(&["0.15.0", "0.15.1", "0.16.0"]);
        assert_eq!(
            find_matching_version("0.15", &available).ok(),
            Some("0.15.1".to_string())
        );
    }

    #[test]
    fn major_prefix_selects_highest_within_major() {
        let available = versions(&["1.0.0", "1.8.2", "2.0.0"]);
        assert_eq!(
            find_matching_version("1", &available).ok(),
            Some("1.8.2".to_string())
        );
    }

    #[test]
    fn wildcard_segment_passes_through() {
        let available = versions(&["0.15.0", "0.15.1", "0.16.0"]);
        assert_eq!(
            find_matching_version("0.15.x", &available).ok(),
            Some("0.15.1".to_string())
        );
    }

    #[test]
    fn explicit_range_passes_through() {
        let available = versions(&["0.15.0", "0.15.1", "0.16.0"]);
        assert_eq!(
            find_matching_version(">=0.15.0, <0.16.0", &available).ok(),
            Some("0.15.1".to_string())
        );
    }

    #[test]
    fn unmatched_constraint_is_an_error() {
        let available = versions(&["0.15.0", "0.15.1"]);
        let error = find_matching_version("9.9.9", &available).unwrap_err();
        assert!(matches!(error, Error::NoMatchingVersion { constraint } if constraint == "9.9.9"));
    }

    #[test]
    fn invalid_constraint_is_an_error() {
        let available = versions(&["0.15.0"]);
        assert!(matches!(
            find_matching_version("latest-and-greatest", &available),
            Err(Error::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn unparseable_candidates_are_skipped() {
        let available = versions(&["not-a-version", "0.15.1"]);
        assert_eq!(
            find_matching_version("0.15", &available).ok(),
            Some("0.15.1".to_string())
        );
    }

    #[test]
    fn empty_candidate_list_is_an_error() {
        assert!(matches!(
            find_matching_version("0.15", &[]),
            Err(Error::NoMatchingVersion { .. })
        ));
    }

    #[test]
    fn dependency_displays_name_and_version() {
        let dep = Dependency::new("opa", "0.20.0");
        assert_eq!(dep.to_string(), "opa@0.20.0");
    }
}
