//! Buildpack staging layer for the OPA buildpack.
//!
//! This crate carries the framework side of the buildpack: the dependency
//! manifest, version resolution, artifact installation, and the staging
//! directory layout. The supply phase consumes it exclusively through the
//! [`Manifest`], [`Installer`], and [`Stager`] traits, so every collaborator
//! can be swapped for an in-memory fake in tests.

pub mod dependency;
pub mod error;
pub mod installer;
pub mod manifest;
pub mod stager;

pub use dependency::{Dependency, find_matching_version};
pub use error::{Error, Result};
pub use installer::{DownloadInstaller, Installer};
pub use manifest::{BuildpackManifest, DependencyEntry, Manifest};
pub use stager::{DirStager, Stager};
