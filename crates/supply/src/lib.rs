//! Supply phase of the OPA buildpack.
//!
//! Reads the application's optional `ADCConfig.yml`, resolves the requested
//! (or default) OPA version against the buildpack manifest, installs the
//! matching artifact into the staging dependency directory, and registers the
//! binary on the buildpack PATH.

pub mod config;
pub mod supplier;

pub use config::AdcConfig;
pub use supplier::Supplier;
