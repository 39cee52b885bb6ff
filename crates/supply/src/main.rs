//! The buildpack `supply` lifecycle hook.
//!
//! Invoked by the staging framework as
//! `bin/supply BUILD_DIR CACHE_DIR DEPS_DIR DEPS_IDX`.

use clap::Parser;
use miette::IntoDiagnostic;
use opa_buildpack_core::{BuildpackManifest, DirStager, DownloadInstaller};
use opa_buildpack_supply::Supplier;
use std::path::{Path, PathBuf};

/// Arguments handed to a supply hook by the staging framework.
#[derive(Debug, Parser)]
#[command(name = "supply", about = "Provision the OPA binary into the droplet")]
struct Args {
    /// Application build directory.
    build_dir: PathBuf,

    /// Per-buildpack artifact cache.
    cache_dir: PathBuf,

    /// Root of all buildpacks' dependency directories.
    deps_dir: PathBuf,

    /// Index of this buildpack within the deps directory.
    deps_idx: String,

    /// Buildpack root (where manifest.yml lives); inferred from the hook
    /// binary location when unset.
    #[arg(long, env = "BUILDPACK_DIR")]
    buildpack_dir: Option<PathBuf>,
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let buildpack_dir = match args.buildpack_dir {
        Some(dir) => dir,
        None => default_buildpack_dir()?,
    };

    let manifest = BuildpackManifest::load(&buildpack_dir.join("manifest.yml"))?;
    let installer = DownloadInstaller::new(manifest.clone());
    let stager = DirStager::new(args.build_dir, args.cache_dir, args.deps_dir, &args.deps_idx);
    let mut supplier = Supplier::new(stager, manifest, installer);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    runtime.block_on(supplier.run())?;

    Ok(())
}

/// The buildpack root is the parent of the `bin/` directory the hook runs from.
fn default_buildpack_dir() -> miette::Result<PathBuf> {
    let exe = std::env::current_exe().into_diagnostic()?;
    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| miette::miette!("could not locate the buildpack root; pass --buildpack-dir"))
}
