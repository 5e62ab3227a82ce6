//! Builds the cctools-port linker suite for the target triple.
//!
//! The target's own `ld` cannot run on the host, so the suite is compiled
//! from source and installed into the toolchain's `usr` prefix. Two extra
//! entries are added to `usr/bin` afterwards: an unprefixed `ld` link and a
//! `dsymutil` placeholder.

use crate::archive::extract;
use crate::core::context::Context;
use crate::core::error::{Error, Result};
use crate::exec::{CommandRunner, CommandSpec, run_checked};
use crate::fetch::Fetcher;
use crate::util::fs::{ensure_dir_exists, replace_symlink, write_executable};
use std::path::{Path, PathBuf};

pub mod patch;

pub use patch::{PatchOutcome, PatchRule};

/// Name of the directory inside the source tree that holds `configure`.
const CCTOOLS_SUBDIR: &str = "cctools";

/// Placeholder installed as `dsymutil`.
pub const DSYMUTIL_STUB: &str = "#!/bin/sh\n\
echo \"dsymutil: not available in this cross toolchain, debug symbols were not extracted\"\n\
exit 0\n";

/// Files written into the toolchain by a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CctoolsInstall {
    /// The `ld` link in the toolchain's bin directory.
    pub ld_link: PathBuf,
    /// The `dsymutil` placeholder.
    pub dsymutil_stub: PathBuf,
    /// Outcomes of the configure patches.
    pub patches: Vec<PatchOutcome>,
    /// Excluded components that were not found in the makefile.
    pub missing_components: Vec<String>,
}

/// Patch rules for the configure scripts, derived from the configuration.
pub fn configure_rules(ctx: &Context) -> Vec<PatchRule> {
    let mut rules = Vec::new();
    for (i, patch) in ctx.config.cctools.configure_patches.iter().enumerate() {
        for file in ["configure", "configure.ac"] {
            rules.push(PatchRule::new(
                format!("configure-patch-{}", i + 1),
                file,
                patch.search.clone(),
                patch.replace.clone(),
            ));
        }
    }
    rules
}

/// Fetch, patch, configure, build and install cctools, then add the `ld`
/// link and the `dsymutil` placeholder.
///
/// The scratch source tree is removed when this returns, whatever the outcome.
pub fn build_cctools(
    ctx: &Context,
    fetcher: &Fetcher<'_>,
    runner: &dyn CommandRunner,
) -> Result<CctoolsInstall> {
    let cctools = &ctx.config.cctools;
    let archive = fetcher.fetch(&cctools.url, &cctools.cache_key, cctools.sha256.as_deref())?;

    let scratch = tempfile::Builder::new()
        .prefix(".cctools-")
        .tempdir_in(&ctx.destination)
        .map_err(|e| {
            Error::filesystem(
                &ctx.destination,
                format!("failed to create scratch directory: {}", e),
            )
        })?;

    ctx.log(format!("Unpacking {}...", archive.display()));
    extract(&archive, scratch.path())?;

    let source_dir = locate_source_dir(scratch.path(), &cctools.source_prefix).ok_or_else(|| {
        Error::corrupt_archive(
            &archive,
            format!(
                "no {}*/{}/configure found",
                cctools.source_prefix, CCTOOLS_SUBDIR
            ),
        )
    })?;

    let patches = patch::apply_rules(&source_dir, &configure_rules(ctx))?;

    let prefix = ctx.toolchain_dir.join("usr");
    ctx.log(format!("Configuring cctools for {}", ctx.config.target));
    let configure = CommandSpec::new("configure", source_dir.join("configure"), &source_dir)
        .arg(format!("--prefix={}", prefix.display()))
        .arg(format!("--target={}", ctx.config.target));
    run_checked(runner, &configure)?;

    let missing_components = patch::exclude_components(
        &source_dir.join("Makefile"),
        &cctools.component_variable,
        &cctools.exclude_components,
    )?;

    ctx.log("Building cctools");
    let make = CommandSpec::new("make", "make", &source_dir).arg(format!("-j{}", cctools.jobs));
    run_checked(runner, &make)?;

    ctx.log(format!("Installing cctools into {}", prefix.display()));
    let install = CommandSpec::new("make install", "make", &source_dir).arg("install");
    run_checked(runner, &install)?;

    ensure_dir_exists(&ctx.bin_dir).map_err(|e| {
        Error::filesystem(&ctx.bin_dir, format!("failed to create directory: {}", e))
    })?;

    let ld_link = ctx.bin_dir.join("ld");
    replace_symlink(Path::new(&format!("{}-ld", ctx.config.target)), &ld_link)?;

    let dsymutil_stub = ctx.bin_dir.join("dsymutil");
    write_executable(&dsymutil_stub, DSYMUTIL_STUB)?;

    drop(scratch);

    Ok(CctoolsInstall {
        ld_link,
        dsymutil_stub,
        patches,
        missing_components,
    })
}

/// Find `<prefix>*/cctools` holding a `configure` script under `unpacked`.
pub fn locate_source_dir(unpacked: &Path, prefix: &str) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(unpacked)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .map(|e| e.path().join(CCTOOLS_SUBDIR))
        .filter(|dir| dir.join("configure").is_file())
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}
