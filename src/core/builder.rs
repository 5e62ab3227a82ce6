use crate::archive::{BundleMapping, extract, install_bundle};
use crate::cctools::{CctoolsInstall, build_cctools};
use crate::config::{Config, ConfigLoader};
use crate::core::context::Context;
use crate::core::error::{Error, Result};
use crate::descriptor::Descriptor;
use crate::exec::{CommandRunner, SystemRunner};
use crate::fetch::{Downloader, Fetcher, HttpDownloader};
use crate::inputs::InputPaths;
use crate::symlinks::{NormalizeReport, normalize_symlinks};
use crate::util::fs::{ensure_dir_exists, recreate_dir};
use std::path::PathBuf;

/// Builder for configuring and running a toolchain provisioning pass.
pub struct ToolchainBuilder {
    config: Option<Config>,
    working_dir: Option<PathBuf>,
    destination: Option<PathBuf>,
    cross_bundle: Option<PathBuf>,
    native_bundle: Option<PathBuf>,
    sdk_archive: Option<PathBuf>,
    downloader: Option<Box<dyn Downloader>>,
    runner: Option<Box<dyn CommandRunner>>,
}

impl ToolchainBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: None,
            working_dir: None,
            destination: None,
            cross_bundle: None,
            native_bundle: None,
            sdk_archive: None,
            downloader: None,
            runner: None,
        }
    }

    /// Set the configuration directly.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from a standalone TOML file plus env overrides.
    pub fn from_config_file(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        self.config = Some(ConfigLoader::new().config_file(path).load()?);
        Ok(self)
    }

    /// Directory that relative input paths are resolved against.
    ///
    /// Defaults to the process working directory at `build()` time.
    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    /// Set the destination directory.
    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Some(path.into());
        self
    }

    /// Set the bundle carrying the macOS runtime libraries.
    pub fn cross_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.cross_bundle = Some(path.into());
        self
    }

    /// Set the bundle carrying the host compiler.
    pub fn native_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.native_bundle = Some(path.into());
        self
    }

    /// Set the SDK archive.
    pub fn sdk_archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.sdk_archive = Some(path.into());
        self
    }

    /// Set a custom downloader implementation.
    pub fn downloader<D: Downloader + 'static>(mut self, downloader: D) -> Self {
        self.downloader = Some(Box::new(downloader));
        self
    }

    /// Set a custom command runner implementation.
    pub fn command_runner<R: CommandRunner + 'static>(mut self, runner: R) -> Self {
        self.runner = Some(Box::new(runner));
        self
    }

    // --- Build and Execute ---

    /// Validate inputs and build the provisioner. Nothing is written to disk.
    pub fn build(self) -> Result<Provisioner> {
        let config = match self.config {
            Some(config) => config,
            None => ConfigLoader::new().load()?,
        };

        let working_dir = match self.working_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        let destination = self
            .destination
            .ok_or_else(|| Error::usage("destination directory not set"))?;
        let cross_bundle = self
            .cross_bundle
            .ok_or_else(|| Error::usage("cross-compiler bundle not set"))?;
        let native_bundle = self
            .native_bundle
            .ok_or_else(|| Error::usage("native toolchain bundle not set"))?;
        let sdk_archive = self
            .sdk_archive
            .ok_or_else(|| Error::usage("SDK archive not set"))?;

        let inputs = InputPaths::resolve(
            &working_dir,
            destination,
            cross_bundle,
            native_bundle,
            sdk_archive,
        )?;

        let verbose = config.verbose;
        let ctx = Context::new(config, inputs.destination.clone())?;

        Ok(Provisioner {
            ctx,
            inputs,
            downloader: self
                .downloader
                .unwrap_or_else(|| Box::new(HttpDownloader::default())),
            runner: self
                .runner
                .unwrap_or_else(|| Box::new(SystemRunner::new(verbose))),
        })
    }

    /// Build and immediately run.
    pub fn run(self) -> Result<ProvisionReport> {
        self.build()?.run()
    }
}

impl Default for ToolchainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a finished provisioning pass.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    /// Where the descriptor was written.
    pub descriptor_path: PathBuf,
    /// The descriptor contents.
    pub descriptor: Descriptor,
    /// Files and links merged from the two bundles.
    pub merged_entries: usize,
    /// What the cctools step installed.
    pub cctools: CctoolsInstall,
    /// Symlink normalization counts.
    pub symlinks: NormalizeReport,
}

/// Runs the provisioning pipeline for one set of validated inputs.
pub struct Provisioner {
    ctx: Context,
    inputs: InputPaths,
    downloader: Box<dyn Downloader>,
    runner: Box<dyn CommandRunner>,
}

impl Provisioner {
    /// The resolved layout.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The validated inputs.
    pub fn inputs(&self) -> &InputPaths {
        &self.inputs
    }

    /// Run the full pipeline: fresh tree, SDK, bundles, cctools, symlinks,
    /// descriptor. The first failing step aborts the run.
    pub fn run(self) -> Result<ProvisionReport> {
        let ctx = &self.ctx;

        ensure_dir_exists(&ctx.destination).map_err(|e| {
            Error::filesystem(&ctx.destination, format!("failed to create destination: {}", e))
        })?;

        ctx.log(format!("Creating fresh toolchain root at {}", ctx.root_dir.display()));
        recreate_dir(&ctx.root_dir)?;

        ctx.log(format!("Installing SDK into {}", ctx.sdk_dir.display()));
        extract(&self.inputs.sdk_archive, &ctx.sdk_dir)?;

        ensure_dir_exists(&ctx.toolchain_dir).map_err(|e| {
            Error::filesystem(&ctx.toolchain_dir, format!("failed to create directory: {}", e))
        })?;

        ctx.log("Installing native toolchain bundle");
        let mut merged_entries = install_bundle(
            &self.inputs.native_bundle,
            &ctx.destination,
            &ctx.toolchain_dir,
            &native_bundle_mappings(),
            ctx.verbose(),
        )?;

        ctx.log("Installing cross-compiler bundle");
        merged_entries += install_bundle(
            &self.inputs.cross_bundle,
            &ctx.destination,
            &ctx.toolchain_dir,
            &cross_bundle_mappings(),
            ctx.verbose(),
        )?;

        let fetcher = Fetcher::new(ctx.cache_dir.clone(), &*self.downloader, ctx.verbose());
        let cctools = build_cctools(ctx, &fetcher, &*self.runner)?;

        ctx.log(format!("Normalizing symlinks in {}", ctx.sdk_dir.display()));
        let symlinks = normalize_symlinks(&ctx.sdk_dir, ctx.verbose())?;
        ctx.log(format!(
            "Rewrote {} absolute symlinks ({} relative left as-is)",
            symlinks.rewritten, symlinks.relative
        ));

        let descriptor = Descriptor::from_context(ctx)?;
        descriptor.write(&ctx.descriptor_path)?;
        ctx.log(format!("Wrote {}", ctx.descriptor_path.display()));

        Ok(ProvisionReport {
            descriptor_path: ctx.descriptor_path.clone(),
            descriptor,
            merged_entries,
            cctools,
            symlinks,
        })
    }
}

/// Where the host compiler bundle lands: its whole `usr` tree.
pub fn native_bundle_mappings() -> Vec<BundleMapping> {
    vec![BundleMapping::required("usr", "usr")]
}

/// Where the macOS runtime bundle lands: only the target runtime libraries.
pub fn cross_bundle_mappings() -> Vec<BundleMapping> {
    vec![
        BundleMapping::required("usr/lib/swift/macosx", "usr/lib/swift/macosx"),
        BundleMapping::optional("usr/lib/swift_static/macosx", "usr/lib/swift_static/macosx"),
    ]
}
