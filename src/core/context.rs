use crate::config::Config;
use crate::core::error::Result;
use std::path::PathBuf;

/// Context object that carries the resolved layout through the pipeline.
///
/// Every path is absolute; no step depends on the process working directory.
#[derive(Debug, Clone)]
pub struct Context {
    /// Configuration.
    pub config: Config,

    /// Destination directory given on the command line.
    pub destination: PathBuf,

    /// Toolchain root, recreated on every run (`cross-toolchain`).
    pub root_dir: PathBuf,

    /// Installed SDK (`cross-toolchain/MacOSX.sdk`).
    pub sdk_dir: PathBuf,

    /// Installed toolchain (`cross-toolchain/swift.xctoolchain`).
    pub toolchain_dir: PathBuf,

    /// Toolchain binaries (`swift.xctoolchain/usr/bin`).
    pub bin_dir: PathBuf,

    /// Download cache, kept across runs.
    pub cache_dir: PathBuf,

    /// Descriptor file inside the root.
    pub descriptor_path: PathBuf,
}

impl Context {
    /// Create a context for `destination`. Nothing is created on disk.
    pub fn new(config: Config, destination: PathBuf) -> Result<Self> {
        crate::config::validate(&config)?;

        let layout = &config.layout;
        let root_dir = destination.join(&layout.root);
        let sdk_dir = root_dir.join(&layout.sdk);
        let toolchain_dir = root_dir.join(&layout.toolchain);
        let bin_dir = toolchain_dir.join("usr").join("bin");
        let cache_dir = destination.join(&layout.cache);
        let descriptor_path = root_dir.join(&layout.descriptor);

        Ok(Self {
            config,
            destination,
            root_dir,
            sdk_dir,
            toolchain_dir,
            bin_dir,
            cache_dir,
            descriptor_path,
        })
    }

    /// Whether progress messages should be printed.
    pub fn verbose(&self) -> bool {
        self.config.verbose
    }

    /// Print a progress message when verbose output is enabled.
    pub fn log(&self, msg: impl AsRef<str>) {
        if self.config.verbose {
            println!("{}", msg.as_ref());
        }
    }
}
