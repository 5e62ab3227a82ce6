//! macos-cross-toolchain: provision a Linux-hosted cross-compilation toolchain
//! that targets macOS.
//!
//! Given a destination directory, two toolchain bundles and a macOS SDK archive,
//! the library assembles a self-contained tree:
//!
//! ```text
//! <dest>/
//!   cache/                      downloaded sources, kept across runs
//!   cross-toolchain/            recreated on every run
//!     MacOSX.sdk/               the SDK, absolute symlinks re-rooted inside it
//!     swift.xctoolchain/usr/    host compiler, macOS runtime libraries, cctools
//!     macos-destination.json    descriptor for the downstream build system
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use macos_cross_toolchain::builder;
//!
//! # fn main() -> macos_cross_toolchain::Result<()> {
//! let report = builder()
//!     .destination("out")
//!     .cross_bundle("swift-macos.tar.gz")
//!     .native_bundle("swift-linux.tar.gz")
//!     .sdk_archive("MacOSX.sdk.tar.xz")
//!     .run()?;
//! println!("{}", report.descriptor_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! Defaults can be overridden from a standalone TOML file and from
//! `MACOS_CROSS_TOOLCHAIN_*` environment variables:
//!
//! ```toml
//! target = "arm64-apple-macosx"
//! verbose = true
//!
//! [cctools]
//! jobs = 8
//! sha256 = "..."
//! ```
//!
//! # Architecture
//!
//! External effects sit behind two traits so the pipeline can be driven
//! without a network or a compiler:
//!
//! - [`Downloader`](fetch::Downloader): fetches a URL into the cache
//! - [`CommandRunner`](exec::CommandRunner): runs configure and make

pub mod archive;
pub mod cctools;
pub mod config;
pub mod core;
pub mod descriptor;
pub mod exec;
pub mod fetch;
pub mod inputs;
pub mod symlinks;
pub mod util;

// Re-export commonly used types
pub use crate::core::{Error, InputKind, ProvisionReport, Provisioner, Result, ToolchainBuilder};
pub use config::Config;
pub use descriptor::Descriptor;
pub use inputs::InputPaths;

/// Create a new toolchain builder.
///
/// This is the main entry point for the fluent API.
pub fn builder() -> ToolchainBuilder {
    ToolchainBuilder::new()
}
