//! macos-cross-toolchain: provision a Linux-hosted toolchain that targets macOS.
//!
//! Usage: macos-cross-toolchain <dest> <cross-bundle> <native-bundle> <sdk-archive>
//!
//! Produces `<dest>/cross-toolchain/` holding the SDK, the merged toolchain,
//! cctools, and `macos-destination.json` for the downstream build system.

use clap::Parser;
use macos_cross_toolchain::config::ConfigLoader;
use macos_cross_toolchain::{Error, ToolchainBuilder};
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser)]
#[command(name = "macos-cross-toolchain")]
#[command(version)]
#[command(about = "Build a Linux-hosted cross-compilation toolchain targeting macOS")]
struct Args {
    /// Destination directory; cross-toolchain/ is (re)created inside it
    dest: PathBuf,

    /// Toolchain bundle carrying the macOS runtime libraries
    cross_bundle: PathBuf,

    /// Toolchain bundle carrying the host compiler
    native_bundle: PathBuf,

    /// macOS SDK archive
    sdk_archive: PathBuf,

    /// Standalone TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print progress for each step
    #[arg(short, long)]
    verbose: bool,

    /// Parallel jobs for the cctools build
    #[arg(short, long)]
    jobs: Option<u32>,

    /// Target triple for cctools and the descriptor
    #[arg(long)]
    target: Option<String>,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            exit(code);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        exit(e.exit_code());
    }
}

fn run(args: Args) -> Result<(), Error> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = args.config {
        loader = loader.config_file(path);
    }
    let mut config = loader.load()?;

    if args.verbose {
        config.verbose = true;
    }
    if let Some(jobs) = args.jobs {
        config.cctools.jobs = jobs;
    }
    if let Some(target) = args.target {
        config.target = target;
    }

    let report = ToolchainBuilder::new()
        .with_config(config)
        .destination(args.dest)
        .cross_bundle(args.cross_bundle)
        .native_bundle(args.native_bundle)
        .sdk_archive(args.sdk_archive)
        .run()?;

    println!("Toolchain ready: {}", report.descriptor_path.display());
    Ok(())
}
