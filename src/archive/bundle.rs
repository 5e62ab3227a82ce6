use super::extract;
use crate::core::error::{Error, Result};
use crate::util::merge_tree;
use std::path::{Path, PathBuf};

/// A subtree of an unpacked bundle and where it lands in the toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleMapping {
    /// Path relative to the bundle root (the directory holding `usr`).
    pub source: PathBuf,
    /// Path relative to the toolchain directory.
    pub dest: PathBuf,
    /// Whether a missing source aborts the install.
    pub required: bool,
}

impl BundleMapping {
    /// A mapping whose source must exist.
    pub fn required(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            required: true,
        }
    }

    /// A mapping that is skipped with a warning if the source is absent.
    pub fn optional(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            required: false,
        }
    }
}

/// Extract `archive` into a scratch directory under `scratch_parent`, then
/// merge each mapping into `toolchain_dir`.
///
/// The scratch directory is removed when this returns, whether or not the
/// merge succeeded. Returns the number of files and links merged.
pub fn install_bundle(
    archive: &Path,
    scratch_parent: &Path,
    toolchain_dir: &Path,
    mappings: &[BundleMapping],
    verbose: bool,
) -> Result<usize> {
    let scratch = tempfile::Builder::new()
        .prefix(".bundle-")
        .tempdir_in(scratch_parent)
        .map_err(|e| {
            Error::filesystem(scratch_parent, format!("failed to create scratch directory: {}", e))
        })?;

    if verbose {
        println!("Unpacking {}...", archive.display());
    }
    extract(archive, scratch.path())?;

    let root = find_bundle_root(scratch.path())
        .ok_or_else(|| Error::corrupt_archive(archive, "no usr directory in bundle"))?;

    let mut merged = 0;
    for mapping in mappings {
        let src = root.join(&mapping.source);
        if !src.is_dir() {
            if mapping.required {
                return Err(Error::corrupt_archive(
                    archive,
                    format!("bundle has no {}", mapping.source.display()),
                ));
            }
            eprintln!(
                "warning: {} has no {}, skipping",
                archive.display(),
                mapping.source.display()
            );
            continue;
        }

        let dst = toolchain_dir.join(&mapping.dest);
        if verbose {
            println!("Merging {} into {}", mapping.source.display(), dst.display());
        }
        merged += merge_tree(&src, &dst)?;
    }

    Ok(merged)
}

/// Find the directory that holds `usr`: the unpack root itself, or one of
/// its immediate subdirectories (bundles usually wrap everything in a
/// versioned top-level folder).
pub fn find_bundle_root(unpacked: &Path) -> Option<PathBuf> {
    if unpacked.join("usr").is_dir() {
        return Some(unpacked.to_path_buf());
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(unpacked)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.join("usr").is_dir())
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}
