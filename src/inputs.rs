//! Resolution and validation of the four positional inputs.

use crate::core::error::{Error, InputKind, Result};
use std::path::{Component, Path, PathBuf};

/// Absolute, validated input paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    /// Directory that receives the toolchain root and the cache.
    pub destination: PathBuf,
    /// Bundle carrying the macOS runtime libraries.
    pub cross_bundle: PathBuf,
    /// Bundle carrying the host compiler.
    pub native_bundle: PathBuf,
    /// SDK header/library archive.
    pub sdk_archive: PathBuf,
}

impl InputPaths {
    /// Resolve every path against `cwd` and check that the archives exist.
    ///
    /// Nothing is created on disk; the destination may or may not exist yet.
    pub fn resolve(
        cwd: &Path,
        destination: impl AsRef<Path>,
        cross_bundle: impl AsRef<Path>,
        native_bundle: impl AsRef<Path>,
        sdk_archive: impl AsRef<Path>,
    ) -> Result<Self> {
        if !cwd.is_absolute() {
            return Err(Error::config(format!(
                "working directory must be absolute, got {}",
                cwd.display()
            )));
        }

        let destination = absolutize(cwd, destination.as_ref());
        if destination.exists() && !destination.is_dir() {
            return Err(Error::missing_input(InputKind::Destination, destination));
        }

        Ok(Self {
            destination,
            cross_bundle: existing_file(cwd, cross_bundle.as_ref(), InputKind::CrossBundle)?,
            native_bundle: existing_file(cwd, native_bundle.as_ref(), InputKind::NativeBundle)?,
            sdk_archive: existing_file(cwd, sdk_archive.as_ref(), InputKind::SdkArchive)?,
        })
    }
}

/// Join a relative path onto `cwd`, then drop `.` and `..` lexically.
///
/// The result ends up verbatim in the descriptor and in re-rooted SDK links.
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    normalize_lexically(&joined)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // `..` at the root stays at the root
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn existing_file(cwd: &Path, path: &Path, input: InputKind) -> Result<PathBuf> {
    let resolved = absolutize(cwd, path);
    if resolved.is_file() {
        Ok(resolved)
    } else {
        Err(Error::missing_input(input, resolved))
    }
}
