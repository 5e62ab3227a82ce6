//! Re-rooting of absolute symlinks inside an installed SDK.
//!
//! SDK archives are packed on a macOS machine, so links such as
//! `usr/lib/libz.dylib -> /usr/lib/libz.1.dylib` point at that machine's root
//! filesystem. After extraction they must point into the SDK copy instead.

use crate::core::error::{Error, Result};
use crate::util::fs::replace_symlink;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Counts from one normalization pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Absolute links rewritten to point under the SDK root.
    pub rewritten: usize,
    /// Relative links left as they were.
    pub relative: usize,
    /// Absolute links already under the SDK root.
    pub already_rooted: usize,
}

/// Target for an absolute link once re-rooted under `sdk_root`.
///
/// Returns `None` for relative targets and for targets already under
/// `sdk_root`.
pub fn rerooted_target(sdk_root: &Path, target: &Path) -> Option<PathBuf> {
    if !target.is_absolute() || target.starts_with(sdk_root) {
        return None;
    }
    let mut joined: OsString = sdk_root.as_os_str().to_owned();
    joined.push(target.as_os_str());
    Some(PathBuf::from(joined))
}

/// Rewrite every absolute symlink under `sdk_root` so it points to
/// `<sdk_root><original target>`.
///
/// Relative links and non-link entries are untouched. Running this again on
/// its own output changes nothing.
pub fn normalize_symlinks(sdk_root: &Path, verbose: bool) -> Result<NormalizeReport> {
    if !sdk_root.is_absolute() {
        return Err(Error::filesystem(sdk_root, "SDK root must be an absolute path"));
    }

    let mut report = NormalizeReport::default();

    // Collect first so rewriting links does not race the walk.
    let mut links = Vec::new();
    for entry in WalkDir::new(sdk_root).follow_links(false) {
        let entry = entry?;
        if entry.path_is_symlink() {
            links.push(entry.into_path());
        }
    }

    for link in links {
        let target = std::fs::read_link(&link)
            .map_err(|e| Error::filesystem(&link, format!("failed to read link: {}", e)))?;

        if !target.is_absolute() {
            report.relative += 1;
            continue;
        }

        match rerooted_target(sdk_root, &target) {
            Some(new_target) => {
                if verbose {
                    println!(
                        "Relinking {} -> {}",
                        link.display(),
                        new_target.display()
                    );
                }
                replace_symlink(&new_target, &link)?;
                report.rewritten += 1;
            }
            None => report.already_rooted += 1,
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;

    fn sdk_fixture() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let sdk = dir.path().join("MacOSX.sdk");
        std::fs::create_dir_all(sdk.join("usr/lib")).unwrap();
        std::fs::create_dir_all(sdk.join("usr/include")).unwrap();
        std::fs::write(sdk.join("usr/lib/libz.1.dylib"), b"dylib").unwrap();
        std::fs::write(sdk.join("usr/include/zlib.h"), b"header").unwrap();
        (dir, sdk)
    }

    #[test]
    fn test_rerooted_target() {
        let root = Path::new("/opt/tc/MacOSX.sdk");
        assert_eq!(
            rerooted_target(root, Path::new("/usr/lib/libz.dylib")),
            Some(PathBuf::from("/opt/tc/MacOSX.sdk/usr/lib/libz.dylib"))
        );
        assert_eq!(rerooted_target(root, Path::new("libz.1.dylib")), None);
        assert_eq!(
            rerooted_target(root, Path::new("/opt/tc/MacOSX.sdk/usr/lib/libz.dylib")),
            None
        );
    }

    #[test]
    fn test_absolute_links_rerooted_and_resolve() {
        let (_dir, sdk) = sdk_fixture();
        symlink("/usr/lib/libz.1.dylib", sdk.join("usr/lib/libz.dylib")).unwrap();

        let report = normalize_symlinks(&sdk, false).unwrap();
        assert_eq!(report.rewritten, 1);

        let link = sdk.join("usr/lib/libz.dylib");
        assert_eq!(
            std::fs::read_link(&link).unwrap(),
            sdk.join("usr/lib/libz.1.dylib")
        );
        assert_eq!(std::fs::read(&link).unwrap(), b"dylib");
    }

    #[test]
    fn test_dangling_absolute_link_stays_dangling() {
        let (_dir, sdk) = sdk_fixture();
        let link = sdk.join("usr/lib/libmissing.dylib");
        symlink("/usr/lib/libmissing.1.dylib", &link).unwrap();

        normalize_symlinks(&sdk, false).unwrap();
        assert_eq!(
            std::fs::read_link(&link).unwrap(),
            sdk.join("usr/lib/libmissing.1.dylib")
        );
        assert!(std::fs::metadata(&link).is_err());
    }

    #[test]
    fn test_relative_links_untouched() {
        let (_dir, sdk) = sdk_fixture();
        let link = sdk.join("usr/lib/libz.dylib");
        symlink("libz.1.dylib", &link).unwrap();
        let before = std::fs::symlink_metadata(&link).unwrap();

        let report = normalize_symlinks(&sdk, false).unwrap();
        assert_eq!(report.relative, 1);
        assert_eq!(report.rewritten, 0);
        assert_eq!(std::fs::read_link(&link).unwrap(), Path::new("libz.1.dylib"));
        let after = std::fs::symlink_metadata(&link).unwrap();
        assert_eq!(
            filetime::FileTime::from_last_modification_time(&before),
            filetime::FileTime::from_last_modification_time(&after)
        );
    }

    #[test]
    fn test_second_pass_is_noop() {
        let (_dir, sdk) = sdk_fixture();
        symlink("/usr/lib/libz.1.dylib", sdk.join("usr/lib/libz.dylib")).unwrap();
        symlink("/usr/include", sdk.join("usr/include-compat")).unwrap();
        symlink("zlib.h", sdk.join("usr/include/zconf.h")).unwrap();

        let first = normalize_symlinks(&sdk, false).unwrap();
        assert_eq!(first.rewritten, 2);
        assert_eq!(first.relative, 1);

        let snapshot = |sdk: &Path| {
            let mut links: Vec<(PathBuf, PathBuf)> = WalkDir::new(sdk)
                .into_iter()
                .map(|e| e.unwrap())
                .filter(|e| e.path_is_symlink())
                .map(|e| (e.path().to_path_buf(), std::fs::read_link(e.path()).unwrap()))
                .collect();
            links.sort();
            links
        };
        let before = snapshot(&sdk);

        let second = normalize_symlinks(&sdk, false).unwrap();
        assert_eq!(second.rewritten, 0);
        assert_eq!(second.already_rooted, 2);
        assert_eq!(snapshot(&sdk), before);
    }

    #[test]
    fn test_directory_link_not_followed() {
        let (dir, sdk) = sdk_fixture();
        // A link to a directory outside the SDK must not be walked into.
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        symlink("/etc", outside.join("escape")).unwrap();
        symlink(&outside, sdk.join("usr/outside")).unwrap();

        let report = normalize_symlinks(&sdk, false).unwrap();
        assert_eq!(report.rewritten + report.already_rooted + report.relative, 1);
        assert_eq!(std::fs::read_link(outside.join("escape")).unwrap(), Path::new("/etc"));
    }

    #[test]
    fn test_relative_root_rejected() {
        assert!(normalize_symlinks(Path::new("MacOSX.sdk"), false).is_err());
    }
}
