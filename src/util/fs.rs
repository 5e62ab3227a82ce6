use crate::core::error::{Error, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir_exists(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Remove a directory tree if present, then create it empty.
pub fn recreate_dir(path: &Path) -> Result<()> {
    if path.symlink_metadata().is_ok() {
        std::fs::remove_dir_all(path)
            .map_err(|e| Error::filesystem(path, format!("failed to remove old tree: {}", e)))?;
    }
    std::fs::create_dir_all(path)
        .map_err(|e| Error::filesystem(path, format!("failed to create directory: {}", e)))
}

/// Create a symlink at `link` pointing to `target`, replacing whatever is at `link`.
pub fn replace_symlink(target: &Path, link: &Path) -> Result<()> {
    if let Ok(meta) = link.symlink_metadata() {
        let removed = if meta.is_dir() {
            std::fs::remove_dir_all(link)
        } else {
            std::fs::remove_file(link)
        };
        removed.map_err(|e| Error::filesystem(link, format!("failed to remove: {}", e)))?;
    }
    std::os::unix::fs::symlink(target, link).map_err(|e| {
        Error::filesystem(
            link,
            format!("failed to create symlink to {}: {}", target.display(), e),
        )
    })
}

/// Copy a single file, keeping its permissions and modification time.
pub fn copy_file_preserving(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir_exists(parent)
            .map_err(|e| Error::filesystem(parent, format!("failed to create directory: {}", e)))?;
    }

    // A read-only file left by an earlier merge would make the copy fail.
    if let Ok(meta) = dst.symlink_metadata() {
        if meta.file_type().is_symlink() || meta.permissions().readonly() {
            std::fs::remove_file(dst)
                .map_err(|e| Error::filesystem(dst, format!("failed to remove: {}", e)))?;
        }
    }

    std::fs::copy(src, dst).map_err(|e| {
        Error::filesystem(
            dst,
            format!("failed to copy from {}: {}", src.display(), e),
        )
    })?;

    let meta = std::fs::metadata(src)?;
    let mtime = filetime::FileTime::from_last_modification_time(&meta);
    filetime::set_file_mtime(dst, mtime)
        .map_err(|e| Error::filesystem(dst, format!("failed to set mtime: {}", e)))?;
    Ok(())
}

/// Overlay `src` onto `dst` recursively.
///
/// Files and symlinks from `src` replace their counterparts in `dst`;
/// anything in `dst` without a counterpart is left alone. Permissions,
/// modification times and symlink targets are preserved.
///
/// Returns the number of files and links written.
pub fn merge_tree(src: &Path, dst: &Path) -> Result<usize> {
    if !src.is_dir() {
        return Err(Error::filesystem(src, "merge source is not a directory"));
    }
    ensure_dir_exists(dst)
        .map_err(|e| Error::filesystem(dst, format!("failed to create directory: {}", e)))?;

    let mut written = 0;
    let mut dirs = Vec::new();

    for entry in WalkDir::new(src).follow_links(false).min_depth(1) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::filesystem(entry.path(), e))?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            let link_target = std::fs::read_link(entry.path())?;
            replace_symlink(&link_target, &target)?;
            written += 1;
        } else if file_type.is_dir() {
            if target.symlink_metadata().is_ok_and(|m| !m.is_dir()) {
                std::fs::remove_file(&target)
                    .map_err(|e| Error::filesystem(&target, format!("failed to remove: {}", e)))?;
            }
            ensure_dir_exists(&target).map_err(|e| {
                Error::filesystem(&target, format!("failed to create directory: {}", e))
            })?;
            dirs.push((entry.path().to_path_buf(), target));
        } else {
            copy_file_preserving(entry.path(), &target)?;
            written += 1;
        }
    }

    // Directory attributes last, deepest first, so writing children does not
    // disturb them.
    for (src_dir, dst_dir) in dirs.iter().rev() {
        let meta = std::fs::metadata(src_dir)?;
        std::fs::set_permissions(dst_dir, meta.permissions())
            .map_err(|e| Error::filesystem(dst_dir, format!("failed to set permissions: {}", e)))?;
        let mtime = filetime::FileTime::from_last_modification_time(&meta);
        filetime::set_file_mtime(dst_dir, mtime)
            .map_err(|e| Error::filesystem(dst_dir, format!("failed to set mtime: {}", e)))?;
    }

    Ok(written)
}

/// Write an executable file with the given contents.
pub fn write_executable(path: &Path, contents: &str) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        ensure_dir_exists(parent)
            .map_err(|e| Error::filesystem(parent, format!("failed to create directory: {}", e)))?;
    }
    if path.symlink_metadata().is_ok() {
        std::fs::remove_file(path)
            .map_err(|e| Error::filesystem(path, format!("failed to remove: {}", e)))?;
    }
    std::fs::write(path, contents)
        .map_err(|e| Error::filesystem(path, format!("failed to write: {}", e)))?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| Error::filesystem(path, format!("failed to set permissions: {}", e)))
}
