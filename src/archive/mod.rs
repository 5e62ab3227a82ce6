//! Archive extraction and bundle installation.

use crate::core::error::{Error, Result};
use crate::util::ensure_dir_exists;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

pub mod bundle;

pub use bundle::{BundleMapping, install_bundle};

/// Compression wrapped around a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Xz,
    Bzip2,
}

impl Compression {
    /// Guess from the file name.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Compression::Gzip)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Some(Compression::Xz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") || name.ends_with(".tbz") {
            Some(Compression::Bzip2)
        } else if name.ends_with(".tar") {
            Some(Compression::None)
        } else {
            None
        }
    }

    /// Guess from the leading bytes of the file.
    pub fn from_magic(header: &[u8]) -> Self {
        if header.starts_with(&[0x1f, 0x8b]) {
            Compression::Gzip
        } else if header.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Compression::Xz
        } else if header.starts_with(b"BZh") {
            Compression::Bzip2
        } else {
            Compression::None
        }
    }
}

/// Extract `archive` into `target_dir`, creating the directory if needed.
///
/// Permissions, modification times and symlinks (absolute targets included)
/// are restored as recorded. Any failure is reported as
/// [`Error::CorruptArchive`].
pub fn extract(archive: &Path, target_dir: &Path) -> Result<()> {
    ensure_dir_exists(target_dir).map_err(|e| {
        Error::filesystem(target_dir, format!("failed to create directory: {}", e))
    })?;

    let mut file =
        File::open(archive).map_err(|e| Error::corrupt_archive(archive, format!("cannot open: {}", e)))?;

    let compression = match Compression::from_extension(archive) {
        Some(c) => c,
        None => sniff(&mut file).map_err(|e| Error::corrupt_archive(archive, e))?,
    };

    let reader = BufReader::new(file);
    let result = match compression {
        Compression::None => unpack(reader, target_dir),
        Compression::Gzip => unpack(flate2::read::GzDecoder::new(reader), target_dir),
        Compression::Xz => unpack(xz2::read::XzDecoder::new(reader), target_dir),
        Compression::Bzip2 => unpack(bzip2::read::BzDecoder::new(reader), target_dir),
    };

    result.map_err(|e| Error::corrupt_archive(archive, e))
}

fn sniff(file: &mut File) -> std::io::Result<Compression> {
    let mut header = [0u8; 6];
    let mut filled = 0;
    while filled < header.len() {
        let n = file.read(&mut header[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    file.seek(SeekFrom::Start(0))?;
    Ok(Compression::from_magic(&header[..filled]))
}

fn unpack<R: Read>(reader: R, target_dir: &Path) -> std::io::Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_overwrite(true);

    let mut entries = 0usize;
    let mut directories = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        entries += 1;
        if entry.header().entry_type() == tar::EntryType::Directory {
            directories.push(entry);
        } else {
            entry.unpack_in(target_dir)?;
        }
    }

    // Directory mode and mtime go on after their contents, children before
    // parents, so a read-only directory can still be filled. tar sets the
    // mode of a directory but not its mtime.
    directories.sort_by(|a, b| b.path_bytes().cmp(&a.path_bytes()));
    for mut dir in directories {
        let path = dir.path()?.into_owned();
        if dir.unpack_in(target_dir)? {
            let mtime = dir.header().mtime()?;
            filetime::set_file_mtime(
                target_dir.join(path),
                filetime::FileTime::from_unix_time(mtime as i64, 0),
            )?;
        }
    }

    if entries == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "archive contains no entries",
        ));
    }
    Ok(())
}
