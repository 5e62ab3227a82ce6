//! Cache-aware download of source archives.

use crate::core::error::{Error, Result};
use crate::util::{ensure_dir_exists, sha256_file};
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod http;

pub use http::HttpDownloader;

/// Something that can stream a URL into a writer.
pub trait Downloader {
    /// Write the body of `url` into `out`.
    ///
    /// Returns an error for connection failures and non-2xx responses.
    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64>;
}

/// Whether `key` names a single entry directly inside the cache directory.
pub fn is_plain_file_name(key: &str) -> bool {
    !key.is_empty() && key != "." && key != ".." && !key.contains('/')
}

/// Downloads into a cache directory, reusing existing entries forever.
pub struct Fetcher<'a> {
    cache_dir: PathBuf,
    downloader: &'a dyn Downloader,
    verbose: bool,
}

impl<'a> Fetcher<'a> {
    /// Create a new fetcher with the specified cache directory.
    pub fn new(cache_dir: PathBuf, downloader: &'a dyn Downloader, verbose: bool) -> Self {
        Self {
            cache_dir,
            downloader,
            verbose,
        }
    }

    /// Path of the cache entry for `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(key)
    }

    /// Return the cached file for `key`, downloading `url` if it is absent.
    ///
    /// An existing entry is returned without any network access and without
    /// verification. A fresh download lands in a temporary file first and is
    /// renamed into place only once complete (and, when `sha256` is given,
    /// only if the digest matches).
    pub fn fetch(&self, url: &str, key: &str, sha256: Option<&str>) -> Result<PathBuf> {
        if !is_plain_file_name(key) {
            return Err(Error::config(format!("invalid cache key '{}'", key)));
        }

        ensure_dir_exists(&self.cache_dir).map_err(|e| {
            Error::filesystem(&self.cache_dir, format!("failed to create cache: {}", e))
        })?;

        let entry = self.entry_path(key);
        if entry.exists() {
            if self.verbose {
                println!("Using cached {} from {}", key, entry.display());
            }
            return Ok(entry);
        }

        if self.verbose {
            println!("Fetching {} from {}...", key, url);
        }

        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", key))
            .suffix(".part")
            .tempfile_in(&self.cache_dir)
            .map_err(|e| {
                Error::filesystem(&self.cache_dir, format!("failed to create temp file: {}", e))
            })?;

        let bytes = self.downloader.download(url, temp.as_file_mut())?;
        temp.as_file_mut()
            .sync_all()
            .map_err(|e| Error::download(url, format!("failed to flush download: {}", e)))?;

        if let Some(expected) = sha256 {
            verify_digest(url, temp.path(), expected)?;
        }

        temp.persist(&entry)
            .map_err(|e| Error::filesystem(&entry, format!("failed to commit download: {}", e)))?;

        if self.verbose {
            println!("Fetched {} ({} bytes)", key, bytes);
        }
        Ok(entry)
    }
}

fn verify_digest(url: &str, path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(Error::Checksum {
            url: url.to_string(),
            expected: expected.to_lowercase(),
            actual,
        })
    }
}
