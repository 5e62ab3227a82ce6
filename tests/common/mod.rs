//! Fixtures shared by the integration tests: in-test archives and fakes for
//! the network and the cctools build.

#![allow(dead_code)]

use macos_cross_toolchain::exec::{CommandRunner, CommandSpec, ProcessOutput};
use macos_cross_toolchain::fetch::Downloader;
use macos_cross_toolchain::{Error, Result};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub enum Entry<'a> {
    File(&'a str, &'a [u8]),
    Symlink(&'a str, &'a str),
}

/// Encode `entries` as a gzip-compressed tar in memory.
pub fn tar_gz_bytes(entries: &[Entry<'_>]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_mtime(1_600_000_000);
        match entry {
            Entry::File(name, data) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(data.len() as u64);
                header.set_mode(0o755);
                builder.append_data(&mut header, name, *data).unwrap();
            }
            Entry::Symlink(name, target) => {
                header.set_entry_type(tar::EntryType::Symlink);
                header.set_size(0);
                header.set_mode(0o777);
                builder.append_link(&mut header, name, target).unwrap();
            }
        }
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn write_tar_gz(path: &Path, entries: &[Entry<'_>]) {
    std::fs::write(path, tar_gz_bytes(entries)).unwrap();
}

/// A cctools-port source tree with a configure script carrying the flag
/// that gets patched out.
pub fn cctools_source_archive() -> Vec<u8> {
    tar_gz_bytes(&[
        Entry::File(
            "cctools-port-949.0.1-ld64-530/cctools/configure",
            b"#!/bin/sh\nCFLAGS=\"-O2 -Wno-enum-conversion\"\n",
        ),
        Entry::File(
            "cctools-port-949.0.1-ld64-530/cctools/configure.ac",
            b"CFLAGS=\"-O2 -Wno-enum-conversion\"\n",
        ),
    ])
}

/// Writes the three input archives into `dir` and returns their names.
pub fn write_inputs(dir: &Path) -> (&'static str, &'static str, &'static str) {
    write_tar_gz(
        &dir.join("swift-macos.tar.gz"),
        &[
            Entry::File(
                "swift-5.9-RELEASE-osx/usr/lib/swift/macosx/libswiftCore.dylib",
                b"dylib",
            ),
            Entry::File(
                "swift-5.9-RELEASE-osx/usr/lib/swift_static/macosx/libswiftCore.a",
                b"archive",
            ),
            Entry::File("swift-5.9-RELEASE-osx/usr/bin/swiftc", b"macos compiler"),
        ],
    );
    write_tar_gz(
        &dir.join("swift-linux.tar.gz"),
        &[
            Entry::File("swift-5.9-RELEASE-ubuntu22.04/usr/bin/swiftc", b"linux compiler"),
            Entry::File(
                "swift-5.9-RELEASE-ubuntu22.04/usr/lib/swift/linux/libswiftCore.so",
                b"so",
            ),
        ],
    );
    write_tar_gz(
        &dir.join("MacOSX.sdk.tar.gz"),
        &[
            Entry::File("usr/include/stdio.h", b"int printf(const char *, ...);\n"),
            Entry::File("usr/lib/libc.dylib", b"libc"),
            Entry::Symlink("usr/lib/libSystem.dylib", "/usr/lib/libc.dylib"),
            Entry::Symlink("usr/lib/libm.dylib", "libc.dylib"),
        ],
    );
    ("swift-macos.tar.gz", "swift-linux.tar.gz", "MacOSX.sdk.tar.gz")
}

/// Serves a fixed body for every URL and counts transfers.
#[derive(Clone)]
pub struct StaticDownloader {
    body: Arc<Vec<u8>>,
    transfers: Arc<AtomicUsize>,
}

impl StaticDownloader {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body: Arc::new(body),
            transfers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn transfers(&self) -> usize {
        self.transfers.load(Ordering::SeqCst)
    }
}

impl Downloader for StaticDownloader {
    fn download(&self, _url: &str, out: &mut dyn Write) -> Result<u64> {
        self.transfers.fetch_add(1, Ordering::SeqCst);
        out.write_all(&self.body)?;
        Ok(self.body.len() as u64)
    }
}

/// Refuses every request.
pub struct NoNetwork;

impl Downloader for NoNetwork {
    fn download(&self, url: &str, _out: &mut dyn Write) -> Result<u64> {
        Err(Error::download(url, "network disabled in tests"))
    }
}

/// Stands in for configure and make.
///
/// configure writes a Makefile; `make install` drops the linker into the
/// `--prefix` that configure was given.
pub struct FakeBuild {
    pub fail_step: Option<&'static str>,
}

impl CommandRunner for FakeBuild {
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput> {
        if self.fail_step == Some(cmd.step.as_str()) {
            return Ok(ProcessOutput::new(2).with_output("", "make: *** [all] Error 2"));
        }
        match cmd.step.as_str() {
            "configure" => {
                let prefix = cmd
                    .args
                    .iter()
                    .filter_map(|a| a.to_str())
                    .find_map(|a| a.strip_prefix("--prefix="))
                    .unwrap()
                    .to_string();
                std::fs::write(
                    cmd.cwd.join("Makefile"),
                    format!("PREFIX = {}\nSUBDIRS = libstuff libobjc2 ar as otool ld64\n", prefix),
                )?;
            }
            "make install" => {
                let makefile = std::fs::read_to_string(cmd.cwd.join("Makefile"))?;
                let prefix = makefile
                    .lines()
                    .find_map(|l| l.strip_prefix("PREFIX = "))
                    .unwrap();
                let bin = Path::new(prefix).join("bin");
                std::fs::create_dir_all(&bin)?;
                std::fs::write(bin.join("x86_64-apple-macosx-ld"), "#!/bin/sh\n")?;
            }
            _ => {}
        }
        Ok(ProcessOutput::success())
    }

    fn name(&self) -> &str {
        "fake-build"
    }
}
