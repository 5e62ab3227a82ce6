//! Filesystem and hashing utility helpers.

pub mod fs;
pub mod hash;

pub use fs::{ensure_dir_exists, merge_tree};
pub use hash::sha256_file;
