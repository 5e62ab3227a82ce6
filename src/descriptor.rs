//! The destination descriptor read by the downstream build system.

use crate::core::context::Context;
use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Descriptor format version.
pub const DESCRIPTOR_VERSION: u32 = 1;

/// Flag telling the Swift driver where to find `ld` and friends.
pub const TOOLS_DIRECTORY_FLAG: &str = "-tools-directory";

/// Manifest describing the finished toolchain.
///
/// Field order here is the field order on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Descriptor {
    pub version: u32,
    pub sdk: String,
    pub toolchain_bin_dir: String,
    pub target: String,
    pub dynamic_library_extension: String,
    pub extra_cc_flags: Vec<String>,
    pub extra_swiftc_flags: Vec<String>,
    pub extra_cpp_flags: Vec<String>,
}

impl Descriptor {
    /// Build the descriptor for the layout in `ctx`.
    pub fn from_context(ctx: &Context) -> Result<Self> {
        let sdk = path_string(&ctx.sdk_dir)?;
        let bin_dir = path_string(&ctx.bin_dir)?;
        let flags = &ctx.config.descriptor;

        Ok(Self {
            version: DESCRIPTOR_VERSION,
            sdk,
            toolchain_bin_dir: bin_dir.clone(),
            target: ctx.config.target.clone(),
            dynamic_library_extension: flags.dynamic_library_extension.clone(),
            extra_cc_flags: flags.extra_cc_flags.clone(),
            extra_swiftc_flags: vec![TOOLS_DIRECTORY_FLAG.to_string(), bin_dir],
            extra_cpp_flags: flags.extra_cpp_flags.clone(),
        })
    }

    /// Render as pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Write to `path`, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .map_err(|e| Error::filesystem(path, format!("failed to write descriptor: {}", e)))
    }

    /// Read a descriptor back from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::filesystem(path, format!("failed to read descriptor: {}", e)))?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn path_string(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| Error::filesystem(path, "path is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::path::PathBuf;

    fn ctx() -> Context {
        Context::new(Config::default(), PathBuf::from("/work/dest")).unwrap()
    }

    #[test]
    fn test_descriptor_fields() {
        let descriptor = Descriptor::from_context(&ctx()).unwrap();
        assert_eq!(descriptor.version, 1);
        assert_eq!(descriptor.sdk, "/work/dest/cross-toolchain/MacOSX.sdk");
        assert_eq!(
            descriptor.toolchain_bin_dir,
            "/work/dest/cross-toolchain/swift.xctoolchain/usr/bin"
        );
        assert_eq!(descriptor.target, "x86_64-apple-macosx");
        assert_eq!(descriptor.dynamic_library_extension, "dylib");
        assert!(descriptor.extra_cc_flags.is_empty());
        assert_eq!(descriptor.extra_cpp_flags, vec!["-lc++"]);
    }

    #[test]
    fn test_swiftc_flags_are_separate_elements_in_order() {
        let descriptor = Descriptor::from_context(&ctx()).unwrap();
        assert_eq!(
            descriptor.extra_swiftc_flags,
            vec![
                "-tools-directory".to_string(),
                "/work/dest/cross-toolchain/swift.xctoolchain/usr/bin".to_string(),
            ]
        );
    }

    #[test]
    fn test_json_keys_and_order() {
        let json = Descriptor::from_context(&ctx()).unwrap().to_json().unwrap();
        let keys = [
            "\"version\"",
            "\"sdk\"",
            "\"toolchain-bin-dir\"",
            "\"target\"",
            "\"dynamic-library-extension\"",
            "\"extra-cc-flags\"",
            "\"extra-swiftc-flags\"",
            "\"extra-cpp-flags\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
        assert!(json.ends_with("}\n"));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macos-destination.json");
        let descriptor = Descriptor::from_context(&ctx()).unwrap();

        descriptor.write(&path).unwrap();
        assert_eq!(Descriptor::read(&path).unwrap(), descriptor);
    }

    #[test]
    fn test_configured_flags_flow_through() {
        let mut config = Config::default();
        config.target = "arm64-apple-macosx".to_string();
        config.descriptor.extra_cc_flags = vec!["-fPIC".to_string()];
        let ctx = Context::new(config, PathBuf::from("/d")).unwrap();

        let descriptor = Descriptor::from_context(&ctx).unwrap();
        assert_eq!(descriptor.target, "arm64-apple-macosx");
        assert_eq!(descriptor.extra_cc_flags, vec!["-fPIC"]);
    }
}
