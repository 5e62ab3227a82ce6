//! Configuration types, loaded from defaults, an optional TOML file and the environment.

use serde::{Deserialize, Serialize};

pub mod env;
mod loader;
pub use loader::ConfigLoader;
pub(crate) use loader::validate;

/// Default target triple for the produced toolchain.
pub const DEFAULT_TARGET: &str = "x86_64-apple-macosx";

/// Source archive for the cctools-port linker suite.
pub const DEFAULT_CCTOOLS_URL: &str =
    "https://github.com/tpoechtrager/cctools-port/archive/949.0.1-ld64-530.tar.gz";

/// Complete configuration for the provisioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Target triple, used for cctools and the descriptor.
    #[serde(default = "default_target")]
    pub target: String,

    /// Output directory layout.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Auxiliary linker suite.
    #[serde(default)]
    pub cctools: CctoolsConfig,

    /// Descriptor flags.
    #[serde(default)]
    pub descriptor: DescriptorConfig,

    /// Enable verbose output (show progress messages).
    #[serde(default)]
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: default_target(),
            layout: LayoutConfig::default(),
            cctools: CctoolsConfig::default(),
            descriptor: DescriptorConfig::default(),
            verbose: false,
        }
    }
}

impl Config {
    /// Parse and validate a configuration from a TOML string; missing keys
    /// keep their defaults.
    pub fn from_toml_str(s: &str) -> crate::core::Result<Self> {
        let config: Config = toml::from_str(s)?;
        validate(&config)?;
        Ok(config)
    }
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

/// Directory names relative to the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LayoutConfig {
    /// Toolchain root, recreated on every run.
    pub root: String,
    /// SDK directory inside the root.
    pub sdk: String,
    /// Toolchain directory inside the root.
    pub toolchain: String,
    /// Descriptor file name inside the root.
    pub descriptor: String,
    /// Download cache, kept across runs.
    pub cache: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root: "cross-toolchain".to_string(),
            sdk: "MacOSX.sdk".to_string(),
            toolchain: "swift.xctoolchain".to_string(),
            descriptor: "macos-destination.json".to_string(),
            cache: "cache".to_string(),
        }
    }
}

/// A single search/replace applied to a build script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchConfig {
    pub search: String,
    #[serde(default)]
    pub replace: String,
}

/// cctools-port source and build settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CctoolsConfig {
    /// Source archive URL.
    pub url: String,
    /// File name of the archive inside the cache.
    pub cache_key: String,
    /// Expected SHA-256 of a fresh download (hex). Cached files are trusted.
    pub sha256: Option<String>,
    /// Directory name prefix of the unpacked sources.
    pub source_prefix: String,
    /// Parallel make jobs.
    pub jobs: u32,
    /// Patches applied to `configure` and `configure.ac`.
    pub configure_patches: Vec<PatchConfig>,
    /// Makefile variable listing the components to build.
    pub component_variable: String,
    /// Components removed from that list before building.
    pub exclude_components: Vec<String>,
}

impl Default for CctoolsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CCTOOLS_URL.to_string(),
            cache_key: "cctools-port.tar.gz".to_string(),
            sha256: None,
            source_prefix: "cctools-port".to_string(),
            jobs: 1,
            configure_patches: vec![PatchConfig {
                search: " -Wno-enum-conversion".to_string(),
                replace: String::new(),
            }],
            component_variable: "SUBDIRS".to_string(),
            exclude_components: vec!["libobjc2".to_string(), "otool".to_string()],
        }
    }
}

/// Extra flags and platform details written into the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DescriptorConfig {
    pub dynamic_library_extension: String,
    pub extra_cc_flags: Vec<String>,
    pub extra_cpp_flags: Vec<String>,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            dynamic_library_extension: "dylib".to_string(),
            extra_cc_flags: Vec::new(),
            extra_cpp_flags: vec!["-lc++".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.target, "x86_64-apple-macosx");
        assert_eq!(config.layout.root, "cross-toolchain");
        assert_eq!(config.layout.sdk, "MacOSX.sdk");
        assert_eq!(config.layout.toolchain, "swift.xctoolchain");
        assert_eq!(config.layout.descriptor, "macos-destination.json");
        assert_eq!(config.cctools.exclude_components, vec!["libobjc2", "otool"]);
        assert!(config.cctools.sha256.is_none());
        assert!(!config.verbose);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
target = "arm64-apple-macosx"

[cctools]
jobs = 8
sha256 = "abc123"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.target, "arm64-apple-macosx");
        assert_eq!(config.cctools.jobs, 8);
        assert_eq!(config.cctools.sha256.as_deref(), Some("abc123"));
        // Untouched fields keep their defaults
        assert_eq!(config.cctools.component_variable, "SUBDIRS");
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn test_parse_patch_list() {
        let toml_str = r#"
[cctools]
configure-patches = [
    { search = "-Wfoo" },
    { search = "-O3", replace = "-O2" },
]
exclude-components = ["otool"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.cctools.configure_patches.len(), 2);
        assert_eq!(config.cctools.configure_patches[0].replace, "");
        assert_eq!(config.cctools.configure_patches[1].replace, "-O2");
        assert_eq!(config.cctools.exclude_components, vec!["otool"]);
    }

    #[test]
    fn test_from_toml_str_validates() {
        assert!(Config::from_toml_str("[cctools]\njobs = 4\n").is_ok());
        assert!(Config::from_toml_str("[cctools]\njobs = 0\n").is_err());
        assert!(Config::from_toml_str("[cctools]\ncache-key = \"..\"\n").is_err());
        assert!(Config::from_toml_str("[layout]\nroot = \"cache\"\n").is_err());
    }

    #[test]
    fn test_parse_descriptor_section() {
        let toml_str = r#"
[descriptor]
extra-cc-flags = ["-fPIC"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.descriptor.extra_cc_flags, vec!["-fPIC"]);
        assert_eq!(config.descriptor.extra_cpp_flags, vec!["-lc++"]);
        assert_eq!(config.descriptor.dynamic_library_extension, "dylib");
    }
}
