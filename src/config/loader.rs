use super::Config;
use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Configuration loader that supports multiple sources.
pub struct ConfigLoader {
    /// Path to standalone config file.
    config_file: Option<PathBuf>,
    /// Whether to apply `MACOS_CROSS_TOOLCHAIN_*` overrides.
    use_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    pub fn new() -> Self {
        Self {
            config_file: None,
            use_env: true,
        }
    }

    /// Set a standalone configuration file path.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Skip environment variable overrides.
    pub fn no_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Load configuration from all enabled sources.
    ///
    /// Priority (later sources override earlier):
    /// 1. Default values
    /// 2. Standalone TOML file
    /// 3. Individual env var overrides (`MACOS_CROSS_TOOLCHAIN_*`)
    pub fn load(self) -> Result<Config> {
        let mut config = match self.config_file {
            Some(ref path) => load_toml_file(path)?,
            None => Config::default(),
        };

        if self.use_env {
            super::env::apply_env_overrides(&mut config);
        }

        validate(&config)?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from a standalone TOML file.
fn load_toml_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::config(format!(
            "failed to parse TOML config {}: {}",
            path.display(),
            e
        ))
    })
}

/// Reject values that would produce a broken layout or build.
pub(crate) fn validate(config: &Config) -> Result<()> {
    if config.target.trim().is_empty() {
        return Err(Error::config("target triple must not be empty"));
    }

    let layout = &config.layout;
    for (field, value) in [
        ("layout.root", &layout.root),
        ("layout.sdk", &layout.sdk),
        ("layout.toolchain", &layout.toolchain),
        ("layout.descriptor", &layout.descriptor),
        ("layout.cache", &layout.cache),
    ] {
        if value.is_empty() || Path::new(value).is_absolute() || value.contains("..") {
            return Err(Error::config(format!(
                "{} must be a non-empty relative name, got '{}'",
                field, value
            )));
        }
    }

    if layout.root == layout.cache {
        return Err(Error::config(
            "layout.root and layout.cache must differ (the root is removed on every run)",
        ));
    }

    if config.cctools.jobs == 0 {
        return Err(Error::config("cctools.jobs must be at least 1"));
    }

    if !crate::fetch::is_plain_file_name(&config.cctools.cache_key) {
        return Err(Error::config(format!(
            "cctools.cache-key must be a plain file name, got '{}'",
            config.cctools.cache_key
        )));
    }

    if let Some(ref digest) = config.cctools.sha256 {
        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::config(format!(
                "cctools.sha256 must be 64 hex characters, got '{}'",
                digest
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults_without_file() {
        let config = ConfigLoader::new().no_env().load().unwrap();
        assert_eq!(config.target, super::super::DEFAULT_TARGET);
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolchain.toml");
        std::fs::write(
            &path,
            "target = \"arm64-apple-macosx\"\nverbose = true\n\n[cctools]\njobs = 4\n",
        )
        .unwrap();

        let config = ConfigLoader::new().config_file(&path).no_env().load().unwrap();
        assert_eq!(config.target, "arm64-apple-macosx");
        assert!(config.verbose);
        assert_eq!(config.cctools.jobs, 4);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigLoader::new()
            .config_file("/nonexistent/toolchain.toml")
            .no_env()
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "target = [").unwrap();

        let err = ConfigLoader::new().config_file(&path).no_env().load().unwrap_err();
        assert!(err.to_string().contains("failed to parse TOML config"));
    }

    #[test]
    fn test_validate_rejects_zero_jobs() {
        let mut config = Config::default();
        config.cctools.jobs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_root_equal_to_cache() {
        let mut config = Config::default();
        config.layout.cache = config.layout.root.clone();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_validate_rejects_absolute_layout() {
        let mut config = Config::default();
        config.layout.sdk = "/usr/share/sdk".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_dot_cache_keys() {
        for key in [".", "..", "", "a/b"] {
            let mut config = Config::default();
            config.cctools.cache_key = key.to_string();
            assert!(validate(&config).is_err(), "cache key {:?} should be rejected", key);
        }
    }

    #[test]
    fn test_validate_rejects_bad_digest() {
        let mut config = Config::default();
        config.cctools.sha256 = Some("not-a-digest".to_string());
        assert!(validate(&config).is_err());

        config.cctools.sha256 = Some("a".repeat(64));
        assert!(validate(&config).is_ok());
    }
}
