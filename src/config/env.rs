//! Environment variable processing for runtime configuration overrides.
//!
//! Env var prefix: `MACOS_CROSS_TOOLCHAIN_`
//!
//! - `MACOS_CROSS_TOOLCHAIN_TARGET` — override the target triple
//! - `MACOS_CROSS_TOOLCHAIN_VERBOSE` — enable verbose output (1/true/yes)
//! - `MACOS_CROSS_TOOLCHAIN_CCTOOLS_URL` — override the cctools-port source URL
//! - `MACOS_CROSS_TOOLCHAIN_CCTOOLS_SHA256` — expected digest of a fresh download
//! - `MACOS_CROSS_TOOLCHAIN_JOBS` — parallel make jobs

use super::Config;

const PREFIX: &str = "MACOS_CROSS_TOOLCHAIN_";

/// Apply individual env var overrides to a config.
///
/// Each override is applied only if the env var is set and parses correctly.
/// Invalid values are silently ignored.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(val) = env_str("TARGET") {
        config.target = val;
    }

    if let Some(val) = env_bool("VERBOSE") {
        config.verbose = val;
    }

    if let Some(val) = env_str("CCTOOLS_URL") {
        config.cctools.url = val;
    }

    if let Some(val) = env_str("CCTOOLS_SHA256") {
        config.cctools.sha256 = Some(val.to_lowercase());
    }

    if let Some(val) = env_parse::<u32>("JOBS").filter(|jobs| *jobs > 0) {
        config.cctools.jobs = val;
    }
}

// --- helpers ---

fn env_str(suffix: &str) -> Option<String> {
    std::env::var(format!("{PREFIX}{suffix}"))
        .ok()
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(suffix: &str) -> Option<T> {
    env_str(suffix).and_then(|s| s.parse().ok())
}

fn env_bool(suffix: &str) -> Option<bool> {
    env_str(suffix).map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
}
