use std::fmt;
use std::path::PathBuf;

/// Result type alias for macos-cross-toolchain operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Exit status used when one of the input archives does not exist.
pub const MISSING_INPUT_EXIT_CODE: i32 = 42;

/// Which positional input an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// The destination directory.
    Destination,
    /// Bundle carrying the macOS runtime libraries.
    CrossBundle,
    /// Bundle carrying the host compiler.
    NativeBundle,
    /// Archive with the macOS SDK headers and libraries.
    SdkArchive,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputKind::Destination => "destination directory",
            InputKind::CrossBundle => "cross-compiler bundle",
            InputKind::NativeBundle => "native toolchain bundle",
            InputKind::SdkArchive => "SDK archive",
        };
        f.write_str(name)
    }
}

/// Main error type for macos-cross-toolchain.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wrong command-line usage.
    #[error("Usage error: {0}")]
    Usage(String),

    /// An input archive does not exist or is not a regular file.
    #[error("Missing input: {input} not found at {}", .path.display())]
    MissingInput { input: InputKind, path: PathBuf },

    /// A download did not complete.
    #[error("Download error: {url}: {reason}")]
    Download { url: String, reason: String },

    /// Downloaded content did not match the configured checksum.
    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    Checksum {
        url: String,
        expected: String,
        actual: String,
    },

    /// An archive could not be extracted.
    #[error("Corrupt archive {}: {reason}", .path.display())]
    CorruptArchive { path: PathBuf, reason: String },

    /// An external build step exited unsuccessfully.
    #[error("Build error in step '{step}' (exit code {code}){}", format_stderr(.stderr))]
    Build {
        step: String,
        code: i32,
        stderr: String,
    },

    /// Tree creation, merge or symlink rewrite failed.
    #[error("Filesystem error at {}: {reason}", .path.display())]
    Filesystem { path: PathBuf, reason: String },

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error.
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// TOML deserialization error.
    #[error("TOML parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

impl Error {
    /// Create a usage error.
    pub fn usage(msg: impl Into<String>) -> Self {
        Error::Usage(msg.into())
    }

    /// Create a missing input error.
    pub fn missing_input(input: InputKind, path: impl Into<PathBuf>) -> Self {
        Error::MissingInput {
            input,
            path: path.into(),
        }
    }

    /// Create a download error.
    pub fn download(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::Download {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a corrupt archive error.
    pub fn corrupt_archive(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Error::CorruptArchive {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a build error.
    pub fn build(step: impl Into<String>, code: i32, stderr: impl Into<String>) -> Self {
        Error::Build {
            step: step.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Create a filesystem error.
    pub fn filesystem(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Error::Filesystem {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MissingInput { .. } => MISSING_INPUT_EXIT_CODE,
            _ => 1,
        }
    }
}
