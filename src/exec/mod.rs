//! External process invocation for the configure/make steps.

use crate::core::error::{Error, Result};
use std::ffi::OsString;
use std::path::PathBuf;

pub mod system;

pub use system::SystemRunner;

/// Number of trailing stderr lines kept in a build error.
const STDERR_TAIL_LINES: usize = 20;

/// A command to execute, with an explicit working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Pipeline step this command belongs to, used in errors.
    pub step: String,
    /// Program to run.
    pub program: OsString,
    /// Arguments.
    pub args: Vec<OsString>,
    /// Working directory. Always set; the process cwd is never relied on.
    pub cwd: PathBuf,
    /// Extra environment variables.
    pub env: Vec<(OsString, OsString)>,
}

impl CommandSpec {
    /// Create a command for `step` running `program` in `cwd`.
    pub fn new(step: impl Into<String>, program: impl Into<OsString>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            step: step.into(),
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Render as a shell-like line for messages.
    pub fn display(&self) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Trait for anything that can execute a [`CommandSpec`] synchronously.
pub trait CommandRunner {
    /// Execute the command and capture its output.
    ///
    /// A nonzero exit is reported through [`ProcessOutput`], not as an error;
    /// errors are reserved for failing to start the process at all.
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput>;

    /// Get a human-readable name for this runner.
    fn name(&self) -> &str;
}

/// Result of running an external command.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code (-1 when terminated by a signal).
    pub exit_code: i32,

    /// Captured standard output.
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// Create a new output record.
    pub fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Create a successful result with exit code 0.
    pub fn success() -> Self {
        Self::new(0)
    }

    /// Attach captured output.
    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }

    /// Whether the command exited with status zero.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `cmd` and turn a nonzero exit into [`Error::Build`].
pub fn run_checked(runner: &dyn CommandRunner, cmd: &CommandSpec) -> Result<ProcessOutput> {
    let output = runner.run(cmd)?;
    if output.is_success() {
        Ok(output)
    } else {
        Err(Error::build(
            cmd.step.clone(),
            output.exit_code,
            stderr_tail(&output.stderr),
        ))
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
