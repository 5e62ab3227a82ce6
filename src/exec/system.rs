use super::{CommandRunner, CommandSpec, ProcessOutput};
use crate::core::error::{Error, Result};
use std::process::{Command, Stdio};

/// Runs commands as real child processes.
pub struct SystemRunner {
    verbose: bool,
}

impl SystemRunner {
    /// Create a new system runner.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(false)
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput> {
        if self.verbose {
            println!("[{}] {} (in {})", cmd.step, cmd.display(), cmd.cwd.display());
        }

        let output = Command::new(&cmd.program)
            .args(&cmd.args)
            .envs(cmd.env.iter().map(|(k, v)| (k, v)))
            .current_dir(&cmd.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                Error::build(
                    cmd.step.clone(),
                    -1,
                    format!("failed to start {}: {}", cmd.program.to_string_lossy(), e),
                )
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if self.verbose && !stdout.is_empty() {
            print!("{}", stdout);
        }

        Ok(ProcessOutput::new(output.status.code().unwrap_or(-1)).with_output(stdout, stderr))
    }

    fn name(&self) -> &str {
        "system"
    }
}
