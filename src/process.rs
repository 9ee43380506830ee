//! Centralized command execution with consistent error handling.
//!
//! All external tools (pipenv, zip, unzip) go through this module so every
//! failure carries the command's stderr and exit code.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Get stderr, trimmed of whitespace.
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

/// Builder for configuring command execution.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<std::path::PathBuf>,
    env_set: BTreeMap<String, String>,
    env_clear: Vec<String>,
    /// If true, don't fail on non-zero exit.
    allow_fail: bool,
    /// Custom error message prefix.
    error_prefix: Option<String>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
            env_set: BTreeMap::new(),
            env_clear: Vec::new(),
            allow_fail: false,
            error_prefix: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env_set
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Remove an environment variable from the child's environment.
    pub fn env_remove(mut self, key: impl AsRef<str>) -> Self {
        self.env_clear.push(key.as_ref().to_string());
        self
    }

    /// Allow non-zero exit codes without failing.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Set a custom error message prefix.
    pub fn error_msg(mut self, msg: impl AsRef<str>) -> Self {
        self.error_prefix = Some(msg.as_ref().to_string());
        self
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        for key in &self.env_clear {
            cmd.env_remove(key);
        }
        for (key, value) in &self.env_set {
            cmd.env(key, value);
        }
        cmd
    }

    fn fail_message(&self, code: i32, stderr: &str) -> anyhow::Error {
        let prefix = self
            .error_prefix
            .clone()
            .unwrap_or_else(|| format!("'{}' failed", self.program));

        if stderr.is_empty() {
            anyhow::anyhow!("{} (exit code {})", prefix, code)
        } else {
            anyhow::anyhow!("{} (exit code {}):\n{}", prefix, code, stderr)
        }
    }

    /// Run the command and capture output.
    pub fn run(self) -> Result<CommandResult> {
        let output = self.build().output().with_context(|| {
            format!("Failed to execute '{}'. Is it installed?", self.program)
        })?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !self.allow_fail && !result.success() {
            return Err(self.fail_message(result.code(), result.stderr_trimmed()));
        }

        Ok(result)
    }

    /// Run the command with inherited stdio (streaming).
    ///
    /// Output goes directly to the terminal. Use for long-running commands
    /// where the user should see progress (e.g., dependency installs).
    pub fn run_streaming(self) -> Result<ExitStatus> {
        let mut cmd = self.build();
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        let status = cmd.status().with_context(|| {
            format!("Failed to execute '{}'. Is it installed?", self.program)
        })?;

        if !self.allow_fail && !status.success() {
            return Err(self.fail_message(status.code().unwrap_or(-1), ""));
        }

        Ok(status)
    }
}

/// Check if a program exists in PATH.
pub fn exists(program: &str) -> bool {
    which::which(program).is_ok()
}
