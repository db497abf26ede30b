//! External command execution.
//!
//! Every git and docker invocation goes through a [`CommandRunner`]. A call is
//! described by an [`Invocation`] that carries the caller's [`FailurePolicy`];
//! the runner never short-circuits, it returns a [`CommandOutcome`] and the
//! caller decides whether a failure aborts the sequence.

mod system;

pub use system::SystemRunner;

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// What a failed invocation means to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Failure aborts the run
    Fatal,
    /// Failure is logged and the run continues
    Tolerant,
}

/// A single external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub policy: FailurePolicy,
    /// Capture stdout/stderr instead of inheriting the terminal
    pub capture: bool,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            policy: FailurePolicy::Fatal,
            capture: false,
        }
    }

    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn tolerant(mut self) -> Self {
        self.policy = FailurePolicy::Tolerant;
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// The command line as shown in logs and errors.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Result of running an [`Invocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: String,
    pub policy: FailurePolicy,
    /// Exit code; `None` when the process could not be spawned or was killed
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Set when the program could not be executed at all
    pub spawn_error: Option<String>,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.spawn_error.is_none() && self.exit_code == Some(0)
    }

    /// Whether the program itself was missing or not executable.
    pub fn not_spawned(&self) -> bool {
        self.spawn_error.is_some()
    }

    /// Apply the failure policy: fatal failures become errors, tolerant ones are logged.
    pub fn check(self) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        match self.policy {
            FailurePolicy::Fatal => Err(self.into_error()),
            FailurePolicy::Tolerant => {
                tracing::warn!(
                    "'{}' failed (tolerated): {}",
                    self.command,
                    self.failure_detail()
                );
                Ok(self)
            }
        }
    }

    pub fn into_error(self) -> Error {
        let stderr = self.failure_detail();
        Error::CommandFailed {
            command: self.command,
            exit_code: self.exit_code,
            stderr,
        }
    }

    fn failure_detail(&self) -> String {
        if let Some(ref e) = self.spawn_error {
            return e.clone();
        }
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            "no error output".to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Runs external commands to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> CommandOutcome;
}
