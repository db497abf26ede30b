// Allow unused_assignments at module level because thiserror's generated code
// for struct variants triggers false positive warnings - the fields ARE used
// in the Display impl but rustc's lint pass doesn't see this.
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::io;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Filesystem error: {0}")]
    #[diagnostic(code(stackup::filesystem::error))]
    Filesystem(String),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Required tool '{0}' is not available")]
    #[diagnostic(
        code(stackup::preflight::missing_tool),
        help("Install '{0}' and make sure it is on your PATH")
    )]
    ToolMissing(String),

    #[error("Docker Compose v2 is not available: {0}")]
    #[diagnostic(
        code(stackup::preflight::compose),
        help("Install or update Docker so that `docker compose version` succeeds")
    )]
    ComposeUnavailable(String),

    #[error("Could not determine default branch of {repository} (tried {})", .tried.join(", "))]
    #[diagnostic(
        code(stackup::sync::default_branch),
        help("Check the repository URL in stackup.yaml and your network access")
    )]
    DefaultBranch {
        repository: String,
        tried: Vec<String>,
    },

    #[error("Dependency checkout at {0} cannot be fast-forwarded")]
    #[diagnostic(
        code(stackup::sync::diverged),
        help("Resolve local changes in {0} manually, or remove the directory to re-clone it")
    )]
    Diverged(String),

    #[error("'{command}' failed{}: {stderr}",
        .exit_code.as_ref().map(|c| format!(" (exit code {})", c)).unwrap_or_default()
    )]
    #[diagnostic(code(stackup::command::failed))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Capability declaration error: {0}")]
    #[diagnostic(
        code(stackup::capability::error),
        help("Check the guarded declaration in docker-compose.yml or rerun with --no-cap-adjust")
    )]
    Capability(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(stackup::config::validation))]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns a helpful suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::ToolMissing(tool) => Some(format!(
                "Install '{}' and check that it runs from this shell. `stackup doctor` lists what is missing.",
                tool
            )),
            Error::ComposeUnavailable(_) => Some(
                "The Compose v2 plugin is required (`docker compose`, not `docker-compose`).".to_string(),
            ),
            Error::DefaultBranch { repository, .. } => Some(format!(
                "Try `git ls-remote --heads {}` to see which branches exist.",
                repository
            )),
            Error::Diverged(path) => Some(format!(
                "Inspect the checkout with `git -C {} status`. Re-run with --skip-clone to start without updating.",
                path
            )),
            Error::CommandFailed { command, .. } if command.starts_with("docker") => {
                Some("Check that Docker is running: docker ps".to_string())
            }
            Error::Capability(_) => Some(
                "Restore the cap_drop block by hand or re-run with --no-cap-adjust.".to_string(),
            ),
            Error::Config(_) | Error::Validation(_) => {
                Some("Check the values in stackup.yaml".to_string())
            }
            _ => None,
        }
    }

    /// Formats the error with its suggestion (if any) for user-friendly display.
    pub fn with_suggestion(&self) -> String {
        match self.suggestion() {
            Some(suggestion) => format!("{}\n\nHint: {}", self, suggestion),
            None => self.to_string(),
        }
    }
}
