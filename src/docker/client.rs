//! Docker CLI client.
//!
//! All Docker CLI interactions go through `DockerClient`, which builds the
//! [`Invocation`]s and hands them to the shared [`CommandRunner`].

use crate::error::{Error, Result};
use crate::exec::{CommandOutcome, CommandRunner, FailurePolicy, Invocation};
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct DockerClient {
    runner: Arc<dyn CommandRunner>,
}

impl DockerClient {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    // ========================================================================
    // Preflight
    // ========================================================================

    /// Get Docker version string.
    pub async fn version(&self) -> CommandOutcome {
        self.runner
            .run(&Invocation::new("docker", ["--version"]).captured().tolerant())
            .await
    }

    /// Require the Compose v2 plugin (`docker compose`). Returns its version line.
    pub async fn compose_version(&self) -> Result<String> {
        let outcome = self
            .runner
            .run(&Invocation::new("docker", ["compose", "version"]).captured())
            .await;
        if outcome.success() {
            Ok(outcome.stdout.trim().to_string())
        } else if let Some(e) = outcome.spawn_error {
            Err(Error::ComposeUnavailable(e))
        } else {
            Err(Error::ComposeUnavailable(outcome.stderr.trim().to_string()))
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Names of running containers whose name matches `name`, newest first.
    ///
    /// A failing `docker ps` is logged and reported as no matches.
    pub async fn ps_names(&self, name: &str) -> Vec<String> {
        let filter = format!("name={}", name);
        let outcome = self
            .runner
            .run(
                &Invocation::new("docker", ["ps", "--filter", &filter, "--format", "{{.Names}}"])
                    .captured()
                    .tolerant(),
            )
            .await;

        if !outcome.success() {
            tracing::warn!(
                "Could not list containers matching '{}'; assuming none are running",
                name
            );
            return Vec::new();
        }

        outcome
            .stdout
            .lines()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Run a command inside a container using `sh -c`.
    pub async fn exec_sh(&self, container: &str, shell_cmd: &str) -> CommandOutcome {
        self.runner
            .run(
                &Invocation::new("docker", ["exec", container, "sh", "-c", shell_cmd])
                    .captured()
                    .tolerant(),
            )
            .await
    }

    // ========================================================================
    // Compose
    // ========================================================================

    /// Run `docker compose <args>` from `work_dir`, applying `policy` to the outcome.
    pub async fn compose(
        &self,
        args: &[String],
        work_dir: &Path,
        policy: FailurePolicy,
    ) -> Result<CommandOutcome> {
        let mut invocation = Invocation::new("docker", args.iter().cloned()).cwd(work_dir);
        invocation.policy = policy;
        self.runner.run(&invocation).await.check()
    }
}
