use super::{CommandOutcome, CommandRunner, Invocation};
use async_trait::async_trait;
use std::process::Stdio;

/// Runs invocations as real child processes.
///
/// Captured invocations collect stdout/stderr; the rest inherit the terminal so
/// progress from `git clone` or `docker compose up` stays visible.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> CommandOutcome {
        let command = invocation.display();
        tracing::debug!(
            "RUN {} (cwd={})",
            command,
            invocation
                .cwd
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ".".to_string())
        );

        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args).stdin(Stdio::null());
        if let Some(ref dir) = invocation.cwd {
            cmd.current_dir(dir);
        }

        let result = if invocation.capture {
            cmd.output().await.map(|output| {
                (
                    output.status.code(),
                    String::from_utf8_lossy(&output.stdout).to_string(),
                    String::from_utf8_lossy(&output.stderr).to_string(),
                )
            })
        } else {
            cmd.stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .map(|status| (status.code(), String::new(), String::new()))
        };

        match result {
            Ok((exit_code, stdout, stderr)) => CommandOutcome {
                command,
                policy: invocation.policy,
                exit_code,
                stdout,
                stderr,
                spawn_error: None,
            },
            Err(e) => CommandOutcome {
                command,
                policy: invocation.policy,
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                spawn_error: Some(format!("Failed to execute '{}': {}", invocation.program, e)),
            },
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_output_of_real_process() {
        let runner = SystemRunner::new();
        let outcome = runner
            .run(&Invocation::new("sh", ["-c", "echo found"]).captured())
            .await;
        assert!(outcome.success());
        assert_eq!(outcome.stdout.trim(), "found");
    }

    #[tokio::test]
    async fn missing_program_reports_spawn_error() {
        let runner = SystemRunner::new();
        let outcome = runner
            .run(&Invocation::new("stackup-definitely-missing-binary", ["--version"]).captured())
            .await;
        assert!(outcome.not_spawned());
        assert!(outcome.check().is_err());
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = SystemRunner::new()
            .run(
                &Invocation::new("sh", ["-c", "pwd; exit 3"])
                    .cwd(dir.path())
                    .captured()
                    .tolerant(),
            )
            .await;
        assert_eq!(outcome.exit_code, Some(3));
        assert!(outcome.check().is_ok());
    }
}
