//! Dependency synchronization.
//!
//! The dependency project is fetched as a blob-less sparse clone holding only
//! its compose subtree. An existing checkout is fast-forwarded; divergence is
//! reported, never resolved.

mod branch;

pub use branch::{resolve_default_branch, BranchProbe, Git2BranchProbe};

use crate::config::DependencySettings;
use crate::error::{Error, Result};
use crate::exec::{CommandRunner, Invocation};
use git2::Repository;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned { branch: String },
    Updated,
}

pub struct DependencySynchronizer {
    runner: Arc<dyn CommandRunner>,
    probe: Arc<dyn BranchProbe>,
}

impl DependencySynchronizer {
    pub fn new(runner: Arc<dyn CommandRunner>, probe: Arc<dyn BranchProbe>) -> Self {
        Self { runner, probe }
    }

    /// Clone the dependency under `work_dir`, or update the existing checkout.
    pub async fn sync(&self, work_dir: &Path, settings: &DependencySettings) -> Result<SyncOutcome> {
        let checkout = work_dir.join(&settings.directory);

        if checkout.exists() {
            if Repository::open(&checkout).is_err() {
                return Err(Error::Config(format!(
                    "{} exists but is not a git working copy",
                    checkout.display()
                )));
            }
            self.update(&checkout).await?;
            return Ok(SyncOutcome::Updated);
        }

        let branch = resolve_default_branch(
            self.probe.as_ref(),
            &settings.repository,
            &settings.candidate_branches,
        )
        .await?;
        self.clone_sparse(work_dir, &checkout, settings, &branch).await?;
        Ok(SyncOutcome::Cloned { branch })
    }

    async fn clone_sparse(
        &self,
        work_dir: &Path,
        checkout: &Path,
        settings: &DependencySettings,
        branch: &str,
    ) -> Result<()> {
        tracing::info!(
            "Cloning {} ({}, sparse: {}) into {}",
            settings.repository,
            branch,
            settings.sparse_path,
            checkout.display()
        );

        let directory = settings.directory.to_string_lossy().to_string();
        self.git(
            Invocation::new(
                "git",
                [
                    "clone",
                    "--filter=blob:none",
                    "--no-checkout",
                    settings.repository.as_str(),
                    directory.as_str(),
                ],
            )
            .cwd(work_dir),
        )
        .await?;

        self.git(Invocation::new("git", ["sparse-checkout", "init", "--cone"]).cwd(checkout))
            .await?;
        self.git(
            Invocation::new("git", ["sparse-checkout", "set", settings.sparse_path.as_str()])
                .cwd(checkout),
        )
        .await?;
        self.git(Invocation::new("git", ["checkout", branch]).cwd(checkout))
            .await?;
        Ok(())
    }

    async fn update(&self, checkout: &Path) -> Result<()> {
        tracing::info!("Updating {}", checkout.display());

        self.git(
            Invocation::new("git", ["fetch", "--prune"])
                .cwd(checkout)
                .tolerant(),
        )
        .await?;

        let pull = self
            .runner
            .run(&Invocation::new("git", ["pull", "--ff-only"]).cwd(checkout))
            .await;
        if pull.success() {
            Ok(())
        } else if pull.not_spawned() {
            Err(pull.into_error())
        } else {
            Err(Error::Diverged(checkout.display().to_string()))
        }
    }

    async fn git(&self, invocation: Invocation) -> Result<()> {
        self.runner.run(&invocation).await.check().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::CommandOutcome;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Invocation>>,
        fail_prefix: Option<&'static str>,
    }

    #[async_trait]
    impl CommandRunner for Recorder {
        async fn run(&self, invocation: &Invocation) -> CommandOutcome {
            self.seen.lock().unwrap().push(invocation.clone());
            let failed = self
                .fail_prefix
                .is_some_and(|p| invocation.display().starts_with(p));
            CommandOutcome {
                command: invocation.display(),
                policy: invocation.policy,
                exit_code: Some(if failed { 1 } else { 0 }),
                stdout: String::new(),
                stderr: String::new(),
                spawn_error: None,
            }
        }
    }

    impl Recorder {
        fn commands(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(Invocation::display)
                .collect()
        }
    }

    struct Branches(&'static [&'static str]);

    #[async_trait]
    impl BranchProbe for Branches {
        async fn remote_branches(&self, _url: &str) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    fn synchronizer(recorder: Arc<Recorder>, branches: &'static [&'static str]) -> DependencySynchronizer {
        DependencySynchronizer::new(recorder, Arc::new(Branches(branches)))
    }

    #[tokio::test]
    async fn fresh_checkout_runs_sparse_clone_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());
        let outcome = synchronizer(recorder.clone(), &["main"])
            .sync(dir.path(), &DependencySettings::default())
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Cloned { branch: "main".to_string() });
        assert_eq!(
            recorder.commands(),
            vec![
                "git clone --filter=blob:none --no-checkout https://github.com/supabase/supabase.git supabase",
                "git sparse-checkout init --cone",
                "git sparse-checkout set docker",
                "git checkout main",
            ]
        );
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0].cwd.as_deref(), Some(dir.path()));
        assert_eq!(seen[1].cwd.as_deref(), Some(dir.path().join("supabase").as_path()));
    }

    #[tokio::test]
    async fn clone_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder {
            fail_prefix: Some("git sparse-checkout set"),
            ..Recorder::default()
        });
        let err = synchronizer(recorder.clone(), &["master"])
            .sync(dir.path(), &DependencySettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
        assert_eq!(recorder.commands().len(), 3);
    }

    #[tokio::test]
    async fn missing_default_branch_clones_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());
        let err = synchronizer(recorder.clone(), &["trunk"])
            .sync(dir.path(), &DependencySettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DefaultBranch { .. }));
        assert!(recorder.commands().is_empty());
    }

    #[tokio::test]
    async fn existing_checkout_fetches_then_fast_forwards() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path().join("supabase")).unwrap();
        let recorder = Arc::new(Recorder {
            fail_prefix: Some("git fetch"),
            ..Recorder::default()
        });

        let outcome = synchronizer(recorder.clone(), &[])
            .sync(dir.path(), &DependencySettings::default())
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Updated);
        assert_eq!(recorder.commands(), vec!["git fetch --prune", "git pull --ff-only"]);
    }

    #[tokio::test]
    async fn failed_fast_forward_reports_divergence() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path().join("supabase")).unwrap();
        let recorder = Arc::new(Recorder {
            fail_prefix: Some("git pull"),
            ..Recorder::default()
        });

        let err = synchronizer(recorder, &[])
            .sync(dir.path(), &DependencySettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Diverged(_)));
    }

    #[tokio::test]
    async fn plain_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("supabase")).unwrap();
        let recorder = Arc::new(Recorder::default());

        let err = synchronizer(recorder.clone(), &["master"])
            .sync(dir.path(), &DependencySettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(recorder.commands().is_empty());
    }
}
