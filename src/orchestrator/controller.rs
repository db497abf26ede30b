use super::builder::StackControllerBuilder;
use super::report::{RunReport, Stage, Step};
use crate::capability;
use crate::compose::{ComposeOperation, CompositionFileSet};
use crate::config::{StackConfiguration, StackSettings};
use crate::docker::DockerClient;
use crate::envfile;
use crate::error::{Error, Result};
use crate::exec::{CommandOutcome, CommandRunner, Invocation};
use crate::readiness::{ReadinessProber, ServiceEndpoint};
use crate::secret;
use crate::sync::{BranchProbe, DependencySynchronizer};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Drives one bring-up of the stack from a work directory.
///
/// Steps run strictly one after another. A fatal failure returns immediately;
/// nothing already done is rolled back.
pub struct StackController {
    pub(super) work_dir: PathBuf,
    pub(super) settings: StackSettings,
    pub(super) config: StackConfiguration,
    pub(super) runner: Arc<dyn CommandRunner>,
    pub(super) probe: Arc<dyn BranchProbe>,
    pub(super) prober: ReadinessProber,
}

impl StackController {
    pub fn builder() -> StackControllerBuilder {
        StackControllerBuilder::new()
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn settings(&self) -> &StackSettings {
        &self.settings
    }

    pub fn configuration(&self) -> &StackConfiguration {
        &self.config
    }

    fn docker(&self) -> DockerClient {
        DockerClient::new(self.runner.clone())
    }

    fn path(&self, relative: &Path) -> PathBuf {
        self.work_dir.join(relative)
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Check that git, docker and the compose plugin are usable.
    pub async fn preflight(&self) -> Result<()> {
        let git = self
            .runner
            .run(&Invocation::new("git", ["--version"]).captured().tolerant())
            .await;
        if !git.success() {
            return Err(Error::ToolMissing("git".to_string()));
        }

        let docker = self.docker();
        if !docker.version().await.success() {
            return Err(Error::ToolMissing("docker".to_string()));
        }
        let compose = docker.compose_version().await?;
        tracing::debug!("Using {}", compose);
        Ok(())
    }

    /// Full bring-up: sync, prepare files, restart both deployment units.
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();
        report.enter(Stage::Init);
        self.preflight().await?;

        report.sync = if self.config.skip_sync {
            tracing::info!("Skipping dependency sync");
            Step::Skipped
        } else {
            let synchronizer = DependencySynchronizer::new(self.runner.clone(), self.probe.clone());
            Step::Ran(
                synchronizer
                    .sync(&self.work_dir, &self.settings.dependency)
                    .await?,
            )
        };
        report.enter(Stage::Synced);

        report.env = Some(envfile::prepare(
            &self.path(&self.settings.env_files.source),
            &self.path(&self.settings.env_files.destination),
        )?);
        report.enter(Stage::EnvPrepared);

        report.secret = Some(secret::provision(
            &self.path(&self.settings.secret.template),
            &self.path(&self.settings.secret.working),
            &self.settings.secret.placeholder,
        )?);
        report.enter(Stage::SecretProvisioned);

        report.capability = if self.config.skip_capability {
            tracing::info!("Skipping {} adjustment", self.settings.capability.key);
            Step::Skipped
        } else {
            let first_run = capability::is_first_run(&self.docker(), &self.settings.capability).await;
            let outcome = capability::adjust(
                &self.path(&self.settings.capability.compose_file),
                &self.settings.capability,
                first_run,
            )?;
            Step::Ran((first_run, outcome))
        };
        report.enter(Stage::CapabilityAdjusted);

        report.teardown_clean = self.teardown().await?.success();
        report.enter(Stage::TornDown);

        self.compose(ComposeOperation::UpDependency).await?;
        report.enter(Stage::DependencyUp);

        let endpoint = ServiceEndpoint::new(
            self.settings.readiness.host.clone(),
            self.config.probe_port,
        );
        tracing::info!(
            "Waiting up to {:?} for {}",
            self.config.readiness_timeout,
            endpoint
        );
        report.ready = self
            .prober
            .wait(&endpoint, self.config.readiness_timeout)
            .await;
        if report.ready {
            report.enter(Stage::Ready);
        } else {
            report.enter(Stage::TimedOut);
            if !self.config.fallback_wait.is_zero() {
                tracing::warn!(
                    "{} still unreachable; waiting another {:?} before continuing",
                    endpoint,
                    self.config.fallback_wait
                );
                tokio::time::sleep(self.config.fallback_wait).await;
            }
        }

        self.compose(ComposeOperation::UpLocal).await?;
        report.enter(Stage::LocalUp);

        report.enter(Stage::Done);
        Ok(report)
    }

    /// Remove containers from every composition file set. Failures are tolerated.
    pub async fn teardown(&self) -> Result<CommandOutcome> {
        self.compose(ComposeOperation::Down).await
    }

    /// The compose invocations `run` would make, as `docker` argument lists.
    pub fn plan(&self) -> Vec<(ComposeOperation, Vec<String>)> {
        [
            ComposeOperation::Down,
            ComposeOperation::UpDependency,
            ComposeOperation::UpLocal,
        ]
        .into_iter()
        .map(|op| (op, self.file_set(op).to_args(&self.settings.project_name)))
        .collect()
    }

    // ========================================================================
    // Compose
    // ========================================================================

    fn file_set(&self, operation: ComposeOperation) -> CompositionFileSet {
        let set = CompositionFileSet::for_operation(operation, &self.config, &self.settings.compose);
        match operation {
            ComposeOperation::Down => set.retain_existing(&self.work_dir),
            ComposeOperation::UpDependency | ComposeOperation::UpLocal => set,
        }
    }

    async fn compose(&self, operation: ComposeOperation) -> Result<CommandOutcome> {
        let set = self.file_set(operation);
        let args = set.to_args(&self.settings.project_name);
        tracing::info!("Compose {}: docker {}", operation, args.join(" "));
        self.docker()
            .compose(&args, &self.work_dir, set.policy())
            .await
    }
}
