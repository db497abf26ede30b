use super::StackController;
use crate::config::{StackConfiguration, StackSettings};
use crate::error::Result;
use crate::exec::{CommandRunner, SystemRunner};
use crate::readiness::ReadinessProber;
use crate::sync::{BranchProbe, Git2BranchProbe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Builder for a [`StackController`].
///
/// Anything left unset falls back to the real implementations: the system
/// command runner, libgit2 branch probing, and the settings file's readiness
/// interval.
///
/// # Example
///
/// ```no_run
/// use stackup::{Profile, StackConfiguration, StackController};
///
/// # async fn example() -> Result<(), stackup::Error> {
/// let controller = StackController::builder()
///     .work_dir(".")
///     .configuration(StackConfiguration {
///         profile: Profile::GpuNvidia,
///         ..StackConfiguration::default()
///     })
///     .build()?;
/// let report = controller.run().await?;
/// println!("ready: {}", report.ready);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct StackControllerBuilder {
    work_dir: Option<PathBuf>,
    settings: Option<StackSettings>,
    configuration: Option<StackConfiguration>,
    runner: Option<Arc<dyn CommandRunner>>,
    probe: Option<Arc<dyn BranchProbe>>,
    probe_interval: Option<Duration>,
}

impl StackControllerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding the stack's compose files. Defaults to the current directory.
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn settings(mut self, settings: StackSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Per-run options. Defaults to [`StackConfiguration::from_settings`].
    pub fn configuration(mut self, configuration: StackConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn branch_probe(mut self, probe: Arc<dyn BranchProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Delay between readiness connection attempts.
    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = Some(interval);
        self
    }

    /// Validate the settings and assemble the controller.
    pub fn build(self) -> Result<StackController> {
        let settings = self.settings.unwrap_or_default();
        settings.validate()?;

        let config = match self.configuration {
            Some(config) => config,
            None => StackConfiguration::from_settings(&settings)?,
        };
        let interval = match self.probe_interval {
            Some(interval) => interval,
            None => settings.readiness.interval_duration()?,
        };
        let work_dir = match self.work_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        Ok(StackController {
            work_dir,
            settings,
            config,
            runner: self.runner.unwrap_or_else(|| Arc::new(SystemRunner::new())),
            probe: self.probe.unwrap_or_else(|| Arc::new(Git2BranchProbe)),
            prober: ReadinessProber::new(interval),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Environment, Profile};

    #[test]
    fn defaults_come_from_settings() {
        let mut settings = StackSettings::default();
        settings.readiness.port = 6543;
        settings.readiness.interval = "500ms".to_string();

        let controller = StackControllerBuilder::new()
            .work_dir("/tmp/stack")
            .settings(settings)
            .build()
            .unwrap();

        assert_eq!(controller.work_dir(), std::path::Path::new("/tmp/stack"));
        assert_eq!(controller.configuration().probe_port, 6543);
        assert_eq!(controller.configuration().profile, Profile::Cpu);
        assert_eq!(controller.configuration().environment, Environment::Private);
        assert_eq!(controller.prober.interval(), Duration::from_millis(500));
    }

    #[test]
    fn explicit_configuration_wins() {
        let controller = StackControllerBuilder::new()
            .work_dir(".")
            .configuration(StackConfiguration {
                environment: Environment::Public,
                ..StackConfiguration::default()
            })
            .probe_interval(Duration::from_millis(10))
            .build()
            .unwrap();
        assert_eq!(controller.configuration().environment, Environment::Public);
        assert_eq!(controller.prober.interval(), Duration::from_millis(10));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut settings = StackSettings::default();
        settings.project_name = String::new();
        assert!(StackControllerBuilder::new().settings(settings).build().is_err());
    }
}
