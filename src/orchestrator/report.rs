use crate::capability::CapabilityOutcome;
use crate::envfile::EnvMergeOutcome;
use crate::secret::SecretOutcome;
use crate::sync::SyncOutcome;
use std::fmt;

/// Controller state. A run visits these in declaration order, taking exactly
/// one of `Ready` or `TimedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Init,
    Synced,
    EnvPrepared,
    SecretProvisioned,
    CapabilityAdjusted,
    TornDown,
    DependencyUp,
    Ready,
    TimedOut,
    LocalUp,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Synced => "synced",
            Stage::EnvPrepared => "env-prepared",
            Stage::SecretProvisioned => "secret-provisioned",
            Stage::CapabilityAdjusted => "capability-adjusted",
            Stage::TornDown => "torn-down",
            Stage::DependencyUp => "dependency-up",
            Stage::Ready => "ready",
            Stage::TimedOut => "timed-out",
            Stage::LocalUp => "local-up",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a step did; `Skipped` when a flag turned it off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Skipped,
    Ran(T),
}

impl<T> Step<T> {
    pub fn ran(&self) -> Option<&T> {
        match self {
            Step::Ran(value) => Some(value),
            Step::Skipped => None,
        }
    }
}

/// Record of one `start` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub stages: Vec<Stage>,
    pub sync: Step<SyncOutcome>,
    pub env: Option<EnvMergeOutcome>,
    pub secret: Option<SecretOutcome>,
    /// First-run decision and the resulting rewrite
    pub capability: Step<(bool, CapabilityOutcome)>,
    /// Whether teardown exited cleanly
    pub teardown_clean: bool,
    pub ready: bool,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            stages: Vec::new(),
            sync: Step::Skipped,
            env: None,
            secret: None,
            capability: Step::Skipped,
            teardown_clean: false,
            ready: false,
        }
    }
}

impl RunReport {
    pub(crate) fn enter(&mut self, stage: Stage) {
        tracing::info!("Stage: {}", stage);
        self.stages.push(stage);
    }

    pub fn reached(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn last_stage(&self) -> Option<Stage> {
        self.stages.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_records_in_order() {
        let mut report = RunReport::default();
        report.enter(Stage::Init);
        report.enter(Stage::Synced);
        assert_eq!(report.stages, vec![Stage::Init, Stage::Synced]);
        assert!(report.reached(Stage::Init));
        assert!(!report.reached(Stage::Done));
        assert_eq!(report.last_stage(), Some(Stage::Synced));
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::TimedOut.to_string(), "timed-out");
        assert_eq!(Stage::CapabilityAdjusted.to_string(), "capability-adjusted");
    }
}
