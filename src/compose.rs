//! Composition command builder.
//!
//! Turns a run configuration into the `docker compose` argument lists for the
//! three invocations a run makes. Nothing here touches the filesystem except
//! [`CompositionFileSet::retain_existing`], which the controller applies to the
//! teardown set before running it.

use crate::config::{ComposeLayout, Environment, Profile, StackConfiguration};
use crate::exec::FailurePolicy;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComposeOperation {
    /// Stop and remove everything either deployment unit may have started
    Down,
    UpDependency,
    UpLocal,
}

impl fmt::Display for ComposeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeOperation::Down => write!(f, "down"),
            ComposeOperation::UpDependency => write!(f, "up-dependency"),
            ComposeOperation::UpLocal => write!(f, "up-local"),
        }
    }
}

/// Ordered compose files plus profile filters for one invocation.
///
/// Later files override earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionFileSet {
    pub operation: ComposeOperation,
    pub files: Vec<PathBuf>,
    pub profiles: Vec<Profile>,
}

fn environment_overrides(environment: Environment, layout: &ComposeLayout) -> Vec<PathBuf> {
    match environment {
        Environment::Private => vec![layout.private_override.clone()],
        Environment::Public => vec![
            layout.public_override.clone(),
            layout.public_dependency_override.clone(),
        ],
    }
}

impl CompositionFileSet {
    pub fn for_operation(
        operation: ComposeOperation,
        config: &StackConfiguration,
        layout: &ComposeLayout,
    ) -> Self {
        match operation {
            ComposeOperation::Down => {
                let mut files = vec![layout.dependency_file.clone(), layout.local_file.clone()];
                for other in Environment::ALL.iter().filter(|e| **e != config.environment) {
                    files.extend(environment_overrides(*other, layout));
                }
                // Requested environment last so its overrides win
                files.extend(environment_overrides(config.environment, layout));

                let mut profiles = Vec::new();
                if config.profile.compose_name().is_some() {
                    profiles.push(config.profile);
                }
                profiles.extend(
                    Profile::ALL
                        .iter()
                        .copied()
                        .filter(|p| *p != config.profile && p.compose_name().is_some()),
                );

                Self {
                    operation,
                    files,
                    profiles,
                }
            }
            ComposeOperation::UpDependency => {
                let mut files = vec![layout.dependency_file.clone()];
                if config.environment == Environment::Public {
                    files.push(layout.public_dependency_override.clone());
                }
                Self {
                    operation,
                    files,
                    profiles: Vec::new(),
                }
            }
            ComposeOperation::UpLocal => {
                let override_file = match config.environment {
                    Environment::Private => layout.private_override.clone(),
                    Environment::Public => layout.public_override.clone(),
                };
                let profiles = if config.profile.compose_name().is_some() {
                    vec![config.profile]
                } else {
                    Vec::new()
                };
                Self {
                    operation,
                    files: vec![layout.local_file.clone(), override_file],
                    profiles,
                }
            }
        }
    }

    /// Drop files that do not exist under `work_dir`.
    pub fn retain_existing(mut self, work_dir: &Path) -> Self {
        self.files.retain(|file| {
            let exists = work_dir.join(file).is_file();
            if !exists {
                tracing::debug!("Skipping missing compose file {}", file.display());
            }
            exists
        });
        self
    }

    /// Failure handling for this operation: teardown never aborts a run.
    pub fn policy(&self) -> FailurePolicy {
        match self.operation {
            ComposeOperation::Down => FailurePolicy::Tolerant,
            ComposeOperation::UpDependency | ComposeOperation::UpLocal => FailurePolicy::Fatal,
        }
    }

    /// Arguments following `docker`, starting with `compose`.
    pub fn to_args(&self, project: &str) -> Vec<String> {
        let mut args = vec!["compose".to_string(), "-p".to_string(), project.to_string()];
        for profile in &self.profiles {
            if let Some(name) = profile.compose_name() {
                args.push("--profile".to_string());
                args.push(name.to_string());
            }
        }
        for file in &self.files {
            args.push("-f".to_string());
            args.push(file.to_string_lossy().to_string());
        }
        match self.operation {
            ComposeOperation::Down => {
                args.push("down".to_string());
                args.push("--remove-orphans".to_string());
            }
            ComposeOperation::UpDependency | ComposeOperation::UpLocal => {
                args.push("up".to_string());
                args.push("-d".to_string());
            }
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(profile: Profile, environment: Environment) -> StackConfiguration {
        StackConfiguration {
            profile,
            environment,
            ..StackConfiguration::default()
        }
    }

    fn args(op: ComposeOperation, profile: Profile, environment: Environment) -> Vec<String> {
        CompositionFileSet::for_operation(op, &config(profile, environment), &ComposeLayout::default())
            .to_args("localai")
    }

    #[test]
    fn up_local_private_cpu() {
        assert_eq!(
            args(ComposeOperation::UpLocal, Profile::Cpu, Environment::Private).join(" "),
            "compose -p localai --profile cpu -f docker-compose.yml -f docker-compose.override.private.yml up -d"
        );
    }

    #[test]
    fn up_local_public_without_profile() {
        assert_eq!(
            args(ComposeOperation::UpLocal, Profile::None, Environment::Public).join(" "),
            "compose -p localai -f docker-compose.yml -f docker-compose.override.public.yml up -d"
        );
    }

    #[test]
    fn up_dependency_never_filters_profiles() {
        assert_eq!(
            args(ComposeOperation::UpDependency, Profile::GpuNvidia, Environment::Private).join(" "),
            "compose -p localai -f supabase/docker/docker-compose.yml up -d"
        );
        assert_eq!(
            args(ComposeOperation::UpDependency, Profile::GpuNvidia, Environment::Public).join(" "),
            "compose -p localai -f supabase/docker/docker-compose.yml -f docker-compose.override.public.supabase.yml up -d"
        );
    }

    #[test]
    fn down_public_puts_requested_overrides_last() {
        assert_eq!(
            args(ComposeOperation::Down, Profile::GpuAmd, Environment::Public).join(" "),
            "compose -p localai --profile gpu-amd --profile cpu --profile gpu-nvidia \
             -f supabase/docker/docker-compose.yml -f docker-compose.yml \
             -f docker-compose.override.private.yml \
             -f docker-compose.override.public.yml -f docker-compose.override.public.supabase.yml \
             down --remove-orphans"
        );
    }

    #[test]
    fn public_contributes_two_overrides_private_one() {
        let layout = ComposeLayout::default();
        let overrides = |env| {
            [ComposeOperation::UpDependency, ComposeOperation::UpLocal]
                .iter()
                .flat_map(|op| {
                    CompositionFileSet::for_operation(*op, &config(Profile::Cpu, env), &layout).files
                })
                .filter(|f| f != &layout.dependency_file && f != &layout.local_file)
                .count()
        };
        assert_eq!(overrides(Environment::Public), 2);
        assert_eq!(overrides(Environment::Private), 1);
    }

    #[test]
    fn teardown_covers_every_startup_combination() {
        let layout = ComposeLayout::default();
        for requested_env in Environment::ALL {
            for requested_profile in Profile::ALL {
                let down = CompositionFileSet::for_operation(
                    ComposeOperation::Down,
                    &config(requested_profile, requested_env),
                    &layout,
                );
                for env in Environment::ALL {
                    for profile in Profile::ALL {
                        for op in [ComposeOperation::UpDependency, ComposeOperation::UpLocal] {
                            let up =
                                CompositionFileSet::for_operation(op, &config(profile, env), &layout);
                            assert!(up.files.iter().all(|f| down.files.contains(f)));
                            assert!(up.profiles.iter().all(|p| down.profiles.contains(p)));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn builder_is_deterministic() {
        let first = args(ComposeOperation::Down, Profile::Cpu, Environment::Private);
        let second = args(ComposeOperation::Down, Profile::Cpu, Environment::Private);
        assert_eq!(first, second);
    }

    #[test]
    fn policies() {
        let layout = ComposeLayout::default();
        let cfg = StackConfiguration::default();
        let policy =
            |op| CompositionFileSet::for_operation(op, &cfg, &layout).policy();
        assert_eq!(policy(ComposeOperation::Down), FailurePolicy::Tolerant);
        assert_eq!(policy(ComposeOperation::UpDependency), FailurePolicy::Fatal);
        assert_eq!(policy(ComposeOperation::UpLocal), FailurePolicy::Fatal);
    }

    #[test]
    fn retain_existing_filters_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("docker-compose.yml"), "services: {}\n").unwrap();
        let down = CompositionFileSet::for_operation(
            ComposeOperation::Down,
            &StackConfiguration::default(),
            &ComposeLayout::default(),
        )
        .retain_existing(dir.path());
        assert_eq!(down.files, vec![PathBuf::from("docker-compose.yml")]);
    }
}
