//! Core configuration types.
//!
//! [`StackSettings`] describes the on-disk layout of the stack and is read from
//! `stackup.yaml`. [`StackConfiguration`] is the immutable per-run input built
//! from the settings plus command-line overrides.

use super::{parse_duration_string, Environment, Profile};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PROJECT_NAME: &str = "localai";
pub const DEFAULT_PROBE_PORT: u16 = 54322;

/// Root configuration structure for stackup.yaml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StackSettings {
    /// Compose project name shared by both deployment units
    pub project_name: String,
    pub dependency: DependencySettings,
    pub env_files: EnvFileSettings,
    pub secret: SecretSettings,
    pub capability: CapabilitySettings,
    pub compose: ComposeLayout,
    pub readiness: ReadinessSettings,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            dependency: DependencySettings::default(),
            env_files: EnvFileSettings::default(),
            secret: SecretSettings::default(),
            capability: CapabilitySettings::default(),
            compose: ComposeLayout::default(),
            readiness: ReadinessSettings::default(),
        }
    }
}

/// The vendored project fetched with a sparse checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DependencySettings {
    pub repository: String,
    /// Local checkout directory, relative to the work dir
    pub directory: PathBuf,
    /// The only subtree materialized by the sparse checkout
    pub sparse_path: String,
    /// Branch names probed in order to find the remote's default branch
    pub candidate_branches: Vec<String>,
}

impl Default for DependencySettings {
    fn default() -> Self {
        Self {
            repository: "https://github.com/supabase/supabase.git".to_string(),
            directory: PathBuf::from("supabase"),
            sparse_path: "docker".to_string(),
            candidate_branches: vec!["master".to_string(), "main".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvFileSettings {
    /// Authoritative env file
    pub source: PathBuf,
    /// Working env file read by the dependency project
    pub destination: PathBuf,
}

impl Default for EnvFileSettings {
    fn default() -> Self {
        Self {
            source: PathBuf::from(".env"),
            destination: PathBuf::from("supabase/docker/.env"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecretSettings {
    pub template: PathBuf,
    pub working: PathBuf,
    pub placeholder: String,
}

impl Default for SecretSettings {
    fn default() -> Self {
        Self {
            template: PathBuf::from("searxng/settings-base.yml"),
            working: PathBuf::from("searxng/settings.yml"),
            placeholder: "ultrasecretkey".to_string(),
        }
    }
}

/// Location of the guarded capability declaration and how to detect first run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CapabilitySettings {
    pub compose_file: PathBuf,
    /// Service under `services:` that owns the declaration
    pub service: String,
    /// Key of the declaration inside the service
    pub key: String,
    /// Name filter used to find the running instance
    pub container_filter: String,
    /// File whose presence inside the instance marks bootstrap as complete
    pub marker_file: String,
}

impl Default for CapabilitySettings {
    fn default() -> Self {
        Self {
            compose_file: PathBuf::from("docker-compose.yml"),
            service: "searxng".to_string(),
            key: "cap_drop".to_string(),
            container_filter: "searxng".to_string(),
            marker_file: "/etc/searxng/uwsgi.ini".to_string(),
        }
    }
}

/// Composition files, relative to the work dir.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComposeLayout {
    pub dependency_file: PathBuf,
    pub local_file: PathBuf,
    pub private_override: PathBuf,
    pub public_override: PathBuf,
    pub public_dependency_override: PathBuf,
}

impl Default for ComposeLayout {
    fn default() -> Self {
        Self {
            dependency_file: PathBuf::from("supabase/docker/docker-compose.yml"),
            local_file: PathBuf::from("docker-compose.yml"),
            private_override: PathBuf::from("docker-compose.override.private.yml"),
            public_override: PathBuf::from("docker-compose.override.public.yml"),
            public_dependency_override: PathBuf::from(
                "docker-compose.override.public.supabase.yml",
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReadinessSettings {
    pub host: String,
    pub port: u16,
    /// Total wait budget, e.g. "120s"
    pub timeout: String,
    /// Delay between connection attempts, e.g. "2s"
    pub interval: String,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PROBE_PORT,
            timeout: "120s".to_string(),
            interval: "2s".to_string(),
        }
    }
}

impl ReadinessSettings {
    pub fn timeout_duration(&self) -> Result<Duration> {
        parse_duration_string(&self.timeout).ok_or_else(|| {
            Error::Validation(format!("readiness.timeout '{}' is not a duration", self.timeout))
        })
    }

    pub fn interval_duration(&self) -> Result<Duration> {
        parse_duration_string(&self.interval).ok_or_else(|| {
            Error::Validation(format!(
                "readiness.interval '{}' is not a duration",
                self.interval
            ))
        })
    }
}

/// Immutable input to a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct StackConfiguration {
    pub profile: Profile,
    pub environment: Environment,
    /// Skip the dependency clone/update step
    pub skip_sync: bool,
    /// Skip the capability toggle step
    pub skip_capability: bool,
    pub readiness_timeout: Duration,
    /// Extra sleep applied only when the readiness probe times out
    pub fallback_wait: Duration,
    pub probe_port: u16,
}

impl StackConfiguration {
    /// Defaults for a run, taken from the settings file.
    pub fn from_settings(settings: &StackSettings) -> Result<Self> {
        Ok(Self {
            profile: Profile::default(),
            environment: Environment::default(),
            skip_sync: false,
            skip_capability: false,
            readiness_timeout: settings.readiness.timeout_duration()?,
            fallback_wait: Duration::ZERO,
            probe_port: settings.readiness.port,
        })
    }
}

impl Default for StackConfiguration {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            environment: Environment::default(),
            skip_sync: false,
            skip_capability: false,
            readiness_timeout: Duration::from_secs(120),
            fallback_wait: Duration::ZERO,
            probe_port: DEFAULT_PROBE_PORT,
        }
    }
}
