use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Deployment environment; selects which override files augment the base composition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Private,
    Public,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Private, Environment::Public];
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" => Ok(Environment::Private),
            "public" => Ok(Environment::Public),
            _ => Err(format!(
                "Invalid environment '{}'. Valid values: private, public",
                s
            )),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Private => write!(f, "private"),
            Environment::Public => write!(f, "public"),
        }
    }
}

/// Compose profile selecting a subset of the local services.
///
/// `None` disables profile filtering entirely.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    #[default]
    Cpu,
    GpuNvidia,
    GpuAmd,
    None,
}

impl Profile {
    pub const ALL: [Profile; 4] = [
        Profile::Cpu,
        Profile::GpuNvidia,
        Profile::GpuAmd,
        Profile::None,
    ];

    /// The compose profile name, or `None` when no filter applies.
    pub fn compose_name(&self) -> Option<&'static str> {
        match self {
            Profile::Cpu => Some("cpu"),
            Profile::GpuNvidia => Some("gpu-nvidia"),
            Profile::GpuAmd => Some("gpu-amd"),
            Profile::None => None,
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Profile::Cpu),
            "gpu-nvidia" => Ok(Profile::GpuNvidia),
            "gpu-amd" => Ok(Profile::GpuAmd),
            "none" => Ok(Profile::None),
            _ => Err(format!(
                "Invalid profile '{}'. Valid values: cpu, gpu-nvidia, gpu-amd, none",
                s
            )),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.compose_name().unwrap_or("none"))
    }
}
