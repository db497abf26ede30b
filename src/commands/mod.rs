mod doctor;
mod start;
mod stop;

pub use doctor::run_doctor;
pub use start::run_start;
pub use stop::run_stop;

use stackup::{Parser as ConfigParser, StackSettings};
use std::path::{Path, PathBuf};

/// Settings plus the directory the stack lives in.
pub struct Workspace {
    pub settings: StackSettings,
    pub work_dir: PathBuf,
}

/// Load stackup.yaml (explicit, discovered from the work dir upward, or defaults).
pub fn load_workspace(
    config: Option<PathBuf>,
    workdir: Option<PathBuf>,
) -> anyhow::Result<Workspace> {
    let parser = ConfigParser::new();
    let config_path = match (config, &workdir) {
        (Some(path), _) => Some(path),
        (None, Some(dir)) => ConfigParser::find_config_in_dir(dir),
        (None, None) => parser.find_config_file()?,
    };
    let (settings, config_path) = parser.load_or_default(config_path.as_deref())?;
    let work_dir = resolve_work_dir(workdir, config_path.as_deref())?;
    tracing::debug!("Work dir: {}", work_dir.display());
    Ok(Workspace { settings, work_dir })
}

fn resolve_work_dir(workdir: Option<PathBuf>, config_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(workdir) = workdir {
        return Ok(workdir);
    }
    match config_path.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Ok(std::env::current_dir()?),
    }
}
