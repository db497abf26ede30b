use crate::error::{Error, Result};
use async_trait::async_trait;

/// Lists the branches a remote advertises.
#[async_trait]
pub trait BranchProbe: Send + Sync {
    /// Branch names (without `refs/heads/`) present on `url`.
    async fn remote_branches(&self, url: &str) -> Result<Vec<String>>;
}

/// Remote listing through libgit2, equivalent to `git ls-remote --heads`.
#[derive(Debug, Clone, Default)]
pub struct Git2BranchProbe;

impl Git2BranchProbe {
    fn list_blocking(url: &str) -> Result<Vec<String>> {
        let mut remote = git2::Remote::create_detached(url)?;
        remote.connect(git2::Direction::Fetch)?;
        let branches = remote
            .list()?
            .iter()
            .filter_map(|head| head.name().strip_prefix("refs/heads/"))
            .map(str::to_string)
            .collect();
        remote.disconnect()?;
        Ok(branches)
    }
}

#[async_trait]
impl BranchProbe for Git2BranchProbe {
    async fn remote_branches(&self, url: &str) -> Result<Vec<String>> {
        let url = url.to_string();
        tokio::task::spawn_blocking(move || Self::list_blocking(&url))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?
    }
}

/// First of `candidates` that exists on the remote.
pub async fn resolve_default_branch(
    probe: &dyn BranchProbe,
    url: &str,
    candidates: &[String],
) -> Result<String> {
    let branches = match probe.remote_branches(url).await {
        Ok(branches) => branches,
        Err(e) => {
            tracing::warn!("Listing branches of {} failed: {}", url, e);
            Vec::new()
        }
    };

    for candidate in candidates {
        if branches.iter().any(|b| b == candidate) {
            tracing::info!("Default branch of {} is '{}'", url, candidate);
            return Ok(candidate.clone());
        }
        tracing::debug!("Branch '{}' not found on {}", candidate, url);
    }

    Err(Error::DefaultBranch {
        repository: url.to_string(),
        tried: candidates.to_vec(),
    })
}
