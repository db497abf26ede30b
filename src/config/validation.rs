use super::StackSettings;
use crate::error::{Error, Result};

impl StackSettings {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.project_name.trim().is_empty() {
            return Err(Error::Validation(
                "project_name cannot be empty".to_string(),
            ));
        }

        // Compose project names are lowercase alphanumerics, '-' and '_'
        if !self
            .project_name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(Error::Validation(format!(
                "project_name '{}' may only contain lowercase letters, digits, '-' and '_'",
                self.project_name
            )));
        }

        if self.dependency.repository.trim().is_empty() {
            return Err(Error::Validation(
                "dependency.repository cannot be empty".to_string(),
            ));
        }

        if self.dependency.candidate_branches.is_empty() {
            return Err(Error::Validation(
                "dependency.candidate_branches must name at least one branch".to_string(),
            ));
        }

        if self.secret.placeholder.is_empty() {
            return Err(Error::Validation(
                "secret.placeholder cannot be empty".to_string(),
            ));
        }

        if self.capability.service.is_empty() || self.capability.key.is_empty() {
            return Err(Error::Validation(
                "capability.service and capability.key are required".to_string(),
            ));
        }

        // Interpolated into a single-quoted `sh -c` test inside the container
        let marker = &self.capability.marker_file;
        if marker.trim().is_empty() || marker.contains('\'') {
            return Err(Error::Validation(format!(
                "capability.marker_file '{}' must be a non-empty path without single quotes",
                marker
            )));
        }

        if self.readiness.port == 0 {
            return Err(Error::Validation(
                "readiness.port must be non-zero".to_string(),
            ));
        }

        self.readiness.timeout_duration()?;
        let interval = self.readiness.interval_duration()?;
        if interval.is_zero() {
            return Err(Error::Validation(
                "readiness.interval must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
