//! Secret provisioning for the search service's settings file.
//!
//! The working settings file starts life as a copy of a template that contains
//! a literal placeholder. The placeholder is replaced by a generated secret
//! exactly once; once it is gone, provisioning never touches the file again.

use crate::error::Result;
use crate::fsutil;
use rand::RngCore;
use std::path::Path;

/// Random bytes per secret (hex-encoded to twice as many characters).
pub const SECRET_BYTES: usize = 32;

/// Generate a random secret using a CSPRNG (ChaCha12 via `thread_rng`).
///
/// 64 lowercase hex characters.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Replace every placeholder occurrence with one secret, or `None` if already provisioned.
pub fn substitute(text: &str, placeholder: &str, secret: &str) -> Option<String> {
    if placeholder.is_empty() || !text.contains(placeholder) {
        return None;
    }
    Some(text.replace(placeholder, secret))
}

/// What [`provision`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOutcome {
    /// No template; nothing done
    TemplateMissing,
    /// A secret was written; `created` when the working file was new
    Provisioned { created: bool },
    /// Working file already free of the placeholder
    AlreadyProvisioned { created: bool },
}

/// Create the working settings file from the template if needed and inject a secret.
pub fn provision(template: &Path, working: &Path, placeholder: &str) -> Result<SecretOutcome> {
    if !template.exists() {
        tracing::warn!(
            "Settings template missing ({}); skipping secret generation",
            template.display()
        );
        return Ok(SecretOutcome::TemplateMissing);
    }

    if !working.exists() {
        tracing::info!(
            "Creating {} from {}",
            working.display(),
            template.display()
        );
        let template_text = std::fs::read_to_string(template)?;
        return match substitute(&template_text, placeholder, &generate_secret()) {
            Some(provisioned) => {
                fsutil::atomic_write(working, &provisioned)?;
                tracing::info!("Secret key inserted into {}", working.display());
                Ok(SecretOutcome::Provisioned { created: true })
            }
            None => {
                fsutil::atomic_write(working, &template_text)?;
                Ok(SecretOutcome::AlreadyProvisioned { created: true })
            }
        };
    }

    let written = fsutil::rewrite(working, |text| {
        Ok(substitute(text, placeholder, &generate_secret()))
    })?;

    if written {
        tracing::info!("Secret key inserted into {}", working.display());
        Ok(SecretOutcome::Provisioned { created: false })
    } else {
        tracing::info!("Secret in {} already replaced; skipping", working.display());
        Ok(SecretOutcome::AlreadyProvisioned { created: false })
    }
}
