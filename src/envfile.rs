//! Environment file (.env) merging.
//!
//! The root `.env` is authoritative; the dependency project keeps its own copy.
//! Merging only ever appends keys the destination has never seen, so values a
//! user changed in the destination survive every run.

use crate::error::{Error, Result};
use crate::fsutil;
use std::collections::HashSet;
use std::path::Path;

/// Comment written above every block of appended entries.
pub const MERGE_MARKER: &str = "# Added from root .env";

/// One line of an env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvLine {
    /// An assignment as dotenvy reads it; `raw` is the line exactly as written
    Entry {
        key: String,
        value: String,
        raw: String,
    },
    /// Comment, blank, or a line dotenvy rejects
    Other(String),
}

/// Line-oriented env file with insertion order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    lines: Vec<EnvLine>,
}

/// Key and value of a single line, using dotenvy's grammar (`export`, quotes, inline comments).
fn parse_assignment(line: &str) -> Option<(String, String)> {
    match dotenvy::from_read_iter(line.as_bytes()).next()? {
        Ok(pair) => Some(pair),
        Err(e) => {
            tracing::debug!("Ignoring unparseable env line {:?}: {}", line, e);
            None
        }
    }
}

impl EnvFile {
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|line| match parse_assignment(line) {
                Some((key, value)) => EnvLine::Entry {
                    key,
                    value,
                    raw: line.to_string(),
                },
                None => EnvLine::Other(line.to_string()),
            })
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[EnvLine] {
        &self.lines
    }

    /// Keys in file order (duplicates included).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            EnvLine::Entry { key, .. } => Some(key.as_str()),
            EnvLine::Other(_) => None,
        })
    }

    /// Value of the first entry for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            EnvLine::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Raw source lines for keys absent from `other`, first occurrence only.
    pub fn missing_from<'a>(&'a self, other: &EnvFile) -> Vec<&'a EnvLine> {
        let existing: HashSet<&str> = other.keys().collect();
        let mut seen = HashSet::new();
        self.lines
            .iter()
            .filter(|line| match line {
                EnvLine::Entry { key, .. } => {
                    !existing.contains(key.as_str()) && seen.insert(key.as_str())
                }
                EnvLine::Other(_) => false,
            })
            .collect()
    }
}

/// Compute the merged destination text, or `None` when nothing needs appending.
pub fn merge(source: &str, destination: &str) -> Option<String> {
    let source_env = EnvFile::parse(source);
    let dest_env = EnvFile::parse(destination);
    let additions = source_env.missing_from(&dest_env);
    if additions.is_empty() {
        return None;
    }

    let mut merged = destination.to_string();
    if !merged.is_empty() && !merged.ends_with('\n') {
        merged.push('\n');
    }
    merged.push('\n');
    merged.push_str(MERGE_MARKER);
    merged.push('\n');
    for line in additions {
        if let EnvLine::Entry { raw, .. } = line {
            merged.push_str(raw);
            merged.push('\n');
        }
    }
    Some(merged)
}

/// What [`prepare`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvMergeOutcome {
    /// Root env file absent; nothing done
    SourceMissing,
    /// Destination did not exist and was created as a copy of the source
    Copied,
    /// These keys were appended to the destination
    Appended(Vec<String>),
    /// Destination already had every source key
    UpToDate,
}

/// Bring the destination env file in line with the source.
pub fn prepare(source: &Path, destination: &Path) -> Result<EnvMergeOutcome> {
    if !source.exists() {
        tracing::warn!(
            "Root env file not found at {}; skipping env merge",
            source.display()
        );
        return Ok(EnvMergeOutcome::SourceMissing);
    }

    let source_text = std::fs::read_to_string(source)?;

    if !destination.exists() {
        match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
                return Err(Error::Filesystem(format!(
                    "Cannot create '{}': directory '{}' does not exist (was the dependency project synced?)",
                    destination.display(),
                    parent.display()
                )));
            }
            _ => {}
        }
        tracing::info!(
            "Copying {} to {}",
            source.display(),
            destination.display()
        );
        fsutil::atomic_write(destination, &source_text)?;
        return Ok(EnvMergeOutcome::Copied);
    }

    let mut appended = Vec::new();
    fsutil::rewrite(destination, |dest_text| {
        let source_env = EnvFile::parse(&source_text);
        let dest_env = EnvFile::parse(dest_text);
        appended = source_env
            .missing_from(&dest_env)
            .into_iter()
            .filter_map(|line| match line {
                EnvLine::Entry { key, .. } => Some(key.clone()),
                EnvLine::Other(_) => None,
            })
            .collect();
        Ok(merge(&source_text, dest_text))
    })?;

    if appended.is_empty() {
        tracing::debug!("{} already has every root env key", destination.display());
        Ok(EnvMergeOutcome::UpToDate)
    } else {
        tracing::info!(
            "Merged {} new variable(s) into {}: {}",
            appended.len(),
            destination.display(),
            appended.join(", ")
        );
        Ok(EnvMergeOutcome::Appended(appended))
    }
}
