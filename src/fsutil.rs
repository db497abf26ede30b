//! Scoped file rewrites.
//!
//! Every mutation of a shared artifact is a pure `old text -> Option<new text>`
//! transform. [`rewrite`] reads the file under an exclusive lock, applies the
//! transform and, only when it produced new content, replaces the file with a
//! write-then-rename so the original is either fully replaced or untouched.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Apply `transform` to the file at `path`. Returns whether the file was written.
pub fn rewrite<F>(path: &Path, transform: F) -> Result<bool>
where
    F: FnOnce(&str) -> Result<Option<String>>,
{
    let mut file = fs::File::open(path)
        .map_err(|e| Error::Filesystem(format!("Cannot open '{}': {}", path.display(), e)))?;

    file.lock_exclusive()
        .map_err(|e| Error::Filesystem(format!("Cannot lock '{}': {}", path.display(), e)))?;

    let mut current = String::new();
    let result = file
        .read_to_string(&mut current)
        .map_err(|e| Error::Filesystem(format!("Cannot read '{}': {}", path.display(), e)))
        .and_then(|_| transform(&current))
        .and_then(|updated| match updated {
            Some(contents) if contents != current => {
                atomic_write(path, &contents)?;
                Ok(true)
            }
            _ => Ok(false),
        });

    file.unlock()
        .map_err(|e| Error::Filesystem(format!("Cannot unlock '{}': {}", path.display(), e)))?;

    result
}

/// Atomic file write using write-then-rename.
///
/// The temp file lives next to the target so the rename stays on one filesystem.
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let temp_path = temp_sibling(path);

    let mut file = fs::File::create(&temp_path).map_err(|e| {
        Error::Filesystem(format!(
            "Failed to create temp file '{}': {}",
            temp_path.display(),
            e
        ))
    })?;

    let written = file
        .write_all(contents.as_bytes())
        .and_then(|_| file.sync_all());
    drop(file);

    if let Err(e) = written.and_then(|_| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::Filesystem(format!(
            "Failed to write '{}': {}",
            path.display(),
            e
        )));
    }

    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "stackup".to_string());
    path.with_file_name(format!(".{}.stackup-tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_applies_transform() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yml");
        fs::write(&path, "secret: PLACEHOLDER\n").unwrap();

        let written = rewrite(&path, |text| Ok(Some(text.replace("PLACEHOLDER", "abc")))).unwrap();

        assert!(written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "secret: abc\n");
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn rewrite_skips_write_when_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "A=1\n").unwrap();

        assert!(!rewrite(&path, |_| Ok(None)).unwrap());
        assert!(!rewrite(&path, |text| Ok(Some(text.to_string()))).unwrap());
    }

    #[test]
    fn failed_transform_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker-compose.yml");
        fs::write(&path, "services: {}\n").unwrap();

        let result = rewrite(&path, |_| Err(Error::Capability("boom".to_string())));

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "services: {}\n");
    }

    #[test]
    fn rewrite_missing_file_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = rewrite(&dir.path().join("absent"), |_| Ok(None)).unwrap_err();
        assert!(matches!(err, Error::Filesystem(_)));
    }

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "old").unwrap();
        atomic_write(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }
}
