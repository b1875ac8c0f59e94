//! Writing rewritten sources back to disk.
//!
//! A [`FileRewrite`] replaces a whole file with the printed result of a
//! session, but only while the file still holds the text the session parsed.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// What the file is expected to contain before the rewrite lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (large files)
    Hash(u64),
}

impl EditVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }

    pub fn hash(&self) -> u64 {
        match self {
            EditVerification::Hash(h) => *h,
            EditVerification::ExactMatch(text) => xxh3_64(text.as_bytes()),
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("{file} changed since it was read; refusing to overwrite")]
    BeforeTextMismatch { file: PathBuf, expected_hash: u64, found_hash: u64 },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 validation error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditResult should be checked for success/already-applied"]
pub enum EditResult {
    Applied { file: PathBuf, bytes_written: usize },
    /// The file already holds the new text.
    AlreadyApplied { file: PathBuf },
}

/// Replacement of a file's entire contents.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileRewrite does nothing until apply() is called"]
pub struct FileRewrite {
    pub file: PathBuf,
    pub expected_before: EditVerification,
    pub new_text: String,
}

impl FileRewrite {
    pub fn new(file: impl Into<PathBuf>, before: &str, new_text: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            expected_before: EditVerification::from_text(before),
            new_text: new_text.into(),
        }
    }

    /// Whether applying would change anything, judged against the text the
    /// rewrite was computed from.
    pub fn is_noop(&self) -> bool {
        self.expected_before.matches(&self.new_text)
    }

    /// Verify the file and write the new text atomically.
    pub fn apply(&self) -> Result<EditResult, EditError> {
        let bytes = fs::read(&self.file)?;
        let current = std::str::from_utf8(&bytes)?;

        if current == self.new_text {
            return Ok(EditResult::AlreadyApplied {
                file: self.file.clone(),
            });
        }

        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                file: self.file.clone(),
                expected_hash: self.expected_before.hash(),
                found_hash: xxh3_64(current.as_bytes()),
            });
        }

        atomic_write(&self.file, self.new_text.as_bytes())?;
        tracing::debug!(file = %self.file.display(), bytes = self.new_text.len(), "rewrote file");

        Ok(EditResult::Applied {
            file: self.file.clone(),
            bytes_written: self.new_text.len(),
        })
    }
}

/// Atomic file write: tempfile + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Same directory, so the rename never crosses filesystems.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_exact_match() {
        let verify = EditVerification::ExactMatch("hello world".to_string());
        assert!(verify.matches("hello world"));
        assert!(!verify.matches("hello"));
    }

    #[test]
    fn verification_switches_to_hash_for_large_text() {
        assert!(matches!(
            EditVerification::from_text("small"),
            EditVerification::ExactMatch(_)
        ));
        let large = "x".repeat(2000);
        let verify = EditVerification::from_text(&large);
        assert!(matches!(verify, EditVerification::Hash(_)));
        assert!(verify.matches(&large));
        assert_eq!(verify.hash(), EditVerification::ExactMatch(large).hash());
    }

    #[test]
    fn applies_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.js");
        fs::write(&path, "console.log(1);\n").unwrap();

        let rewrite = FileRewrite::new(&path, "console.log(1);\n", "logger.debug(1);\n");
        assert!(!rewrite.is_noop());
        let result = rewrite.apply().unwrap();

        assert!(matches!(result, EditResult::Applied { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "logger.debug(1);\n");
    }

    #[test]
    fn second_apply_is_already_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.js");
        fs::write(&path, "a();").unwrap();

        let rewrite = FileRewrite::new(&path, "a();", "b();");
        assert!(matches!(rewrite.apply().unwrap(), EditResult::Applied { .. }));
        assert!(matches!(
            rewrite.apply().unwrap(),
            EditResult::AlreadyApplied { .. }
        ));
    }

    #[test]
    fn refuses_when_file_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.js");
        fs::write(&path, "edited elsewhere();").unwrap();

        let err = FileRewrite::new(&path, "a();", "b();").apply().unwrap_err();
        assert!(matches!(err, EditError::BeforeTextMismatch { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "edited elsewhere();");
    }
}
