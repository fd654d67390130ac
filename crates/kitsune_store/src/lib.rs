//! Durable storage for a single user's [`CompanionProgress`].
//!
//! The save file is a pretty-printed JSON document so it can be inspected by
//! hand. Writes go to a temporary file in the same directory which is then
//! renamed over the target, so a crash mid-save never leaves a truncated file.

mod document;

pub use document::{ProgressDocument, SkillRecord, DOCUMENT_VERSION};

use chrono::Utc;
use kitsune_core::{CompanionError, CompanionProgress, ProgressionTable};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type Result<T> = std::result::Result<T, CompanionError>;

#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
    table: Arc<ProgressionTable>,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>, table: Arc<ProgressionTable>) -> Self {
        Self {
            path: path.into(),
            table,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &Arc<ProgressionTable> {
        &self.table
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the saved progress.
    ///
    /// A missing file is a first run and yields fresh progress. A file that
    /// exists but does not describe valid progress fails with `CorruptData`;
    /// the caller decides between aborting and [`ProgressStore::reset`].
    pub fn load(&self) -> Result<CompanionProgress> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "No save file at {}, starting fresh",
                    self.path.display()
                );
                return Ok(CompanionProgress::new(self.table.clone(), Utc::now()));
            }
            Err(source) => {
                return Err(CompanionError::Persistence {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let document: ProgressDocument = serde_json::from_slice(&bytes)
            .map_err(|e| CompanionError::corrupt(&self.path, e.to_string()))?;
        let progress = document
            .into_progress(self.table.clone())
            .map_err(|reason| CompanionError::corrupt(&self.path, reason))?;

        tracing::info!(
            "Loaded progress from {}: {} interactions, total level {}, {} achievements",
            self.path.display(),
            progress.total_interactions,
            progress.total_level(),
            progress.unlocked_count()
        );
        Ok(progress)
    }

    /// Overwrite the save file with `progress`, atomically.
    pub fn save(&self, progress: &CompanionProgress) -> Result<()> {
        let mut json = serde_json::to_vec_pretty(&ProgressDocument::from_progress(progress))
            .map_err(|e| self.io_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        json.push(b'\n');

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&json).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        tracing::debug!("Saved progress to {}", self.path.display());
        Ok(())
    }

    /// Replace the save file with fresh progress and return it.
    pub fn reset(&self) -> Result<CompanionProgress> {
        let fresh = CompanionProgress::new(self.table.clone(), Utc::now());
        self.save(&fresh)?;
        tracing::info!("Progress reset at {}", self.path.display());
        Ok(fresh)
    }

    /// Move an unreadable save file aside so a reset does not destroy it.
    /// Returns the new location, or `None` if there was nothing to move.
    pub fn quarantine(&self) -> Result<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".corrupt-{}", Utc::now().timestamp()));
        let target = self.path.with_file_name(name);
        std::fs::rename(&self.path, &target).map_err(|e| self.io_error(e))?;
        tracing::warn!(
            "Moved unreadable save file {} to {}",
            self.path.display(),
            target.display()
        );
        Ok(Some(target))
    }

    fn io_error(&self, source: std::io::Error) -> CompanionError {
        CompanionError::Persistence {
            path: self.path.clone(),
            source,
        }
    }
}
