//! Error taxonomy shared by every Kitsune crate.
//!
//! - `InvalidInput`: a malformed call into the progression core (unknown skill
//!   name, invalid threshold table). Should not happen from normal UI flow.
//! - `CorruptData`: the persisted progress document exists but cannot be
//!   turned back into a `CompanionProgress`. Surfaced to the user, never
//!   silently replaced.
//! - `UpstreamUnavailable`: the language-model endpoint failed, timed out or
//!   returned nothing. No progression state is touched when this is returned.
//! - `Persistence`: the document could not be read or written at the I/O level.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompanionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("corrupt progress document {}: {reason}", path.display())]
    CorruptData { path: PathBuf, reason: String },

    #[error("language model unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("failed to access {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompanionError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True when the error means "the save file is unreadable as progress",
    /// which the UI resolves by offering reset or abort.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }
}

pub type Result<T, E = CompanionError> = std::result::Result<T, E>;
