//! Artifact model: names, store references and metadata.
//!
//! An artifact is one persisted voice recording. The name is chosen by the
//! caller and doubles as the store's lookup key, so it is validated once here
//! and carried around as a newtype afterwards.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{CacheError, Result};

/// Leaves room for the store's `.{name}.{ext}.part` temp file inside the
/// usual 255-byte file name limit.
pub const MAX_NAME_LEN: usize = 200;

/// Caller-supplied artifact identifier.
///
/// The store derives the artifact's path from this name, so anything that
/// could escape the store root (separators, `.`/`..`, control characters)
/// is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactName(String);

impl ArtifactName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name.len() > MAX_NAME_LEN {
            Some("name is longer than 200 bytes")
        } else if name == "." || name == ".." {
            Some("name is a relative path component")
        } else if name.contains(['/', '\\']) {
            Some("name contains a path separator")
        } else if name.chars().any(char::is_control) {
            Some("name contains a control character")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CacheError::InvalidName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ArtifactName {
    type Error = CacheError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ArtifactName {
    type Error = CacheError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ArtifactName> for String {
    fn from(name: ArtifactName) -> Self {
        name.0
    }
}

/// Size and creation time as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// A persisted artifact as returned by a store write or directory scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub name: ArtifactName,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl ArtifactRef {
    pub fn new(name: ArtifactName, path: PathBuf, meta: ArtifactMeta) -> Self {
        Self {
            name,
            path,
            size_bytes: meta.size_bytes,
            created_at: meta.created_at,
        }
    }

    pub fn meta(&self) -> ArtifactMeta {
        ArtifactMeta {
            size_bytes: self.size_bytes,
            created_at: self.created_at,
        }
    }
}
