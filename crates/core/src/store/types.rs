//! Types for the artifact store.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::format::FormatTag;

/// Opaque handle to a stored artifact (a UUID v4 string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactHandle(String);

impl ArtifactHandle {
    /// Generates a fresh handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parses a caller-supplied handle. Only UUIDs are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim())
            .ok()
            .map(|uuid| Self(uuid.hyphenated().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ArtifactHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata kept alongside stored bytes.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMeta {
    pub handle: ArtifactHandle,
    /// Download filename.
    pub filename: String,
    pub format: FormatTag,
    pub size_bytes: u64,
    /// Hex SHA-256 of the bytes.
    pub sha256: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ArtifactMeta {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A stored artifact. Cloning is cheap; the bytes are shared.
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub bytes: Bytes,
    pub meta: ArtifactMeta,
}

/// Why an artifact left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// Caller deleted it.
    Explicit,
    /// Retention window elapsed.
    Expired,
    /// Evicted to stay under the byte cap.
    Capacity,
    /// Its result never reached the caller.
    Undelivered,
}

impl EvictionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Expired => "expired",
            Self::Capacity => "capacity",
            Self::Undelivered => "undelivered",
        }
    }
}
