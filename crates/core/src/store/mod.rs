//! Artifact store.
//!
//! Converted bytes live here between conversion and download. Each artifact
//! is addressed by an opaque `ArtifactHandle` and expires after the
//! configured retention window.

mod config;
mod error;
mod memory;
mod types;

pub use config::StoreConfig;
pub use error::StoreError;
pub use memory::ArtifactStore;
pub use types::{ArtifactHandle, ArtifactMeta, EvictionReason, StoredArtifact};
