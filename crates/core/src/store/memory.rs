//! In-memory artifact store.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::config::StoreConfig;
use super::error::StoreError;
use super::types::{ArtifactHandle, ArtifactMeta, EvictionReason, StoredArtifact};
use crate::format::FormatTag;
use crate::metrics;

/// Holds converted bytes keyed by handle until they are evicted or expire.
///
/// Safe for concurrent readers and writers. Expired artifacts read as
/// `NotFound` immediately; the sweeper only reclaims their memory.
pub struct ArtifactStore {
    config: StoreConfig,
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    artifacts: HashMap<ArtifactHandle, StoredArtifact>,
    /// Insertion order, oldest first.
    order: VecDeque<ArtifactHandle>,
    total_bytes: u64,
}

impl StoreInner {
    fn remove(&mut self, handle: &ArtifactHandle, reason: EvictionReason) -> Option<ArtifactMeta> {
        let artifact = self.artifacts.remove(handle)?;
        self.order.retain(|h| h != handle);
        self.total_bytes = self.total_bytes.saturating_sub(artifact.meta.size_bytes);
        metrics::ARTIFACTS_EVICTED
            .with_label_values(&[reason.as_str()])
            .inc();
        Some(artifact.meta)
    }
}

impl ArtifactStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(StoreInner::default()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Stores bytes under a fresh handle.
    pub async fn put(
        &self,
        bytes: impl Into<Bytes>,
        filename: impl Into<String>,
        format: FormatTag,
    ) -> Result<ArtifactMeta, StoreError> {
        self.put_at(bytes.into(), filename.into(), format, Utc::now())
            .await
    }

    async fn put_at(
        &self,
        bytes: Bytes,
        filename: String,
        format: FormatTag,
        now: DateTime<Utc>,
    ) -> Result<ArtifactMeta, StoreError> {
        let size_bytes = bytes.len() as u64;
        if let Some(capacity) = self.config.max_total_bytes {
            if size_bytes > capacity {
                return Err(StoreError::TooLarge {
                    size_bytes,
                    capacity_bytes: capacity,
                });
            }
        }

        let meta = ArtifactMeta {
            handle: ArtifactHandle::new(),
            filename,
            format,
            size_bytes,
            sha256: hex_sha256(&bytes),
            created_at: now,
            expires_at: self.expiry_for(now),
        };

        let mut inner = self.inner.write().await;
        if let Some(capacity) = self.config.max_total_bytes {
            while inner.total_bytes + size_bytes > capacity {
                let Some(oldest) = inner.order.front().cloned() else {
                    break;
                };
                inner.remove(&oldest, EvictionReason::Capacity);
                debug!(handle = %oldest, "Evicted artifact to stay under capacity");
            }
        }

        inner.total_bytes += size_bytes;
        inner.order.push_back(meta.handle.clone());
        inner.artifacts.insert(
            meta.handle.clone(),
            StoredArtifact {
                bytes,
                meta: meta.clone(),
            },
        );
        metrics::ARTIFACTS_STORED.inc();
        metrics::STORE_BYTES.set(inner.total_bytes as i64);

        debug!(
            handle = %meta.handle,
            filename = %meta.filename,
            size_bytes,
            "Stored artifact"
        );
        Ok(meta)
    }

    fn expiry_for(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.config.retention())
            .ok()
            .and_then(|retention| now.checked_add_signed(retention))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns the artifact, or `NotFound` if it is unknown or expired.
    pub async fn get(&self, handle: &ArtifactHandle) -> Result<StoredArtifact, StoreError> {
        self.get_at(handle, Utc::now()).await
    }

    async fn get_at(
        &self,
        handle: &ArtifactHandle,
        now: DateTime<Utc>,
    ) -> Result<StoredArtifact, StoreError> {
        let inner = self.inner.read().await;
        match inner.artifacts.get(handle) {
            Some(artifact) if !artifact.meta.is_expired_at(now) => Ok(artifact.clone()),
            _ => Err(StoreError::not_found(handle.as_str())),
        }
    }

    /// Removes an artifact at the caller's request.
    pub async fn evict(&self, handle: &ArtifactHandle) -> Result<ArtifactMeta, StoreError> {
        self.evict_with_reason(handle, EvictionReason::Explicit)
            .await
    }

    /// Removes an artifact, recording why.
    pub async fn evict_with_reason(
        &self,
        handle: &ArtifactHandle,
        reason: EvictionReason,
    ) -> Result<ArtifactMeta, StoreError> {
        let mut inner = self.inner.write().await;
        let meta = inner
            .remove(handle, reason)
            .ok_or_else(|| StoreError::not_found(handle.as_str()))?;
        metrics::STORE_BYTES.set(inner.total_bytes as i64);
        debug!(handle = %handle, reason = reason.as_str(), "Evicted artifact");
        Ok(meta)
    }

    /// Drops every expired artifact. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now()).await
    }

    /// Drops every artifact expired as of `now`.
    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.inner.write().await;
        let expired: Vec<ArtifactHandle> = inner
            .artifacts
            .values()
            .filter(|a| a.meta.is_expired_at(now))
            .map(|a| a.meta.handle.clone())
            .collect();

        for handle in &expired {
            inner.remove(handle, EvictionReason::Expired);
        }
        metrics::STORE_BYTES.set(inner.total_bytes as i64);

        if !expired.is_empty() {
            info!(
                purged = expired.len(),
                remaining = inner.artifacts.len(),
                "Purged expired artifacts"
            );
        }
        expired.len()
    }

    /// Starts the background task that purges expired artifacts.
    ///
    /// The task runs until aborted.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let period = self.config.sweep_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.purge_expired().await;
            }
        })
    }

    /// Number of artifacts held, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.inner.read().await.artifacts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.artifacts.is_empty()
    }

    pub async fn total_bytes(&self) -> u64 {
        self.inner.read().await.total_bytes
    }
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn hex_sha256(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
