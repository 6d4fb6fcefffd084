//! Secret resolution with an optional in-memory cache.
//!
//! [`SecretStore`] is the raw backend seam. [`resolve_secret`] applies the
//! payload contract on top of any store, so the direct and the caching
//! strategies report failures identically:
//! - a backend failure becomes [`ProvisionError::SecretStore`]
//! - a missing or empty payload becomes [`ProvisionError::EmptySecret`]

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sql_resource_core::error::{DriverError, ProvisionError};
use tokio::sync::RwLock;
use tokio::time::Instant as Deadline;

use crate::deadline::bounded;

/// Backend that returns the current payload for a secret reference.
///
/// Implementations must not log payloads.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn fetch_secret(&self, secret_id: &str) -> Result<Option<String>, DriverError>;
}

pub async fn resolve_secret(
    store: &dyn SecretStore,
    secret_id: &str,
    deadline: Option<Deadline>,
) -> Result<String, ProvisionError> {
    tracing::debug!(secret_id, "Getting secret");
    let payload = bounded(deadline, "secret fetch", store.fetch_secret(secret_id))
        .await
        .map_err(ProvisionError::SecretStore)?;

    match payload {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ProvisionError::EmptySecret),
    }
}

#[derive(Debug, Clone)]
struct CachedSecret {
    value: String,
    cached_at: Instant,
}

impl CachedSecret {
    fn new(value: String) -> Self {
        Self {
            value,
            cached_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Wraps a [`SecretStore`] with a per-reference cache shared by concurrent
/// invocations.
///
/// Only non-empty payloads are cached; failures always reach the inner store
/// again on the next call.
pub struct CachingSecretStore<S> {
    inner: S,
    cache: RwLock<HashMap<String, CachedSecret>>,
    ttl: Duration,
}

impl<S: SecretStore> CachingSecretStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn invalidate(&self, secret_id: &str) {
        self.cache.write().await.remove(secret_id);
    }

    pub async fn cache_size(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[async_trait]
impl<S: SecretStore> SecretStore for CachingSecretStore<S> {
    async fn fetch_secret(&self, secret_id: &str) -> Result<Option<String>, DriverError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(secret_id) {
                if !cached.is_expired(self.ttl) {
                    tracing::debug!(secret_id, "Cache hit for secret");
                    return Ok(Some(cached.value.clone()));
                }
                tracing::debug!(secret_id, "Cached secret expired");
            }
        }

        let payload = self.inner.fetch_secret(secret_id).await?;

        let mut cache = self.cache.write().await;
        match &payload {
            Some(value) if !value.is_empty() => {
                cache.insert(secret_id.to_string(), CachedSecret::new(value.clone()));
            }
            _ => {
                cache.remove(secret_id);
            }
        }

        Ok(payload)
    }
}
