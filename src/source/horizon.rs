use tracing::debug;

use crate::{
    config::FeedConfig,
    domain::Version,
    error::{FeedResult, UpstreamError},
    source::{KeyValueStore, StabilityHorizonProvider},
};

pub const DEFAULT_HORIZON_BUCKET: &str = "ol";
pub const DEFAULT_HORIZON_KEY: &str = "ledger.latestVersion";

/// Reads the stability horizon from a key-value bucket where the indexer publishes it as
/// a base-10 string.
#[derive(Debug, Clone)]
pub struct KeyValueHorizon<S> {
    store: S,
    bucket: String,
    key: String,
}

impl<S: KeyValueStore> KeyValueHorizon<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_HORIZON_BUCKET, DEFAULT_HORIZON_KEY)
    }

    pub fn with_key(store: S, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Uses the bucket and key named in `config`.
    pub fn from_config(store: S, config: &FeedConfig) -> Self {
        Self::with_key(store, config.horizon_bucket.as_str(), config.horizon_key.as_str())
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> StabilityHorizonProvider for KeyValueHorizon<S> {
    async fn latest_stable_version(&self) -> FeedResult<Option<Version>> {
        let Some(raw) = self.store.get(&self.bucket, &self.key).await? else {
            debug!(bucket = %self.bucket, key = %self.key, "No stability horizon published yet");
            return Ok(None);
        };
        let version = raw.trim().parse::<u64>().map_err(|e| {
            UpstreamError::Malformed(format!(
                "horizon '{}/{}' holds '{raw}': {e}",
                self.bucket, self.key
            ))
        })?;
        Ok(Some(Version(version)))
    }
}
