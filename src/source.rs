//! The three external collaborators the engine reads from.
//!
//! Implementations own their transport (HTTP client, database pool, KV bucket). The
//! engine only needs these async seams and never retries on its own.

use std::{collections::HashMap, future::Future, sync::Arc};

use crate::{
    domain::{AccountAddress, Version},
    error::FeedResult,
    series::BalanceHistory,
    transaction::{
        BlockMetadataTransaction, GenesisTransaction, ScriptUserTransaction, UserTransaction,
    },
};

pub mod horizon;
pub mod memory;

pub use horizon::KeyValueHorizon;

/// Serves the per-version balance samples of an account.
pub trait TimeSeriesProvider: Send + Sync {
    fn balance_history(
        &self,
        account: &AccountAddress,
    ) -> impl Future<Output = FeedResult<BalanceHistory>> + Send;
}

/// Reports the highest version treated as final. `None` means no data has been indexed yet.
pub trait StabilityHorizonProvider: Send + Sync {
    fn latest_stable_version(&self) -> impl Future<Output = FeedResult<Option<Version>>> + Send;
}

/// Batched lookups into the four transaction tables.
///
/// Each call returns only the versions its table knows about; missing versions are
/// simply absent from the map.
pub trait LedgerAnalyticsStore: Send + Sync {
    fn genesis_transactions(
        &self,
        versions: &[Version],
    ) -> impl Future<Output = FeedResult<HashMap<Version, GenesisTransaction>>> + Send;

    fn block_metadata_transactions(
        &self,
        versions: &[Version],
    ) -> impl Future<Output = FeedResult<HashMap<Version, BlockMetadataTransaction>>> + Send;

    fn script_user_transactions(
        &self,
        versions: &[Version],
    ) -> impl Future<Output = FeedResult<HashMap<Version, ScriptUserTransaction>>> + Send;

    fn user_transactions(
        &self,
        versions: &[Version],
    ) -> impl Future<Output = FeedResult<HashMap<Version, UserTransaction>>> + Send;
}

/// Minimal string key-value lookup, the shape of a JetStream-style KV bucket.
pub trait KeyValueStore: Send + Sync {
    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = FeedResult<Option<String>>> + Send;
}

// ================================================================================================
// Shared handles
// ================================================================================================

impl<T: TimeSeriesProvider> TimeSeriesProvider for Arc<T> {
    fn balance_history(
        &self,
        account: &AccountAddress,
    ) -> impl Future<Output = FeedResult<BalanceHistory>> + Send {
        (**self).balance_history(account)
    }
}

impl<T: StabilityHorizonProvider> StabilityHorizonProvider for Arc<T> {
    fn latest_stable_version(&self) -> impl Future<Output = FeedResult<Option<Version>>> + Send {
        (**self).latest_stable_version()
    }
}

impl<T: LedgerAnalyticsStore> LedgerAnalyticsStore for Arc<T> {
    fn genesis_transactions(
        &self,
        versions: &[Version],
    ) -> impl Future<Output = FeedResult<HashMap<Version, GenesisTransaction>>> + Send {
        (**self).genesis_transactions(versions)
    }

    fn block_metadata_transactions(
        &self,
        versions: &[Version],
    ) -> impl Future<Output = FeedResult<HashMap<Version, BlockMetadataTransaction>>> + Send {
        (**self).block_metadata_transactions(versions)
    }

    fn script_user_transactions(
        &self,
        versions: &[Version],
    ) -> impl Future<Output = FeedResult<HashMap<Version, ScriptUserTransaction>>> + Send {
        (**self).script_user_transactions(versions)
    }

    fn user_transactions(
        &self,
        versions: &[Version],
    ) -> impl Future<Output = FeedResult<HashMap<Version, UserTransaction>>> + Send {
        (**self).user_transactions(versions)
    }
}

impl<T: KeyValueStore> KeyValueStore for Arc<T> {
    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = FeedResult<Option<String>>> + Send {
        (**self).get(bucket, key)
    }
}
