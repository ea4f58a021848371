//! In-process implementations of every source trait.
//!
//! Used by the test suites and handy for embedding the engine over pre-fetched data.
//! Each one can be told to fail or to respond slowly, to exercise the engine's error
//! and deadline paths.

use std::{
    collections::HashMap,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use serde::Deserialize;

use crate::{
    domain::{AccountAddress, Version},
    error::{FeedResult, UpstreamError},
    series::BalanceHistory,
    source::{KeyValueStore, LedgerAnalyticsStore, StabilityHorizonProvider, TimeSeriesProvider},
    transaction::{
        BlockMetadataTransaction, GenesisTransaction, ScriptUserTransaction, TransactionKind,
        TransactionRecord, UserTransaction,
        rows::{
            BlockMetadataTransactionRow, GenesisTransactionRow, ScriptUserTransactionRow,
            UserTransactionRow, parse_rows,
        },
    },
};

/// Failure and latency knobs shared by the in-memory sources.
#[derive(Debug, Default)]
struct Faults {
    failure: Mutex<Option<String>>,
    latency: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl Faults {
    async fn enter(&self, source_name: &str) -> FeedResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let failure = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match failure {
            Some(reason) => Err(UpstreamError::unavailable(source_name, reason).into()),
            None => Ok(()),
        }
    }

    fn set_failure(&self, reason: Option<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = reason;
    }

    fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

macro_rules! impl_fault_knobs {
    ($ty:ident) => {
        impl $ty {
            /// Makes every subsequent call fail as unavailable with `reason`.
            pub fn fail_with(&self, reason: impl Into<String>) {
                self.faults.set_failure(Some(reason.into()));
            }

            pub fn recover(&self) {
                self.faults.set_failure(None);
            }

            /// Delays every subsequent call by `latency`.
            pub fn with_latency(self, latency: Duration) -> Self {
                self.faults.set_latency(Some(latency));
                self
            }

            /// Number of calls served so far, including failed ones.
            pub fn calls(&self) -> usize {
                self.faults.calls()
            }
        }
    };
}

// ================================================================================================
// Time Series
// ================================================================================================

/// Balance histories keyed by account. Unknown accounts have an empty history.
#[derive(Debug, Default)]
pub struct InMemoryTimeSeries {
    histories: Mutex<HashMap<AccountAddress, BalanceHistory>>,
    faults: Faults,
}
impl_fault_knobs!(InMemoryTimeSeries);

impl InMemoryTimeSeries {
    pub fn insert(&self, account: AccountAddress, history: BalanceHistory) {
        self.histories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account, history);
    }

    pub fn with_history(self, account: AccountAddress, history: BalanceHistory) -> Self {
        self.insert(account, history);
        self
    }
}

impl TimeSeriesProvider for InMemoryTimeSeries {
    async fn balance_history(&self, account: &AccountAddress) -> FeedResult<BalanceHistory> {
        self.faults.enter("time-series").await?;
        Ok(self
            .histories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(account)
            .cloned()
            .unwrap_or_default())
    }
}

// ================================================================================================
// Stability Horizon
// ================================================================================================

/// A horizon held in memory, movable between requests to simulate a growing ledger.
#[derive(Debug, Default)]
pub struct StaticHorizon {
    version: Mutex<Option<Version>>,
    faults: Faults,
}
impl_fault_knobs!(StaticHorizon);

impl StaticHorizon {
    pub fn new(version: Option<Version>) -> Self {
        Self {
            version: Mutex::new(version),
            faults: Faults::default(),
        }
    }

    pub fn at(version: u64) -> Self {
        Self::new(Some(Version(version)))
    }

    pub fn set(&self, version: Option<Version>) {
        *self.version.lock().unwrap_or_else(PoisonError::into_inner) = version;
    }
}

impl StabilityHorizonProvider for StaticHorizon {
    async fn latest_stable_version(&self) -> FeedResult<Option<Version>> {
        self.faults.enter("stability-horizon").await?;
        Ok(*self.version.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// ================================================================================================
// Key Value
// ================================================================================================

#[derive(Debug, Default)]
pub struct InMemoryKeyValue {
    entries: Mutex<HashMap<(String, String), String>>,
    faults: Faults,
}
impl_fault_knobs!(InMemoryKeyValue);

impl InMemoryKeyValue {
    pub fn put(&self, bucket: &str, key: &str, value: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((bucket.to_string(), key.to_string()), value.into());
    }
}

impl KeyValueStore for InMemoryKeyValue {
    async fn get(&self, bucket: &str, key: &str) -> FeedResult<Option<String>> {
        self.faults.enter("key-value").await?;
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }
}

// ================================================================================================
// Ledger Analytics Store
// ================================================================================================

#[derive(Debug, Default)]
struct Tables {
    genesis: HashMap<Version, GenesisTransaction>,
    block_metadata: HashMap<Version, BlockMetadataTransaction>,
    script_user: HashMap<Version, ScriptUserTransaction>,
    user: HashMap<Version, UserTransaction>,
}

/// The four transaction tables held in maps.
///
/// Unlike the real ledger, nothing stops a test from inserting the same version into
/// several tables.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tables: Mutex<Tables>,
    faults: Faults,
    failing_tables: Mutex<HashMap<TransactionKind, String>>,
}
impl_fault_knobs!(InMemoryLedgerStore);

impl InMemoryLedgerStore {
    pub fn insert(&self, record: impl Into<TransactionRecord>) {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        match record.into() {
            TransactionRecord::Genesis(tx) => {
                tables.genesis.insert(tx.version, tx);
            }
            TransactionRecord::BlockMetadata(tx) => {
                tables.block_metadata.insert(tx.version, tx);
            }
            TransactionRecord::ScriptUser(tx) => {
                tables.script_user.insert(tx.version, tx);
            }
            TransactionRecord::User(tx) => {
                tables.user.insert(tx.version, tx);
            }
        }
    }

    pub fn with(self, record: impl Into<TransactionRecord>) -> Self {
        self.insert(record);
        self
    }

    /// Loads newline-delimited JSON rows, as exported from the analytics store, into the
    /// table for `kind`.
    pub fn load_rows(&self, kind: TransactionKind, ndjson: &str) -> FeedResult<usize> {
        let records = match kind {
            TransactionKind::Genesis => decode::<GenesisTransactionRow, GenesisTransaction>(ndjson)?,
            TransactionKind::BlockMetadata => {
                decode::<BlockMetadataTransactionRow, BlockMetadataTransaction>(ndjson)?
            }
            TransactionKind::ScriptUser => {
                decode::<ScriptUserTransactionRow, ScriptUserTransaction>(ndjson)?
            }
            TransactionKind::User => decode::<UserTransactionRow, UserTransaction>(ndjson)?,
        };
        let count = records.len();
        records.into_iter().for_each(|r| self.insert(r));
        Ok(count)
    }

    /// Makes lookups into one table fail while the other tables keep answering.
    pub fn fail_table(&self, kind: TransactionKind, reason: impl Into<String>) {
        self.failing_tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, reason.into());
    }

    async fn lookup<T: Clone>(
        &self,
        kind: TransactionKind,
        versions: &[Version],
        table: impl FnOnce(&Tables) -> &HashMap<Version, T>,
    ) -> FeedResult<HashMap<Version, T>> {
        self.faults.enter(kind.into()).await?;
        let failure = self
            .failing_tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned();
        if let Some(reason) = failure {
            return Err(UpstreamError::unavailable(kind.to_string(), reason).into());
        }

        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let table = table(&*tables);
        Ok(versions
            .iter()
            .filter_map(|v| table.get(v).map(|tx| (*v, tx.clone())))
            .collect())
    }
}

fn decode<R, T>(ndjson: &str) -> FeedResult<Vec<TransactionRecord>>
where
    R: for<'de> Deserialize<'de>,
    T: TryFrom<R> + Into<TransactionRecord>,
    crate::error::FeedError: From<T::Error>,
{
    parse_rows::<R>(ndjson)?
        .into_iter()
        .map(|row| -> FeedResult<TransactionRecord> { Ok(T::try_from(row)?.into()) })
        .collect()
}

impl LedgerAnalyticsStore for InMemoryLedgerStore {
    async fn genesis_transactions(
        &self,
        versions: &[Version],
    ) -> FeedResult<HashMap<Version, GenesisTransaction>> {
        self.lookup(TransactionKind::Genesis, versions, |t| &t.genesis)
            .await
    }

    async fn block_metadata_transactions(
        &self,
        versions: &[Version],
    ) -> FeedResult<HashMap<Version, BlockMetadataTransaction>> {
        self.lookup(TransactionKind::BlockMetadata, versions, |t| &t.block_metadata)
            .await
    }

    async fn script_user_transactions(
        &self,
        versions: &[Version],
    ) -> FeedResult<HashMap<Version, ScriptUserTransaction>> {
        self.lookup(TransactionKind::ScriptUser, versions, |t| &t.script_user)
            .await
    }

    async fn user_transactions(
        &self,
        versions: &[Version],
    ) -> FeedResult<HashMap<Version, UserTransaction>> {
        self.lookup(TransactionKind::User, versions, |t| &t.user)
            .await
    }
}
