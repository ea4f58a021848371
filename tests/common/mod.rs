#![allow(dead_code)]

use std::sync::Arc;

use ledger_movements::{
    prelude::*,
    series::{compact, truncate_at_horizon},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing_subscriber::EnvFilter;

pub type TestFeed =
    MovementFeed<Arc<InMemoryTimeSeries>, Arc<StaticHorizon>, Arc<InMemoryLedgerStore>>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn account() -> AccountAddress {
    "0x9A710919B1A1E67EDA335269C0085C91"
        .parse()
        .expect("valid legacy address")
}

// ================================================================================================
// Series Builders
// ================================================================================================

/// Builds a history from `(version, balance, unlocked, locked)` rows.
pub fn history(rows: &[(u64, u64, u64, u64)]) -> BalanceHistory {
    rows.iter()
        .map(|&(version, balance, unlocked, locked)| VersionedSample {
            version: Version(version),
            timestamp: Timestamp(1_701_201_600 + version),
            balance: RawAmount(balance),
            unlocked: RawAmount(unlocked),
            locked: RawAmount(locked),
        })
        .collect()
}

/// A reproducible random history of `len` samples.
///
/// Roughly a third of the samples repeat the previous state, some of those at the same
/// version, so compaction has real work to do. That includes the newest rows.
pub fn random_history(seed: u64, len: usize) -> BalanceHistory {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut version = rng.random_range(0..1_000u64);
    let (mut unlocked, mut locked) = (0u64, 0u64);
    let mut samples = Vec::with_capacity(len);

    for i in 0..len {
        let repeat = i > 0 && rng.random_bool(0.35);
        if repeat {
            if !rng.random_bool(0.25) {
                version += rng.random_range(1..40);
            }
        } else {
            version += if i == 0 { 0 } else { rng.random_range(1..40) };
            unlocked = rng.random_range(0..5_000_000_000);
            locked = if rng.random_bool(0.5) {
                rng.random_range(0..2_000_000_000)
            } else {
                locked
            };
        }
        samples.push(VersionedSample {
            version: Version(version),
            timestamp: Timestamp(1_701_201_600 + version / 3),
            balance: RawAmount(unlocked + locked),
            unlocked: RawAmount(unlocked),
            locked: RawAmount(locked),
        });
    }
    samples.into_iter().collect()
}

/// What the engine should page over: the compacted series cut at `horizon`.
pub fn expected_series(history: &BalanceHistory, horizon: u64) -> Vec<VersionedSample> {
    let samples = history.clone().into_samples().expect("well-formed history");
    truncate_at_horizon(compact(samples), Version(horizon))
}

pub fn versions(samples: &[VersionedSample]) -> Vec<Version> {
    samples.iter().map(|s| s.version).collect()
}

// ================================================================================================
// Engine Fixtures
// ================================================================================================

/// A store with exactly one record for every version of `history`, rotating through
/// the four kinds. Version 0 is always the genesis transaction.
pub fn ledger_for(history: &BalanceHistory) -> InMemoryLedgerStore {
    let store = InMemoryLedgerStore::default();
    for &v in &history.version {
        store.insert(record(v));
    }
    store
}

pub fn record(version: u64) -> TransactionRecord {
    let v = Version(version);
    let timestamp = TxTimestamp::from_secs(1_701_201_600 + version);
    match version % 4 {
        _ if version == 0 => GenesisTransaction { version: v }.into(),
        0 => BlockMetadataTransaction {
            version: v,
            epoch: version / 100,
            timestamp,
        }
        .into(),
        1 => ScriptUserTransaction {
            version: v,
            sender: account(),
            success: true,
            timestamp,
        }
        .into(),
        _ => UserTransaction {
            version: v,
            hash: format!("{version:064X}"),
            sender: account(),
            success: version % 3 != 0,
            module_address: AccountAddress::from_bytes(&[1; 16]).expect("16-byte address"),
            module_name: "ol_account".into(),
            function_name: "transfer".into(),
            arguments: "[]".into(),
            timestamp,
        }
        .into(),
    }
}

pub fn feed(history: BalanceHistory, horizon: Option<u64>) -> TestFeed {
    init_tracing();
    let store = ledger_for(&history);
    MovementFeed::new(
        Arc::new(InMemoryTimeSeries::default().with_history(account(), history)),
        Arc::new(StaticHorizon::new(horizon.map(Version))),
        Arc::new(store),
    )
}

/// Walks every page in `direction`, following each page's `end_cursor`.
pub async fn walk(feed: &TestFeed, direction: Direction, page_size: usize) -> Vec<Page> {
    let mut pages: Vec<Page> = Vec::new();
    let mut cursor = None;
    loop {
        let request = PageRequest::new(account(), direction)
            .after_cursor(cursor)
            .first(page_size);
        let page = feed.paginate(&request).await.expect("page");
        let more = page.page_info.has_more;
        cursor = page.page_info.end_cursor;
        pages.push(page);
        if !more || cursor.is_none() {
            return pages;
        }
        assert!(pages.len() <= 10_000, "pagination does not terminate");
    }
}
