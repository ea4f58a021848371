mod common;

use std::{sync::Arc, time::Duration};

use common::*;
use ledger_movements::prelude::*;
use tokio_util::sync::CancellationToken;

// ================================================================================================
// Tiling
// ================================================================================================

#[tokio::test]
async fn ascending_pages_tile_the_stable_series() {
    for (seed, len) in [(1, 1), (2, 17), (3, 120), (4, 333)] {
        let history = random_history(seed, len);
        let horizon = *history.version.last().expect("non-empty");
        let expected = versions(&expected_series(&history, horizon));
        let feed = feed(history, Some(horizon));

        for size in [1, 3, 7, 50, 200] {
            let pages = walk(&feed, Direction::Asc, size).await;
            let seen: Vec<Version> = pages.iter().flat_map(Page::versions).collect();
            assert_eq!(seen, expected, "seed {seed}, page size {size}");
            assert!(pages.iter().all(|p| p.total_count == expected.len() as u64));
        }
    }
}

#[tokio::test]
async fn descending_pages_tile_the_stable_series_newest_first() {
    for (seed, len) in [(5, 2), (6, 64), (7, 250)] {
        let history = random_history(seed, len);
        let horizon = *history.version.last().expect("non-empty");
        let mut expected = versions(&expected_series(&history, horizon));
        expected.reverse();
        let feed = feed(history, Some(horizon));

        for size in [1, 4, 9, 100] {
            let pages = walk(&feed, Direction::Desc, size).await;
            let seen: Vec<Version> = pages.iter().flat_map(Page::versions).collect();
            assert_eq!(seen, expected, "seed {seed}, page size {size}");
        }
    }
}

#[tokio::test]
async fn prev_cursor_reproduces_the_previous_page() {
    let history = random_history(11, 90);
    let horizon = *history.version.last().expect("non-empty");
    let feed = feed(history, Some(horizon));

    for direction in [Direction::Asc, Direction::Desc] {
        for size in [2, 5, 13] {
            let pages = walk(&feed, direction, size).await;
            for pair in pages.windows(2) {
                let (previous, current) = (&pair[0], &pair[1]);
                let back = feed
                    .paginate(
                        &PageRequest::new(account(), direction)
                            .after_cursor(current.page_info.prev_cursor)
                            .first(size),
                    )
                    .await
                    .expect("page");
                assert_eq!(back.versions(), previous.versions(), "{direction} / {size}");
            }
            assert_eq!(pages[0].page_info.prev_cursor, None);
        }
    }
}

// ================================================================================================
// Deltas
// ================================================================================================

#[tokio::test]
async fn deltas_add_up_to_the_final_balances() {
    let history = random_history(42, 1_500);
    let horizon = *history.version.last().expect("non-empty");
    let series = expected_series(&history, horizon);
    let last = series.last().expect("non-empty");
    let feed = feed(history, Some(horizon));

    for direction in [Direction::Asc, Direction::Desc] {
        let items: Vec<Movement> = walk(&feed, direction, 97)
            .await
            .into_iter()
            .flat_map(|p| p.items)
            .collect();
        assert_eq!(items.len(), series.len());

        let sum = |f: fn(&Movement) -> Coin| items.iter().map(f).fold(Coin::default(), |a, b| a + b);
        assert_eq!(sum(|m| m.amount), Coin::from_raw(last.balance));
        assert_eq!(sum(|m| m.locked_amount), Coin::from_raw(last.locked));
        assert_eq!(sum(|m| m.unlocked_amount), Coin::from_raw(last.unlocked));
    }
}

#[tokio::test]
async fn every_delta_bridges_its_predecessor() {
    let history = random_history(43, 1_500);
    let horizon = *history.version.last().expect("non-empty");
    let series = expected_series(&history, horizon);
    let feed = feed(history, Some(horizon));

    for direction in [Direction::Asc, Direction::Desc] {
        let mut items: Vec<Movement> = walk(&feed, direction, 89)
            .await
            .into_iter()
            .flat_map(|p| p.items)
            .collect();
        items.sort_by_key(|m| m.version);
        assert_eq!(items.len(), series.len());

        for (pos, pair) in items.windows(2).enumerate() {
            let (prev, cur) = (&pair[0], &pair[1]);
            let (before, after) = (&series[pos], &series[pos + 1]);
            assert_eq!(cur.balance, prev.balance + cur.amount, "{direction} at {}", cur.version);
            assert_eq!(
                cur.locked_balance,
                prev.locked_balance + cur.locked_amount,
                "{direction} at {}",
                cur.version
            );
            assert_eq!(
                cur.unlocked_amount,
                Coin::from_raw(after.unlocked) - Coin::from_raw(before.unlocked),
                "{direction} at {}",
                cur.version
            );
            assert_eq!(cur.balance, Coin::from_raw(after.balance));
        }
    }
}

#[tokio::test]
async fn first_movement_carries_the_absolute_balance() {
    let history = random_history(8, 40);
    let horizon = *history.version.last().expect("non-empty");
    let first = expected_series(&history, horizon)[0];
    let feed = feed(history, Some(horizon));

    let page = feed
        .paginate(&PageRequest::new(account(), Direction::Asc).first(1))
        .await
        .expect("page");
    let m = &page.items[0];
    assert_eq!(m.amount, Coin::from_raw(first.balance));
    assert_eq!(m.amount, m.balance);
    assert_eq!(m.locked_amount, m.locked_balance);
}

#[tokio::test]
async fn first_page_boundary_delta_uses_the_sample_on_the_previous_page() {
    let feed = feed(
        history(&[
            (1, 5_000_000, 5_000_000, 0),
            (2, 7_000_000, 4_000_000, 3_000_000),
            (3, 6_500_000, 3_500_000, 3_000_000),
        ]),
        Some(3),
    );
    let page = feed
        .paginate(&PageRequest::new(account(), Direction::Asc).after("1"))
        .await
        .expect("page");
    assert_eq!(page.versions(), vec![Version(2), Version(3)]);
    assert_eq!(page.items[0].amount.to_string(), "2.000000");
    assert_eq!(page.items[0].locked_amount.to_string(), "3.000000");
    assert_eq!(page.items[0].unlocked_amount.to_string(), "-1.000000");
    assert_eq!(page.items[1].amount.to_string(), "-0.500000");
}

// ================================================================================================
// Boundaries
// ================================================================================================

#[tokio::test]
async fn oversized_page_has_no_navigation_in_either_direction() {
    let history = random_history(9, 30);
    let horizon = *history.version.last().expect("non-empty");
    let len = expected_series(&history, horizon).len();
    let feed = feed(history, Some(horizon));

    for direction in [Direction::Asc, Direction::Desc] {
        for size in [len, len + 1, 200] {
            let page = feed
                .paginate(&PageRequest::new(account(), direction).first(size))
                .await
                .expect("page");
            assert_eq!(page.items.len(), len);
            assert_eq!(page.page_info.prev_cursor, None);
            assert!(!page.page_info.has_more);
        }
    }
}

#[tokio::test]
async fn concrete_scenario_with_constant_state_keeps_endpoints() -> anyhow::Result<()> {
    let feed = feed(
        history(&[
            (10, 100, 100, 0),
            (20, 100, 100, 0),
            (20, 100, 100, 0),
            (30, 150, 150, 0),
        ]),
        Some(30),
    );
    let page = feed
        .paginate(&PageRequest::new(account(), Direction::Asc).first(2))
        .await?;
    assert_eq!(page.versions(), vec![Version(10), Version(30)]);
    assert_eq!(page.items[0].amount, Coin::from_raw(RawAmount(100)));
    assert_eq!(page.items[1].amount, Coin::from_raw(RawAmount(50)));
    assert!(!page.page_info.has_more);
    assert_eq!(page.page_info.prev_cursor, None);
    Ok(())
}

#[tokio::test]
async fn concrete_scenario_with_changing_state_pages_two_of_three() -> anyhow::Result<()> {
    let feed = feed(
        history(&[
            (10, 100, 100, 0),
            (20, 100, 90, 10),
            (20, 100, 90, 10),
            (30, 150, 140, 10),
        ]),
        Some(30),
    );
    let page = feed
        .paginate(&PageRequest::new(account(), Direction::Asc).first(2))
        .await?;
    assert_eq!(page.versions(), vec![Version(10), Version(20)]);
    assert_eq!(page.items[0].amount, Coin::from_raw(RawAmount(100)));
    assert!(page.items[1].amount.is_zero());
    assert!(page.page_info.has_more);
    assert_eq!(page.page_info.prev_cursor, None);
    assert_eq!(page.total_count, 3);
    Ok(())
}

#[tokio::test]
async fn newest_row_repeated_verbatim_is_served_once() {
    let trailing = feed(
        history(&[(10, 100, 100, 0), (20, 150, 150, 0), (20, 150, 150, 0)]),
        Some(20),
    );
    let single = feed(history(&[(10, 100, 100, 0), (10, 100, 100, 0)]), Some(10));

    let page = trailing
        .paginate(&PageRequest::new(account(), Direction::Asc))
        .await
        .expect("page");
    assert_eq!(page.versions(), vec![Version(10), Version(20)]);
    assert_eq!(page.total_count, 2);
    assert_eq!(page.items[1].amount, Coin::from_raw(RawAmount(50)));

    let page = single
        .paginate(&PageRequest::new(account(), Direction::Desc))
        .await
        .expect("page");
    assert_eq!(page.versions(), vec![Version(10)]);
    assert_eq!(page.items[0].amount, Coin::from_raw(RawAmount(100)));
}

#[tokio::test]
async fn growing_horizon_does_not_shift_pages_already_served() {
    let history = random_history(21, 80);
    let versions_all = history.version.clone();
    let mid = versions_all[versions_all.len() / 2];
    let last = *versions_all.last().expect("non-empty");
    let feed = feed(history, Some(mid));

    let before = walk(&feed, Direction::Asc, 6).await;
    let cursor = before.last().and_then(|p| p.page_info.end_cursor);
    assert!(before.iter().flat_map(|p| p.items.iter()).all(|m| m.version <= Version(mid)));

    feed.horizon().set(Some(Version(last)));
    let after = walk(&feed, Direction::Asc, 6).await;
    for (old, new) in before.iter().zip(&after) {
        if old.items.len() == 6 {
            assert_eq!(old.versions(), new.versions());
        }
    }

    let next = feed
        .paginate(&PageRequest::new(account(), Direction::Asc).after_cursor(cursor).first(6))
        .await
        .expect("page");
    assert!(next.items.iter().all(|m| m.version > Version(mid)));
}

#[tokio::test]
async fn no_stable_version_yields_an_empty_page() {
    let feed = feed(history(&[(1, 1, 1, 0)]), None);
    let page = feed
        .paginate(&PageRequest::new(account(), Direction::Desc))
        .await
        .expect("page");
    assert_eq!(page, Page::empty());
}

#[tokio::test]
async fn unknown_account_yields_an_empty_page() {
    let feed = feed(history(&[(1, 1, 1, 0)]), Some(1));
    let stranger = AccountAddress([0x42; 32]);
    let page = feed
        .paginate(&PageRequest::new(stranger, Direction::Asc))
        .await
        .expect("page");
    assert!(page.is_empty());
    assert_eq!(page.total_count, 0);
}

// ================================================================================================
// Transactions
// ================================================================================================

#[tokio::test]
async fn overlapping_tables_resolve_by_priority() {
    let store = InMemoryLedgerStore::default()
        .with(record(2))
        .with(GenesisTransaction { version: Version(2) })
        .with(record(3))
        .with(BlockMetadataTransaction {
            version: Version(3),
            epoch: 7,
            timestamp: TxTimestamp::from_secs(1_701_201_603),
        })
        .with(record(5));
    let feed = MovementFeed::new(
        InMemoryTimeSeries::default()
            .with_history(account(), history(&[(2, 1, 1, 0), (3, 2, 2, 0), (5, 3, 3, 0)])),
        StaticHorizon::at(5),
        store,
    );
    let page = feed
        .paginate(&PageRequest::new(account(), Direction::Asc))
        .await
        .expect("page");
    let kinds: Vec<TransactionKind> = page.items.iter().map(|m| m.transaction.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            TransactionKind::Genesis,
            TransactionKind::BlockMetadata,
            TransactionKind::ScriptUser
        ]
    );
}

#[tokio::test]
async fn exported_rows_flow_through_to_movements() -> anyhow::Result<()> {
    let store = InMemoryLedgerStore::default();
    store.load_rows(TransactionKind::Genesis, r#"{"version":"0"}"#)?;
    store.load_rows(
        TransactionKind::User,
        r#"{"version":"383074","hash":"9f3c","sender":"9a710919b1a1e67eda335269c0085c91","success":true,"module_address":"0x1","module_name":"ol_account","function_name":"transfer","arguments":"[\"0x2\",\"1000\"]","timestamp":"1701376079939922"}"#,
    )?;
    let feed = MovementFeed::new(
        InMemoryTimeSeries::default().with_history(
            account(),
            history(&[(0, 0, 0, 0), (383_074, 1_000, 1_000, 0)]),
        ),
        StaticHorizon::at(383_074),
        store,
    );

    let page = feed
        .paginate(&PageRequest::new(account(), Direction::Desc))
        .await?;
    let TransactionRecord::User(tx) = &page.items[0].transaction else {
        panic!("expected a user transaction, got {:?}", page.items[0].transaction);
    };
    assert_eq!(tx.hash, "9F3C");
    assert_eq!(tx.sender, account());
    assert_eq!(tx.function_name, "transfer");
    assert_eq!(tx.module_address, "0x1".parse::<AccountAddress>()?);
    assert_eq!(page.items[1].transaction.kind(), TransactionKind::Genesis);

    let json = serde_json::to_value(&page)?;
    assert_eq!(json["items"][0]["transaction"]["type"], "user");
    assert_eq!(json["items"][0]["amount"], "0.001000");
    assert_eq!(json["pageInfo"]["endCursor"], "0");
    Ok(())
}

// ================================================================================================
// Errors
// ================================================================================================

#[tokio::test]
async fn malformed_requests_never_reach_upstream() {
    let feed = feed(history(&[(1, 1, 1, 0)]), Some(1));
    for cursor in ["", "abc", "-1", "0x10", " 7", "18446744073709551616"] {
        let err = feed
            .paginate(&PageRequest::new(account(), Direction::Asc).after(cursor))
            .await
            .unwrap_err();
        assert!(
            matches!(err, FeedError::Request(RequestError::InvalidCursor(_))),
            "{cursor:?}"
        );
        assert_eq!(err.class(), ErrorClass::Client);
    }
    for size in [0, 201, usize::MAX] {
        let err = feed
            .paginate(&PageRequest::new(account(), Direction::Desc).first(size))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Request(RequestError::InvalidPageSize { .. })));
    }
    assert_eq!(feed.time_series().calls(), 0);
    assert_eq!(feed.horizon().calls(), 0);
    assert_eq!(feed.store().calls(), 0);
}

#[tokio::test]
async fn upstream_outages_are_retryable() {
    let feed = feed(history(&[(1, 1, 1, 0)]), Some(1));

    feed.store().fail_with("connection refused");
    let err = feed
        .paginate(&PageRequest::new(account(), Direction::Asc))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Upstream(UpstreamError::Unavailable { .. })));
    assert!(err.is_retryable());
    feed.store().recover();

    feed.time_series().fail_with("HTTP 503");
    let err = feed
        .paginate(&PageRequest::new(account(), Direction::Asc))
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Retryable);
    feed.time_series().recover();

    assert!(feed.paginate(&PageRequest::new(account(), Direction::Asc)).await.is_ok());
}

#[tokio::test]
async fn gap_in_the_analytics_store_is_an_integrity_error() {
    let store = InMemoryLedgerStore::default().with(record(1));
    let feed = MovementFeed::new(
        InMemoryTimeSeries::default()
            .with_history(account(), history(&[(1, 1, 1, 0), (2, 2, 2, 0)])),
        StaticHorizon::at(2),
        store,
    );
    let err = feed
        .paginate(&PageRequest::new(account(), Direction::Asc))
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Integrity);
    assert!(matches!(
        err,
        FeedError::Integrity(IntegrityError::UnresolvedTransaction { version }) if version == Version(2)
    ));
}

#[tokio::test]
async fn broken_history_payloads_are_malformed() {
    let ragged = BalanceHistory {
        timestamp: vec![1, 2],
        version: vec![1, 2],
        balance: vec![1],
        unlocked: vec![1, 2],
        locked: vec![0, 0],
    };
    let backwards = history(&[(5, 1, 1, 0), (4, 2, 2, 0)]);
    let conflicting = history(&[(1, 1, 1, 0), (2, 5, 5, 0), (2, 6, 6, 0), (3, 7, 7, 0)]);

    for broken in [ragged, backwards, conflicting] {
        let feed = feed(broken, Some(10));
        let err = feed
            .paginate(&PageRequest::new(account(), Direction::Asc))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Upstream(UpstreamError::Malformed(_))));
        assert_eq!(err.class(), ErrorClass::Integrity);
        assert!(!err.is_retryable());
    }
}

// ================================================================================================
// Deadlines & Cancellation
// ================================================================================================

#[tokio::test]
async fn slow_transaction_lookup_hits_the_deadline() {
    init_tracing();
    let history = history(&[(1, 1, 1, 0)]);
    let store = ledger_for(&history).with_latency(Duration::from_secs(30));
    let feed = MovementFeed::new(
        InMemoryTimeSeries::default().with_history(account(), history),
        StaticHorizon::at(1),
        store,
    )
    .with_config(FeedConfig::from_json_str(r#"{ "request_timeout": "50ms" }"#).expect("config"))
    .expect("valid config");

    let started = tokio::time::Instant::now();
    let err = feed
        .paginate(&PageRequest::new(account(), Direction::Asc))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FeedError::Upstream(UpstreamError::DeadlineExceeded(d)) if d == Duration::from_millis(50)
    ));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn cancellation_drops_in_flight_lookups() {
    init_tracing();
    let history = history(&[(1, 1, 1, 0)]);
    let series = Arc::new(
        InMemoryTimeSeries::default()
            .with_history(account(), history.clone())
            .with_latency(Duration::from_secs(30)),
    );
    let feed = MovementFeed::new(series, StaticHorizon::at(1), ledger_for(&history));

    let cx = CancellationToken::new();
    let trigger = cx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = feed
        .paginate_with_cancellation(&PageRequest::new(account(), Direction::Desc), &cx)
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Upstream(UpstreamError::Cancelled)));
    assert_eq!(feed.time_series().calls(), 1);
}

// ================================================================================================
// Key-Value Horizon
// ================================================================================================

#[tokio::test]
async fn horizon_published_in_a_key_value_bucket() {
    init_tracing();
    let config = FeedConfig::from_json_str(
        r#"{ "horizon_bucket": "ledger", "horizon_key": "stable", "default_page_size": 2 }"#,
    )
    .expect("config");
    let history = history(&[(1, 1, 1, 0), (2, 2, 2, 0), (3, 3, 3, 0), (4, 4, 4, 0)]);
    let kv = Arc::new(InMemoryKeyValue::default());
    kv.put("ledger", "stable", "3\n");

    let feed = MovementFeed::new(
        InMemoryTimeSeries::default().with_history(account(), history.clone()),
        KeyValueHorizon::from_config(kv.clone(), &config),
        ledger_for(&history),
    )
    .with_config(config)
    .expect("valid config");

    let page = feed
        .paginate(&PageRequest::new(account(), Direction::Desc))
        .await
        .expect("page");
    assert_eq!(page.versions(), vec![Version(3), Version(2)]);
    assert!(page.page_info.has_more);

    kv.put("ledger", "stable", "n/a");
    let err = feed
        .paginate(&PageRequest::new(account(), Direction::Desc))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Upstream(UpstreamError::Malformed(_))));
    assert_eq!(err.class(), ErrorClass::Integrity);
}
