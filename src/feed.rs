//! The directional assembler: one call turns an account's raw balance history into a
//! page of movements.

use itertools::izip;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::FeedConfig,
    domain::{AccountAddress, Direction, Version},
    error::{FeedResult, UpstreamError},
    movement::{Movement, Page, PageInfo, StepDelta},
    pagination::{Cursor, PageWindow, resolve},
    series::{compact, compactor::ensure_strictly_increasing, truncate_at_horizon},
    source::{LedgerAnalyticsStore, StabilityHorizonProvider, TimeSeriesProvider},
    transaction,
};

/// Parameters of one page request.
///
/// The cursor is kept as the caller sent it and parsed when the request is served, so a
/// bad cursor surfaces as `RequestError::InvalidCursor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub account: AccountAddress,
    pub direction: Direction,
    pub after: Option<String>,
    pub first: Option<usize>,
}

impl PageRequest {
    pub fn new(account: AccountAddress, direction: Direction) -> Self {
        Self {
            account,
            direction,
            after: None,
            first: None,
        }
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Continues from a cursor taken from a previous page. `None` restarts at the edge.
    pub fn after_cursor(mut self, cursor: Option<Cursor>) -> Self {
        self.after = cursor.map(|c| c.to_string());
        self
    }

    pub fn first(mut self, page_size: usize) -> Self {
        self.first = Some(page_size);
        self
    }
}

/// Engine over the three upstream sources.
///
/// Holds no per-request state; a single instance may serve concurrent requests.
#[derive(Debug, Clone)]
pub struct MovementFeed<T, H, L> {
    time_series: T,
    horizon: H,
    store: L,
    config: FeedConfig,
}

impl<T, H, L> MovementFeed<T, H, L>
where
    T: TimeSeriesProvider,
    H: StabilityHorizonProvider,
    L: LedgerAnalyticsStore,
{
    pub fn new(time_series: T, horizon: H, store: L) -> Self {
        Self {
            time_series,
            horizon,
            store,
            config: FeedConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FeedConfig) -> FeedResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn time_series(&self) -> &T {
        &self.time_series
    }

    pub fn horizon(&self) -> &H {
        &self.horizon
    }

    pub fn store(&self) -> &L {
        &self.store
    }

    /// Serves one page, bounded by `config.request_timeout`.
    ///
    /// Cursor and page size are validated before any upstream call. When the deadline
    /// fires, every in-flight lookup is dropped.
    #[tracing::instrument(
        skip_all,
        fields(account = %request.account, direction = %request.direction, first = request.first)
    )]
    pub async fn paginate(&self, request: &PageRequest) -> FeedResult<Page> {
        let cursor = request.after.as_deref().map(str::parse::<Cursor>).transpose()?;
        let page_size = self.config.page_size(request.first)?;

        match self.config.request_timeout {
            Some(deadline) => tokio::time::timeout(
                deadline,
                self.assemble(request.account, request.direction, cursor, page_size),
            )
            .await
            .map_err(|_| {
                warn!(?deadline, "Page computation exceeded its deadline");
                UpstreamError::DeadlineExceeded(deadline)
            })?,
            None => {
                self.assemble(request.account, request.direction, cursor, page_size)
                    .await
            }
        }
    }

    /// Like [`Self::paginate`], but also gives up as soon as `cx` is cancelled.
    pub async fn paginate_with_cancellation(
        &self,
        request: &PageRequest,
        cx: &CancellationToken,
    ) -> FeedResult<Page> {
        tokio::select! {
            biased;
            _ = cx.cancelled() => {
                info!(account = %request.account, "Page request cancelled");
                Err(UpstreamError::Cancelled.into())
            }
            res = self.paginate(request) => res,
        }
    }

    async fn assemble(
        &self,
        account: AccountAddress,
        direction: Direction,
        cursor: Option<Cursor>,
        page_size: usize,
    ) -> FeedResult<Page> {
        let (horizon, history) = tokio::try_join!(
            self.horizon.latest_stable_version(),
            self.time_series.balance_history(&account),
        )
        .inspect_err(|e| warn!(error = %e, "Upstream read failed"))?;

        let Some(horizon) = horizon else {
            info!("No stable version indexed yet; serving empty page");
            return Ok(Page::empty());
        };

        let compacted = compact(history.into_samples()?);
        ensure_strictly_increasing(&compacted)?;
        let total_count = compacted.len() as u64;
        let series = truncate_at_horizon(compacted, horizon);
        debug!(total_count, stable = series.len(), %horizon, "Prepared balance series");

        if series.is_empty() {
            info!("Account has no stable history; serving empty page");
            return Ok(Page::empty());
        }

        let versions: Vec<Version> = series.iter().map(|s| s.version).collect();
        let window = PageWindow::select(
            versions.len(),
            page_size,
            resolve(&versions, direction, cursor),
        );
        debug!(
            start = window.range.start,
            end = window.range.end,
            has_more = window.has_more,
            "Selected page window"
        );

        let mut page_info = PageInfo {
            has_more: window.has_more,
            prev_cursor: window
                .prev_index
                .and_then(|i| versions.get(i))
                .copied()
                .map(Cursor::from),
            end_cursor: None,
        };

        if window.is_empty() {
            return Ok(Page {
                total_count,
                items: Vec::new(),
                page_info,
            });
        }

        let page_versions = &versions[window.range.clone()];
        let maps = transaction::fetch(&self.store, page_versions)
            .await
            .inspect_err(|e| warn!(error = %e, "Transaction lookup failed"))?;
        let records = transaction::join(page_versions, maps)?;
        let deltas = StepDelta::for_range(&series, window.range.clone());

        let mut items: Vec<Movement> = izip!(&series[window.range], deltas, records)
            .map(|(sample, delta, record)| Movement::new(sample, delta, record))
            .collect();
        if direction == Direction::Desc {
            items.reverse();
        }
        page_info.end_cursor = items.last().map(Movement::cursor);

        Ok(Page {
            total_count,
            items,
            page_info,
        })
    }
}
