use serde::{Deserialize, Serialize};

use crate::{
    domain::{Coin, Timestamp, Version},
    movement::delta::StepDelta,
    pagination::Cursor,
    series::VersionedSample,
    transaction::TransactionRecord,
};

/// One entry of an account's activity feed: a balance change and the transaction that
/// caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub version: Version,
    pub timestamp: Timestamp,
    /// Total balance right after `version`.
    pub balance: Coin,
    /// Locked part of the balance right after `version`.
    pub locked_balance: Coin,
    pub amount: Coin,
    pub locked_amount: Coin,
    pub unlocked_amount: Coin,
    pub transaction: TransactionRecord,
}

impl Movement {
    pub fn new(sample: &VersionedSample, delta: StepDelta, transaction: TransactionRecord) -> Self {
        Self {
            version: sample.version,
            timestamp: sample.timestamp,
            balance: Coin::from_raw(sample.balance),
            locked_balance: Coin::from_raw(sample.locked),
            amount: delta.amount,
            locked_amount: delta.locked,
            unlocked_amount: delta.unlocked,
            transaction,
        }
    }

    pub fn cursor(&self) -> Cursor {
        Cursor::from(self.version)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// More movements exist past this page in the requested direction.
    pub has_more: bool,
    /// Cursor that, used with the same direction, yields the page before this one.
    pub prev_cursor: Option<Cursor>,
    /// Cursor of the last item; used with the same direction it yields the next page.
    pub end_cursor: Option<Cursor>,
}

/// A page of movements, ordered as the UI shows them (newest first for `DESC`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Size of the account's compacted history, independent of paging and of the horizon.
    pub total_count: u64,
    pub items: Vec<Movement>,
    pub page_info: PageInfo,
}

impl Page {
    /// The page returned for an account with no stable history.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn edges(&self) -> impl Iterator<Item = (Cursor, &Movement)> {
        self.items.iter().map(|m| (m.cursor(), m))
    }

    pub fn versions(&self) -> Vec<Version> {
        self.items.iter().map(|m| m.version).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
