use itertools::izip;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{RawAmount, Timestamp, Version},
    error::{FeedResult, UpstreamError},
};

/// One point of an account's balance history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionedSample {
    pub version: Version,
    pub timestamp: Timestamp,
    pub balance: RawAmount,
    pub unlocked: RawAmount,
    pub locked: RawAmount,
}

impl VersionedSample {
    /// Whether `other` carries the same economic state (balance, unlocked, locked).
    pub fn same_state(&self, other: &Self) -> bool {
        self.balance == other.balance
            && self.unlocked == other.unlocked
            && self.locked == other.locked
    }
}

/// Balance history as served by the time-series provider: parallel arrays ordered by
/// ascending version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceHistory {
    pub timestamp: Vec<u64>,
    pub version: Vec<u64>,
    pub balance: Vec<u64>,
    pub unlocked: Vec<u64>,
    pub locked: Vec<u64>,
}

impl BalanceHistory {
    pub fn len(&self) -> usize {
        self.version.len()
    }

    pub fn is_empty(&self) -> bool {
        self.version.is_empty()
    }

    /// Zips the parallel arrays into samples.
    ///
    /// # Errors
    /// Returns `UpstreamError::Malformed` if the arrays differ in length or the versions
    /// go backwards. Repeated versions are let through; they must collapse during
    /// compaction (see [`crate::series::compactor::ensure_strictly_increasing`]).
    pub fn into_samples(self) -> FeedResult<Vec<VersionedSample>> {
        let len = self.version.len();
        let lengths = [
            self.timestamp.len(),
            self.balance.len(),
            self.unlocked.len(),
            self.locked.len(),
        ];
        if lengths.iter().any(|&l| l != len) {
            return Err(UpstreamError::Malformed(format!(
                "balance history arrays differ in length: version={len}, \
                 timestamp={}, balance={}, unlocked={}, locked={}",
                lengths[0], lengths[1], lengths[2], lengths[3]
            ))
            .into());
        }

        if let Some(w) = self.version.windows(2).find(|w| w[0] > w[1]) {
            return Err(UpstreamError::Malformed(format!(
                "balance history versions out of order: {} then {}",
                w[0], w[1]
            ))
            .into());
        }

        Ok(izip!(
            self.version,
            self.timestamp,
            self.balance,
            self.unlocked,
            self.locked
        )
        .map(|(version, timestamp, balance, unlocked, locked)| VersionedSample {
            version: Version(version),
            timestamp: Timestamp(timestamp),
            balance: RawAmount(balance),
            unlocked: RawAmount(unlocked),
            locked: RawAmount(locked),
        })
        .collect())
    }
}

impl FromIterator<VersionedSample> for BalanceHistory {
    fn from_iter<I: IntoIterator<Item = VersionedSample>>(iter: I) -> Self {
        let mut history = Self::default();
        for s in iter {
            history.version.push(s.version.0);
            history.timestamp.push(s.timestamp.0);
            history.balance.push(s.balance.0);
            history.unlocked.push(s.unlocked.0);
            history.locked.push(s.locked.0);
        }
        history
    }
}
