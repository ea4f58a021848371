use serde::{Deserialize, Serialize};

use crate::{domain::Coin, series::VersionedSample};

/// Change of an account's balances caused by one retained sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepDelta {
    pub amount: Coin,
    pub locked: Coin,
    pub unlocked: Coin,
}

impl StepDelta {
    /// Delta of `current` against the sample right before it in the stability-filtered
    /// series.
    ///
    /// The very first sample of the series has no predecessor; its delta is its absolute
    /// state (everything the account holds arrived with it).
    pub fn between(current: &VersionedSample, previous: Option<&VersionedSample>) -> Self {
        match previous {
            None => Self {
                amount: Coin::from_raw(current.balance),
                locked: Coin::from_raw(current.locked),
                unlocked: Coin::from_raw(current.unlocked),
            },
            Some(prev) => Self {
                amount: Coin::delta(current.balance, prev.balance),
                locked: Coin::delta(current.locked, prev.locked),
                unlocked: Coin::delta(current.unlocked, prev.unlocked),
            },
        }
    }

    /// Deltas for the absolute range `range` of `series`.
    ///
    /// Each element is compared with its predecessor in `series`, which may sit outside
    /// `range` (on the previous page).
    pub fn for_range(series: &[VersionedSample], range: std::ops::Range<usize>) -> Vec<Self> {
        let previous = range.start.checked_sub(1).and_then(|i| series.get(i));
        let page = series.get(range).unwrap_or_default();
        std::iter::once(previous)
            .chain(page.iter().map(Some))
            .zip(page)
            .map(|(prev, current)| Self::between(current, prev))
            .collect()
    }
}
