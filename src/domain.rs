use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{error::RequestError, impl_display_primitive, impl_from_primitive};

// ================================================================================================
// Domain Strong Types (NewTypes)
// ================================================================================================

/// A single ledger state transition. Primary join key across every ledger-derived table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Version(pub u64);
impl_from_primitive!(Version, u64);
impl_display_primitive!(Version);

/// Sample time reported by the time-series provider, in seconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);
impl_from_primitive!(Timestamp, u64);
impl_display_primitive!(Timestamp);

impl Timestamp {
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.0).ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

/// Transaction time as stored by the analytics store, in microseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TxTimestamp(pub u64);
impl_from_primitive!(TxTimestamp, u64);
impl_display_primitive!(TxTimestamp);

impl TxTimestamp {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000_000))
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let micros = i64::try_from(self.0).ok()?;
        DateTime::from_timestamp_micros(micros)
    }
}

/// Integer ledger amount before fixed-point scaling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct RawAmount(pub u64);
impl_from_primitive!(RawAmount, u64);
impl_display_primitive!(RawAmount);

// ================================================================================================
// Coin
// ================================================================================================

/// Number of fractional digits of the native coin: one coin is `10^6` raw units.
pub const COIN_DECIMALS: u32 = 6;

/// An exact, possibly negative, coin amount (`raw / 10^6`).
///
/// Used both for balances at a version and for the signed deltas between two samples.
/// Conversions from raw integers never go through binary floating point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Coin(pub Decimal);
impl_from_primitive!(Coin, Decimal);
impl_display_primitive!(Coin);

impl Coin {
    pub fn from_raw(raw: RawAmount) -> Self {
        Self::from_raw_delta(i128::from(raw.0))
    }

    /// Signed difference `current - previous`, scaled to coin units.
    pub fn delta(current: RawAmount, previous: RawAmount) -> Self {
        Self::from_raw_delta(i128::from(current.0) - i128::from(previous.0))
    }

    /// `raw` is bounded by `|raw| <= u64::MAX`, well inside the 96-bit mantissa.
    fn from_raw_delta(raw: i128) -> Self {
        Self(Decimal::from_i128_with_scale(raw, COIN_DECIMALS))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl std::ops::Add for Coin {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl std::ops::Sub for Coin {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

// ================================================================================================
// Account Address
// ================================================================================================

/// A 32-byte ledger account address.
///
/// Accepts hex with or without a `0x` prefix. Short forms such as `0x1` and legacy
/// 16-byte addresses are left-padded with zeros. Renders as upper-case hex without
/// prefix, the form the balance history provider keys accounts by.
///
/// # Examples
///
/// ```
/// # use ledger_movements::prelude::*;
/// let short: AccountAddress = "0x9A710919B1A1E67EDA335269C0085C91".parse().unwrap();
/// let long: AccountAddress =
///     "000000000000000000000000000000009a710919b1a1e67eda335269c0085c91".parse().unwrap();
/// assert_eq!(short, long);
/// assert_eq!(short.to_string(), "000000000000000000000000000000009A710919B1A1E67EDA335269C0085C91");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct AccountAddress(pub [u8; 32]);

impl AccountAddress {
    pub const LENGTH: usize = 32;
    pub const LEGACY_LENGTH: usize = 16;

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RequestError> {
        let mut address = [0u8; Self::LENGTH];
        match bytes.len() {
            Self::LENGTH => address.copy_from_slice(bytes),
            Self::LEGACY_LENGTH => address[Self::LEGACY_LENGTH..].copy_from_slice(bytes),
            len => {
                return Err(RequestError::InvalidAddress(format!(
                    "invalid address length {len}"
                )));
            }
        }
        Ok(Self(address))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for AccountAddress {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() || digits.len() > 2 * Self::LENGTH {
            return Err(RequestError::InvalidAddress(format!(
                "'{s}': expected 1 to {} hex digits",
                2 * Self::LENGTH
            )));
        }
        let padded = format!("{digits:0>width$}", width = 2 * Self::LENGTH);
        let bytes = hex::decode(padded)
            .map_err(|e| RequestError::InvalidAddress(format!("'{s}': {e}")))?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

// ================================================================================================
// Direction
// ================================================================================================

/// Chronological order of a page as seen by the UI.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
    IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Direction {
    /// Oldest first; the cursor marks the last version already seen.
    Asc,
    /// Newest first; the cursor marks the oldest version already seen.
    #[default]
    Desc,
}
