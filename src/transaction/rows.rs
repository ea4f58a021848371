//! Row shapes returned by the analytics store (one JSON object per row).
//!
//! 64-bit integers arrive as JSON strings and addresses as hex strings, so every row is
//! decoded into a raw struct first and then validated into its domain record.

use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::{
    domain::{AccountAddress, TxTimestamp, Version},
    error::{FeedError, UpstreamError},
    transaction::record::{
        BlockMetadataTransaction, GenesisTransaction, ScriptUserTransaction, UserTransaction,
    },
};

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct GenesisTransactionRow {
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub version: u64,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct BlockMetadataTransactionRow {
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub version: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub epoch: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub timestamp: u64,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptUserTransactionRow {
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub version: u64,
    pub sender: String,
    pub success: bool,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub timestamp: u64,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct UserTransactionRow {
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub version: u64,
    pub hash: String,
    pub sender: String,
    pub success: bool,
    pub module_address: String,
    pub module_name: String,
    pub function_name: String,
    pub arguments: String,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub timestamp: u64,
}

fn address(field: &str, version: u64, hex: &str) -> Result<AccountAddress, FeedError> {
    hex.parse().map_err(|e| {
        UpstreamError::Malformed(format!("{field} of transaction {version}: {e}")).into()
    })
}

impl From<GenesisTransactionRow> for GenesisTransaction {
    fn from(row: GenesisTransactionRow) -> Self {
        Self {
            version: Version(row.version),
        }
    }
}

impl From<BlockMetadataTransactionRow> for BlockMetadataTransaction {
    fn from(row: BlockMetadataTransactionRow) -> Self {
        Self {
            version: Version(row.version),
            epoch: row.epoch,
            timestamp: TxTimestamp(row.timestamp),
        }
    }
}

impl TryFrom<ScriptUserTransactionRow> for ScriptUserTransaction {
    type Error = FeedError;

    fn try_from(row: ScriptUserTransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            version: Version(row.version),
            sender: address("sender", row.version, &row.sender)?,
            success: row.success,
            timestamp: TxTimestamp(row.timestamp),
        })
    }
}

impl TryFrom<UserTransactionRow> for UserTransaction {
    type Error = FeedError;

    fn try_from(row: UserTransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            version: Version(row.version),
            sender: address("sender", row.version, &row.sender)?,
            module_address: address("module_address", row.version, &row.module_address)?,
            hash: row.hash.to_uppercase(),
            success: row.success,
            module_name: row.module_name,
            function_name: row.function_name,
            arguments: row.arguments,
            timestamp: TxTimestamp(row.timestamp),
        })
    }
}

/// Parses newline-delimited JSON rows, skipping blank lines.
pub fn parse_rows<T>(ndjson: &str) -> Result<Vec<T>, FeedError>
where
    T: for<'de> Deserialize<'de>,
{
    ndjson
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .map_err(|e| UpstreamError::Malformed(format!("bad row: {e}")).into())
        })
        .collect()
}
