use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

use crate::domain::{AccountAddress, TxTimestamp, Version};

/// Unix time (seconds) assigned to the genesis transaction.
///
/// Genesis carries no timestamp of its own. This is the start of the hour before the
/// first reconfiguration, obtained by subtracting the epoch 2 → 3 interval from the
/// epoch 2 timestamp.
pub const GENESIS_TIMESTAMP_SECS: u64 = 1_701_201_600;

/// The four transaction tables of the analytics store.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum TransactionKind {
    Genesis,
    BlockMetadata,
    ScriptUser,
    User,
}

impl TransactionKind {
    /// Resolution order when several tables claim the same version. The ledger writes
    /// at most one kind per version; the order only decides pathological overlaps.
    pub const PRIORITY: [TransactionKind; 4] = [
        TransactionKind::Genesis,
        TransactionKind::BlockMetadata,
        TransactionKind::ScriptUser,
        TransactionKind::User,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisTransaction {
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadataTransaction {
    pub version: Version,
    pub epoch: u64,
    pub timestamp: TxTimestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptUserTransaction {
    pub version: Version,
    pub sender: AccountAddress,
    pub success: bool,
    pub timestamp: TxTimestamp,
}

/// An entry-function call submitted by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTransaction {
    pub version: Version,
    /// Upper-case hex transaction hash.
    pub hash: String,
    pub sender: AccountAddress,
    pub success: bool,
    pub module_address: AccountAddress,
    pub module_name: String,
    pub function_name: String,
    /// Call arguments as the JSON text stored by the indexer.
    pub arguments: String,
    pub timestamp: TxTimestamp,
}

/// The single logical transaction behind a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionRecord {
    Genesis(GenesisTransaction),
    BlockMetadata(BlockMetadataTransaction),
    ScriptUser(ScriptUserTransaction),
    User(UserTransaction),
}

impl TransactionRecord {
    pub fn version(&self) -> Version {
        match self {
            Self::Genesis(tx) => tx.version,
            Self::BlockMetadata(tx) => tx.version,
            Self::ScriptUser(tx) => tx.version,
            Self::User(tx) => tx.version,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Genesis(_) => TransactionKind::Genesis,
            Self::BlockMetadata(_) => TransactionKind::BlockMetadata,
            Self::ScriptUser(_) => TransactionKind::ScriptUser,
            Self::User(_) => TransactionKind::User,
        }
    }

    pub fn timestamp(&self) -> TxTimestamp {
        match self {
            Self::Genesis(_) => TxTimestamp::from_secs(GENESIS_TIMESTAMP_SECS),
            Self::BlockMetadata(tx) => tx.timestamp,
            Self::ScriptUser(tx) => tx.timestamp,
            Self::User(tx) => tx.timestamp,
        }
    }

    /// The submitting account, for kinds that have one.
    pub fn sender(&self) -> Option<&AccountAddress> {
        match self {
            Self::ScriptUser(tx) => Some(&tx.sender),
            Self::User(tx) => Some(&tx.sender),
            Self::Genesis(_) | Self::BlockMetadata(_) => None,
        }
    }
}

impl From<GenesisTransaction> for TransactionRecord {
    fn from(tx: GenesisTransaction) -> Self {
        Self::Genesis(tx)
    }
}

impl From<BlockMetadataTransaction> for TransactionRecord {
    fn from(tx: BlockMetadataTransaction) -> Self {
        Self::BlockMetadata(tx)
    }
}

impl From<ScriptUserTransaction> for TransactionRecord {
    fn from(tx: ScriptUserTransaction) -> Self {
        Self::ScriptUser(tx)
    }
}

impl From<UserTransaction> for TransactionRecord {
    fn from(tx: UserTransaction) -> Self {
        Self::User(tx)
    }
}
