//! Transaction records from the ledger analytics store and their join onto versions.

pub mod joiner;
pub mod record;
pub mod rows;

pub use joiner::{TransactionMaps, fetch, join};
pub use record::{
    BlockMetadataTransaction, GenesisTransaction, ScriptUserTransaction, TransactionKind,
    TransactionRecord, UserTransaction,
};
