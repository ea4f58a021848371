// 1. Traits
pub use crate::source::{
    KeyValueStore, LedgerAnalyticsStore, StabilityHorizonProvider, TimeSeriesProvider,
};

// 2. The Core Engine
pub use crate::config::FeedConfig;
pub use crate::feed::{MovementFeed, PageRequest};
pub use crate::movement::{Movement, Page, PageInfo, StepDelta};
pub use crate::pagination::Cursor;

// 3. Ledger Domain Types
pub use crate::domain::{
    AccountAddress, COIN_DECIMALS, Coin, Direction, RawAmount, Timestamp, TxTimestamp, Version,
};
pub use crate::series::{BalanceHistory, VersionedSample};
pub use crate::transaction::{
    BlockMetadataTransaction, GenesisTransaction, ScriptUserTransaction, TransactionKind,
    TransactionRecord, UserTransaction,
};

// 4. Errors
pub use crate::error::{
    ConfigError, ErrorClass, FeedError, FeedResult, IntegrityError, RequestError, UpstreamError,
};

// 5. Sources
pub use crate::source::KeyValueHorizon;
pub use crate::source::memory::{
    InMemoryKeyValue, InMemoryLedgerStore, InMemoryTimeSeries, StaticHorizon,
};
