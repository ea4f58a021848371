//! The per-account balance time series and the two passes that prepare it for paging:
//! compaction of redundant samples and truncation at the stability horizon.

pub mod compactor;
pub mod sample;
pub mod stability;

pub use compactor::compact;
pub use sample::{BalanceHistory, VersionedSample};
pub use stability::truncate_at_horizon;
