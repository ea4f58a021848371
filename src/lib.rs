mod macros;

pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod movement;
pub mod pagination;
pub mod prelude;
pub mod series;
pub mod source;
pub mod transaction;

pub use config::FeedConfig;
pub use error::{FeedError, FeedResult};
pub use feed::{MovementFeed, PageRequest};
