//! User-facing activity feed entries and the page that carries them.

pub mod delta;
pub mod page;

pub use delta::StepDelta;
pub use page::{Movement, Page, PageInfo};
