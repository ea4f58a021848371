//! Keyset pagination over the sorted version axis.
//!
//! Cursors are resolved by bisection instead of offsets, so a ledger that keeps growing
//! between requests never shifts page boundaries.

pub mod cursor;
pub mod window;

pub use cursor::{Anchor, Cursor, resolve};
pub use window::PageWindow;
