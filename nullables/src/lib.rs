//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (clock, storage, ledger, chat venue, integrity
//! checker) are abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record every side effect for assertions
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod checker;
pub mod clock;
pub mod ledger;
pub mod store;
pub mod venue;

pub use checker::NullChecker;
pub use clock::NullClock;
pub use ledger::{Approval, Comment, NullLedger, Transfer};
pub use store::NullStore;
pub use venue::NullVenue;
