//! Shared utilities for the curation service.

pub mod logging;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use time::{format_duration, until_next_daily, until_next_weekly};
