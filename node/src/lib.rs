//! Curation node: configuration, periodic jobs, metrics and lifecycle.

pub mod config;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use jobs::{Job, JobContext, Schedule};
pub use metrics::NodeMetrics;
pub use node::CuratorNode;
pub use shutdown::ShutdownController;
