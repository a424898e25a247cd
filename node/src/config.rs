//! Node configuration with TOML file support.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use curator_types::CurationParams;

use crate::NodeError;

/// Configuration for a curation node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Engine tunables live in the
/// `[curation]` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// JSON-RPC endpoint of the signing ledger gateway.
    #[serde(default = "default_ledger_endpoint")]
    pub ledger_endpoint: String,

    /// Base URL of the messaging gateway webhook.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// text.ru user key. The integrity screen is off when unset.
    #[serde(default)]
    pub text_ru_key: Option<String>,

    /// Domain excluded from the similarity search.
    #[serde(default)]
    pub text_ru_except_domain: Option<String>,

    /// Whether to enable the inbound HTTP server.
    #[serde(default = "default_true")]
    pub enable_rpc: bool,

    /// Address the inbound HTTP server binds to.
    #[serde(default = "default_rpc_bind")]
    pub rpc_bind: String,

    /// Inbound HTTP port.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Whether to expose Prometheus metrics at `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Chat handle used in invitation links.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    /// Contact shown to users when something goes wrong.
    #[serde(default = "default_developer")]
    pub developer: String,

    /// Frontend domains whose post links are accepted.
    #[serde(default = "default_frontend_domains")]
    pub frontend_domains: Vec<String>,

    // ── Loop cadence ───────────────────────────────────────────────────
    /// Seconds between two stale sweeps.
    #[serde(default = "default_stale_interval")]
    pub stale_interval_secs: u64,

    /// Seconds between two best-candidate sweeps.
    #[serde(default = "default_best_candidate_interval")]
    pub best_candidate_interval_secs: u64,

    /// Seconds between two authority audits.
    #[serde(default = "default_audit_interval")]
    pub audit_interval_secs: u64,

    /// Weekday of the curator reward payout ("Sun", "monday", ...).
    #[serde(default = "default_reward_weekday")]
    pub reward_weekday: String,

    /// UTC hour of the curator reward payout.
    #[serde(default = "default_reward_hour")]
    pub reward_hour: u32,

    /// UTC hour of the daily support report.
    #[serde(default = "default_report_hour")]
    pub report_hour: u32,

    /// UTC minute of the daily support report.
    #[serde(default)]
    pub report_minute: u32,

    /// Curation engine tunables.
    #[serde(default)]
    pub curation: CurationParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_db_path() -> PathBuf {
    PathBuf::from("./curator.db")
}

fn default_ledger_endpoint() -> String {
    "http://127.0.0.1:8090".to_string()
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:8091".to_string()
}

fn default_true() -> bool {
    true
}

fn default_rpc_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    7077
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bot_name() -> String {
    "golos_vote_bot".to_string()
}

fn default_developer() -> String {
    "@golosovalochka".to_string()
}

fn default_frontend_domains() -> Vec<String> {
    vec!["golos.io".to_string(), "golos.blog".to_string()]
}

fn default_stale_interval() -> u64 {
    3 * 3600
}

fn default_best_candidate_interval() -> u64 {
    3600
}

fn default_audit_interval() -> u64 {
    3600
}

fn default_reward_weekday() -> String {
    "Sun".to_string()
}

fn default_reward_hour() -> u32 {
    20
}

fn default_report_hour() -> u32 {
    12
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Check values serde cannot express.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.reward_weekday()?;
        if self.reward_hour > 23 || self.report_hour > 23 {
            return Err(NodeError::Config("cadence hour must be 0..=23".into()));
        }
        if self.report_minute > 59 {
            return Err(NodeError::Config("report_minute must be 0..=59".into()));
        }
        if self.stale_interval_secs == 0
            || self.best_candidate_interval_secs == 0
            || self.audit_interval_secs == 0
        {
            return Err(NodeError::Config("loop intervals must be positive".into()));
        }
        if self.curation.required_votes == 0 {
            return Err(NodeError::Config("required_votes must be positive".into()));
        }
        Ok(())
    }

    /// The parsed reward weekday.
    pub fn reward_weekday(&self) -> Result<Weekday, NodeError> {
        self.reward_weekday
            .parse()
            .map_err(|_| NodeError::Config(format!("invalid weekday: {}", self.reward_weekday)))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            ledger_endpoint: default_ledger_endpoint(),
            gateway_url: default_gateway_url(),
            text_ru_key: None,
            text_ru_except_domain: None,
            enable_rpc: default_true(),
            rpc_bind: default_rpc_bind(),
            rpc_port: default_rpc_port(),
            enable_metrics: false,
            log_format: default_log_format(),
            log_level: default_log_level(),
            bot_name: default_bot_name(),
            developer: default_developer(),
            frontend_domains: default_frontend_domains(),
            stale_interval_secs: default_stale_interval(),
            best_candidate_interval_secs: default_best_candidate_interval(),
            audit_interval_secs: default_audit_interval(),
            reward_weekday: default_reward_weekday(),
            reward_hour: default_reward_hour(),
            report_hour: default_report_hour(),
            report_minute: 0,
            curation: CurationParams::default(),
        }
    }
}
