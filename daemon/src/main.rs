//! Curation daemon: entry point for running a curation node.

use anyhow::Context;
use clap::Parser;
use curator_node::{CuratorNode, NodeConfig};
use curator_utils::{init_logging, LogFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "curator-daemon", about = "Collective curation service daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CURATOR_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file.
    #[arg(long, env = "CURATOR_DB_PATH")]
    db_path: Option<PathBuf>,

    /// JSON-RPC endpoint of the signing ledger gateway.
    #[arg(long, env = "CURATOR_LEDGER_ENDPOINT")]
    ledger_endpoint: Option<String>,

    /// Base URL of the messaging gateway webhook.
    #[arg(long, env = "CURATOR_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// text.ru user key; enables the integrity screen.
    #[arg(long, env = "CURATOR_TEXT_RU_KEY", hide_env_values = true)]
    text_ru_key: Option<String>,

    /// Service account holding the delegated posting authority.
    #[arg(long, env = "CURATOR_SERVICE_ACCOUNT")]
    service_account: Option<String>,

    /// Address the inbound HTTP server binds to.
    #[arg(long, env = "CURATOR_RPC_BIND")]
    rpc_bind: Option<String>,

    /// Inbound HTTP server port.
    #[arg(long, env = "CURATOR_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Disable the inbound HTTP server.
    #[arg(long, env = "CURATOR_DISABLE_RPC")]
    disable_rpc: bool,

    /// Enable Prometheus metrics endpoint.
    #[arg(long, env = "CURATOR_ENABLE_METRICS")]
    metrics: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CURATOR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CURATOR_LOG_FORMAT")]
    log_format: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the service.
    Run,
    /// Print the effective configuration as TOML and exit.
    Config,
}

impl Cli {
    /// Apply flags and env vars on top of `base`.
    fn merge_into(&self, base: NodeConfig) -> NodeConfig {
        let mut curation = base.curation;
        if let Some(account) = &self.service_account {
            curation.service_account = account.clone();
        }
        NodeConfig {
            db_path: self.db_path.clone().unwrap_or(base.db_path),
            ledger_endpoint: self.ledger_endpoint.clone().unwrap_or(base.ledger_endpoint),
            gateway_url: self.gateway_url.clone().unwrap_or(base.gateway_url),
            text_ru_key: self.text_ru_key.clone().or(base.text_ru_key),
            rpc_bind: self.rpc_bind.clone().unwrap_or(base.rpc_bind),
            rpc_port: self.rpc_port.unwrap_or(base.rpc_port),
            enable_rpc: base.enable_rpc && !self.disable_rpc,
            enable_metrics: self.metrics || base.enable_metrics,
            log_level: self.log_level.clone().unwrap_or(base.log_level),
            log_format: self.log_format.clone().unwrap_or(base.log_format),
            curation,
            ..base
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(&path.to_string_lossy())
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => NodeConfig::default(),
    };
    let config = cli.merge_into(file_config);
    config.validate().context("invalid configuration")?;

    let log_format: LogFormat = config
        .log_format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    init_logging(log_format, &config.log_level);

    match cli.command {
        Command::Config => {
            println!("{}", config.to_toml_string()?);
        }
        Command::Run => {
            let rpc = if config.enable_rpc {
                format!("{}:{}", config.rpc_bind, config.rpc_port)
            } else {
                "off".to_string()
            };
            tracing::info!(
                db = %config.db_path.display(),
                rpc = %rpc,
                metrics = config.enable_metrics,
                integrity = config.text_ru_key.is_some(),
                "starting curation daemon"
            );

            let mut node = CuratorNode::new(config)?;
            node.start().await?;

            tracing::info!("shutdown signal received, stopping node");
            node.stop().await?;

            tracing::info!("curation daemon exited cleanly");
        }
    }

    Ok(())
}
