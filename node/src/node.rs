//! The curation node: wires the store, the collaborators, the engine, the
//! gateway and the inbound HTTP server, and owns the periodic jobs.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use curator_engine::{CurationEngine, SharedChecker};
use curator_gateway::{Gateway, GatewaySettings, WebhookVenue};
use curator_ledger::{RpcLedgerClient, SharedLedger, TextRuChecker};
use curator_messages::SharedVenue;
use curator_rpc::{RpcServer, RpcState};
use curator_store::SharedStore;
use curator_store_sqlite::SqliteStore;
use curator_types::{Clock, SystemClock};
use tokio::task::JoinHandle;

use crate::config::NodeConfig;
use crate::jobs::{run_periodic, Job, JobContext, Schedule};
use crate::metrics::NodeMetrics;
use crate::shutdown::ShutdownController;
use crate::NodeError;

/// How long [`CuratorNode::stop`] waits for background tasks.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A running curation service.
pub struct CuratorNode {
    pub config: NodeConfig,
    engine: Arc<CurationEngine>,
    gateway: Arc<Gateway>,
    pub metrics: Arc<NodeMetrics>,
    clock: Arc<dyn Clock>,
    shutdown: ShutdownController,
    /// Handles for spawned background tasks (joined during shutdown).
    task_handles: Vec<JoinHandle<()>>,
}

impl CuratorNode {
    /// Create a node with the production collaborators.
    ///
    /// Opens the SQLite database at `config.db_path`. The integrity screen is
    /// enabled only when a text.ru key is configured.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;

        let store: SharedStore = Arc::new(SqliteStore::open(&config.db_path)?);
        let ledger: SharedLedger = Arc::new(RpcLedgerClient::new(config.ledger_endpoint.clone()));
        let venue: SharedVenue = Arc::new(WebhookVenue::new(config.gateway_url.clone()));
        let checker = config.text_ru_key.as_ref().map(|key| {
            Arc::new(TextRuChecker::new(
                key.clone(),
                config.text_ru_except_domain.clone(),
            )) as SharedChecker
        });
        if checker.is_none() {
            tracing::info!("no text.ru key configured, integrity screen disabled");
        }

        Self::with_collaborators(config, store, ledger, venue, checker, Arc::new(SystemClock))
    }

    /// Create a node over caller-supplied collaborators.
    pub fn with_collaborators(
        config: NodeConfig,
        store: SharedStore,
        ledger: SharedLedger,
        venue: SharedVenue,
        checker: Option<SharedChecker>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NodeError> {
        let shutdown = ShutdownController::new();
        let engine = Arc::new(CurationEngine::new(
            store,
            ledger,
            venue,
            checker,
            config.curation.clone(),
            shutdown.cancellation(),
        ));
        let gateway = Arc::new(Gateway::new(
            Arc::clone(&engine),
            GatewaySettings {
                bot_name: config.bot_name.clone(),
                frontend_domains: config.frontend_domains.clone(),
                developer: config.developer.clone(),
            },
            Arc::clone(&clock),
        )?);

        tracing::info!(
            db = %config.db_path.display(),
            ledger = %config.ledger_endpoint,
            gateway = %config.gateway_url,
            service_account = %config.curation.service_account,
            "curation node initialised"
        );

        Ok(Self {
            config,
            engine,
            gateway,
            metrics: Arc::new(NodeMetrics::new()),
            clock,
            shutdown,
            task_handles: Vec::new(),
        })
    }

    pub fn engine(&self) -> &Arc<CurationEngine> {
        &self.engine
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// Spawn every background task, then block until a shutdown signal.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        self.spawn_tasks()?;

        tracing::info!("curation node started, all jobs running");

        self.shutdown.wait_for_signal().await;

        Ok(())
    }

    /// Spawn the periodic jobs and, when enabled, the inbound HTTP server.
    pub fn spawn_tasks(&mut self) -> Result<(), NodeError> {
        let schedules = [
            (
                Job::StaleSweep,
                Schedule::Every(Duration::from_secs(self.config.stale_interval_secs)),
            ),
            (
                Job::BestCandidateSweep,
                Schedule::Every(Duration::from_secs(self.config.best_candidate_interval_secs)),
            ),
            (
                Job::AuthorityAudit,
                Schedule::Every(Duration::from_secs(self.config.audit_interval_secs)),
            ),
            (
                Job::CuratorRewards,
                Schedule::Weekly {
                    weekday: self.config.reward_weekday()?,
                    hour: self.config.reward_hour,
                },
            ),
            (
                Job::SupportReport,
                Schedule::Daily {
                    hour: self.config.report_hour,
                    minute: self.config.report_minute,
                },
            ),
        ];

        let ctx = JobContext {
            engine: Arc::clone(&self.engine),
            metrics: Arc::clone(&self.metrics),
            clock: Arc::clone(&self.clock),
        };
        for (job, schedule) in schedules {
            let handle = tokio::spawn(run_periodic(
                ctx.clone(),
                job,
                schedule,
                self.shutdown.subscribe(),
            ));
            self.task_handles.push(handle);
        }

        // ── Inbound HTTP server (optional) ────────────────────────────────
        if self.config.enable_rpc {
            let addr: SocketAddr = format!("{}:{}", self.config.rpc_bind, self.config.rpc_port)
                .parse()
                .map_err(|e| NodeError::Config(format!("invalid RPC address: {e}")))?;
            let rpc_state = Arc::new(RpcState {
                gateway: Arc::clone(&self.gateway),
                metrics_registry: self
                    .config
                    .enable_metrics
                    .then(|| self.metrics.registry.clone()),
                events_received: self.metrics.events_received.clone(),
                events_failed: self.metrics.events_failed.clone(),
                approvals_dispatched: self.metrics.approvals_dispatched.clone(),
                started_at: Instant::now(),
            });
            let rpc_server = RpcServer::with_state(addr, rpc_state);
            let mut shutdown_rx_rpc = self.shutdown.subscribe();

            let rpc_handle = tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = shutdown_rx_rpc.recv() => {
                        tracing::info!("RPC server shutting down");
                    }
                    result = rpc_server.start() => {
                        match result {
                            Ok(()) => tracing::info!("RPC server exited"),
                            Err(e) => tracing::error!("RPC server error: {e}"),
                        }
                    }
                }
            });
            self.task_handles.push(rpc_handle);
        }

        Ok(())
    }

    /// Trigger shutdown without waiting for an OS signal.
    pub fn request_shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Stop the node gracefully.
    ///
    /// Signals every task, which also cancels in-flight dispatch batches,
    /// then waits for the tasks to finish (with timeout).
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("curation node stopping");

        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };

        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all)
            .await
            .is_err()
        {
            tracing::warn!(
                "shutdown timeout ({:?}), some tasks may still be running",
                SHUTDOWN_TIMEOUT
            );
        }

        tracing::info!("curation node stopped");
        Ok(())
    }
}
