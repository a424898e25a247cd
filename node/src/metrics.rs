//! Prometheus metrics for the curation node.
//!
//! Counters cover inbound events and the periodic loops; gauges track the
//! open vote queue and the delegated accounts. The [`NodeMetrics`] struct
//! owns a dedicated [`Registry`] that the RPC `/metrics` endpoint encodes
//! into the Prometheus text exposition format.

use curator_rpc::TrackedCounter;
use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, IntCounter, IntGauge,
    Opts, Registry,
};

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Inbound gateway events handled by the RPC server.
    pub events_received: IntCounter,
    /// Inbound gateway events that ended in an error.
    pub events_failed: IntCounter,
    /// Votes closed as `Addled` by either sweep.
    pub votes_addled: IntCounter,
    /// Votes resolved early by the best-candidate sweep.
    pub votes_promoted: IntCounter,
    /// Approvals that reached the ledger for completed votes, whichever path
    /// completed them.
    pub approvals_dispatched: TrackedCounter,
    /// Credentials deactivated by the authority audit.
    pub credentials_revoked: IntCounter,
    /// Reward transfers sent to curators.
    pub rewards_paid: IntCounter,
    /// Support reports announced.
    pub reports_published: IntCounter,
    /// Loop iterations that failed.
    pub loop_errors: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Current number of open votes.
    pub open_votes: IntGauge,
    /// Current number of active delegated credentials.
    pub active_credentials: IntGauge,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let events_received = register_int_counter_with_registry!(
            Opts::new(
                "curator_events_received_total",
                "Total inbound gateway events"
            ),
            registry
        )
        .expect("failed to register events_received counter");

        let events_failed = register_int_counter_with_registry!(
            Opts::new(
                "curator_events_failed_total",
                "Total inbound gateway events that failed"
            ),
            registry
        )
        .expect("failed to register events_failed counter");

        let votes_addled = register_int_counter_with_registry!(
            Opts::new(
                "curator_votes_addled_total",
                "Total votes closed after their payout window"
            ),
            registry
        )
        .expect("failed to register votes_addled counter");

        let votes_promoted = register_int_counter_with_registry!(
            Opts::new(
                "curator_votes_promoted_total",
                "Total votes resolved by the best-candidate sweep"
            ),
            registry
        )
        .expect("failed to register votes_promoted counter");

        let approvals_dispatched = register_int_counter_with_registry!(
            Opts::new(
                "curator_approvals_dispatched_total",
                "Total approvals accepted by the ledger"
            ),
            registry
        )
        .expect("failed to register approvals_dispatched counter");

        let credentials_revoked = register_int_counter_with_registry!(
            Opts::new(
                "curator_credentials_revoked_total",
                "Total credentials deactivated by the authority audit"
            ),
            registry
        )
        .expect("failed to register credentials_revoked counter");

        let rewards_paid = register_int_counter_with_registry!(
            Opts::new("curator_rewards_paid_total", "Total curator reward transfers"),
            registry
        )
        .expect("failed to register rewards_paid counter");

        let reports_published = register_int_counter_with_registry!(
            Opts::new(
                "curator_reports_published_total",
                "Total support reports announced"
            ),
            registry
        )
        .expect("failed to register reports_published counter");

        let loop_errors = register_int_counter_with_registry!(
            Opts::new(
                "curator_loop_errors_total",
                "Total failed periodic loop iterations"
            ),
            registry
        )
        .expect("failed to register loop_errors counter");

        let open_votes = register_int_gauge_with_registry!(
            Opts::new("curator_open_votes", "Current number of open votes"),
            registry
        )
        .expect("failed to register open_votes gauge");

        let active_credentials = register_int_gauge_with_registry!(
            Opts::new(
                "curator_active_credentials",
                "Current number of active delegated accounts"
            ),
            registry
        )
        .expect("failed to register active_credentials gauge");

        Self {
            registry,
            events_received,
            events_failed,
            votes_addled,
            votes_promoted,
            approvals_dispatched: TrackedCounter::new(approvals_dispatched),
            credentials_revoked,
            rewards_paid,
            reports_published,
            loop_errors,
            open_votes,
            active_credentials,
        }
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};

    #[test]
    fn registry_exposes_curator_metrics() {
        let metrics = NodeMetrics::new();
        metrics.events_received.inc();
        metrics.open_votes.set(4);

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metrics.registry.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("curator_events_received_total 1"));
        assert!(text.contains("curator_open_votes 4"));
    }
}
