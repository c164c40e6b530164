//! Building and persisting action records.

use std::sync::Arc;

use tokengate_protocol::{Header, Reply, now_ms};
use tokengate_store::{
    ACTION_RESPONSE, ActionRecord, ActionStore, PROGRESS_CREATED,
    ProgressEvent, ResendPolicy,
};

/// Retry/TTL knobs for freshly created action records.
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// How long a record stays deliverable at all: `timeoutAt` is
    /// creation time plus this. Default: 24 hours.
    pub response_ttl_ms: u64,

    /// Delivery attempts before the delivery worker gives up.
    /// Default: 3.
    pub max_resends: u32,

    /// Gap between delivery attempts, milliseconds. Default: 10 s.
    pub resend_timeout_ms: u64,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            response_ttl_ms: 86_400_000,
            max_resends: 3,
            resend_timeout_ms: 10_000,
        }
    }
}

/// Persists device-bound responses into the action outbox.
pub struct ActionRecorder<A: ActionStore> {
    actions: Arc<A>,
    config: OutboxConfig,
}

impl<A: ActionStore> ActionRecorder<A> {
    /// Creates a recorder with default retry/TTL settings.
    pub fn new(actions: Arc<A>) -> Self {
        Self::with_config(actions, OutboxConfig::default())
    }

    /// Creates a recorder with explicit settings.
    pub fn with_config(actions: Arc<A>, config: OutboxConfig) -> Self {
        Self { actions, config }
    }

    /// Records one device-bound response and returns the reply that was
    /// recorded.
    ///
    /// The caller always gets the original `reply` back, even when the
    /// insert fails: the domain outcome must reach the bus-ack path
    /// regardless of outbox health. A persistence failure is surfaced
    /// through the log (with its 200003 code) for operators, not through
    /// the reply — the message bus's redelivery is the wrong tool for a
    /// request that was already decided.
    pub async fn record(&self, header: &Header, reply: Reply) -> Reply {
        let record = self.build_record(header, reply.clone(), now_ms());
        if let Err(err) = self.actions.insert_action(record).await {
            tracing::error!(
                error = %err,
                error_code = err.error_code(),
                device = %header.device_id,
                request = %header.request_id,
                "failed to persist device response"
            );
        }
        reply
    }

    /// Builds the record for a given outcome at a given instant.
    ///
    /// Invariants: one `"created"` progress event stamped at
    /// `created_at`, zero resends so far, and
    /// `resend_after = created_at + resend_timeout`.
    fn build_record(
        &self,
        header: &Header,
        reply: Reply,
        created_at: u64,
    ) -> ActionRecord {
        ActionRecord {
            device_id: header.device_id.clone(),
            encryption: header.encryption.clone(),
            request_id: header.request_id.clone(),
            action: ACTION_RESPONSE.to_string(),
            params: reply,
            status: 0,
            created_at,
            timeout_at: created_at + self.config.response_ttl_ms,
            progress: vec![ProgressEvent {
                timestamp: created_at,
                status: PROGRESS_CREATED.to_string(),
            }],
            resends: ResendPolicy {
                num_resends: 0,
                max_resends: self.config.max_resends,
                resend_after: created_at + self.config.resend_timeout_ms,
                resend_timeout: self.config.resend_timeout_ms,
            },
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
