//! Process liveness heartbeat.
//!
//! Runs beside the consume loop and writes a liveness record on a fixed
//! cadence regardless of message traffic. This is the only liveness
//! signal the worker emits: the pipeline enforces no per-message
//! timeout, so a hung store call stalls the (single) consumer slot and
//! it is the *stalled heartbeat* that supervisors detect.

use std::sync::Arc;

use tokengate_protocol::now_ms;
use tokengate_store::HeartbeatStore;

use crate::WorkerConfig;

/// Emits heartbeats forever. Spawned by the worker and aborted when the
/// consume loop ends.
pub(crate) async fn run<H: HeartbeatStore>(store: Arc<H>, config: WorkerConfig) {
    let mut ticker = tokio::time::interval(config.heartbeat_interval);
    loop {
        // The first tick completes immediately, so a heartbeat lands as
        // soon as the worker starts.
        ticker.tick().await;
        match store
            .record_heartbeat(&config.process_name, &config.server_name, now_ms())
            .await
        {
            Ok(()) => tracing::trace!("heartbeat recorded"),
            // A missed beat is the supervisor's problem to notice, not
            // a reason to take the worker down.
            Err(err) => {
                tracing::warn!(error = %err, "heartbeat write failed");
            }
        }
    }
}
