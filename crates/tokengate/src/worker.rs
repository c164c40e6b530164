//! `SessionWorker` builder and consume loop.
//!
//! This is the entry point for running a Tokengate worker. It ties the
//! layers together: queue → dispatcher → outbox, with the heartbeat
//! task running alongside.

use std::sync::Arc;

use serde_json::Value;
use tokengate_bus::{Delivery, MessageQueue};
use tokengate_outbox::OutboxConfig;
use tokengate_protocol::ProtocolError;
use tokengate_store::{
    ActionStore, ApplicationStore, DeviceStore, HeartbeatStore,
};

use crate::dispatcher::Dispatcher;
use crate::{TokengateError, WorkerConfig, heartbeat};

/// Builder for configuring and starting a session worker.
///
/// # Example
///
/// ```rust,ignore
/// let worker = SessionWorker::builder()
///     .config(WorkerConfig { server_name: hostname, ..Default::default() })
///     .build(store, queue);
/// worker.run().await
/// ```
pub struct SessionWorkerBuilder {
    config: WorkerConfig,
    outbox: OutboxConfig,
}

impl SessionWorkerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: WorkerConfig::default(),
            outbox: OutboxConfig::default(),
        }
    }

    /// Sets the worker's process configuration.
    pub fn config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the outbox retry/TTL configuration.
    pub fn outbox_config(mut self, outbox: OutboxConfig) -> Self {
        self.outbox = outbox;
        self
    }

    /// Builds a worker over the given store and queue.
    pub fn build<S, Q>(self, store: Arc<S>, queue: Q) -> SessionWorker<S, Q>
    where
        S: ApplicationStore
            + DeviceStore
            + ActionStore
            + HeartbeatStore,
        Q: MessageQueue,
    {
        SessionWorker {
            dispatcher: Dispatcher::with_outbox_config(
                Arc::clone(&store),
                self.outbox,
            ),
            store,
            queue,
            config: self.config,
        }
    }
}

impl Default for SessionWorkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running session-provisioning worker.
///
/// One worker holds one queue subscription and processes messages
/// strictly one at a time — scaling out means running more worker
/// processes against the same queue and store, accepting last-write-wins
/// on concurrent session issuance for the same device/application pair.
pub struct SessionWorker<S, Q>
where
    S: ApplicationStore + DeviceStore + ActionStore + HeartbeatStore,
    Q: MessageQueue,
{
    dispatcher: Dispatcher<S>,
    store: Arc<S>,
    queue: Q,
    config: WorkerConfig,
}

impl<S, Q> SessionWorker<S, Q>
where
    S: ApplicationStore + DeviceStore + ActionStore + HeartbeatStore,
    Q: MessageQueue,
{
    /// Creates a new builder.
    pub fn builder() -> SessionWorkerBuilder {
        SessionWorkerBuilder::new()
    }

    /// Runs the consume loop until the queue closes.
    ///
    /// Each message is acked only after the full
    /// validate → dispatch → record pipeline has produced a reply. If
    /// the loop bails with an error, the in-flight delivery is dropped
    /// unacked and the queue redelivers it — infrastructure failures
    /// ride the bus's retry, not ours.
    pub async fn run(mut self) -> Result<(), TokengateError> {
        tracing::info!(
            process = %self.config.process_name,
            server = %self.config.server_name,
            "session worker running"
        );

        let heartbeat = tokio::spawn(heartbeat::run(
            Arc::clone(&self.store),
            self.config.clone(),
        ));

        // The heartbeat must not outlive the consume loop, however the
        // loop ends — clean queue close or encode failure.
        let result = self.consume().await;
        heartbeat.abort();
        if result.is_ok() {
            tracing::info!("queue closed, session worker stopping");
        }
        result
    }

    async fn consume(&mut self) -> Result<(), TokengateError> {
        while let Some(delivery) = self.queue.recv().await {
            let message: Value = match serde_json::from_slice(delivery.body())
            {
                Ok(message) => message,
                // Not JSON at all: a poison message. Ack it away — the
                // broker would redeliver it forever otherwise.
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        "discarding undecodable message"
                    );
                    delivery.ack(Vec::new()).await;
                    continue;
                }
            };

            let reply = self.dispatcher.dispatch(&message).await;
            let outcome =
                serde_json::to_vec(&reply).map_err(ProtocolError::Encode)?;
            delivery.ack(outcome).await;
        }
        Ok(())
    }
}
