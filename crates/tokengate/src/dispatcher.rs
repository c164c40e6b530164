//! The request dispatcher: top-level orchestration of one message.
//!
//! `dispatch` is a straight-line ladder where every rung can
//! short-circuit to a terminal reply:
//!
//! ```text
//! envelope schema ──✗── reply (100003, no record)
//!      │
//! resolve application ──✗── reply (200002 / 100016 / 100003, no record)
//!      │
//! request expiry ──✗── record + reply (100017)
//!      │
//! route by type ──┬── "session" → issuer → record + reply
//!                 └── other     → record + reply (100018)
//! ```
//!
//! The asymmetry is deliberate: until the envelope has passed its
//! schema and the application resolved, nothing has established that
//! the message names a real device/application pairing — recording a
//! device-bound response for an unattributable request would write
//! garbage into the outbox. From the expiry check on, every outcome is
//! recorded so the device learns why nothing (or something) happened.

use std::sync::Arc;

use serde_json::Value;
use tokengate_outbox::{ActionRecorder, OutboxConfig};
use tokengate_protocol::{
    AppId, Envelope, REQUEST_TYPE_SESSION, Reply, codes, now_ms, schema,
};
use tokengate_session::SessionIssuer;
use tokengate_store::{
    ActionStore, Application, ApplicationStore, DeviceStore,
};

/// Validates, routes, and records one inbound request at a time.
///
/// Total over its input: any JSON value in, exactly one [`Reply`] out.
/// All failure modes — malformed input, unknown applications, store
/// faults — come back as structured replies, never as panics or `Err`s,
/// because the caller's only job afterwards is to ack the message.
pub struct Dispatcher<S>
where
    S: ApplicationStore + DeviceStore + ActionStore,
{
    store: Arc<S>,
    issuer: SessionIssuer<S>,
    recorder: ActionRecorder<S>,
}

impl<S> Dispatcher<S>
where
    S: ApplicationStore + DeviceStore + ActionStore,
{
    /// Creates a dispatcher with default outbox settings.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_outbox_config(store, OutboxConfig::default())
    }

    /// Creates a dispatcher with explicit outbox settings.
    pub fn with_outbox_config(store: Arc<S>, outbox: OutboxConfig) -> Self {
        Self {
            issuer: SessionIssuer::new(Arc::clone(&store)),
            recorder: ActionRecorder::with_config(Arc::clone(&store), outbox),
            store,
        }
    }

    /// Processes one raw queue message through the full pipeline.
    pub async fn dispatch(&self, message: &Value) -> Reply {
        // 1. The envelope must pass its schema before any field is
        //    trusted, even for attribution.
        if let Err(failures) = schema::validate(message, &schema::ENVELOPE) {
            return Reply::invalid(failures, Some(codes::SCHEMA_INVALID));
        }
        let envelope: Envelope = match serde_json::from_value(message.clone())
        {
            Ok(envelope) => envelope,
            // The schema passed, so this would mean schema and types
            // have drifted apart. Report it like any other bad shape.
            Err(err) => {
                return Reply::error(codes::SCHEMA_INVALID, err.to_string());
            }
        };
        let header = &envelope.header;

        // 2–4. Resolve the requesting application.
        let application = match self
            .resolve_application(&header.encryption.tokencard_id)
            .await
        {
            Ok(application) => application,
            Err(reply) => return reply,
        };
        tracing::debug!(
            request = %header.request_id,
            device = %header.device_id,
            app = %application.name,
            major = application.version.major,
            minor = application.version.minor,
            "request attributed"
        );

        // 5. A request that outlived its ttl is not processed, but the
        //    device is still told why nothing happened.
        if header.is_expired(now_ms()) {
            let refusal = Reply::error(
                codes::MESSAGE_EXPIRED,
                "This message has expired.",
            );
            return self.recorder.record(header, refusal).await;
        }

        // 6. Route by request type and record the outcome, success or
        //    not.
        let reply = match header.kind.as_str() {
            REQUEST_TYPE_SESSION => {
                self.issuer.issue(header, &envelope.body).await
            }
            other => Reply::error(
                codes::BAD_MESSAGE_TYPE,
                format!(
                    "The message type parameter ('system/{other}') is not \
                     valid."
                ),
            ),
        };
        self.recorder.record(header, reply).await
    }

    /// Looks up and shape-checks the application named by the request's
    /// tokencard id. Failures here are returned directly to the caller,
    /// never recorded: the request's attribution is exactly what's in
    /// doubt.
    async fn resolve_application(
        &self,
        id: &AppId,
    ) -> Result<Application, Reply> {
        let record = self
            .store
            .find_application(id)
            .await
            .map_err(|err| Reply::Error(err.into()))?;

        let Some(record) = record else {
            return Err(Reply::error(
                codes::APP_NOT_FOUND,
                "The application does not exist.",
            ));
        };

        // Registry records are not trusted either; shape-check before
        // deserializing.
        if let Err(failures) = schema::validate(&record, &schema::APPLICATION)
        {
            return Err(Reply::invalid(
                failures,
                Some(codes::SCHEMA_INVALID),
            ));
        }
        serde_json::from_value(record)
            .map_err(|err| Reply::error(codes::SCHEMA_INVALID, err.to_string()))
    }
}
