//! The session issuer: validates a session request against the device's
//! binding state and writes a fresh token.
//!
//! Every refusal is a *value* — a structured error reply with the
//! device-facing code — because the refusal itself must be delivered to
//! the device as an action record. The issuer therefore never returns a
//! Rust error to its caller: `issue` is total. Internally the checks are
//! chained with early returns over `Result<_, ErrorReply>` so that store
//! calls can use `?`.

use std::sync::Arc;

use serde_json::Value;
use tokengate_protocol::{
    ErrorDetail, ErrorReply, Header, Reply, SessionBody, codes, now_ms,
    schema,
};
use tokengate_store::{DeviceStore, STATUS_REGISTERED, SessionRecord};

use crate::token::generate_token;

/// Issues session tokens against a device store.
pub struct SessionIssuer<D: DeviceStore> {
    devices: Arc<D>,
}

impl<D: DeviceStore> SessionIssuer<D> {
    /// Creates an issuer over the given device store.
    pub fn new(devices: Arc<D>) -> Self {
        Self { devices }
    }

    /// Handles one session request: returns either the success reply
    /// carrying the new token, or the structured refusal.
    pub async fn issue(&self, header: &Header, body: &Value) -> Reply {
        match self.try_issue(header, body).await {
            Ok(reply) => reply,
            Err(refusal) => Reply::Error(refusal),
        }
    }

    async fn try_issue(
        &self,
        header: &Header,
        body: &Value,
    ) -> Result<Reply, ErrorReply> {
        // 1. The body must conform to the session-body schema. Body
        //    schema failures carry no code, matching the wire contract.
        if let Err(failures) = schema::validate(body, &schema::SESSION_BODY) {
            return Err(ErrorReply {
                error: ErrorDetail::Failures(failures),
                error_code: None,
            });
        }
        let body: SessionBody = serde_json::from_value(body.clone())
            .map_err(|e| uncoded(e.to_string()))?;

        // 2. Fetch the device's bindings; a store fault converts
        //    straight into a coded reply (200004) via `?`.
        let app_id = &header.encryption.tokencard_id;
        let bindings = self.devices.app_bindings(&header.device_id).await?;

        // 3–6. Walk the binding checks, most fundamental first.
        let Some(bindings) = bindings else {
            return Err(uncoded("The device does not exist."));
        };
        let Some(binding) = bindings.get(&app_id.0) else {
            return Err(coded(
                codes::APP_NOT_REGISTERED,
                "The application has not been registered on this device.",
            ));
        };
        let Some(status) = binding.status.as_deref() else {
            return Err(coded(
                codes::SCHEMA_INVALID,
                "The application is wrongly defined on the device.",
            ));
        };
        if status != STATUS_REGISTERED {
            return Err(coded(
                codes::APP_NOT_ACTIVE,
                "The application status is not equal to 'registered'.",
            ));
        }

        // 7. Issue. Overwriting an existing session is the normal
        //    reissue path — the previous token stops being current the
        //    moment this write lands. The expiry saturates: `timeout`
        //    is wire input and must not be able to overflow the sum.
        let token = generate_token();
        let timeout_at = if body.timeout > 0 {
            now_ms().saturating_add(body.timeout.saturating_mul(1000))
        } else {
            0
        };
        self.devices
            .set_session(
                &header.device_id,
                app_id,
                SessionRecord { id: token.clone(), timeout_at },
            )
            .await?;

        tracing::info!(
            device = %header.device_id,
            app = %app_id,
            timeout_at,
            "session issued"
        );
        Ok(Reply::session(token))
    }
}

fn coded(code: u32, message: &str) -> ErrorReply {
    ErrorReply {
        error: ErrorDetail::Message(message.into()),
        error_code: Some(code),
    }
}

fn uncoded(message: impl Into<String>) -> ErrorReply {
    ErrorReply {
        error: ErrorDetail::Message(message.into()),
        error_code: None,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for the issuer's decision ladder.
    //!
    //! Assertions match on `error_code()` — the codes are the stable
    //! contract; the message text is diagnostics and free to change.

    use std::collections::HashMap;

    use serde_json::json;
    use tokengate_protocol::{AppId, DeviceId, Encryption, RequestId};
    use tokengate_store::{AppBinding, Device, FaultPoint, MemoryStore};

    use super::*;
    use crate::token::TOKEN_LEN;

    // -- Helpers ----------------------------------------------------------

    fn header(device: &str, app: &str) -> Header {
        Header {
            request_id: RequestId("req-1".into()),
            device_id: DeviceId(device.into()),
            kind: "session".into(),
            timestamp: now_ms(),
            ttl: 0,
            encryption: Encryption {
                method: "plain".into(),
                tokencard_id: AppId(app.into()),
            },
        }
    }

    fn device(id: &str, app: &str, status: Option<&str>) -> Device {
        Device {
            id: id.into(),
            apps: Some(HashMap::from([(
                app.into(),
                AppBinding {
                    status: status.map(Into::into),
                    session: None,
                },
            )])),
        }
    }

    async fn issuer_with(devices: Vec<Device>) -> SessionIssuer<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for d in devices {
            store.insert_device(d).await;
        }
        SessionIssuer::new(store)
    }

    // =====================================================================
    // Body validation
    // =====================================================================

    #[tokio::test]
    async fn test_issue_invalid_body_returns_failure_list_without_code() {
        let issuer = issuer_with(vec![]).await;

        let reply = issuer
            .issue(&header("dev-1", "card-1"), &json!({ "timeout": "soon" }))
            .await;

        assert_eq!(reply.error_code(), None);
        let Reply::Error(e) = reply else { panic!("expected error") };
        assert!(matches!(e.error, ErrorDetail::Failures(_)));
    }

    #[tokio::test]
    async fn test_issue_invalid_body_performs_no_store_reads() {
        // A device-lookup fault would surface as 200004 — proving the
        // store is never touched when the body is bad.
        let store = Arc::new(MemoryStore::new());
        store.fail_on(FaultPoint::FindDevice).await;
        let issuer = SessionIssuer::new(store);

        let reply =
            issuer.issue(&header("dev-1", "card-1"), &json!({})).await;
        assert_eq!(reply.error_code(), None);
    }

    // =====================================================================
    // Binding checks
    // =====================================================================

    #[tokio::test]
    async fn test_issue_unknown_device_is_uncoded_error() {
        let issuer = issuer_with(vec![]).await;

        let reply = issuer
            .issue(&header("ghost", "card-1"), &json!({ "timeout": 60 }))
            .await;

        assert_eq!(reply.error_code(), None);
        assert!(matches!(reply, Reply::Error(_)));
    }

    #[tokio::test]
    async fn test_issue_device_without_apps_map_is_uncoded_error() {
        let issuer = issuer_with(vec![Device {
            id: "bare".into(),
            apps: None,
        }])
        .await;

        let reply = issuer
            .issue(&header("bare", "card-1"), &json!({ "timeout": 60 }))
            .await;

        assert_eq!(reply.error_code(), None);
        assert!(matches!(reply, Reply::Error(_)));
    }

    #[tokio::test]
    async fn test_issue_unbound_application_returns_100012() {
        let issuer =
            issuer_with(vec![device("dev-1", "other-card", Some("registered"))])
                .await;

        let reply = issuer
            .issue(&header("dev-1", "card-1"), &json!({ "timeout": 60 }))
            .await;

        assert_eq!(reply.error_code(), Some(100_012));
    }

    #[tokio::test]
    async fn test_issue_binding_without_status_returns_100003() {
        let issuer = issuer_with(vec![device("dev-1", "card-1", None)]).await;

        let reply = issuer
            .issue(&header("dev-1", "card-1"), &json!({ "timeout": 60 }))
            .await;

        assert_eq!(reply.error_code(), Some(100_003));
    }

    #[tokio::test]
    async fn test_issue_pending_binding_returns_100032() {
        let issuer =
            issuer_with(vec![device("dev-1", "card-1", Some("pending"))])
                .await;

        let reply = issuer
            .issue(&header("dev-1", "card-1"), &json!({ "timeout": 60 }))
            .await;

        assert_eq!(reply.error_code(), Some(100_032));
    }

    // =====================================================================
    // Issuance
    // =====================================================================

    #[tokio::test]
    async fn test_issue_happy_path_returns_token_and_persists_session() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_device(device("dev-1", "card-1", Some("registered")))
            .await;
        let issuer = SessionIssuer::new(Arc::clone(&store));

        let before = now_ms();
        let reply = issuer
            .issue(&header("dev-1", "card-1"), &json!({ "timeout": 3600 }))
            .await;
        let after = now_ms();

        let Reply::Session(session) = reply else {
            panic!("expected success, got {reply:?}");
        };
        assert_eq!(session.response_type, "session");
        assert_eq!(session.session_id.len(), TOKEN_LEN);
        assert!(session.session_id.chars().all(|c| c.is_ascii_alphanumeric()));

        // The persisted session must carry the same token and an expiry
        // of now + 3600s, within the call's own wall-clock window.
        let stored = store.device(&DeviceId("dev-1".into())).await.unwrap();
        let session_record =
            stored.apps.unwrap()["card-1"].session.clone().unwrap();
        assert_eq!(session_record.id, session.session_id);
        assert!(session_record.timeout_at >= before + 3_600_000);
        assert!(session_record.timeout_at <= after + 3_600_000);
    }

    #[tokio::test]
    async fn test_issue_zero_timeout_never_expires() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_device(device("dev-1", "card-1", Some("registered")))
            .await;
        let issuer = SessionIssuer::new(Arc::clone(&store));

        let reply = issuer
            .issue(&header("dev-1", "card-1"), &json!({ "timeout": 0 }))
            .await;

        assert!(matches!(reply, Reply::Session(_)));
        let stored = store.device(&DeviceId("dev-1".into())).await.unwrap();
        let session_record =
            stored.apps.unwrap()["card-1"].session.clone().unwrap();
        assert_eq!(session_record.timeout_at, 0);
    }

    #[tokio::test]
    async fn test_issue_max_timeout_saturates_expiry() {
        // A schema-valid body may carry any u64 timeout; the expiry
        // computation must clamp at u64::MAX rather than overflow.
        let store = Arc::new(MemoryStore::new());
        store
            .insert_device(device("dev-1", "card-1", Some("registered")))
            .await;
        let issuer = SessionIssuer::new(Arc::clone(&store));

        let reply = issuer
            .issue(&header("dev-1", "card-1"), &json!({ "timeout": u64::MAX }))
            .await;

        assert!(matches!(reply, Reply::Session(_)));
        let stored = store.device(&DeviceId("dev-1".into())).await.unwrap();
        let session_record =
            stored.apps.unwrap()["card-1"].session.clone().unwrap();
        assert_eq!(session_record.timeout_at, u64::MAX);
    }

    #[tokio::test]
    async fn test_issue_twice_replaces_previous_token() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_device(device("dev-1", "card-1", Some("registered")))
            .await;
        let issuer = SessionIssuer::new(Arc::clone(&store));
        let h = header("dev-1", "card-1");
        let body = json!({ "timeout": 60 });

        let Reply::Session(first) = issuer.issue(&h, &body).await else {
            panic!("first issue failed");
        };
        let Reply::Session(second) = issuer.issue(&h, &body).await else {
            panic!("second issue failed");
        };
        assert_ne!(first.session_id, second.session_id);

        // Only the second token is current.
        let stored = store.device(&DeviceId("dev-1".into())).await.unwrap();
        let session_record =
            stored.apps.unwrap()["card-1"].session.clone().unwrap();
        assert_eq!(session_record.id, second.session_id);
    }

    // =====================================================================
    // Store faults
    // =====================================================================

    #[tokio::test]
    async fn test_issue_device_lookup_fault_returns_200004() {
        let store = Arc::new(MemoryStore::new());
        store.fail_on(FaultPoint::FindDevice).await;
        let issuer = SessionIssuer::new(store);

        let reply = issuer
            .issue(&header("dev-1", "card-1"), &json!({ "timeout": 60 }))
            .await;

        assert_eq!(reply.error_code(), Some(200_004));
    }

    #[tokio::test]
    async fn test_issue_session_write_fault_returns_200004() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_device(device("dev-1", "card-1", Some("registered")))
            .await;
        store.fail_on(FaultPoint::UpdateDevice).await;
        let issuer = SessionIssuer::new(store);

        let reply = issuer
            .issue(&header("dev-1", "card-1"), &json!({ "timeout": 60 }))
            .await;

        assert_eq!(reply.error_code(), Some(200_004));
    }
}
