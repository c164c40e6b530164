//! Core wire types for Tokengate's message format.
//!
//! This module defines the shape of every message the worker consumes
//! from the queue (the request [`Envelope`]) and every value it hands
//! back to the bus-ack path (the [`Reply`]).
//!
//! Requests are JSON on the wire, camelCase field names. The envelope is
//! always schema-validated (see [`crate::schema`]) *before* being
//! deserialized into these types, so deserialization failures indicate a
//! gap between schema and types, not bad client input.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The only request type this worker currently routes.
///
/// Other values pass the envelope schema (the schema requires only "a
/// string" here) and are rejected by the dispatcher with code 100018,
/// so new request types can be added without a schema change.
pub const REQUEST_TYPE_SESSION: &str = "session";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a device.
///
/// A newtype wrapper over `String`: you can't accidentally pass an
/// `AppId` where a `DeviceId` is expected, even though both are strings
/// underneath. `#[serde(transparent)]` keeps the JSON representation a
/// plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for an application.
///
/// On the wire this arrives as `header.encryption.tokencardId` — the
/// tokencard is the credential card an application presents, and its id
/// doubles as the application id in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(pub String);

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a single request, assigned by the sender.
///
/// Echoed back onto the durable action record so the device can match
/// responses to requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Request envelope
// ---------------------------------------------------------------------------

/// The encryption context of a request.
///
/// The pipeline never decrypts anything itself — `method` is carried
/// along and echoed onto the action record, and `tokencard_id` names the
/// application to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encryption {
    /// The encryption method the device and platform agreed on.
    pub method: String,

    /// The application's tokencard id, used as the application id.
    pub tokencard_id: AppId,
}

/// The request header: everything the dispatcher needs to route and
/// attribute a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Sender-assigned request id, echoed onto the action record.
    pub request_id: RequestId,

    /// The device making the request.
    pub device_id: DeviceId,

    /// The request type. Routing key for the dispatcher — currently only
    /// [`REQUEST_TYPE_SESSION`] is handled.
    #[serde(rename = "type")]
    pub kind: String,

    /// When the request was sent, epoch milliseconds.
    pub timestamp: u64,

    /// Time-to-live in seconds. `0` means the request never expires.
    pub ttl: u64,

    /// The request's encryption context.
    pub encryption: Encryption,
}

impl Header {
    /// Returns `true` if this request has outlived its `ttl`.
    ///
    /// A `ttl` of `0` means "never expires". Otherwise the request is
    /// expired once `now_ms` passes `timestamp + ttl * 1000`. Both
    /// fields come off the wire, so the deadline saturates instead of
    /// overflowing — an absurdly large `ttl` means "never expires", not
    /// a panic.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.ttl > 0
            && now_ms
                > self.timestamp.saturating_add(self.ttl.saturating_mul(1000))
    }
}

/// The top-level request wrapper. Every queue message is an `Envelope`.
///
/// The body is kept as raw JSON here: its shape depends on the request
/// type and is schema-checked by whichever handler the dispatcher routes
/// to (only the session handler today).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Routing and attribution metadata.
    pub header: Header,

    /// The request payload, shape checked per request type.
    pub body: serde_json::Value,
}

/// The body of a session request, deserialized after it passes
/// [`schema::SESSION_BODY`](crate::schema::SESSION_BODY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBody {
    /// Requested session lifetime in seconds. `0` means the session
    /// never expires.
    pub timeout: u64,
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// The value handed to the bus-ack path, and also what gets persisted as
/// `params` of the durable action record.
///
/// `#[serde(untagged)]` because the two shapes are disjoint on the wire:
/// a success reply has `responseType`/`sessionId`, an error reply has
/// `error` (and usually `errorCode`). There is no discriminator field in
/// the original format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    /// A successful session issuance.
    Session(SessionReply),

    /// A validation, domain, or store error, reported to the device.
    Error(ErrorReply),
}

impl Reply {
    /// Builds the success reply for a freshly issued session token.
    pub fn session(token: String) -> Self {
        Reply::Session(SessionReply {
            response_type: REQUEST_TYPE_SESSION.to_string(),
            session_id: token,
        })
    }

    /// Builds an error reply with a numeric code.
    pub fn error(code: u32, message: impl Into<String>) -> Self {
        Reply::Error(ErrorReply {
            error: ErrorDetail::Message(message.into()),
            error_code: Some(code),
        })
    }

    /// Builds an error reply with no code.
    ///
    /// A handful of source errors ("The device does not exist.", body
    /// schema failures) were never assigned a code; the `errorCode`
    /// field is simply absent on the wire for these.
    pub fn error_uncoded(message: impl Into<String>) -> Self {
        Reply::Error(ErrorReply {
            error: ErrorDetail::Message(message.into()),
            error_code: None,
        })
    }

    /// Builds an error reply carrying the validator's failure list.
    pub fn invalid(failures: Vec<String>, code: Option<u32>) -> Self {
        Reply::Error(ErrorReply {
            error: ErrorDetail::Failures(failures),
            error_code: code,
        })
    }

    /// Returns the numeric error code, if this is a coded error reply.
    ///
    /// Test suites match on this — never on the free-text message.
    pub fn error_code(&self) -> Option<u32> {
        match self {
            Reply::Session(_) => None,
            Reply::Error(e) => e.error_code,
        }
    }
}

/// A successful session issuance: `{"responseType": "session",
/// "sessionId": "..."}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReply {
    /// Always [`REQUEST_TYPE_SESSION`] for this flow.
    pub response_type: String,

    /// The freshly issued session token.
    pub session_id: String,
}

/// An error reply: `{"error": ..., "errorCode": ...}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReply {
    /// Human-readable diagnostics: either a message or the validator's
    /// failure list. Not machine-consumable.
    pub error: ErrorDetail,

    /// The stable numeric code, absent for the few uncoded errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u32>,
}

/// The `error` field of an [`ErrorReply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    /// A single human-readable message.
    Message(String),

    /// The schema validator's list of failures.
    Failures(Vec<String>),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Tests for wire types and their JSON serialization.
    //!
    //! The wire format is fixed by the devices already in the field —
    //! camelCase keys, untagged replies — so these tests pin the exact
    //! JSON shapes, not just round-trip equality.

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_device_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&DeviceId("dev-1".into())).unwrap();
        assert_eq!(json, "\"dev-1\"");
    }

    #[test]
    fn test_app_id_deserializes_from_plain_string() {
        let id: AppId = serde_json::from_str("\"card-9\"").unwrap();
        assert_eq!(id, AppId("card-9".into()));
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId("req-7".into()).to_string(), "req-7");
    }

    // =====================================================================
    // Envelope
    // =====================================================================

    fn sample_envelope_json() -> serde_json::Value {
        serde_json::json!({
            "header": {
                "requestId": "req-1",
                "deviceId": "dev-1",
                "type": "session",
                "timestamp": 1_000_000u64,
                "ttl": 60,
                "encryption": {
                    "method": "aes-256-gcm",
                    "tokencardId": "card-1"
                }
            },
            "body": { "timeout": 3600 }
        })
    }

    #[test]
    fn test_envelope_deserializes_camel_case_fields() {
        let envelope: Envelope =
            serde_json::from_value(sample_envelope_json()).unwrap();

        assert_eq!(envelope.header.request_id, RequestId("req-1".into()));
        assert_eq!(envelope.header.device_id, DeviceId("dev-1".into()));
        assert_eq!(envelope.header.kind, "session");
        assert_eq!(envelope.header.ttl, 60);
        assert_eq!(
            envelope.header.encryption.tokencard_id,
            AppId("card-1".into())
        );
    }

    #[test]
    fn test_envelope_round_trip() {
        let envelope: Envelope =
            serde_json::from_value(sample_envelope_json()).unwrap();
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json, sample_envelope_json());
    }

    #[test]
    fn test_envelope_missing_header_field_fails() {
        let mut json = sample_envelope_json();
        json["header"].as_object_mut().unwrap().remove("deviceId");
        let result: Result<Envelope, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    // =====================================================================
    // Header::is_expired
    // =====================================================================

    #[test]
    fn test_is_expired_past_ttl_returns_true() {
        let envelope: Envelope =
            serde_json::from_value(sample_envelope_json()).unwrap();
        // timestamp = 1_000_000, ttl = 60s → expires at 1_060_000.
        assert!(envelope.header.is_expired(1_060_001));
    }

    #[test]
    fn test_is_expired_within_ttl_returns_false() {
        let envelope: Envelope =
            serde_json::from_value(sample_envelope_json()).unwrap();
        assert!(!envelope.header.is_expired(1_060_000));
    }

    #[test]
    fn test_is_expired_zero_ttl_never_expires() {
        let mut json = sample_envelope_json();
        json["header"]["ttl"] = serde_json::json!(0);
        let envelope: Envelope = serde_json::from_value(json).unwrap();
        assert!(!envelope.header.is_expired(u64::MAX));
    }

    #[test]
    fn test_is_expired_max_ttl_saturates_instead_of_overflowing() {
        // ttl and timestamp are wire input; the deadline must saturate,
        // not wrap into "expired forever" or panic.
        let mut json = sample_envelope_json();
        json["header"]["ttl"] = serde_json::json!(u64::MAX);
        json["header"]["timestamp"] = serde_json::json!(u64::MAX);
        let envelope: Envelope = serde_json::from_value(json).unwrap();
        assert!(!envelope.header.is_expired(u64::MAX));
    }

    // =====================================================================
    // Replies
    // =====================================================================

    #[test]
    fn test_session_reply_json_format() {
        let reply = Reply::session("abc123".into());
        let json = serde_json::to_value(&reply).unwrap();

        assert_eq!(json["responseType"], "session");
        assert_eq!(json["sessionId"], "abc123");
    }

    #[test]
    fn test_error_reply_json_format() {
        let reply = Reply::error(100_016, "The application does not exist.");
        let json = serde_json::to_value(&reply).unwrap();

        assert_eq!(json["error"], "The application does not exist.");
        assert_eq!(json["errorCode"], 100_016);
    }

    #[test]
    fn test_uncoded_error_omits_error_code_key() {
        let reply = Reply::error_uncoded("The device does not exist.");
        let json = serde_json::to_value(&reply).unwrap();

        assert!(json.get("errorCode").is_none());
    }

    #[test]
    fn test_invalid_reply_carries_failure_list() {
        let reply = Reply::invalid(
            vec!["header.ttl: required property is missing".into()],
            Some(100_003),
        );
        let json = serde_json::to_value(&reply).unwrap();

        assert!(json["error"].is_array());
        assert_eq!(json["errorCode"], 100_003);
    }

    #[test]
    fn test_reply_untagged_round_trip() {
        // Untagged enums deserialize by shape — make sure both shapes
        // come back as the right variant.
        let success = Reply::session("tok".into());
        let bytes = serde_json::to_vec(&success).unwrap();
        let decoded: Reply = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(success, decoded);

        let failure = Reply::error(100_017, "This message has expired.");
        let bytes = serde_json::to_vec(&failure).unwrap();
        let decoded: Reply = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(failure, decoded);
    }

    #[test]
    fn test_error_code_accessor() {
        assert_eq!(Reply::session("t".into()).error_code(), None);
        assert_eq!(Reply::error_uncoded("nope").error_code(), None);
        assert_eq!(Reply::error(100_032, "status").error_code(), Some(100_032));
    }
}
