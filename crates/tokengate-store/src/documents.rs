//! The documents that live in the store.
//!
//! Field names mirror the on-the-wire/on-disk camelCase convention so a
//! serialized document matches what the rest of the platform reads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokengate_protocol::{DeviceId, Encryption, Reply, RequestId};

/// The binding status required before a session may be issued.
pub const STATUS_REGISTERED: &str = "registered";

/// The `action` discriminator of a device-bound response record.
pub const ACTION_RESPONSE: &str = "response";

/// The status of the initial progress event on a fresh action record.
pub const PROGRESS_CREATED: &str = "created";

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// The live session slot of one device/application binding.
///
/// There is at most one of these per binding — issuing a new session
/// overwrites it, which is the entire revocation story: no list of
/// retired tokens is kept anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// The opaque session token.
    pub id: String,

    /// Absolute expiry, epoch milliseconds. `0` means never expires.
    pub timeout_at: u64,
}

/// Per-application state attached to a device.
///
/// Both fields are optional because device documents are written by the
/// registration flow, not by us, and broken bindings do occur in the
/// field. A binding without a `status` is reported to the device as a
/// wrongly-defined application (code 100003) rather than treated as
/// unregistered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppBinding {
    /// Registration status; must equal [`STATUS_REGISTERED`] for a
    /// session to be issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// The currently live session, if one was ever issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionRecord>,
}

/// A device document, as far as this pipeline reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// The device id (`_id` in the store).
    #[serde(rename = "_id")]
    pub id: String,

    /// Application id → binding. Absent on devices that have never
    /// registered an application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apps: Option<HashMap<String, AppBinding>>,
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

/// A registry record, deserialized only after it passes the
/// `APPLICATION` schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Human-readable application name.
    pub name: String,

    /// The application version the tokencard was issued for.
    pub version: Version,
}

/// An application's version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: i64,
    pub minor: i64,
}

// ---------------------------------------------------------------------------
// Actions (the outbox)
// ---------------------------------------------------------------------------

/// The resend contract handed to the delivery worker.
///
/// This pipeline only ever writes the initial values; the delivery
/// worker increments `num_resends`, advances `resend_after`, and stops
/// once `num_resends == max_resends` or the record's status goes
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendPolicy {
    /// Delivery attempts made so far. Always 0 at creation.
    pub num_resends: u32,

    /// Attempts after which the delivery worker gives up.
    pub max_resends: u32,

    /// Epoch ms of the next allowed delivery attempt. At creation this
    /// is `created_at + resend_timeout`.
    pub resend_after: u64,

    /// Gap between delivery attempts, milliseconds.
    pub resend_timeout: u64,
}

/// One entry of an action record's ordered progress log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// When this status was reached, epoch milliseconds.
    pub timestamp: u64,

    /// Status name; the first entry is always [`PROGRESS_CREATED`].
    pub status: String,
}

/// A durable device-bound response: the outbox entry the delivery worker
/// picks up.
///
/// Exactly one is created per inbound request that got far enough to be
/// attributed to a device — whether the outcome was success or error —
/// and it is never touched again by this pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// The device this response must be delivered to.
    pub device_id: DeviceId,

    /// Echoed from the request so the device can decrypt the payload.
    pub encryption: Encryption,

    /// Echoed from the request for correlation.
    pub request_id: RequestId,

    /// Always [`ACTION_RESPONSE`] for records produced by this flow.
    pub action: String,

    /// The payload to deliver: the success reply or the structured
    /// error.
    pub params: Reply,

    /// Integer state code owned by the delivery worker. Initialized
    /// to 0.
    pub status: i64,

    /// Creation time, epoch milliseconds.
    pub created_at: u64,

    /// When the record itself goes stale: `created_at` + 24 h.
    pub timeout_at: u64,

    /// Ordered, append-only status history.
    pub progress: Vec<ProgressEvent>,

    /// The retry contract for the delivery worker.
    pub resends: ResendPolicy,
}

// =========================================================================
// Tests
// =========================================================================
