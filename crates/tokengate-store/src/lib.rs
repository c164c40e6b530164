//! Document model and store abstraction for Tokengate.
//!
//! The platform keeps its state in a document store with three logical
//! collections plus a control database:
//!
//! - `devices` — one document per device, carrying per-application
//!   bindings (`apps.<appId>.status`, `apps.<appId>.session`)
//! - `applications` — the read-only application registry
//! - `actions` — the append-only outbox of device-bound responses
//! - heartbeats — process liveness records in the control database
//!
//! This crate doesn't talk to a real database. It defines the *traits*
//! the pipeline needs ([`DeviceStore`], [`ApplicationStore`],
//! [`ActionStore`], [`HeartbeatStore`]) — narrow, per-collection
//! contracts shaped exactly like the queries the pipeline makes — plus
//! [`MemoryStore`], an in-process implementation used by tests and the
//! demo. A production deployment implements the same traits over its
//! database driver.
//!
//! # Why traits per collection?
//!
//! The session issuer only ever reads and writes devices; the recorder
//! only ever inserts actions. Splitting the contract along collection
//! lines means each component states precisely which storage it touches,
//! and tests can inject faults into one operation without stubbing a
//! whole database.

use std::collections::HashMap;
use std::future::Future;

use serde_json::Value;
use tokengate_protocol::{AppId, DeviceId};

mod documents;
mod error;
mod memory;

pub use documents::{
    ACTION_RESPONSE, ActionRecord, AppBinding, Application, Device,
    PROGRESS_CREATED, ProgressEvent, ResendPolicy, STATUS_REGISTERED,
    SessionRecord, Version,
};
pub use error::StoreError;
pub use memory::{FaultPoint, MemoryStore};

/// Read access to the application registry.
///
/// The record comes back as raw JSON: the registry predates this worker
/// and its documents are shape-checked by the schema validator before
/// anything trusts them.
pub trait ApplicationStore: Send + Sync + 'static {
    /// Looks up an application by its tokencard id.
    ///
    /// Returns `Ok(None)` when no such application exists — that is a
    /// domain outcome, not a store error.
    fn find_application(
        &self,
        id: &AppId,
    ) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;
}

/// Read/write access to device records.
pub trait DeviceStore: Send + Sync + 'static {
    /// Fetches a device's application bindings.
    ///
    /// This is a projection — only the `apps` map is read, never the
    /// full device document. `Ok(None)` means the device doesn't exist
    /// *or* has no bindings map; the pipeline treats both the same way.
    fn app_bindings(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<HashMap<String, AppBinding>>, StoreError>>
    + Send;

    /// Overwrites the session sub-record of one binding.
    ///
    /// A targeted per-field update keyed by device id, not a full
    /// document rewrite: concurrent writers to *other* bindings of the
    /// same device must not be clobbered. Writing over an existing
    /// session is the normal reissue path — the old token simply stops
    /// being current.
    fn set_session(
        &self,
        id: &DeviceId,
        app: &AppId,
        session: SessionRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Append access to the action outbox.
pub trait ActionStore: Send + Sync + 'static {
    /// Inserts one action record. Records are never updated by this
    /// pipeline after insertion — the resend metadata is a contract for
    /// the delivery worker downstream.
    fn insert_action(
        &self,
        record: ActionRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Liveness records in the control database.
pub trait HeartbeatStore: Send + Sync + 'static {
    /// Upserts the heartbeat for one process on one server.
    fn record_heartbeat(
        &self,
        process: &str,
        server: &str,
        at_ms: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
