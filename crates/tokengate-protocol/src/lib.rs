//! Wire protocol for Tokengate.
//!
//! This crate defines the "language" spoken between the device-messaging
//! bus and the session-provisioning worker:
//!
//! - **Types** ([`Envelope`], [`Header`], [`Reply`], etc.) — the message
//!   structures that arrive on the queue and the replies that go back.
//! - **Schemas** ([`schema`]) — named, immutable schema descriptors and a
//!   pure validator, applied before any typed deserialization happens.
//! - **Codes** ([`codes`]) — the stable numeric error codes that are the
//!   only machine-readable error discriminant.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding or
//!   decoding raw queue bytes.
//!
//! # Architecture
//!
//! The protocol layer sits between the bus (raw bytes) and the dispatcher
//! (decision logic). It doesn't know about queues or document stores —
//! it only knows message shapes and how to judge them.
//!
//! ```text
//! Bus (bytes) → Protocol (Envelope / Reply) → Dispatcher (decisions)
//! ```

pub mod codes;
mod error;
pub mod schema;
mod time;
mod types;

pub use error::ProtocolError;
pub use time::now_ms;
pub use types::{
    AppId, DeviceId, Encryption, Envelope, ErrorDetail, ErrorReply, Header,
    REQUEST_TYPE_SESSION, Reply, RequestId, SessionBody, SessionReply,
};
