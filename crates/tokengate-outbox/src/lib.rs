//! The action outbox: durable device-bound responses.
//!
//! Devices are not request/response peers — a reply can't just be sent
//! back down a socket, because the device may be asleep, offline, or on
//! a flaky link. Instead, every outcome (success *or* refusal) is
//! persisted as an [`ActionRecord`] with delivery/retry metadata, and a
//! separate delivery worker owns actually getting it to the device.
//!
//! This crate produces those records; it never consumes them. The
//! `resends` block it writes is a contract: the delivery worker
//! increments `numResends`, advances `resendAfter`, and stops at
//! `maxResends` or a terminal status.
//!
//! [`ActionRecord`]: tokengate_store::ActionRecord

mod recorder;

pub use recorder::{ActionRecorder, OutboxConfig};
