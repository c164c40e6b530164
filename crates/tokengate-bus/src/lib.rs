//! Message-bus abstraction for Tokengate.
//!
//! The worker consumes from a durable queue, processes one message at a
//! time, and acknowledges each message only after the full pipeline has
//! run. This crate defines that contract — [`MessageQueue`] and
//! [`Delivery`] — without binding to any particular broker, plus an
//! in-process channel-backed queue ([`MemoryQueue`]) used by tests and
//! the demo.
//!
//! # Acknowledgement contract
//!
//! - [`Delivery::ack`] settles the message for good and hands the
//!   processing outcome to whoever published it.
//! - A `Delivery` that is *dropped without being acked* — the handler
//!   panicked, the task was cancelled, the process died mid-message —
//!   goes back on the queue. Broker redelivery is the outer retry loop
//!   for infrastructure failures; it is distinct from the action
//!   records' own resend policy, which governs delivery to the device.
//!
//! Handled errors (validation refusals, domain refusals, even store
//! faults that were mapped to coded replies) are normal outcomes and
//! are acked: redelivering a request that was already decided would just
//! decide it again.

mod memory;

pub use memory::{MemoryDelivery, MemoryQueue, QueuePublisher, memory_queue};

use std::future::Future;

/// One message taken off the queue, awaiting acknowledgement.
pub trait Delivery: Send + 'static {
    /// The raw message body.
    fn body(&self) -> &[u8];

    /// Settles the message with its processing outcome.
    ///
    /// Consumes the delivery: a message can only be settled once.
    fn ack(self, outcome: Vec<u8>) -> impl Future<Output = ()> + Send;
}

/// A subscription to the session-request queue.
///
/// Implementations deliver messages strictly one `recv` at a time; the
/// serialized consume loop in the worker is what gives the pipeline its
/// prefetch-count-1 semantics.
pub trait MessageQueue: Send + 'static {
    /// The delivery type produced by this queue.
    type Delivery: Delivery;

    /// Waits for the next message.
    ///
    /// Returns `None` once the queue is closed and drained — the
    /// worker's signal to shut down.
    fn recv(&mut self) -> impl Future<Output = Option<Self::Delivery>> + Send;
}
