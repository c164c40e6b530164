//! # Tokengate
//!
//! The session-provisioning worker of a device-messaging platform: it
//! consumes session-request messages from a queue, validates them,
//! issues a time-bounded session token for a device/application
//! pairing, and records a durable device-bound response with delivery
//! retry metadata.
//!
//! The layers, top to bottom:
//!
//! ```text
//! SessionWorker   ← consume → dispatch → ack loop, heartbeat task
//! Dispatcher      ← envelope validation, app resolution, routing
//! SessionIssuer   ← binding checks, token issuance   (tokengate-session)
//! ActionRecorder  ← durable response records         (tokengate-outbox)
//! Stores          ← devices / applications / actions (tokengate-store)
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tokengate::SessionWorker;
//! use tokengate_bus::{MemoryQueue, memory_queue};
//! use tokengate_store::MemoryStore;
//!
//! # async fn run() -> Result<(), tokengate::TokengateError> {
//! let store = Arc::new(MemoryStore::new());
//! let (publisher, queue) = memory_queue();
//!
//! let worker = SessionWorker::<MemoryStore, MemoryQueue>::builder().build(store, queue);
//! worker.run().await
//! # }
//! ```

mod config;
mod dispatcher;
mod error;
mod heartbeat;
mod worker;

pub use config::WorkerConfig;
pub use dispatcher::Dispatcher;
pub use error::TokengateError;
pub use worker::{SessionWorker, SessionWorkerBuilder};
