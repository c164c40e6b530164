//! Session issuance for Tokengate.
//!
//! This crate owns the one real business decision of the pipeline:
//! whether a device/application pairing gets a session token, and with
//! what expiry.
//!
//! 1. **Body validation** — the session body must conform to its schema.
//! 2. **Binding checks** — the device must exist, carry a binding for
//!    the requesting application, and that binding must be
//!    `"registered"`.
//! 3. **Issuance** — a fresh random token is written into the binding's
//!    session slot, replacing whatever token was there before.
//!
//! # How it fits in the stack
//!
//! ```text
//! Dispatcher (above)   ← routes "session" requests here
//!     ↕
//! Issuer (this crate)  ← decides and issues
//!     ↕
//! Store (below)        ← devices collection, targeted session update
//! ```

mod issuer;
mod token;

pub use issuer::SessionIssuer;
pub use token::{TOKEN_LEN, generate_token};
