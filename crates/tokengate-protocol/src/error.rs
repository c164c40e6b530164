//! Error types for the protocol layer.
//!
//! These cover only the byte boundary — turning queue bytes into JSON
//! and replies back into bytes. Domain failures (bad envelopes, unknown
//! applications, ...) are *not* errors here: they are [`Reply`] values
//! with numeric codes, because they travel back to the device.
//!
//! [`Reply`]: crate::Reply

/// Errors that can occur while encoding or decoding queue messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a reply failed. Should not happen for the types this
    /// crate defines; surfacing it beats silently dropping the ack.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The inbound message body is not valid JSON at all.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
