//! Unified error type for the Tokengate worker.

use tokengate_protocol::ProtocolError;
use tokengate_store::StoreError;

/// Top-level error that wraps the crate-specific errors.
///
/// Note how little ends up here: domain outcomes are [`Reply`] values,
/// not errors, so this type only covers faults that stop the worker
/// itself — a reply that can't be encoded, or a store call made outside
/// the dispatch pipeline. The `#[from]` attributes let `?` convert
/// sub-crate errors automatically.
///
/// [`Reply`]: tokengate_protocol::Reply
#[derive(Debug, thiserror::Error)]
pub enum TokengateError {
    /// An encode/decode failure at the byte boundary.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A store fault outside the dispatch pipeline.
    #[error(transparent)]
    Store(#[from] StoreError),
}
