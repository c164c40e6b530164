//! Error types for the store layer.

use tokengate_protocol::{ErrorDetail, ErrorReply, codes};

/// A store fault, tagged with the operation that failed.
///
/// One variant per operation, because the error taxonomy assigns a
/// distinct `200xxx` code to each failing store call — the code is how
/// an operator tells a broken application registry from a broken device
/// collection without reading log text.
///
/// Store faults are infrastructure errors: they are surfaced to the
/// caller, never retried inside the pipeline. Retry belongs to the bus's
/// redelivery mechanism (for the request) or the delivery worker (for
/// the response).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Looking up an application registry record failed.
    #[error("application lookup failed: {0}")]
    ApplicationLookup(String),

    /// Reading a device's bindings failed.
    #[error("device lookup failed: {0}")]
    DeviceLookup(String),

    /// Writing a device's session sub-record failed.
    #[error("device update failed: {0}")]
    DeviceUpdate(String),

    /// Appending to the action outbox failed.
    #[error("action insert failed: {0}")]
    ActionInsert(String),
}

impl StoreError {
    /// The stable numeric code for this fault.
    pub fn error_code(&self) -> u32 {
        match self {
            StoreError::Unavailable(_) => codes::STORE_UNAVAILABLE,
            StoreError::ApplicationLookup(_) => codes::APP_LOOKUP_FAILED,
            StoreError::DeviceLookup(_) | StoreError::DeviceUpdate(_) => {
                codes::DEVICE_STORE_FAILED
            }
            StoreError::ActionInsert(_) => codes::ACTION_INSERT_FAILED,
        }
    }
}

/// A store fault becomes a coded error reply when it has to be reported
/// to the device. This is what makes `?` work in the issuance pipeline:
/// store operations early-return straight into the reply type.
impl From<StoreError> for ErrorReply {
    fn from(err: StoreError) -> Self {
        ErrorReply {
            error: ErrorDetail::Message(err.to_string()),
            error_code: Some(err.error_code()),
        }
    }
}
