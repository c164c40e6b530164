//! Stable numeric error codes.
//!
//! These are the only machine-consumable error discriminant — the
//! free-text `error` strings exist for humans and must never be pattern
//! matched. The `100xxx` range covers validation and domain errors
//! (terminal, reported to the device, never retried); the `200xxx` range
//! covers store faults, one code per failing operation, so an operator
//! can tell from the code alone which store call fell over.

/// The envelope, body, or a looked-up record failed schema validation,
/// or a binding is structurally broken (missing `status`).
pub const SCHEMA_INVALID: u32 = 100_003;

/// The application has no binding on the requesting device.
pub const APP_NOT_REGISTERED: u32 = 100_012;

/// No application matches the request's tokencard id.
pub const APP_NOT_FOUND: u32 = 100_016;

/// The request outlived its `ttl` before it was processed.
pub const MESSAGE_EXPIRED: u32 = 100_017;

/// The request's `header.type` is not one this worker routes.
pub const BAD_MESSAGE_TYPE: u32 = 100_018;

/// The device's binding exists but its status is not `"registered"`.
pub const APP_NOT_ACTIVE: u32 = 100_032;

/// The document store could not be reached at all.
pub const STORE_UNAVAILABLE: u32 = 200_001;

/// The application registry lookup failed.
pub const APP_LOOKUP_FAILED: u32 = 200_002;

/// Persisting the device-bound action record failed.
pub const ACTION_INSERT_FAILED: u32 = 200_003;

/// Reading or updating the device record failed.
pub const DEVICE_STORE_FAILED: u32 = 200_004;
