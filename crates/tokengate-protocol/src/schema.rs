//! Named schema descriptors and a pure structural validator.
//!
//! Inbound messages are untrusted JSON, and so are some of the documents
//! we read back from the store (the application registry predates this
//! worker and its records have been hand-edited more than once). Before
//! anything is deserialized into a typed struct it is checked against a
//! declared [`Schema`].
//!
//! The validator is a pure function: no side effects, never panics, and
//! validation failures are *values* (a list of human-readable failure
//! strings), not errors — every caller maps them onto its own domain
//! error code.
//!
//! Schemas are built once as statics ([`ENVELOPE`], [`APPLICATION`],
//! [`SESSION_BODY`]) rather than assembled per call; they are plain
//! `&'static` data with no interior mutability.

use serde_json::Value;

// ---------------------------------------------------------------------------
// Schema descriptors
// ---------------------------------------------------------------------------

/// The expected type of a single field.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    /// A JSON string.
    Text,

    /// A JSON integer, any sign.
    Int,

    /// A JSON integer that must be >= 0 (timestamps, ttls, timeouts).
    UInt,

    /// A nested object with its own declared fields.
    Object(&'static [Field]),

    /// An object whose shape is checked later, per request type.
    AnyObject,
}

/// One required field of an object schema.
///
/// Every field in the wire format is required; optionality is expressed
/// by a field simply not being declared here.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// The JSON key, as it appears on the wire.
    pub name: &'static str,

    /// What the value must look like.
    pub kind: Kind,
}

/// A declared contract for a JSON object.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// The top-level fields the instance must carry.
    pub root: &'static [Field],
}

// ---------------------------------------------------------------------------
// The three contracts this pipeline checks
// ---------------------------------------------------------------------------

/// The full request envelope, checked before anything else happens.
///
/// Note that `header.type` only has to be *a string* — unknown request
/// types pass the schema and are rejected by the dispatcher with code
/// 100018, so future request types don't need a schema change.
pub static ENVELOPE: Schema = Schema {
    root: &[
        Field {
            name: "header",
            kind: Kind::Object(&[
                Field { name: "requestId", kind: Kind::Text },
                Field { name: "deviceId", kind: Kind::Text },
                Field { name: "type", kind: Kind::Text },
                Field { name: "timestamp", kind: Kind::UInt },
                Field { name: "ttl", kind: Kind::UInt },
                Field {
                    name: "encryption",
                    kind: Kind::Object(&[
                        Field { name: "method", kind: Kind::Text },
                        Field { name: "tokencardId", kind: Kind::Text },
                    ]),
                },
            ]),
        },
        Field { name: "body", kind: Kind::AnyObject },
    ],
};

/// The shape of an application registry record.
pub static APPLICATION: Schema = Schema {
    root: &[
        Field { name: "name", kind: Kind::Text },
        Field {
            name: "version",
            kind: Kind::Object(&[
                Field { name: "major", kind: Kind::Int },
                Field { name: "minor", kind: Kind::Int },
            ]),
        },
    ],
};

/// The body of a session request.
pub static SESSION_BODY: Schema = Schema {
    root: &[Field { name: "timeout", kind: Kind::UInt }],
};

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validates a JSON instance against a schema.
///
/// Returns `Ok(())` when the instance conforms, or the full list of
/// failures (dotted paths, e.g. `"header.ttl: expected a non-negative
/// integer"`) when it doesn't. All failures are collected, not just the
/// first — a device developer fixing a malformed request wants to see
/// everything that's wrong at once.
pub fn validate(instance: &Value, schema: &Schema) -> Result<(), Vec<String>> {
    let mut failures = Vec::new();
    check_object(instance, schema.root, "", &mut failures);
    if failures.is_empty() { Ok(()) } else { Err(failures) }
}

/// Checks that `value` is an object carrying every declared field.
fn check_object(
    value: &Value,
    fields: &[Field],
    path: &str,
    failures: &mut Vec<String>,
) {
    let Some(map) = value.as_object() else {
        failures.push(format!("{}: expected an object", display_path(path)));
        return;
    };

    for field in fields {
        let child_path = join_path(path, field.name);
        match map.get(field.name) {
            None => failures
                .push(format!("{child_path}: required property is missing")),
            Some(child) => check_field(child, field.kind, &child_path, failures),
        }
    }
}

/// Checks a single present field against its declared kind.
fn check_field(
    value: &Value,
    kind: Kind,
    path: &str,
    failures: &mut Vec<String>,
) {
    match kind {
        Kind::Text => {
            if !value.is_string() {
                failures.push(format!("{path}: expected a string"));
            }
        }
        Kind::Int => {
            if !value.is_i64() && !value.is_u64() {
                failures.push(format!("{path}: expected an integer"));
            }
        }
        Kind::UInt => {
            if !value.is_u64() {
                failures
                    .push(format!("{path}: expected a non-negative integer"));
            }
        }
        Kind::Object(fields) => check_object(value, fields, path, failures),
        Kind::AnyObject => {
            if !value.is_object() {
                failures.push(format!("{path}: expected an object"));
            }
        }
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "instance" } else { path }
}

// =========================================================================
// Tests
// =========================================================================
