//! Structured error kinds for the action surfaces (§7).
//!
//! The action bus and action core never raise these across the operation
//! boundary — they fold them into an `ActionResult`/`message` string. This
//! type exists so callers that *do* want to match on failure kind (retry
//! logic, HTTP status mapping) have something more useful than a string.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VttError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("duplicate {kind}: {id}")]
    Duplicate { kind: &'static str, id: String },

    #[error("position desync for sprite {sprite_id}: expected {expected:?}, server has {actual:?}")]
    Desync {
        sprite_id: String,
        expected: (f64, f64),
        actual: (f64, f64),
    },

    #[error("version conflict: expected {expected}, current is {current}")]
    VersionConflict { expected: u64, current: u64 },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("asset error: {0}")]
    Asset(String),
}

impl VttError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        VttError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// A short, user-facing message suitable for `ActionResult::message`.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
