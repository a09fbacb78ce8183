//! Internal plumbing errors (§7 tier 2). Operation-boundary methods on
//! `ActionCore`/`CharacterStore` return `Result<_, vtt_core::VttError>`;
//! this enum is for the things underneath that — persistence I/O, lock
//! poisoning — composed with `anyhow::Context` at the task boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("persistence backend error: {0}")]
    Persistence(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("session lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Core(#[from] vtt_core::VttError),
}
