//! Authoritative server: table manager, action core, character store,
//! and the replication surface (§4.5–§4.7).

pub mod action_core;
pub mod broadcast;
pub mod character_store;
pub mod chat;
pub mod config;
pub mod error;
pub mod logging;
pub mod net;
pub mod persistence;
pub mod table_manager;

pub use error::ServerError;
