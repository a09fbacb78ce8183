//! Client-side scene model, rendering pipeline, action bus, and
//! replication handling (§4.3–§4.6, §4.8). No platform/window code lives
//! here — `render::RenderBackend` is the seam a real SDL/GPU layer would
//! implement.

pub mod action_bus;
pub mod gui_bridge;
pub mod logging;
pub mod render;
pub mod replication;
pub mod scene;

pub use vtt_core::{error::VttError, types};
