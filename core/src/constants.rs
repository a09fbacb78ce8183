//! Numeric configuration shared by the geometry kernel, scene model, and
//! the action surfaces. Values are fixed contracts (§6); they are not
//! meant to be tuned at runtime.

/// Shadow-edge perturbation, in radians, used when casting the pair of
/// rays around each obstacle endpoint angle.
pub const SHADOW_EPSILON: f64 = 1e-3;

/// Epsilon used both for the parallel-line denominator check in
/// line/line intersection and for vertex deduplication after rounding.
pub const GEOMETRY_EPSILON: f64 = 1e-10;

/// Default maximum view distance, in table units, for visibility queries.
pub const DEFAULT_VIEW_DISTANCE: f64 = 500.0;

/// Zoom clamp range for `Table::table_scale`.
pub const MIN_TABLE_SCALE: f64 = 0.1;
pub const MAX_TABLE_SCALE: f64 = 5.0;

/// Bound on the client-side undo/redo history ring buffer.
pub const HISTORY_DEPTH: usize = 100;

/// Bound on the render manager's visibility-polygon cache.
pub const VISIBILITY_CACHE_SIZE: usize = 128;

/// Delay before a dirty table is flushed to storage, in seconds.
pub const DEBOUNCE_SAVE_SECONDS: u64 = 2;

/// Bound on how many chat lines a session's `chat_messages` list retains.
pub const CHAT_HISTORY_DEPTH: usize = 200;

/// Grid line spacing, in table units, when `Table::show_grid` is set.
pub const GRID_CELL_SIDE: i64 = 50;

/// Default cell side recorded on a freshly created table (distinct from
/// the render grid spacing; mirrors the source's `CELL_SIDE` constant).
pub const DEFAULT_CELL_SIDE: i64 = 20;

/// Fixed render/z order of scene layers. Order is semantic and must never
/// change at runtime — see [`crate::types::Layer`].
pub const LAYER_ORDER: [crate::types::Layer; 7] = [
    crate::types::Layer::Map,
    crate::types::Layer::Tokens,
    crate::types::Layer::DungeonMaster,
    crate::types::Layer::Light,
    crate::types::Layer::Height,
    crate::types::Layer::Obstacles,
    crate::types::Layer::FogOfWar,
];
