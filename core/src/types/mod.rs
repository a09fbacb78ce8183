//! Shared data model (§3): plain structs and enums with `serde` derives.
//! Nothing here performs I/O; mutation helpers that belong to the action
//! surfaces live in `client`/`server`, not here.

mod action;
mod character;
mod chat;
mod message;
mod sprite;
mod table;
mod update;

pub use action::ActionRecord;
pub use character::{Character, CharacterSummary};
pub use chat::ChatMessage;
pub use message::{Message, MessageType};
pub use sprite::{Layer, Sprite};
pub use table::{FogRectangles, Rect as TableRect, ScreenArea, Table};
pub use update::{SpriteUpdate, TableUpdate};

/// Table-space position. Screen-space points use the same shape but are
/// kept as raw `(f64, f64)` tuples to avoid mixing the two spaces by
/// accident at the type level where it matters (see `Table::table_to_screen`).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub const ZERO: Position = Position { x: 0.0, y: 0.0 };
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Position { x, y }
    }
}

impl From<Position> for (f64, f64) {
    fn from(p: Position) -> Self {
        (p.x, p.y)
    }
}
