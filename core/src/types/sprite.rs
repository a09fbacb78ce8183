use serde::{Deserialize, Serialize};

use super::Position;

/// Fixed render/z order (§3). Variant declaration order IS the z order —
/// do not reorder without checking every caller of `crate::constants::LAYER_ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Map,
    Tokens,
    DungeonMaster,
    Light,
    Height,
    Obstacles,
    FogOfWar,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Map => "map",
            Layer::Tokens => "tokens",
            Layer::DungeonMaster => "dungeon_master",
            Layer::Light => "light",
            Layer::Height => "height",
            Layer::Obstacles => "obstacles",
            Layer::FogOfWar => "fog_of_war",
        }
    }

    pub fn from_str(s: &str) -> Option<Layer> {
        Some(match s {
            "map" => Layer::Map,
            "tokens" => Layer::Tokens,
            "dungeon_master" => Layer::DungeonMaster,
            "light" => Layer::Light,
            "height" => Layer::Height,
            "obstacles" => Layer::Obstacles,
            "fog_of_war" => Layer::FogOfWar,
            _ => return None,
        })
    }
}

impl Default for Layer {
    fn default() -> Self {
        Layer::Tokens
    }
}

/// A placeable entity on a table (§3). `frect` is a cached derived value,
/// not a source of truth — it must be recomputed whenever `position`,
/// scale, or the owning table's view state changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub sprite_id: String,
    pub asset_id: Option<String>,
    pub asset_xxhash: Option<String>,

    pub position: Position,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub layer: Layer,
    pub visible: bool,
    pub collidable: bool,

    pub texture_path: Option<String>,
    pub original_w: f64,
    pub original_h: f64,

    /// Opaque server-side character payload, present only for token sprites
    /// bound to a `Character`.
    pub character_id: Option<String>,
}

impl Sprite {
    pub fn new(sprite_id: impl Into<String>, position: Position, layer: Layer) -> Self {
        Sprite {
            sprite_id: sprite_id.into(),
            asset_id: None,
            asset_xxhash: None,
            position,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            layer,
            visible: true,
            collidable: true,
            texture_path: None,
            original_w: 0.0,
            original_h: 0.0,
            character_id: None,
        }
    }

    /// §3 invariant: `scale_x, scale_y > 0`.
    pub fn has_valid_scale(&self) -> bool {
        self.scale_x > 0.0 && self.scale_y > 0.0
    }

    /// Table-space extents, per §4.3 ("Sprite bounds").
    pub fn table_bounds(&self) -> (Position, Position) {
        let far = Position::new(
            self.position.x + self.original_w * self.scale_x,
            self.position.y + self.original_h * self.scale_y,
        );
        (self.position, far)
    }

    /// True if a sprite rectangle has nonzero area, i.e. is a valid
    /// obstacle-extraction candidate (§4.1).
    pub fn has_nonzero_area(&self) -> bool {
        self.original_w * self.scale_x > 0.0 && self.original_h * self.scale_y > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_order_matches_fixed_enum_sequence() {
        assert_eq!(crate::constants::LAYER_ORDER[0], Layer::Map);
        assert_eq!(crate::constants::LAYER_ORDER[6], Layer::FogOfWar);
    }

    #[test]
    fn layer_round_trips_through_str() {
        for layer in crate::constants::LAYER_ORDER {
            assert_eq!(Layer::from_str(layer.as_str()), Some(layer));
        }
    }

    #[test]
    fn zero_width_sprite_has_no_area() {
        let mut s = Sprite::new("s1", Position::ZERO, Layer::Tokens);
        s.original_w = 0.0;
        s.original_h = 40.0;
        assert!(!s.has_nonzero_area());
    }
}
