use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Position, Sprite};
use crate::constants::{DEFAULT_CELL_SIDE, LAYER_ORDER, MAX_TABLE_SCALE, MIN_TABLE_SCALE};
use crate::types::Layer;

/// Axis-aligned rectangle in table coordinates, orientation-free (§3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub p1: Position,
    pub p2: Position,
}

impl Rect {
    pub fn new(p1: Position, p2: Position) -> Self {
        Rect { p1, p2 }
    }

    /// Returns `(min_x, min_y, max_x, max_y)` regardless of corner order.
    pub fn normalized(&self) -> (f64, f64, f64, f64) {
        (
            self.p1.x.min(self.p2.x),
            self.p1.y.min(self.p2.y),
            self.p1.x.max(self.p2.x),
            self.p1.y.max(self.p2.y),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FogRectangles {
    pub hide: Vec<Rect>,
    pub reveal: Vec<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A table's full scene state (§3/§4.3): layered sprites, view transform,
/// fog state, and grid settings. `screen_area` starts unset — transform
/// methods are no-ops until the layout manager calls `set_screen_area`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub table_id: String,
    pub name: String,
    pub width: f64,
    pub height: f64,

    pub viewport_x: f64,
    pub viewport_y: f64,
    pub table_scale: f64,
    pub screen_area: Option<ScreenArea>,

    pub selected_sprite: Option<String>,
    pub selected_layer: Layer,

    pub fog_rectangles: FogRectangles,

    pub show_grid: bool,
    pub cell_side: i64,

    pub layers: HashMap<Layer, Vec<Sprite>>,
}

impl Table {
    pub fn new(table_id: impl Into<String>, name: impl Into<String>, width: f64, height: f64) -> Self {
        let mut layers = HashMap::with_capacity(LAYER_ORDER.len());
        for layer in LAYER_ORDER {
            layers.insert(layer, Vec::new());
        }
        Table {
            table_id: table_id.into(),
            name: name.into(),
            width,
            height,
            viewport_x: 0.0,
            viewport_y: 0.0,
            table_scale: 1.0,
            screen_area: None,
            selected_sprite: None,
            selected_layer: Layer::Tokens,
            fog_rectangles: FogRectangles::default(),
            show_grid: false,
            cell_side: DEFAULT_CELL_SIDE,
            layers,
        }
    }

    pub fn set_screen_area(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.screen_area = Some(ScreenArea { x, y, width, height });
    }

    /// §4.3 `table_to_screen`. Returns the input unchanged if no screen
    /// area has been set yet.
    pub fn table_to_screen(&self, tx: f64, ty: f64) -> (f64, f64) {
        let Some(area) = self.screen_area else {
            return (tx, ty);
        };
        (
            area.x + (tx - self.viewport_x) * self.table_scale,
            area.y + (ty - self.viewport_y) * self.table_scale,
        )
    }

    /// §4.3 `screen_to_table`.
    pub fn screen_to_table(&self, px: f64, py: f64) -> (f64, f64) {
        let Some(area) = self.screen_area else {
            return (px, py);
        };
        (
            (px - area.x) / self.table_scale + self.viewport_x,
            (py - area.y) / self.table_scale + self.viewport_y,
        )
    }

    pub fn is_point_in_screen_area(&self, px: f64, py: f64) -> bool {
        let Some(area) = self.screen_area else {
            return false;
        };
        px >= area.x && px <= area.x + area.width && py >= area.y && py <= area.y + area.height
    }

    /// §4.3 `pan`: shifts the viewport by `(dx, dy)` screen pixels, then
    /// clamps so the visible window stays within `[0, width] x [0, height]`.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.viewport_x += dx / self.table_scale;
        self.viewport_y += dy / self.table_scale;

        if let Some(area) = self.screen_area {
            let visible_w = area.width / self.table_scale;
            let visible_h = area.height / self.table_scale;
            self.viewport_x = self.viewport_x.clamp(0.0, (self.width - visible_w).max(0.0));
            self.viewport_y = self.viewport_y.clamp(0.0, (self.height - visible_h).max(0.0));
        }
    }

    /// §4.3 `zoom`: multiplies `table_scale` by `factor`, clamped to
    /// `[0.1, 5.0]`. If a center point (table coords) is given, the
    /// viewport is adjusted so that point stays stationary.
    pub fn zoom(&mut self, factor: f64, center: Option<(f64, f64)>) {
        let old_scale = self.table_scale;
        self.table_scale = (self.table_scale * factor).clamp(MIN_TABLE_SCALE, MAX_TABLE_SCALE);

        if let Some((cx, cy)) = center {
            let scale_diff = self.table_scale / old_scale;
            self.viewport_x = cx - (cx - self.viewport_x) * scale_diff;
            self.viewport_y = cy - (cy - self.viewport_y) * scale_diff;
        }
    }

    /// §4.3 sprite bounds / `out_of_bounds`.
    pub fn sprite_out_of_bounds(&self, sprite: &Sprite) -> bool {
        let (near, far) = sprite.table_bounds();
        near.x < 0.0 || near.y < 0.0 || far.x > self.width || far.y > self.height
    }

    /// §4.3 `constrain_to_bounds`: clamps `position` so the full sprite
    /// extent fits within `[0, width] x [0, height]`.
    pub fn constrain_sprite_to_bounds(&self, sprite: &mut Sprite) {
        let sprite_w = sprite.original_w * sprite.scale_x;
        let sprite_h = sprite.original_h * sprite.scale_y;
        sprite.position.x = sprite.position.x.clamp(0.0, (self.width - sprite_w).max(0.0));
        sprite.position.y = sprite.position.y.clamp(0.0, (self.height - sprite_h).max(0.0));
    }

    pub fn sprites_in_layer(&self, layer: Layer) -> &[Sprite] {
        self.layers.get(&layer).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn find_sprite(&self, sprite_id: &str) -> Option<&Sprite> {
        self.layers
            .values()
            .flat_map(|v| v.iter())
            .find(|s| s.sprite_id == sprite_id)
    }

    pub fn find_sprite_mut(&mut self, sprite_id: &str) -> Option<&mut Sprite> {
        self.layers
            .values_mut()
            .flat_map(|v| v.iter_mut())
            .find(|s| s.sprite_id == sprite_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_area() -> Table {
        let mut t = Table::new("t1", "Test Table", 1000.0, 1000.0);
        t.set_screen_area(0.0, 0.0, 800.0, 600.0);
        t
    }

    #[test]
    fn table_to_screen_roundtrips_through_screen_to_table() {
        let t = table_with_area();
        let (sx, sy) = t.table_to_screen(123.4, 56.7);
        let (tx, ty) = t.screen_to_table(sx, sy);
        assert!((tx - 123.4).abs() < 1e-9);
        assert!((ty - 56.7).abs() < 1e-9);
    }

    #[test]
    fn zoom_keeps_center_point_stationary() {
        let mut t = table_with_area();
        t.viewport_x = 50.0;
        t.viewport_y = 50.0;
        let (sx_before, sy_before) = t.table_to_screen(200.0, 200.0);
        t.zoom(2.0, Some((200.0, 200.0)));
        let (sx_after, sy_after) = t.table_to_screen(200.0, 200.0);
        assert!((sx_before - sx_after).abs() < 1e-6);
        assert!((sy_before - sy_after).abs() < 1e-6);
    }

    #[test]
    fn zoom_clamps_to_scale_bounds() {
        let mut t = table_with_area();
        t.zoom(100.0, None);
        assert_eq!(t.table_scale, MAX_TABLE_SCALE);
        t.zoom(0.0001, None);
        assert_eq!(t.table_scale, MIN_TABLE_SCALE);
    }

    #[test]
    fn constrain_sprite_to_bounds_clamps_into_table() {
        let t = Table::new("t1", "Test", 100.0, 100.0);
        let mut sprite = Sprite::new("s1", Position::new(150.0, -20.0), Layer::Tokens);
        sprite.original_w = 10.0;
        sprite.original_h = 10.0;
        t.constrain_sprite_to_bounds(&mut sprite);
        assert_eq!(sprite.position, Position::new(90.0, 0.0));
    }

    #[test]
    fn out_of_bounds_detects_sprite_past_the_far_edge() {
        let t = Table::new("t1", "Test", 100.0, 100.0);
        let mut sprite = Sprite::new("s1", Position::new(95.0, 0.0), Layer::Tokens);
        sprite.original_w = 10.0;
        sprite.original_h = 10.0;
        assert!(t.sprite_out_of_bounds(&sprite));
    }
}
