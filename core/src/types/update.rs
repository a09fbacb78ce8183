use super::Position;

/// Optional-field patch applied by `update_table` (client and server action
/// surfaces). Typed equivalent of the original's kwargs-shaped partial
/// update: only the fields that are `Some` get applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableUpdate {
    pub name: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl TableUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.width.is_none() && self.height.is_none()
    }
}

/// Optional-field patch applied by `update_sprite`. `layer` is deliberately
/// absent here — moving a sprite between layer buckets is `move_sprite_to_layer`'s
/// job, since sprites are stored keyed by layer rather than as a flat list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteUpdate {
    pub position: Option<Position>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub rotation: Option<f64>,
    pub visible: Option<bool>,
    pub texture_path: Option<String>,
}

impl SpriteUpdate {
    pub fn is_empty(&self) -> bool {
        self.position.is_none()
            && self.scale_x.is_none()
            && self.scale_y.is_none()
            && self.rotation.is_none()
            && self.visible.is_none()
            && self.texture_path.is_none()
    }
}
