//! Render manager (§4.4). The actual pixel-pushing backend (SDL/GPU) is
//! explicitly out of scope (§1 window/input platform layer); `RenderBackend`
//! is the seam a concrete backend implements. What lives here is the
//! policy: layer iteration order, fog texture rebuild triggers, the
//! visibility-polygon cache, and the fog tool state machine.

use std::collections::HashMap;

use vtt_core::constants::VISIBILITY_CACHE_SIZE;
use vtt_core::geometry::{self, Point, Segment};
use vtt_core::types::{Layer, Table, TableRect};
use vtt_core::vertex::{self, Color, Vertex};

/// Per-layer appearance (§4.4 step 4). `blend_mode` names the four modes
/// a table layer can use; a real backend maps them to its own enum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlendMode {
    Alpha,
    Additive,
    Modulate,
    Multiply,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerSettings {
    pub color: Color,
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub is_visible: bool,
    pub z_order: u32,
}

impl LayerSettings {
    pub fn new(z_order: u32) -> Self {
        LayerSettings {
            color: Color::rgba(1.0, 1.0, 1.0, 1.0),
            opacity: 1.0,
            blend_mode: BlendMode::Alpha,
            is_visible: true,
            z_order,
        }
    }
}

/// Anything a concrete rendering backend (SDL2, wgpu, ...) must provide so
/// `RenderManager` can drive a frame without knowing about windows, GPU
/// handles, or pixel formats.
pub trait RenderBackend {
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color);
    fn draw_vertices(&mut self, vertices: &[Vertex]);
    fn ensure_fog_texture(&mut self, width: u32, height: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FogCacheKey {
    hide_len: usize,
    reveal_len: usize,
    viewport: (i64, i64),
    scale_bits: u64,
    screen_w: u32,
    screen_h: u32,
}

impl FogCacheKey {
    fn from_table(table: &Table) -> Self {
        let area = table.screen_area.unwrap_or(vtt_core::types::ScreenArea {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        });
        FogCacheKey {
            hide_len: table.fog_rectangles.hide.len(),
            reveal_len: table.fog_rectangles.reveal.len(),
            viewport: (table.viewport_x as i64, table.viewport_y as i64),
            scale_bits: table.table_scale.to_bits(),
            screen_w: area.width as u32,
            screen_h: area.height as u32,
        }
    }
}

/// Rebuild-on-change policy for the fog texture (§4.4 "Fog texture
/// caching"). Doesn't hold the texture itself — that's the backend's job
/// via `ensure_fog_texture` — just tracks whether the inputs changed.
#[derive(Debug, Default)]
pub struct FogTextureCache {
    last_key: Option<FogCacheKey>,
}

impl FogTextureCache {
    pub fn new() -> Self {
        FogTextureCache::default()
    }

    /// Returns `true` if the caller must rebuild the fog texture this frame.
    pub fn needs_rebuild(&mut self, table: &Table) -> bool {
        let key = FogCacheKey::from_table(table);
        let dirty = self.last_key != Some(key);
        self.last_key = Some(key);
        dirty
    }
}

type VisibilityCacheKey = (u64, u64, u64, u64, u64);

/// Folds every segment endpoint's bit pattern into one hash so that two
/// obstacle layouts with the same count but different geometry don't
/// collide in `VisibilityCache`.
fn hash_segments(obstacles: &[Segment]) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    obstacles.len().hash(&mut hasher);
    for segment in obstacles {
        for point in segment {
            point[0].to_bits().hash(&mut hasher);
            point[1].to_bits().hash(&mut hasher);
        }
    }
    hasher.finish()
}

/// §4.4 "Visibility lighting": an LRU cache of up to
/// [`VISIBILITY_CACHE_SIZE`] polygons keyed on `(viewer_rect, obstacles)`.
pub struct VisibilityCache {
    capacity: usize,
    order: Vec<VisibilityCacheKey>,
    entries: HashMap<VisibilityCacheKey, Vec<Point>>,
}

impl VisibilityCache {
    pub fn new() -> Self {
        VisibilityCache {
            capacity: VISIBILITY_CACHE_SIZE,
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    fn key(viewer_rect: (f64, f64, f64, f64), obstacles: &[Segment]) -> VisibilityCacheKey {
        (
            viewer_rect.0.to_bits(),
            viewer_rect.1.to_bits(),
            viewer_rect.2.to_bits(),
            viewer_rect.3.to_bits(),
            hash_segments(obstacles),
        )
    }

    pub fn get_or_compute(
        &mut self,
        viewer_rect: (f64, f64, f64, f64),
        viewer: Point,
        obstacles: &[Segment],
        max_distance: f64,
        gap_resolution: usize,
    ) -> &[Point] {
        let key = Self::key(viewer_rect, obstacles);
        if !self.entries.contains_key(&key) {
            let polygon = geometry::visibility_polygon(viewer, obstacles, max_distance, gap_resolution);
            self.insert(key, polygon);
        } else {
            self.touch(key);
        }
        self.entries.get(&key).expect("just inserted or already present")
    }

    fn insert(&mut self, key: VisibilityCacheKey, polygon: Vec<Point>) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            if let Some(oldest) = self.order.first().copied() {
                self.entries.remove(&oldest);
                self.order.remove(0);
            }
        }
        self.entries.insert(key, polygon);
        self.order.retain(|k| *k != key);
        self.order.push(key);
    }

    fn touch(&mut self, key: VisibilityCacheKey) {
        self.order.retain(|k| *k != key);
        self.order.push(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Call whenever `point_of_view_changed` or `obstacles_changed` fires.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl Default for VisibilityCache {
    fn default() -> Self {
        VisibilityCache::new()
    }
}

pub fn triangle_fan_for_visibility(polygon: &[Point], viewer: Point, color: Color) -> Vec<Vertex> {
    vertex::polygon_to_triangle_fan(polygon, viewer, color)
}

/// §4.4 fog tool state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FogToolMode {
    Hide,
    Reveal,
}

#[derive(Debug, Clone, PartialEq)]
enum FogToolState {
    Idle,
    Drawing { start: (f64, f64), end: (f64, f64) },
}

#[derive(Debug, Clone)]
pub struct FogTool {
    state: FogToolState,
    pub mode: FogToolMode,
}

impl FogTool {
    pub fn new() -> Self {
        FogTool {
            state: FogToolState::Idle,
            mode: FogToolMode::Hide,
        }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, FogToolState::Drawing { .. })
    }

    pub fn on_mouse_down(&mut self, table_point: (f64, f64)) {
        self.state = FogToolState::Drawing {
            start: table_point,
            end: table_point,
        };
    }

    pub fn on_mouse_move(&mut self, table_point: (f64, f64)) {
        if let FogToolState::Drawing { start, .. } = self.state {
            self.state = FogToolState::Drawing {
                start,
                end: table_point,
            };
        }
    }

    /// Returns the normalized rectangle to append to the table's fog
    /// lists, and resets the tool to `idle`.
    pub fn on_mouse_up(&mut self) -> Option<TableRect> {
        let rect = match self.state {
            FogToolState::Drawing { start, end } => Some(TableRect::new(
                vtt_core::types::Position::new(start.0, start.1),
                vtt_core::types::Position::new(end.0, end.1),
            )),
            FogToolState::Idle => None,
        };
        self.state = FogToolState::Idle;
        rect
    }

    /// `* -> idle` on tool deactivate: discards any in-progress rectangle.
    pub fn deactivate(&mut self) {
        self.state = FogToolState::Idle;
    }
}

impl Default for FogTool {
    fn default() -> Self {
        FogTool::new()
    }
}

/// Z-ordered per-layer settings, defaulted to the fixed layer order (§4.4
/// step 4). `fog_of_war` is present for completeness of the map but is
/// rendered via the dedicated fog texture, not as a sprite layer.
pub fn default_layer_settings() -> HashMap<Layer, LayerSettings> {
    vtt_core::constants::LAYER_ORDER
        .iter()
        .enumerate()
        .map(|(i, layer)| (*layer, LayerSettings::new(i as u32)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fog_tool_discards_rectangle_on_deactivate() {
        let mut tool = FogTool::new();
        tool.on_mouse_down((10.0, 10.0));
        tool.on_mouse_move((50.0, 50.0));
        tool.deactivate();
        assert!(!tool.is_drawing());
    }

    #[test]
    fn fog_tool_emits_normalized_rect_on_mouse_up() {
        let mut tool = FogTool::new();
        tool.on_mouse_down((50.0, 10.0));
        tool.on_mouse_move((10.0, 50.0));
        let rect = tool.on_mouse_up().unwrap();
        assert!(!tool.is_drawing());
        let (x1, y1, x2, y2) = rect.normalized();
        assert_eq!((x1, y1, x2, y2), (10.0, 10.0, 50.0, 50.0));
    }

    #[test]
    fn fog_texture_cache_is_dirty_only_on_first_call_and_on_change() {
        let mut cache = FogTextureCache::new();
        let mut table = Table::new("t1", "Test", 100.0, 100.0);
        table.set_screen_area(0.0, 0.0, 400.0, 400.0);
        assert!(cache.needs_rebuild(&table));
        assert!(!cache.needs_rebuild(&table));
        table.viewport_x += 1.0;
        assert!(cache.needs_rebuild(&table));
    }

    #[test]
    fn visibility_cache_reuses_entry_for_identical_key() {
        let mut cache = VisibilityCache::new();
        let obstacles: Vec<Segment> = vec![];
        let a = cache
            .get_or_compute((0.0, 0.0, 10.0, 10.0), [50.0, 50.0], &obstacles, 100.0, 32)
            .to_vec();
        let b = cache
            .get_or_compute((0.0, 0.0, 10.0, 10.0), [50.0, 50.0], &obstacles, 100.0, 32)
            .to_vec();
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn visibility_cache_invalidate_all_clears_entries() {
        let mut cache = VisibilityCache::new();
        let obstacles: Vec<Segment> = vec![];
        cache.get_or_compute((0.0, 0.0, 10.0, 10.0), [50.0, 50.0], &obstacles, 100.0, 32);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn default_layer_settings_covers_every_fixed_layer() {
        let settings = default_layer_settings();
        assert_eq!(settings.len(), 7);
        assert_eq!(settings[&Layer::Map].z_order, 0);
        assert_eq!(settings[&Layer::FogOfWar].z_order, 6);
    }
}
