//! Pure numeric geometry routines: obstacle extraction, visibility
//! polygons, and rectangle/polygon boolean ops for fog-of-war composition.
//!
//! Everything here operates on plain `f64` arrays — no allocation beyond
//! the returned `Vec`, no I/O, no panics on malformed input (degenerate
//! inputs return empty results per §4.1's failure semantics). Callers are
//! responsible for sanitizing NaN/inf.

use crate::constants::{GEOMETRY_EPSILON, SHADOW_EPSILON};

pub type Point = [f64; 2];
pub type Segment = [Point; 2];
/// Axis-aligned-ish rectangle as two opposite corners, unordered.
pub type Rect = (Point, Point);

fn normalize_rect((a, b): Rect) -> Rect {
    let min_x = a[0].min(b[0]);
    let min_y = a[1].min(b[1]);
    let max_x = a[0].max(b[0]);
    let max_y = a[1].max(b[1]);
    ([min_x, min_y], [max_x, max_y])
}

fn angle_of(center: Point, p: Point) -> f64 {
    let a = (p[1] - center[1]).atan2(p[0] - center[0]);
    if a < 0.0 {
        a + std::f64::consts::TAU
    } else {
        a
    }
}

/// Sort points clockwise (descending angle) around `center`.
fn sort_clockwise(mut points: Vec<Point>, center: Point) -> Vec<Point> {
    points.sort_by(|a, b| {
        angle_of(center, *b)
            .partial_cmp(&angle_of(center, *a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    points
}

fn centroid(points: &[Point]) -> Point {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    [sx / n, sy / n]
}

/// Extract the four rectangle edges (top, right, bottom, left) from each
/// `(x, y, w, h)` sprite rectangle. Zero-or-negative-area rectangles are
/// skipped before the output is allocated, so the returned `Vec` has
/// exactly `4 * valid_count` segments.
pub fn sprites_to_obstacles(rects: &[(f64, f64, f64, f64)]) -> Vec<Segment> {
    let valid: Vec<_> = rects.iter().filter(|(_, _, w, h)| *w > 0.0 && *h > 0.0).collect();
    let mut out = Vec::with_capacity(valid.len() * 4);
    for &&(x, y, w, h) in &valid {
        let tl = [x, y];
        let tr = [x + w, y];
        let br = [x + w, y + h];
        let bl = [x, y + h];
        out.push([tl, tr]); // top
        out.push([tr, br]); // right
        out.push([br, bl]); // bottom
        out.push([bl, tl]); // left
    }
    out
}

/// Intersect the ray `origin -> origin + max_dist * dir(angle)` against
/// every obstacle segment, keeping only the closest valid hit. Falls back
/// to the ray's own endpoint (distance `max_dist`) when nothing is hit.
fn cast_ray(origin: Point, angle: f64, max_dist: f64, obstacles: &[Segment]) -> Point {
    let dir = [angle.cos(), angle.sin()];
    let ray_end = [origin[0] + max_dist * dir[0], origin[1] + max_dist * dir[1]];
    let d1 = [ray_end[0] - origin[0], ray_end[1] - origin[1]];

    let mut best: Option<(f64, Point)> = None;
    for seg in obstacles {
        let [a, b] = *seg;
        let d2 = [b[0] - a[0], b[1] - a[1]];
        let denom = d1[0] * d2[1] - d1[1] * d2[0];
        if denom.abs() < GEOMETRY_EPSILON {
            continue;
        }
        let ax = a[0] - origin[0];
        let ay = a[1] - origin[1];
        let t = (ax * d2[1] - ay * d2[0]) / denom;
        let u = (ax * d1[1] - ay * d1[0]) / denom;
        if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
            continue;
        }
        let point = [origin[0] + t * d1[0], origin[1] + t * d1[1]];
        let dist_sq = (point[0] - origin[0]).powi(2) + (point[1] - origin[1]).powi(2);
        match &best {
            Some((best_dist, _)) if *best_dist <= dist_sq => {}
            _ => best = Some((dist_sq, point)),
        }
    }

    match best {
        Some((_, point)) => point,
        None => ray_end,
    }
}

/// Compute a visibility polygon from `viewer` against obstacle segments
/// `obstacles`, out to `max_distance`, filling angular gaps at a
/// resolution of `gap_resolution` bins per §4.1.
///
/// Returns a closed polygon (the last vertex implicitly connects back to
/// the first), sorted clockwise around `viewer`. With no obstacles, this
/// degenerates to a regular `gap_resolution + 20`-gon at radius
/// `max_distance`.
pub fn visibility_polygon(
    viewer: Point,
    obstacles: &[Segment],
    max_distance: f64,
    gap_resolution: usize,
) -> Vec<Point> {
    if obstacles.is_empty() {
        let n = gap_resolution + 20;
        let mut points = Vec::with_capacity(n);
        for i in 0..n {
            let angle = (i as f64) * std::f64::consts::TAU / (n as f64);
            points.push(cast_ray(viewer, angle, max_distance, obstacles));
        }
        return sort_clockwise(points, viewer);
    }

    let endpoints: Vec<Point> = obstacles.iter().flat_map(|s| s.to_vec()).collect();
    let endpoint_angles: Vec<f64> = endpoints.iter().map(|p| angle_of(viewer, *p)).collect();

    let mut points = Vec::with_capacity(endpoint_angles.len() * 3 + gap_resolution + 20);
    for &theta in &endpoint_angles {
        for a in [theta - SHADOW_EPSILON, theta, theta + SHADOW_EPSILON] {
            points.push(cast_ray(viewer, a, max_distance, obstacles));
        }
    }

    // Coverage mask: one bin per `gap_resolution`-th of the full circle.
    let mask_size = (628usize / gap_resolution).max(1);
    let mut covered = vec![false; mask_size];
    for pair in endpoint_angles.chunks(2) {
        if let [a, b] = pair {
            let forward = ((b - a).rem_euclid(std::f64::consts::TAU), true);
            let backward = ((a - b).rem_euclid(std::f64::consts::TAU), false);
            let (span, from_a) = if forward.0 <= backward.0 { forward } else { backward };
            let (start_angle, _) = if from_a { (*a, *b) } else { (*b, *a) };
            let bin_span = (span / std::f64::consts::TAU * mask_size as f64).ceil() as usize + 1;
            let start_bin = (start_angle / std::f64::consts::TAU * mask_size as f64) as usize % mask_size;
            for k in 0..=bin_span {
                covered[(start_bin + k) % mask_size] = true;
            }
        }
    }

    for (bin, is_covered) in covered.iter().enumerate() {
        if !is_covered {
            let angle = (bin as f64 + 0.5) / mask_size as f64 * std::f64::consts::TAU;
            points.push(cast_ray(viewer, angle, max_distance, obstacles));
        }
    }

    sort_clockwise(points, viewer)
}

fn rect_to_polygon((min, max): Rect) -> Vec<Point> {
    vec![
        [min[0], min[1]],
        [max[0], min[1]],
        [max[0], max[1]],
        [min[0], max[1]],
    ]
}

fn point_in_rect(p: Point, (min, max): Rect) -> bool {
    p[0] >= min[0] && p[0] <= max[0] && p[1] >= min[1] && p[1] <= max[1]
}

fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let (x, y) = (p[0], p[1]);
    let mut inside = false;
    let n = polygon.len();
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (polygon[i][0], polygon[i][1]);
        let (xj, yj) = (polygon[j][0], polygon[j][1]);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn line_line_intersection(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    let d1 = [p2[0] - p1[0], p2[1] - p1[1]];
    let d2 = [p4[0] - p3[0], p4[1] - p3[1]];
    let denom = d1[0] * d2[1] - d1[1] * d2[0];
    if denom.abs() < GEOMETRY_EPSILON {
        return None;
    }
    let dx = p3[0] - p1[0];
    let dy = p3[1] - p1[1];
    let t = (dx * d2[1] - dy * d2[0]) / denom;
    let u = (dx * d1[1] - dy * d1[0]) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }
    Some([p1[0] + t * d1[0], p1[1] + t * d1[1]])
}

fn line_rect_intersections(a: Point, b: Point, rect: Rect) -> Vec<Point> {
    let corners = rect_to_polygon(rect);
    let mut out = Vec::new();
    for i in 0..4 {
        let c1 = corners[i];
        let c2 = corners[(i + 1) % 4];
        if let Some(p) = line_line_intersection(a, b, c1, c2) {
            out.push(p);
        }
    }
    out
}

fn dedup_round(points: Vec<Point>) -> Vec<Point> {
    let scale = 1.0 / GEOMETRY_EPSILON;
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for p in points {
        let key = (
            (p[0] * scale).round() as i64,
            (p[1] * scale).round() as i64,
        );
        if seen.insert(key) {
            out.push(p);
        }
    }
    out
}

fn bounding_box_of(a: &[Point], b: &[Point]) -> Vec<Point> {
    let all = a.iter().chain(b.iter());
    let (mut min_x, mut min_y, mut max_x, mut max_y) =
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in all {
        min_x = min_x.min(p[0]);
        min_y = min_y.min(p[1]);
        max_x = max_x.max(p[0]);
        max_y = max_y.max(p[1]);
    }
    vec![[min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y]]
}

/// Union a (possibly empty) polygon with a rectangle. Falls back to the
/// axis-aligned bounding box of both inputs on degeneracy (fewer than 3
/// resulting vertices).
pub fn union_polygon_rect(polygon: &[Point], rect: Rect) -> Vec<Point> {
    let rect = normalize_rect(rect);
    if polygon.is_empty() {
        return rect_to_polygon(rect);
    }
    let rect_poly = rect_to_polygon(rect);

    let mut result: Vec<Point> = polygon
        .iter()
        .copied()
        .filter(|p| !point_in_rect(*p, rect))
        .collect();
    result.extend(rect_poly.iter().copied().filter(|p| !point_in_polygon(*p, polygon)));

    let n = polygon.len();
    for i in 0..n {
        result.extend(line_rect_intersections(polygon[i], polygon[(i + 1) % n], rect));
    }

    let unique = dedup_round(result);
    if unique.len() >= 3 {
        let c = centroid(&unique);
        return sort_clockwise(unique, c);
    }
    bounding_box_of(polygon, &rect_poly)
}

/// Subtract a rectangle from a polygon. Returns an empty vertex list if
/// the result degenerates to fewer than 3 vertices.
pub fn difference_polygon_rect(polygon: &[Point], rect: Rect) -> Vec<Point> {
    if polygon.is_empty() {
        return Vec::new();
    }
    let rect = normalize_rect(rect);
    let rect_poly = rect_to_polygon(rect);

    let mut result: Vec<Point> = polygon
        .iter()
        .copied()
        .filter(|p| !point_in_rect(*p, rect))
        .collect();
    result.extend(rect_poly.iter().copied().filter(|p| point_in_polygon(*p, polygon)));

    let n = polygon.len();
    for i in 0..n {
        result.extend(line_rect_intersections(polygon[i], polygon[(i + 1) % n], rect));
    }

    let unique = dedup_round(result);
    if unique.len() >= 3 {
        let c = centroid(&unique);
        return sort_clockwise(unique, c);
    }
    Vec::new()
}

fn rects_intersect(a: Rect, b: Rect) -> bool {
    let (a_min, a_max) = normalize_rect(a);
    let (b_min, b_max) = normalize_rect(b);
    a_min[0] <= b_max[0] && a_max[0] >= b_min[0] && a_min[1] <= b_max[1] && a_max[1] >= b_min[1]
}

fn polygon_intersects_rect(polygon: &[Point], rect: Rect) -> bool {
    if polygon.is_empty() {
        return false;
    }
    let rect = normalize_rect(rect);
    if polygon.iter().any(|p| point_in_rect(*p, rect)) {
        return true;
    }
    let rect_poly = rect_to_polygon(rect);
    if rect_poly.iter().any(|p| point_in_polygon(*p, polygon)) {
        return true;
    }
    let n = polygon.len();
    (0..n).any(|i| !line_rect_intersections(polygon[i], polygon[(i + 1) % n], rect).is_empty())
}

/// Partition `hide` rectangles into connected components by AABB overlap,
/// union each component into one polygon, then subtract every `reveal`
/// rectangle whose AABB overlaps that polygon. Empty-result polygons are
/// dropped. Returns one polygon per surviving hide component.
pub fn compute_fog_polygons(hide: &[Rect], reveal: &[Rect]) -> Vec<Vec<Point>> {
    if hide.is_empty() {
        return Vec::new();
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut assigned = vec![false; hide.len()];
    for i in 0..hide.len() {
        if assigned[i] {
            continue;
        }
        let mut group = vec![i];
        assigned[i] = true;
        let mut changed = true;
        while changed {
            changed = false;
            for j in 0..hide.len() {
                if assigned[j] {
                    continue;
                }
                if group.iter().any(|&g| rects_intersect(hide[g], hide[j])) {
                    group.push(j);
                    assigned[j] = true;
                    changed = true;
                }
            }
        }
        groups.push(group);
    }

    let mut out = Vec::with_capacity(groups.len());
    for group in groups {
        let mut polygon = rect_to_polygon(normalize_rect(hide[group[0]]));
        for &idx in &group[1..] {
            polygon = union_polygon_rect(&polygon, hide[idx]);
        }
        for &r in reveal {
            if polygon.is_empty() {
                break;
            }
            if polygon_intersects_rect(&polygon, r) {
                polygon = difference_polygon_rect(&polygon, r);
            }
        }
        if !polygon.is_empty() {
            out.push(polygon);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprites_to_obstacles_skips_zero_area() {
        let rects = [(0.0, 0.0, 10.0, 10.0), (5.0, 5.0, 0.0, 3.0), (1.0, 1.0, -1.0, 1.0)];
        let segs = sprites_to_obstacles(&rects);
        assert_eq!(segs.len(), 4);
    }

    #[test]
    fn empty_obstacles_gives_regular_polygon() {
        let poly = visibility_polygon([0.0, 0.0], &[], 100.0, 10);
        assert_eq!(poly.len(), 30);
        for p in &poly {
            let dist = (p[0].powi(2) + p[1].powi(2)).sqrt();
            assert!((dist - 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn single_wall_casts_shadow_along_its_own_span() {
        let obstacles = [[[70.0, 20.0], [70.0, 80.0]]];
        let viewer = [50.0, 50.0];
        let poly = visibility_polygon(viewer, &obstacles, 200.0, 10);
        assert!(poly.len() >= 3);
        // The ray cast straight at the wall (along its angular span) must
        // stop at the wall, not sail past it to the 200-unit view limit.
        let straight_hit = cast_ray(viewer, 0.0, 200.0, &obstacles);
        assert!((straight_hit[0] - 70.0).abs() < 1e-6);
        // Both wall endpoints are themselves visibility-polygon vertices
        // (within the shadow-perturbation epsilon).
        let near_top = poly
            .iter()
            .any(|p| (p[0] - 70.0).abs() < 1e-2 && (p[1] - 20.0).abs() < 1e-2);
        let near_bottom = poly
            .iter()
            .any(|p| (p[0] - 70.0).abs() < 1e-2 && (p[1] - 80.0).abs() < 1e-2);
        assert!(near_top && near_bottom);
    }

    #[test]
    fn union_of_two_rects_has_no_duplicate_vertices() {
        let base = rect_to_polygon(([0.0, 0.0], [10.0, 10.0]));
        let merged = union_polygon_rect(&base, ([5.0, 5.0], [15.0, 15.0]));
        assert!(merged.len() >= 3);
        let unique = dedup_round(merged.clone());
        assert_eq!(unique.len(), merged.len());
    }

    #[test]
    fn difference_fully_covering_rect_is_empty() {
        let base = rect_to_polygon(([0.0, 0.0], [10.0, 10.0]));
        let result = difference_polygon_rect(&base, ([-1.0, -1.0], [11.0, 11.0]));
        assert!(result.is_empty());
    }

    #[test]
    fn compute_fog_polygons_merges_overlapping_hide_rects_and_punches_hole() {
        let hide = [
            ([0.0, 0.0], [100.0, 100.0]),
            ([80.0, 80.0], [160.0, 160.0]),
        ];
        let reveal = [([40.0, 40.0], [60.0, 60.0])];
        let polygons = compute_fog_polygons(&hide, &reveal);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].len(), 12);
    }

    #[test]
    fn zero_hide_rects_yields_no_polygons_regardless_of_reveal() {
        let reveal = [([0.0, 0.0], [10.0, 10.0])];
        assert!(compute_fog_polygons(&[], &reveal).is_empty());
    }

    #[test]
    fn reveal_disjoint_from_hide_leaves_hide_union_unchanged() {
        let hide = [([0.0, 0.0], [10.0, 10.0])];
        let reveal = [([100.0, 100.0], [110.0, 110.0])];
        let polygons = compute_fog_polygons(&hide, &reveal);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].len(), 4);
    }

    #[test]
    fn fog_polygons_are_oriented_clockwise_with_at_least_three_vertices() {
        let hide = [([0.0, 0.0], [50.0, 50.0])];
        let polygons = compute_fog_polygons(&hide, &[]);
        let polygon = &polygons[0];
        assert!(polygon.len() >= 3);
        let c = centroid(polygon);
        let mut signed_area = 0.0;
        for i in 0..polygon.len() {
            let a = polygon[i];
            let b = polygon[(i + 1) % polygon.len()];
            signed_area += (a[0] - c[0]) * (b[1] - c[1]) - (b[0] - c[0]) * (a[1] - c[1]);
        }
        // Screen-space clockwise (y-down) has non-positive signed area
        // under the standard shoelace formula.
        assert!(signed_area <= 0.0);
    }
}
