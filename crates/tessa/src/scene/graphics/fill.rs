//! Outline builders and fill triangulation for every shape kind.

use std::f32::consts::FRAC_PI_2;

use tessa_math::vec2;

use super::{GraphicsData, Polygon, RoundedRect, Shape};
use crate::{
    earcut::Earcut,
    path::{last_point, QuadraticBezier},
    CurveResolution, GraphicsConfig, RoundedRectBuild,
};

/// Flattens the record's shape into `data.points`, untransformed.
pub(crate) fn build(data: &mut GraphicsData, config: &GraphicsConfig) {
    let points = &mut data.points;
    points.clear();

    match &data.shape {
        Shape::Rect(rect) => {
            let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
            points.extend_from_slice(&[x, y, x + w, y, x + w, y + h, x, y + h]);
        }
        Shape::Circle(c) => {
            build_ring(points, c.x, c.y, c.radius, c.radius, 0.0, 0.0, config);
        }
        Shape::Ellipse(e) => {
            build_ring(points, e.x, e.y, e.half_width, e.half_height, 0.0, 0.0, config);
        }
        Shape::RoundedRect(rect) => match config.rounded_rect {
            RoundedRectBuild::Bezier => build_rounded_rect(points, rect, &config.curves),
            RoundedRectBuild::Arcs => {
                let half_w = rect.width / 2.0;
                let half_h = rect.height / 2.0;
                let r = rect.radius.min(half_w.min(half_h)).max(0.0);
                build_ring(
                    points,
                    rect.x + half_w,
                    rect.y + half_h,
                    r,
                    r,
                    half_w - r,
                    half_h - r,
                    config,
                );
            }
        },
        Shape::Polygon(polygon) => points.extend_from_slice(&polygon.points),
    }
}

/// Appends the triangles of a record without holes.
pub(crate) fn triangulate(
    data: &GraphicsData,
    config: &GraphicsConfig,
    earcut: &mut Earcut<f32>,
    verts: &mut Vec<f32>,
    indices: &mut Vec<u32>,
) {
    match &data.shape {
        Shape::Rect(_) => triangulate_rect(&data.points, verts, indices),
        Shape::Circle(_) | Shape::Ellipse(_) => triangulate_fan(data, verts, indices),
        Shape::RoundedRect(_) if config.rounded_rect == RoundedRectBuild::Arcs => {
            triangulate_fan(data, verts, indices)
        }
        Shape::RoundedRect(_) | Shape::Polygon(_) => {
            triangulate_polygon(&mut data.points.clone(), &mut [], earcut, verts, indices)
        }
    }
}

fn triangulate_rect(points: &[f32], verts: &mut Vec<f32>, indices: &mut Vec<u32>) {
    if points.len() < 8 {
        return;
    }

    let base = (verts.len() / 2) as u32;
    verts.extend_from_slice(&[
        points[0], points[1], points[2], points[3], points[6], points[7], points[4], points[5],
    ]);
    indices.extend([0, 1, 2, 1, 2, 3].map(|i| base + i));
}

/// Builds a ring of points around `(x, y)` with radii `rx`/`ry`, split apart by `dx`/`dy` so
/// rounded rectangles share the builder. The ring starts at angle zero.
#[allow(clippy::too_many_arguments)]
fn build_ring(
    points: &mut Vec<f32>,
    x: f32,
    y: f32,
    rx: f32,
    ry: f32,
    dx: f32,
    dy: f32,
    config: &GraphicsConfig,
) {
    if !(rx >= 0.0 && ry >= 0.0 && dx >= 0.0 && dy >= 0.0) {
        return;
    }

    let n = (config.circle_segment_factor * (rx + ry).sqrt()).ceil() as usize;
    let extra = |offset: f32| if offset != 0.0 { 4 } else { 0 };
    let m = n * 8 + extra(dx) + extra(dy);
    if m == 0 {
        return;
    }

    if n == 0 {
        points.extend_from_slice(&[
            x + dx,
            y + dy,
            x - dx,
            y + dy,
            x - dx,
            y - dy,
            x + dx,
            y - dy,
        ]);
        return;
    }

    // Four cursors fill the quadrants at once: j1 forward from the start, j2 backward from the
    // end of the second quadrant, j3 forward from there and j4 backward from the end.
    points.resize(m, 0.0);
    let mut j1 = 0;
    let mut j2 = n * 4 + if dx != 0.0 { 2 } else { 0 } + 2;
    let mut j3 = j2;
    let mut j4 = m;

    {
        let x0 = dx + rx;
        let y0 = dy;
        let (x1, x2, y1) = (x + x0, x - x0, y + y0);

        push_front(points, &mut j1, x1, y1);
        push_back(points, &mut j2, x2, y1);
        if dy != 0.0 {
            let y2 = y - y0;
            push_front(points, &mut j3, x2, y2);
            push_back(points, &mut j4, x1, y2);
        }
    }

    for i in 1..n {
        let a = FRAC_PI_2 * (i as f32 / n as f32);
        let x0 = dx + a.cos() * rx;
        let y0 = dy + a.sin() * ry;
        let (x1, x2) = (x + x0, x - x0);
        let (y1, y2) = (y + y0, y - y0);

        push_front(points, &mut j1, x1, y1);
        push_back(points, &mut j2, x2, y1);
        push_front(points, &mut j3, x2, y2);
        push_back(points, &mut j4, x1, y2);
    }

    {
        let x0 = dx;
        let y0 = dy + ry;
        let (x1, x2) = (x + x0, x - x0);
        let (y1, y2) = (y + y0, y - y0);

        push_front(points, &mut j1, x1, y1);
        push_back(points, &mut j4, x1, y2);
        if dx != 0.0 {
            push_front(points, &mut j1, x2, y1);
            push_back(points, &mut j4, x2, y2);
        }
    }
}

fn push_front(points: &mut [f32], j: &mut usize, x: f32, y: f32) {
    points[*j] = x;
    points[*j + 1] = y;
    *j += 2;
}

fn push_back(points: &mut [f32], j: &mut usize, x: f32, y: f32) {
    *j -= 2;
    points[*j] = x;
    points[*j + 1] = y;
}

/// Fans the ring around the transformed shape center.
fn triangulate_fan(data: &GraphicsData, verts: &mut Vec<f32>, indices: &mut Vec<u32>) {
    let points = &data.points;
    if points.len() < 4 {
        return;
    }

    let center = match &data.shape {
        Shape::Circle(c) => vec2(c.x, c.y),
        Shape::Ellipse(e) => vec2(e.x, e.y),
        Shape::RoundedRect(r) => vec2(r.x + r.width / 2.0, r.y + r.height / 2.0),
        Shape::Rect(_) | Shape::Polygon(_) => return,
    };
    let center = match &data.matrix {
        Some(m) => m.apply(center),
        None => center,
    };

    let center_index = (verts.len() / 2) as u32;
    verts.extend_from_slice(&[center.x, center.y, points[0], points[1]]);

    let mut vert_index = center_index + 1;
    for p in points[2..].chunks_exact(2) {
        verts.extend_from_slice(p);
        indices.extend([vert_index, center_index, vert_index + 1]);
        vert_index += 1;
    }

    indices.extend([center_index + 1, center_index, vert_index]);
}

fn build_rounded_rect(points: &mut Vec<f32>, rect: &RoundedRect, curves: &CurveResolution) {
    let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
    let radius = rect.clamped_radius();

    if radius == 0.0 {
        points.extend_from_slice(&[x, y, x + w, y, x + w, y + h, x, y + h]);
        return;
    }

    let corners = [
        [(x, y + radius), (x, y), (x + radius, y)],
        [(x + w - radius, y), (x + w, y), (x + w, y + radius)],
        [(x + w, y + h - radius), (x + w, y + h), (x + w - radius, y + h)],
        [(x + radius, y + h), (x, y + h), (x, y + h - radius)],
    ];

    for [from, ctrl, to] in corners {
        let curve = QuadraticBezier {
            from: from.into(),
            ctrl: ctrl.into(),
            to: to.into(),
        };

        if last_point(points) != Some(curve.from) {
            points.extend_from_slice(&[curve.from.x, curve.from.y]);
        }

        let segments = curves.segments_count(curve.length(), CurveResolution::DEFAULT_SEGMENTS);
        curve.flatten_into(points, segments);
    }
}

/// Reverses the point order when the winding disagrees with the role: outlines end up with a
/// non positive signed area, holes with a positive one.
pub(crate) fn fix_orientation(points: &mut [f32], hole: bool) {
    if points.len() < 6 {
        return;
    }

    let area = Polygon::signed_area(points);
    if (!hole && area > 0.0) || (hole && area <= 0.0) {
        let n = points.len() / 2;
        for i in 0..n / 2 {
            let j = n - 1 - i;
            points.swap(i * 2, j * 2);
            points.swap(i * 2 + 1, j * 2 + 1);
        }
    }
}

/// Ear clips an outline with holes. Orientation of every ring is fixed in place first.
pub(crate) fn triangulate_polygon(
    outline: &mut [f32],
    holes: &mut [Vec<f32>],
    earcut: &mut Earcut<f32>,
    verts: &mut Vec<f32>,
    indices: &mut Vec<u32>,
) {
    if outline.len() < 6 {
        return;
    }

    fix_orientation(outline, false);

    let mut hole_indices = Vec::with_capacity(holes.len());
    let mut total = outline.len();
    for hole in holes.iter_mut() {
        fix_orientation(hole, true);
        hole_indices.push(total / 2);
        total += hole.len() & !1;
    }

    let rings = || {
        std::iter::once(&*outline)
            .chain(holes.iter().map(|h| h.as_slice()))
            .flat_map(|ring| ring.chunks_exact(2).map(|p| [p[0], p[1]]))
    };

    let base = (verts.len() / 2) as u32;
    let start = indices.len();
    earcut.earcut(rings(), &hole_indices, indices);
    if indices.len() == start {
        return;
    }

    for index in &mut indices[start..] {
        *index += base;
    }
    verts.extend(rings().flatten());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{path::iter_points, Circle, Ellipse, FillStyle, Mat3, Rect};

    fn record(shape: impl Into<Shape>) -> GraphicsData {
        GraphicsData::new(shape.into(), Some(FillStyle::solid(0xff0000, 1.0)), None, None)
    }

    fn built(shape: impl Into<Shape>, config: &GraphicsConfig) -> GraphicsData {
        let mut data = record(shape);
        build(&mut data, config);
        data
    }

    fn fill(data: &GraphicsData, config: &GraphicsConfig) -> (Vec<f32>, Vec<u32>) {
        let (mut verts, mut indices) = (Vec::new(), Vec::new());
        triangulate(data, config, &mut Earcut::new(), &mut verts, &mut indices);
        (verts, indices)
    }

    fn area(verts: &[f32], indices: &[u32]) -> f32 {
        indices
            .chunks_exact(3)
            .map(|t| {
                let [a, b, c] = [t[0], t[1], t[2]]
                    .map(|i| vec2(verts[i as usize * 2], verts[i as usize * 2 + 1]));
                (b - a).cross(c - a).abs() / 2.0
            })
            .sum()
    }

    #[test]
    fn rect_is_two_triangles() {
        let config = GraphicsConfig::default();
        let data = built(Rect::xywh(10.0, 20.0, 30.0, 40.0), &config);
        assert_eq!(data.points, vec![10.0, 20.0, 40.0, 20.0, 40.0, 60.0, 10.0, 60.0]);

        let (verts, indices) = fill(&data, &config);
        assert_eq!(verts, vec![10.0, 20.0, 40.0, 20.0, 10.0, 60.0, 40.0, 60.0]);
        assert_eq!(indices, vec![0, 1, 2, 1, 2, 3]);
    }

    #[test]
    fn circle_ring_size_and_radius() {
        let config = GraphicsConfig::default();
        let data = built(Circle::new(100.0, 100.0, 25.0), &config);

        // ceil(2.3 * sqrt(50)) = 17 segments per quadrant
        assert_eq!(data.points.len(), 17 * 8);
        let center = vec2(100.0, 100.0);
        for p in iter_points(&data.points) {
            assert!((p.distance(center) - 25.0).abs() < 1e-3);
        }
        assert_eq!(&data.points[..2], &[125.0, 100.0]);

        let (verts, indices) = fill(&data, &config);
        assert_eq!(verts.len(), data.points.len() + 2);
        assert_eq!(indices.len(), 17 * 4 * 3);
        assert_eq!(&verts[..2], &[100.0, 100.0]);
    }

    #[test]
    fn ellipse_fan_covers_area() {
        let config = GraphicsConfig::default();
        let data = built(Ellipse::new(0.0, 0.0, 40.0, 20.0), &config);
        let (verts, indices) = fill(&data, &config);

        let exact = std::f32::consts::PI * 40.0 * 20.0;
        let covered = area(&verts, &indices);
        assert!(covered < exact && covered > exact * 0.99);
    }

    #[test]
    fn zero_radius_circle_is_empty() {
        let config = GraphicsConfig::default();
        let data = built(Circle::new(5.0, 5.0, 0.0), &config);
        assert!(data.points.is_empty());
        assert_eq!(fill(&data, &config), (vec![], vec![]));
    }

    #[test]
    fn fan_center_follows_matrix() {
        let config = GraphicsConfig::default();
        let mut data = record(Circle::new(0.0, 0.0, 10.0));
        data.matrix = Some(Mat3::from_translation(50.0, 0.0));
        build(&mut data, &config);
        if let Some(m) = data.matrix {
            m.apply_flat(&mut data.points);
        }

        let (verts, _) = fill(&data, &config);
        assert_eq!(&verts[..2], &[50.0, 0.0]);
    }

    #[test]
    fn rounded_rect_bezier_is_ear_clipped() {
        let config = GraphicsConfig::default();
        let data = built(RoundedRect::new(0.0, 0.0, 100.0, 60.0, 10.0), &config);

        assert_eq!(&data.points[..2], &[0.0, 10.0]);
        let n = data.points.len() / 2;
        assert_eq!(&data.points[(n - 1) * 2..], &[0.0, 50.0]);

        let (verts, indices) = fill(&data, &config);
        assert_eq!(indices.len(), (n - 2) * 3);
        let covered = area(&verts, &indices);
        // quadratic corners sit between the square corner and the true quarter circle
        assert!(covered < 6000.0 && covered > 6000.0 - 400.0 + 100.0 * std::f32::consts::PI);
    }

    #[test]
    fn rounded_rect_arcs_add_offset_points() {
        let config = GraphicsConfig {
            rounded_rect: RoundedRectBuild::Arcs,
            ..Default::default()
        };
        let data = built(RoundedRect::new(0.0, 0.0, 100.0, 60.0, 10.0), &config);

        let n = (2.3f32 * 20f32.sqrt()).ceil() as usize;
        assert_eq!(data.points.len(), n * 8 + 8);

        let (verts, indices) = fill(&data, &config);
        let covered = area(&verts, &indices);
        let exact = 6000.0 - 400.0 + 100.0 * std::f32::consts::PI;
        assert!(covered < exact && covered > exact - 5.0);
    }

    #[test]
    fn orientation_is_normalized() {
        let mut outline = vec![0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 10.0, 0.0];
        let mut hole = vec![2.0, 2.0, 2.0, 4.0, 4.0, 4.0, 4.0, 2.0];
        fix_orientation(&mut outline, false);
        fix_orientation(&mut hole, true);

        assert!(Polygon::signed_area(&outline) <= 0.0);
        assert!(Polygon::signed_area(&hole) > 0.0);
        assert_eq!(outline, vec![10.0, 0.0, 10.0, 10.0, 0.0, 10.0, 0.0, 0.0]);
    }

    #[test]
    fn polygon_with_hole() {
        let mut outline = vec![0.0, 0.0, 100.0, 0.0, 100.0, 100.0, 0.0, 100.0];
        let mut holes = vec![vec![25.0, 25.0, 75.0, 25.0, 75.0, 75.0, 25.0, 75.0]];
        let mut verts = vec![1.0, 1.0];
        let mut indices = Vec::new();

        triangulate_polygon(&mut outline, &mut holes, &mut Earcut::new(), &mut verts, &mut indices);

        assert_eq!(verts.len(), 2 + 16);
        assert!(indices.iter().all(|&i| (1..9).contains(&i)));
        assert!((area(&verts, &indices) - 7500.0).abs() < 1e-2);
    }
}
