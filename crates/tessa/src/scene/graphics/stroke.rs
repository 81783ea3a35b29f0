//! Stroke tessellation. Non native lines become a strip of two rails around the path, native
//! lines a plain line list.

use tessa_math::{vec2, Point, Vec2};

use super::GraphicsData;
use crate::{path::round_segments, GraphicsConfig, LineCap, LineJoin, LineStyle};

/// Appends the stroke of a record and of each of its holes.
pub(crate) fn build_line(
    data: &GraphicsData,
    config: &GraphicsConfig,
    verts: &mut Vec<f32>,
    indices: &mut Vec<u32>,
) {
    stroke(data, config, verts, indices);
    for hole in &data.holes {
        stroke(hole, config, verts, indices);
    }
}

fn stroke(data: &GraphicsData, config: &GraphicsConfig, verts: &mut Vec<f32>, indices: &mut Vec<u32>) {
    let Some(style) = data.visible_line() else {
        return;
    };

    let closed = data.shape.closes_stroke();
    if style.native {
        build_native_line(&data.points, closed, verts, indices);
    } else {
        LineBuilder::new(style, config, verts).build(&data.points, closed, indices);
    }
}

fn build_native_line(points: &[f32], closed: bool, verts: &mut Vec<f32>, indices: &mut Vec<u32>) {
    let len = points.len() / 2;
    if len == 0 {
        return;
    }

    let start = (verts.len() / 2) as u32;
    verts.extend_from_slice(&points[..len * 2]);

    for i in 1..len as u32 {
        indices.extend([start + i - 1, start + i]);
    }

    if closed {
        indices.extend([start + len as u32 - 1, start]);
    }
}

struct LineBuilder<'a> {
    style: &'a LineStyle,
    config: &'a GraphicsConfig,
    verts: &'a mut Vec<f32>,
    half_width: f32,
    inner_weight: f32,
    outer_weight: f32,
}

impl<'a> LineBuilder<'a> {
    fn new(style: &'a LineStyle, config: &'a GraphicsConfig, verts: &'a mut Vec<f32>) -> Self {
        Self {
            style,
            config,
            verts,
            half_width: style.width / 2.0,
            inner_weight: (1.0 - style.alignment) * 2.0,
            outer_weight: style.alignment * 2.0,
        }
    }

    #[inline]
    fn push(&mut self, p: Point) {
        self.verts.extend_from_slice(&[p.x, p.y]);
    }

    /// Normal of the segment `a -> b`, scaled to half the line width.
    fn perp(&self, a: Point, b: Point) -> Vec2<f32> {
        vec2(b.y - a.y, a.x - b.x).normalize() * self.half_width
    }

    fn inner(&self, p: Point, perp: Vec2<f32>) -> Point {
        p - perp * self.inner_weight
    }

    fn outer(&self, p: Point, perp: Vec2<f32>) -> Point {
        p + perp * self.outer_weight
    }

    fn build(mut self, points: &[f32], closed: bool, indices: &mut Vec<u32>) {
        let mut points = points[..points.len() & !1]
            .chunks_exact(2)
            .map(|p| vec2(p[0], p[1]))
            .collect::<Vec<_>>();

        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            return;
        };

        if closed {
            let eps = self.config.close_point_eps;
            let mut last = last;
            if (first.x - last.x).abs() < eps && (first.y - last.y).abs() < eps {
                points.pop();
                if let Some(&p) = points.last() {
                    last = p;
                }
            }

            let mid = (first + last) * 0.5;
            points.insert(0, mid);
            points.push(mid);
        }

        if points.len() < 2 {
            return;
        }

        let start = self.verts.len() / 2;
        let (inner_w, outer_w) = (self.inner_weight, self.outer_weight);

        let (p0, p1) = (points[0], points[1]);
        let perp = self.perp(p0, p1);

        if !closed {
            match self.style.cap {
                LineCap::Round => {
                    let center = p0 - perp * ((inner_w - outer_w) * 0.5);
                    self.round(center, self.inner(p0, perp), self.outer(p0, perp), true);
                }
                LineCap::Square => self.square(p0, perp, true),
                LineCap::Butt => {}
            }
        }

        self.push(self.inner(p0, perp));
        self.push(self.outer(p0, perp));

        for window in points.windows(3) {
            self.joint(window[0], window[1], window[2]);
        }

        let (p0, p1) = (points[points.len() - 2], points[points.len() - 1]);
        let perp = self.perp(p0, p1);

        self.push(self.inner(p1, perp));
        self.push(self.outer(p1, perp));

        if !closed {
            match self.style.cap {
                LineCap::Round => {
                    let center = p1 - perp * ((inner_w - outer_w) * 0.5);
                    self.round(center, self.inner(p1, perp), self.outer(p1, perp), false);
                }
                LineCap::Square => self.square(p1, perp, false),
                LineCap::Butt => {}
            }
        }

        self.emit_strip(start, indices);
    }

    /// Emits the strip triangles between two rail pairs meeting at `p1`.
    fn joint(&mut self, p0: Point, p1: Point, p2: Point) {
        let (inner_w, outer_w) = (self.inner_weight, self.outer_weight);
        let width_sq = self.half_width * self.half_width;

        let perp = self.perp(p0, p1);
        let perp1 = self.perp(p1, p2);

        let (dx0, dy0) = (p1.x - p0.x, p0.y - p1.y);
        let (dx1, dy1) = (p1.x - p2.x, p2.y - p1.y);
        let cross = dy0 * dx1 - dy1 * dx0;
        let clockwise = cross < 0.0;

        if cross.abs() < self.config.straight_join_threshold {
            self.push(self.inner(p1, perp));
            self.push(self.outer(p1, perp));
            return;
        }

        // intersection of the two offset lines on the inner rail
        let c1 = (-perp.x + p0.x) * (-perp.y + p1.y) - (-perp.x + p1.x) * (-perp.y + p0.y);
        let c2 = (-perp1.x + p2.x) * (-perp1.y + p1.y) - (-perp1.x + p1.x) * (-perp1.y + p2.y);
        let miter = vec2(
            (dx0 * c2 - dx1 * c1) / cross,
            (dy1 * c1 - dy0 * c2) / cross,
        );
        let pdist = (miter - p1).magnitude_sq();

        let mut inner_miter = p1 + (miter - p1) * inner_w;
        let mut outer_miter = p1 - (miter - p1) * outer_w;

        let inside_weight = if clockwise { inner_w } else { outer_w };
        let shorter_segment_sq = (dx0 * dx0 + dy0 * dy0).min(dx1 * dx1 + dy1 * dy1);
        let inside_diagonal_sq = shorter_segment_sq + inside_weight * inside_weight * width_sq;

        // The inside miter has to stay on the vertex's side of the chord p0 -> p2, otherwise the
        // strip folds over itself. Fall back to the midpoint of the two inside offsets.
        let chord_normal = (p2 - p0).rot90();
        let vertex_side = (p1 - p0).dot(chord_normal);
        let inside_ok = |inside: Point| {
            pdist <= inside_diagonal_sq && (inside - p0).dot(chord_normal) * vertex_side > 0.0
        };

        if clockwise {
            if !inside_ok(inner_miter) {
                inner_miter = (self.inner(p1, perp) + self.inner(p1, perp1)) * 0.5;
            }
        } else if !inside_ok(outer_miter) {
            outer_miter = (self.outer(p1, perp) + self.outer(p1, perp1)) * 0.5;
        }

        let mut join = self.style.join;
        if join == LineJoin::Miter && pdist / width_sq > self.style.miter_limit * self.style.miter_limit
        {
            join = LineJoin::Bevel;
        }

        match (join, clockwise) {
            (LineJoin::Miter, _) => {
                self.push(inner_miter);
                self.push(outer_miter);
            }
            (LineJoin::Bevel, true) => {
                self.push(inner_miter);
                self.push(self.outer(p1, perp));
                self.push(inner_miter);
                self.push(self.outer(p1, perp1));
            }
            (LineJoin::Bevel, false) => {
                self.push(self.inner(p1, perp));
                self.push(outer_miter);
                self.push(self.inner(p1, perp1));
                self.push(outer_miter);
            }
            (LineJoin::Round, true) => {
                self.push(inner_miter);
                self.push(self.outer(p1, perp));
                self.round(p1, self.outer(p1, perp), self.outer(p1, perp1), true);
                self.push(inner_miter);
                self.push(self.outer(p1, perp1));
            }
            (LineJoin::Round, false) => {
                self.push(self.inner(p1, perp));
                self.push(outer_miter);
                self.round(p1, self.inner(p1, perp), self.inner(p1, perp1), false);
                self.push(self.inner(p1, perp1));
                self.push(outer_miter);
            }
        }
    }

    /// Fans an arc from `from` to `to` around `center`, interleaving the center so the result
    /// stays a valid strip.
    fn round(&mut self, center: Point, from: Point, to: Point, clockwise: bool) {
        let (sx, sy) = (from.x - center.x, from.y - center.y);
        let mut angle0 = sx.atan2(sy);
        let mut angle1 = (to.x - center.x).atan2(to.y - center.y);

        if clockwise && angle0 < angle1 {
            angle0 += std::f32::consts::TAU;
        } else if !clockwise && angle0 > angle1 {
            angle1 += std::f32::consts::TAU;
        }

        let sweep = angle1 - angle0;
        let radius = (sx * sx + sy * sy).sqrt();
        let segments = round_segments(radius, sweep, &self.config.curves);
        let step = sweep / segments as f32;

        let along = |angle: f32| center + vec2(angle.sin(), angle.cos()) * radius;

        if clockwise {
            self.push(center);
            self.push(from);
            for i in 1..segments {
                self.push(center);
                self.push(along(angle0 + step * i as f32));
            }
            self.push(center);
            self.push(to);
        } else {
            self.push(from);
            self.push(center);
            for i in 1..segments {
                self.push(along(angle0 + step * i as f32));
                self.push(center);
            }
            self.push(to);
            self.push(center);
        }
    }

    /// Pushes the rail end points moved half a width past `p` along the tangent.
    fn square(&mut self, p: Point, perp: Vec2<f32>, start: bool) {
        let extend = if start {
            vec2(perp.y, -perp.x)
        } else {
            vec2(-perp.y, perp.x)
        };

        self.push(self.inner(p, perp) + extend);
        self.push(self.outer(p, perp) + extend);
    }

    /// Indexes every consecutive vertex triple from `start`, skipping near zero area ones.
    fn emit_strip(&self, start: usize, indices: &mut Vec<u32>) {
        let eps_sq = self.config.curves.epsilon * self.config.curves.epsilon;
        let end = self.verts.len() / 2;

        for i in start..end.saturating_sub(2) {
            let [a, b, c] = [i, i + 1, i + 2].map(|k| vec2(self.verts[k * 2], self.verts[k * 2 + 1]));
            let area = a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y);
            if area.abs() < eps_sq {
                continue;
            }
            indices.extend([i as u32, i as u32 + 1, i as u32 + 2]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{path::iter_points, Polygon, Rect, Shape};

    fn stroked(shape: impl Into<Shape>, style: LineStyle) -> (Vec<f32>, Vec<u32>) {
        let config = GraphicsConfig::default();
        let mut data = GraphicsData::new(shape.into(), None, Some(style), None);
        super::super::fill::build(&mut data, &config);

        let (mut verts, mut indices) = (Vec::new(), Vec::new());
        build_line(&data, &config, &mut verts, &mut indices);
        (verts, indices)
    }

    fn corner() -> Polygon {
        let mut polyline = Polygon::new([[0.0, 0.0], [100.0, 0.0], [100.0, 100.0]]);
        polyline.close_stroke = false;
        polyline
    }

    fn corner_style(join: LineJoin, miter_limit: f32) -> LineStyle {
        LineStyle::new(10.0, 0x000000, 1.0)
            .join(join)
            .miter_limit(miter_limit)
    }

    #[test]
    fn miter_within_limit_shares_apex() {
        let (verts, indices) = stroked(corner(), corner_style(LineJoin::Miter, 10.0));
        let points = iter_points(&verts).collect::<Vec<_>>();

        assert_eq!(points.len(), 6);
        assert_eq!(indices.len(), 4 * 3);

        let apex = points[3];
        assert!((apex.distance(vec2(100.0, 0.0)) - 50f32.sqrt()).abs() < 1e-3);
        assert!((apex.x - 105.0).abs() < 1e-3 && (apex.y + 5.0).abs() < 1e-3);
        assert!((points[2].x - 95.0).abs() < 1e-3 && (points[2].y - 5.0).abs() < 1e-3);
    }

    #[test]
    fn reflex_inner_miter_falls_back_to_midpoint() {
        let mut polyline = Polygon::new([[0.0, 0.0], [100.0, 0.0], [0.0, 5.0]]);
        polyline.close_stroke = false;
        let (verts, _) = stroked(polyline, corner_style(LineJoin::Miter, 100.0));
        let points = iter_points(&verts).collect::<Vec<_>>();

        assert_eq!(points.len(), 6);
        // the inner rails would meet far behind p0, so the joint uses their midpoint
        let perp1 = vec2(5.0, 100.0).normalize() * 5.0;
        let expected = (vec2(100.0, 5.0) + (vec2(100.0, 0.0) - perp1)) * 0.5;
        assert!(points[2].distance(expected) < 1e-3);
    }

    #[test]
    fn nearly_straight_joint_emits_plain_offsets() {
        let mut polyline = Polygon::new([[0.0, 0.0], [100.0, 0.0], [200.0, 0.0005]]);
        polyline.close_stroke = false;
        let (verts, indices) = stroked(polyline, corner_style(LineJoin::Miter, 10.0));
        let points = iter_points(&verts).collect::<Vec<_>>();

        assert_eq!(points.len(), 6);
        assert_eq!(indices.len(), 4 * 3);
        assert!(points[2].distance(vec2(100.0, 5.0)) < 1e-3);
        assert!(points[3].distance(vec2(100.0, -5.0)) < 1e-3);
    }

    #[test]
    fn miter_beyond_limit_becomes_bevel() {
        let (verts, _) = stroked(corner(), corner_style(LineJoin::Miter, 1.0));
        let points = iter_points(&verts).collect::<Vec<_>>();

        assert_eq!(points.len(), 8);
        // two distinct outer vertices, none at the apex
        let outer = [points[3], points[5]];
        assert_ne!(outer[0], outer[1]);
        assert!((outer[0].distance(vec2(100.0, 0.0)) - 5.0).abs() < 1e-3);
        assert!((outer[1].distance(vec2(100.0, 0.0)) - 5.0).abs() < 1e-3);

        let (bevel, _) = stroked(corner(), corner_style(LineJoin::Bevel, 10.0));
        assert_eq!(bevel, verts);
    }

    #[test]
    fn round_join_fans_around_vertex() {
        let (verts, indices) = stroked(corner(), corner_style(LineJoin::Round, 10.0));
        let points = iter_points(&verts).collect::<Vec<_>>();

        assert!(points.len() > 8);
        let vertex = vec2(100.0, 0.0);
        let on_arc = points[2..points.len() - 2]
            .iter()
            .filter(|p| **p != vertex && (p.distance(vertex) - 5.0).abs() < 1e-3)
            .count();
        assert!(on_arc >= 3);
        assert!(!indices.is_empty());
    }

    #[test]
    fn straight_line_with_caps() {
        let mut line = Polygon::new([[0.0, 0.0], [10.0, 0.0]]);
        line.close_stroke = false;

        let (butt, indices) = stroked(line.clone(), LineStyle::new(4.0, 0, 1.0));
        assert_eq!(
            butt,
            vec![0.0, 2.0, 0.0, -2.0, 10.0, 2.0, 10.0, -2.0]
        );
        assert_eq!(indices, vec![0, 1, 2, 1, 2, 3]);

        let (square, _) = stroked(line.clone(), LineStyle::new(4.0, 0, 1.0).cap(LineCap::Square));
        let xs = iter_points(&square).map(|p| p.x).collect::<Vec<_>>();
        assert_eq!(xs.first(), Some(&-2.0));
        assert_eq!(xs.last(), Some(&12.0));

        let (round, _) = stroked(line, LineStyle::new(4.0, 0, 1.0).cap(LineCap::Round));
        let min_x = iter_points(&round).map(|p| p.x).fold(f32::MAX, f32::min);
        assert!((min_x + 2.0).abs() < 1e-3);
    }

    #[test]
    fn alignment_moves_the_rails() {
        let mut line = Polygon::new([[0.0, 0.0], [10.0, 0.0]]);
        line.close_stroke = false;

        // fully outer: the inner rail sits on the path
        let (verts, _) = stroked(line, LineStyle::new(4.0, 0, 1.0).alignment(1.0));
        assert_eq!(&verts[..4], &[0.0, 0.0, 0.0, -4.0]);
    }

    #[test]
    fn closed_rect_stroke_has_no_caps() {
        let style = LineStyle::new(2.0, 0, 1.0).cap(LineCap::Round);
        let (verts, indices) = stroked(Rect::xywh(0.0, 0.0, 10.0, 10.0), style);

        // seam midpoint twice plus four miter corners, two rails each
        assert_eq!(verts.len() / 2, 12);
        assert_eq!(&verts[..2], &verts[verts.len() - 4..verts.len() - 2]);
        assert!(!indices.is_empty());
    }

    #[test]
    fn native_line_list() {
        let style = LineStyle::new(1.0, 0, 1.0).native(true);

        let (verts, indices) = stroked(Rect::xywh(0.0, 0.0, 10.0, 10.0), style.clone());
        assert_eq!(verts.len(), 8);
        assert_eq!(indices, vec![0, 1, 1, 2, 2, 3, 3, 0]);

        let (_, indices) = stroked(corner(), style);
        assert_eq!(indices, vec![0, 1, 1, 2]);
    }

    #[test]
    fn degenerate_triples_are_skipped() {
        let mut line = Polygon::new([[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]]);
        line.close_stroke = false;

        let (verts, indices) = stroked(line, LineStyle::new(4.0, 0, 1.0));
        assert!(!verts.is_empty());
        assert!(indices.is_empty());
    }

    #[test]
    fn invisible_line_emits_nothing() {
        let (verts, indices) = stroked(corner(), LineStyle::new(0.0, 0, 1.0));
        assert!(verts.is_empty() && indices.is_empty());
    }
}
