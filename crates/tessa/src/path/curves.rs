//! Curve flattening. Every function appends to a flat point list whose last pair is the start
//! of the curve; the start itself is never pushed again.

use std::f32::consts::{PI, TAU};

use tessa_math::{vec2, Point};

use super::last_point;
use crate::CurveResolution;

/// Number of samples used to estimate the length of a bezier curve.
const LENGTH_SAMPLES: u32 = 10;

/// Arcs narrower than this are treated as straight lines by [`arc_to`].
const ARC_TO_COLLINEAR_EPS: f32 = 1.0e-8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticBezier {
    pub from: Point,
    pub ctrl: Point,
    pub to: Point,
}

impl QuadraticBezier {
    pub fn sample(&self, t: f32) -> Point {
        let a = self.from.lerp(self.ctrl, t);
        let b = self.ctrl.lerp(self.to, t);
        a.lerp(b, t)
    }

    pub fn length(&self) -> f32 {
        sampled_length(|t| self.sample(t))
    }

    /// Appends `segments` points for `t` in `(0, 1]`. The last point is `to` exactly.
    pub fn flatten_into(&self, points: &mut Vec<f32>, segments: u32) {
        flatten(points, segments, self.to, |t| self.sample(t));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub from: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub to: Point,
}

impl CubicBezier {
    pub fn sample(&self, t: f32) -> Point {
        let nt = 1.0 - t;
        let nt2 = nt * nt;
        let t2 = t * t;

        let a = nt2 * nt;
        let b = 3.0 * nt2 * t;
        let c = 3.0 * nt * t2;
        let d = t2 * t;

        vec2(
            a * self.from.x + b * self.ctrl1.x + c * self.ctrl2.x + d * self.to.x,
            a * self.from.y + b * self.ctrl1.y + c * self.ctrl2.y + d * self.to.y,
        )
    }

    pub fn length(&self) -> f32 {
        sampled_length(|t| self.sample(t))
    }

    /// Appends `segments` points for `t` in `(0, 1]`. The last point is `to` exactly.
    pub fn flatten_into(&self, points: &mut Vec<f32>, segments: u32) {
        flatten(points, segments, self.to, |t| self.sample(t));
    }
}

fn sampled_length(sample: impl Fn(f32) -> Point) -> f32 {
    let mut prev = sample(0.0);
    let mut length = 0.0;
    for i in 1..=LENGTH_SAMPLES {
        let p = sample(i as f32 / LENGTH_SAMPLES as f32);
        length += prev.distance(p);
        prev = p;
    }
    length
}

fn flatten(points: &mut Vec<f32>, segments: u32, to: Point, sample: impl Fn(f32) -> Point) {
    let segments = segments.max(1);
    points.reserve(segments as usize * 2);

    for i in 1..segments {
        let p = sample(i as f32 / segments as f32);
        points.extend_from_slice(&[p.x, p.y]);
    }
    points.extend_from_slice(&[to.x, to.y]);
}

pub fn quadratic_curve_to(points: &mut Vec<f32>, ctrl: Point, to: Point, curves: &CurveResolution) {
    let Some(from) = last_point(points) else {
        return;
    };

    let curve = QuadraticBezier { from, ctrl, to };
    let segments = curves.segments_count(curve.length(), CurveResolution::DEFAULT_SEGMENTS);
    curve.flatten_into(points, segments);
}

pub fn bezier_curve_to(
    points: &mut Vec<f32>,
    ctrl1: Point,
    ctrl2: Point,
    to: Point,
    curves: &CurveResolution,
) {
    let Some(from) = last_point(points) else {
        return;
    };

    let curve = CubicBezier {
        from,
        ctrl1,
        ctrl2,
        to,
    };
    let segments = curves.segments_count(curve.length(), CurveResolution::DEFAULT_SEGMENTS);
    curve.flatten_into(points, segments);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub center: Point,
    pub radius: f32,
    pub start_angle: f32,
    pub end_angle: f32,
    pub anticlockwise: bool,
}

/// Solves the arc tangent to both the line from the current point to `p1` and the line from
/// `p1` to `p2`.
///
/// Returns `None` when the tangents are (nearly) collinear or `radius` is zero. In that case
/// `p1` is appended as a straight line unless it is already the last point.
pub fn arc_to(points: &mut Vec<f32>, p1: Point, p2: Point, radius: f32) -> Option<Arc> {
    let from = last_point(points)?;

    let a1 = from.y - p1.y;
    let b1 = from.x - p1.x;
    let a2 = p2.y - p1.y;
    let b2 = p2.x - p1.x;
    let mm = (a1 * b2 - b1 * a2).abs();

    if mm < ARC_TO_COLLINEAR_EPS || radius == 0.0 {
        if from != p1 {
            points.extend_from_slice(&[p1.x, p1.y]);
        }
        return None;
    }

    let dd = a1 * a1 + b1 * b1;
    let cc = a2 * a2 + b2 * b2;
    let tt = a1 * a2 + b1 * b2;
    let k1 = radius * dd.sqrt() / mm;
    let k2 = radius * cc.sqrt() / mm;
    let j1 = k1 * tt / dd;
    let j2 = k2 * tt / cc;
    let cx = k1 * b2 + k2 * b1;
    let cy = k1 * a2 + k2 * a1;
    let px = b1 * (k2 + j1);
    let py = a1 * (k2 + j1);
    let qx = b2 * (k1 + j2);
    let qy = a2 * (k1 + j2);

    Some(Arc {
        center: vec2(cx + p1.x, cy + p1.y),
        radius,
        start_angle: (py - cy).atan2(px - cx),
        end_angle: (qy - cy).atan2(qx - cx),
        anticlockwise: b1 * a2 > b2 * a1,
    })
}

/// Shifts one of the angles by a full turn so the sweep runs in the requested direction.
pub fn normalize_arc_angles(start: f32, end: f32, anticlockwise: bool) -> (f32, f32) {
    if !anticlockwise && end <= start {
        (start, end + TAU)
    } else if anticlockwise && start <= end {
        (start + TAU, end)
    } else {
        (start, end)
    }
}

/// Appends the points of an arc after its start point. Angles must already be normalized with
/// [`normalize_arc_angles`].
pub fn arc(
    points: &mut Vec<f32>,
    center: Point,
    radius: f32,
    start_angle: f32,
    end_angle: f32,
    curves: &CurveResolution,
) {
    let sweep = end_angle - start_angle;
    if sweep == 0.0 {
        return;
    }

    let default_segments = (sweep.abs() / TAU).ceil() as u32 * 40;
    let segments = curves
        .segments_count(sweep.abs() * radius, default_segments)
        .max(1);

    let (step_sin, step_cos) = (sweep / segments as f32).sin_cos();
    let (mut sin, mut cos) = start_angle.sin_cos();

    points.reserve(segments as usize * 2);
    for _ in 1..segments {
        (cos, sin) = (cos * step_cos - sin * step_sin, sin * step_cos + cos * step_sin);
        points.extend_from_slice(&[center.x + cos * radius, center.y + sin * radius]);
    }

    let (sin, cos) = end_angle.sin_cos();
    points.extend_from_slice(&[center.x + cos * radius, center.y + sin * radius]);
}

/// Number of fan segments for a round join or cap sweeping `angle` radians at `radius`.
pub fn round_segments(radius: f32, angle: f32, curves: &CurveResolution) -> u32 {
    let fallback = (15.0 * angle.abs() * radius.sqrt() / PI) as u32 + 1;
    curves
        .segments_count(angle.abs() * radius, fallback)
        .max(1)
}
