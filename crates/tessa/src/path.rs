pub mod curves;

pub use curves::*;

use tessa_math::{vec2, Point};

/// Last `(x, y)` pair of a flat point list.
#[inline]
pub fn last_point(points: &[f32]) -> Option<Point> {
    match points {
        [.., x, y] => Some(vec2(*x, *y)),
        _ => None,
    }
}

/// Iterates a flat `[x0, y0, x1, y1, ..]` list as points. A trailing odd value is ignored.
#[inline]
pub fn iter_points(points: &[f32]) -> impl Iterator<Item = Point> + '_ {
    points.chunks_exact(2).map(|p| vec2(p[0], p[1]))
}
