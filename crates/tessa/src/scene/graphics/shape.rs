use tessa_math::{vec2, Rect};

use crate::{path::iter_points, GraphicsError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
}

impl RoundedRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32, radius: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            radius,
        }
    }

    /// Corner radius clamped to half the shorter side.
    pub fn clamped_radius(&self) -> f32 {
        self.radius.min(self.width.min(self.height) / 2.0).max(0.0)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 {
            return false;
        }

        let (left, top) = (self.x, self.y);
        let (right, bottom) = (self.x + self.width, self.y + self.height);
        if x < left || x > right || y < top || y > bottom {
            return false;
        }

        let radius = self.clamped_radius();
        if (y >= top + radius && y <= bottom - radius) || (x >= left + radius && x <= right - radius)
        {
            return true;
        }

        let r2 = radius * radius;
        [
            vec2(left + radius, top + radius),
            vec2(right - radius, top + radius),
            vec2(right - radius, bottom - radius),
            vec2(left + radius, bottom - radius),
        ]
        .into_iter()
        .any(|corner| (vec2(x, y) - corner).magnitude_sq() <= r2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Circle {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self { x, y, radius }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.radius <= 0.0 {
            return false;
        }

        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// An axis aligned ellipse. `half_width`/`half_height` are the radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub x: f32,
    pub y: f32,
    pub half_width: f32,
    pub half_height: f32,
}

impl Ellipse {
    pub fn new(x: f32, y: f32, half_width: f32, half_height: f32) -> Self {
        Self {
            x,
            y,
            half_width,
            half_height,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.half_width <= 0.0 || self.half_height <= 0.0 {
            return false;
        }

        let nx = (x - self.x) / self.half_width;
        let ny = (y - self.y) / self.half_height;
        nx * nx + ny * ny <= 1.0
    }
}

/// A flat `[x0, y0, x1, y1, ..]` point list. Open paths recorded by [`crate::Graphics`] have
/// `close_stroke` unset, so their stroke ends get caps instead of a seam join.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Vec<f32>,
    pub close_stroke: bool,
}

impl Default for Polygon {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            close_stroke: true,
        }
    }
}

impl Polygon {
    /// A closed polygon from points. A trailing unpaired coordinate is dropped.
    pub fn new(points: impl IntoIterator<Item = [f32; 2]>) -> Self {
        Self {
            points: points.into_iter().flatten().collect(),
            close_stroke: true,
        }
    }

    pub fn from_flat(points: Vec<f32>) -> Result<Self, GraphicsError> {
        if points.len() % 2 != 0 {
            return Err(GraphicsError::OddCoordinateCount(points.len()));
        }

        Ok(Self {
            points,
            close_stroke: true,
        })
    }

    pub(crate) fn open() -> Self {
        Self {
            points: Vec::new(),
            close_stroke: false,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.points.len() < 2
    }

    /// Even-odd crossing test.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let mut inside = false;
        let len = self.len();
        if len == 0 {
            return false;
        }

        let mut j = len - 1;
        for i in 0..len {
            let (xi, yi) = (self.points[i * 2], self.points[i * 2 + 1]);
            let (xj, yj) = (self.points[j * 2], self.points[j * 2 + 1]);

            let crosses = (yi > y) != (yj > y) && x < (xj - xi) * ((y - yi) / (yj - yi)) + xi;
            if crosses {
                inside = !inside;
            }
            j = i;
        }

        inside
    }

    pub fn bounds(&self) -> Rect<f32> {
        Rect::from_points(iter_points(&self.points)).unwrap_or(Rect::EMPTY)
    }

    /// Twice the signed area, positive when the points run counter clockwise in a y-down space.
    pub(crate) fn signed_area(points: &[f32]) -> f32 {
        let m = points.len() & !1;
        if m < 6 {
            return 0.0;
        }

        let (mut x1, mut y1) = (points[m - 2], points[m - 1]);
        let mut area = 0.0;
        for p in points[..m].chunks_exact(2) {
            let (x2, y2) = (p[0], p[1]);
            area += (x2 - x1) * (y2 + y1);
            x1 = x2;
            y1 = y2;
        }
        area
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect(Rect<f32>),
    RoundedRect(RoundedRect),
    Circle(Circle),
    Ellipse(Ellipse),
    Polygon(Polygon),
}

impl Shape {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        match self {
            Shape::Rect(rect) => rect.contains(x, y),
            Shape::RoundedRect(rect) => rect.contains(x, y),
            Shape::Circle(circle) => circle.contains(x, y),
            Shape::Ellipse(ellipse) => ellipse.contains(x, y),
            Shape::Polygon(polygon) => polygon.contains(x, y),
        }
    }

    pub fn bounds(&self) -> Rect<f32> {
        match self {
            Shape::Rect(rect) => *rect,
            Shape::RoundedRect(r) => Rect::xywh(r.x, r.y, r.width, r.height),
            Shape::Circle(c) => Rect::xywh(
                c.x - c.radius,
                c.y - c.radius,
                c.radius * 2.0,
                c.radius * 2.0,
            ),
            Shape::Ellipse(e) => Rect::xywh(
                e.x - e.half_width,
                e.y - e.half_height,
                e.half_width * 2.0,
                e.half_height * 2.0,
            ),
            Shape::Polygon(polygon) => polygon.bounds(),
        }
    }

    /// Whether the stroke wraps around from the last point back to the first.
    pub fn closes_stroke(&self) -> bool {
        match self {
            Shape::Polygon(polygon) => polygon.close_stroke,
            _ => true,
        }
    }
}

impl From<Rect<f32>> for Shape {
    fn from(rect: Rect<f32>) -> Self {
        Shape::Rect(rect)
    }
}

impl From<RoundedRect> for Shape {
    fn from(rect: RoundedRect) -> Self {
        Shape::RoundedRect(rect)
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Shape::Circle(circle)
    }
}

impl From<Ellipse> for Shape {
    fn from(ellipse: Ellipse) -> Self {
        Shape::Ellipse(ellipse)
    }
}

impl From<Polygon> for Shape {
    fn from(polygon: Polygon) -> Self {
        Shape::Polygon(polygon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_is_half_open() {
        let shape = Shape::from(Rect::xywh(0.0, 0.0, 10.0, 10.0));
        assert!(shape.contains(0.0, 0.0));
        assert!(shape.contains(9.99, 5.0));
        assert!(!shape.contains(10.0, 5.0));
    }

    #[test]
    fn rounded_rect_excludes_corners() {
        let rect = RoundedRect::new(0.0, 0.0, 100.0, 50.0, 20.0);
        assert!(rect.contains(50.0, 25.0));
        assert!(rect.contains(10.0, 25.0));
        assert!(rect.contains(20.0, 1.0));
        assert!(!rect.contains(1.0, 1.0));
        assert!(rect.contains(8.0, 8.0));
        assert!(!rect.contains(101.0, 25.0));
    }

    #[test]
    fn rounded_rect_radius_is_clamped() {
        assert_eq!(RoundedRect::new(0.0, 0.0, 10.0, 40.0, 50.0).clamped_radius(), 5.0);
        assert_eq!(RoundedRect::new(0.0, 0.0, 10.0, 40.0, -1.0).clamped_radius(), 0.0);
    }

    #[test]
    fn circle_and_ellipse() {
        let circle = Circle::new(10.0, 10.0, 5.0);
        assert!(circle.contains(14.0, 10.0));
        assert!(!circle.contains(14.0, 14.0));
        assert!(!Circle::new(0.0, 0.0, 0.0).contains(0.0, 0.0));

        let ellipse = Ellipse::new(0.0, 0.0, 20.0, 5.0);
        assert!(ellipse.contains(19.0, 0.0));
        assert!(!ellipse.contains(0.0, 6.0));
        assert_eq!(
            Shape::from(ellipse).bounds(),
            Rect::xywh(-20.0, -5.0, 40.0, 10.0)
        );
    }

    #[test]
    fn polygon_even_odd() {
        // a bow tie crossing itself at (5, 5)
        let bow = Polygon::new([[0.0, 0.0], [10.0, 10.0], [10.0, 0.0], [0.0, 10.0]]);
        assert!(bow.contains(8.0, 5.0));
        assert!(!bow.contains(5.0, 1.0));

        let triangle = Polygon::new([[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]]);
        assert!(triangle.contains(2.0, 2.0));
        assert!(!triangle.contains(8.0, 8.0));
        assert_eq!(triangle.bounds(), Rect::xywh(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn from_flat_rejects_odd_lists() {
        assert_eq!(
            Polygon::from_flat(vec![0.0, 1.0, 2.0]),
            Err(GraphicsError::OddCoordinateCount(3))
        );
        let polygon = Polygon::from_flat(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0]).unwrap();
        assert_eq!(polygon.len(), 3);
        assert!(polygon.close_stroke);
    }

    #[test]
    fn signed_area_sign_follows_winding() {
        let cw = [0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0];
        let ccw = [0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 10.0, 0.0];
        assert!(Polygon::signed_area(&cw) < 0.0);
        assert!(Polygon::signed_area(&ccw) > 0.0);
        assert_eq!(Polygon::signed_area(&cw[..4]), 0.0);
    }
}
