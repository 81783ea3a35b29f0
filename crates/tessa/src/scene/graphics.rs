use tessa_math::{vec2, Mat3, Point, Rect};

use crate::{
    path::{self, last_point},
    CurveResolution, FillStyle, GraphicsConfig, LineStyle,
};

mod batch;
mod data;
mod fill;
mod geometry;
mod shape;
mod stroke;

pub use batch::{BatchPart, BatchStyle, DrawCall, GraphicsVertex, IndexBuffer};
pub use data::GraphicsData;
pub use geometry::{GraphicsGeometry, SharedGeometry};
pub use shape::{Circle, Ellipse, Polygon, RoundedRect, Shape};

/// Stateful drawing front end. Paths and shapes are recorded into a [`GraphicsGeometry`] with a
/// snapshot of the fill, line style and matrix active at the time.
#[derive(Debug)]
pub struct Graphics {
    geometry: SharedGeometry,
    fill_style: FillStyle,
    line_style: LineStyle,
    matrix: Option<Mat3>,
    hole_mode: bool,
    current_path: Option<Polygon>,
}

impl Default for Graphics {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Graphics {
    fn drop(&mut self) {
        self.geometry.write().release();
    }
}

impl Graphics {
    pub fn new() -> Self {
        Self::with_config(GraphicsConfig::default())
    }

    pub fn with_config(config: GraphicsConfig) -> Self {
        Self::with_geometry(SharedGeometry::new(GraphicsGeometry::new(config)))
    }

    /// A front end drawing into an existing geometry. Holds a reference until dropped.
    pub fn with_geometry(geometry: SharedGeometry) -> Self {
        geometry.write().retain();

        Self {
            geometry,
            fill_style: FillStyle::default(),
            line_style: LineStyle::default(),
            matrix: None,
            hole_mode: false,
            current_path: None,
        }
    }

    /// A new front end with default styles sharing this one's geometry.
    pub fn share(&self) -> Self {
        Self::with_geometry(self.geometry.clone())
    }

    pub fn geometry(&self) -> &SharedGeometry {
        &self.geometry
    }

    pub fn cx<T>(&self, f: impl FnOnce(&GraphicsGeometry) -> T) -> T {
        f(&self.geometry.read())
    }

    pub fn cx_mut<T>(&self, f: impl FnOnce(&mut GraphicsGeometry) -> T) -> T {
        f(&mut self.geometry.write())
    }

    pub fn fill(&self) -> &FillStyle {
        &self.fill_style
    }

    pub fn line(&self) -> &LineStyle {
        &self.line_style
    }

    pub fn matrix(&self) -> Option<Mat3> {
        self.matrix
    }

    pub fn current_path(&self) -> Option<&Polygon> {
        self.current_path.as_ref()
    }

    fn curves(&self) -> CurveResolution {
        self.geometry.read().config().curves
    }
}

impl Graphics {
    pub fn line_style(&mut self, width: f32, color: u32, alpha: f32) -> &mut Self {
        self.line_texture_style(LineStyle::new(width, color, alpha))
    }

    /// Sets the style of subsequent strokes. The style's texture matrix maps texture space to
    /// local space and is stored inverted.
    pub fn line_texture_style(&mut self, mut style: LineStyle) -> &mut Self {
        if self.current_path.is_some() {
            self.start_poly();
        }

        style.update_visibility();
        if style.visible {
            style.matrix = style.matrix.map(|m| m.inverse());
            self.line_style = style;
        } else {
            self.line_style.reset();
        }
        self
    }

    pub fn begin_fill(&mut self, color: u32, alpha: f32) -> &mut Self {
        self.begin_texture_fill(FillStyle::solid(color, alpha))
    }

    pub fn begin_texture_fill(&mut self, mut style: FillStyle) -> &mut Self {
        if self.current_path.is_some() {
            self.start_poly();
        }

        style.update_visibility();
        if style.visible {
            style.matrix = style.matrix.map(|m| m.inverse());
            self.fill_style = style;
        } else {
            self.fill_style.reset();
        }
        self
    }

    pub fn end_fill(&mut self) -> &mut Self {
        self.finish_poly();
        self.fill_style.reset();
        self
    }

    pub fn set_matrix(&mut self, matrix: Option<Mat3>) -> &mut Self {
        self.matrix = matrix;
        self
    }
}

impl Graphics {
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.start_poly();

        let current = self.current_path.get_or_insert_with(Polygon::open);
        current.points.clear();
        current.points.extend_from_slice(&[x, y]);
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        if self.current_path.is_none() {
            self.move_to(0.0, 0.0);
        }

        let points = self.path_points();
        if last_point(points) != Some(vec2(x, y)) {
            points.extend_from_slice(&[x, y]);
        }
        self
    }

    pub fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32) -> &mut Self {
        let curves = self.curves();
        let points = self.init_curve(0.0, 0.0);
        path::quadratic_curve_to(points, vec2(cpx, cpy), vec2(x, y), &curves);
        self
    }

    pub fn bezier_curve_to(
        &mut self,
        cpx1: f32,
        cpy1: f32,
        cpx2: f32,
        cpy2: f32,
        x: f32,
        y: f32,
    ) -> &mut Self {
        let curves = self.curves();
        let points = self.init_curve(0.0, 0.0);
        path::bezier_curve_to(
            points,
            vec2(cpx1, cpy1),
            vec2(cpx2, cpy2),
            vec2(x, y),
            &curves,
        );
        self
    }

    /// Rounds the corner at `(x1, y1)` between the current point and `(x2, y2)`.
    pub fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) -> &mut Self {
        let points = self.init_curve(x1, y1);
        if let Some(arc) = path::arc_to(points, vec2(x1, y1), vec2(x2, y2), radius) {
            self.arc(
                arc.center.x,
                arc.center.y,
                arc.radius,
                arc.start_angle,
                arc.end_angle,
                arc.anticlockwise,
            );
        }
        self
    }

    /// Angles are in radians, clockwise in a y-down space unless `anticlockwise` is set.
    pub fn arc(
        &mut self,
        cx: f32,
        cy: f32,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        anticlockwise: bool,
    ) -> &mut Self {
        if start_angle == end_angle {
            return self;
        }

        let (start_angle, end_angle) =
            path::normalize_arc_angles(start_angle, end_angle, anticlockwise);
        if end_angle - start_angle == 0.0 {
            return self;
        }

        let (eps, curves) = {
            let geometry = self.geometry.read();
            let config = geometry.config();
            (config.close_point_eps, config.curves)
        };

        let (sin, cos) = start_angle.sin_cos();
        let start = vec2(cx + cos * radius, cy + sin * radius);

        match self.current_path.as_mut() {
            Some(current) => {
                let joins = last_point(&current.points).is_some_and(|last| {
                    (last.x - start.x).abs() < eps && (last.y - start.y).abs() < eps
                });
                if !joins {
                    current.points.extend_from_slice(&[start.x, start.y]);
                }
            }
            None => {
                self.move_to(start.x, start.y);
            }
        }

        let points = self.path_points();
        path::arc(points, vec2(cx, cy), radius, start_angle, end_angle, &curves);
        self
    }

    /// Closes the current path so its stroke joins back to the first point.
    pub fn close_path(&mut self) -> &mut Self {
        if let Some(current) = self.current_path.as_mut() {
            current.close_stroke = true;
            self.finish_poly();
        }
        self
    }

    fn path_points(&mut self) -> &mut Vec<f32> {
        &mut self.current_path.get_or_insert_with(Polygon::open).points
    }

    /// Makes sure there is a path with a start point, beginning at `(x, y)` otherwise.
    fn init_curve(&mut self, x: f32, y: f32) -> &mut Vec<f32> {
        if self.current_path.is_none() {
            self.move_to(x, y);
        }

        let points = self.path_points();
        if points.is_empty() {
            points.extend_from_slice(&[x, y]);
        }
        points
    }

    /// Records the current path if it has at least two points and starts a new open path from
    /// its last point. A lone move-to point is kept so the next segment still starts there.
    fn start_poly(&mut self) {
        match self.current_path.take() {
            Some(current) if current.points.len() > 2 => {
                let mut next = Polygon::open();
                if let Some(last) = last_point(&current.points) {
                    next.points.extend_from_slice(&[last.x, last.y]);
                }
                self.record(Shape::Polygon(current));
                self.current_path = Some(next);
            }
            current => self.current_path = Some(current.unwrap_or_else(Polygon::open)),
        }
    }

    /// Records the current path if it has at least two points. Shorter paths are discarded.
    pub fn finish_poly(&mut self) -> &mut Self {
        if let Some(mut current) = self.current_path.take() {
            if current.points.len() > 2 {
                self.record(Shape::Polygon(current));
            } else {
                current.points.clear();
                self.current_path = Some(current);
            }
        }
        self
    }
}

impl Graphics {
    pub fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.draw_shape(Rect::xywh(x, y, width, height))
    }

    pub fn draw_rounded_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
    ) -> &mut Self {
        self.draw_shape(RoundedRect::new(x, y, width, height, radius))
    }

    pub fn draw_circle(&mut self, x: f32, y: f32, radius: f32) -> &mut Self {
        self.draw_shape(Circle::new(x, y, radius))
    }

    /// `half_width` and `half_height` are the radii along each axis.
    pub fn draw_ellipse(&mut self, x: f32, y: f32, half_width: f32, half_height: f32) -> &mut Self {
        self.draw_shape(Ellipse::new(x, y, half_width, half_height))
    }

    pub fn draw_polygon(&mut self, polygon: Polygon) -> &mut Self {
        self.draw_shape(polygon)
    }

    /// Records a shape with the current styles, or cuts it out of the last shape in hole mode.
    /// A pending path is recorded first so shapes keep their drawing order.
    pub fn draw_shape(&mut self, shape: impl Into<Shape>) -> &mut Self {
        self.finish_poly();
        self.record(shape.into());
        self
    }

    fn record(&mut self, shape: Shape) {
        let mut geometry = self.geometry.write();

        if self.hole_mode {
            if geometry.draw_hole(shape, self.matrix).is_none() {
                log::debug!("Ignoring hole drawn before any shape");
            }
        } else {
            geometry.draw_shape(
                shape,
                Some(self.fill_style.clone()),
                Some(self.line_style.clone()),
                self.matrix,
            );
        }
    }

    /// Shapes drawn until [`Graphics::end_hole`] are cut out of the last recorded shape.
    pub fn begin_hole(&mut self) -> &mut Self {
        self.finish_poly();
        self.hole_mode = true;
        self
    }

    pub fn end_hole(&mut self) -> &mut Self {
        self.finish_poly();
        self.hole_mode = false;
        self
    }

    /// Removes every shape and resets styles, matrix and hole mode.
    pub fn clear(&mut self) -> &mut Self {
        self.geometry.write().clear();
        self.line_style.reset();
        self.fill_style.reset();
        self.matrix = None;
        self.hole_mode = false;
        self.current_path = None;
        self
    }
}

impl Graphics {
    /// Flushes the current path and brings the geometry buffers up to date. Returns `false` when
    /// the update has to wait for a texture, in which case it should be retried next frame.
    pub fn prepare(&mut self, allow_32bit_indices: bool) -> bool {
        self.finish_poly();

        match self.geometry.write().update_batches(allow_32bit_indices) {
            Ok(()) => true,
            Err(err) if err.is_retryable() => {
                log::debug!("Graphics update deferred: {err}");
                false
            }
            Err(err) => {
                log::error!("Graphics update failed: {err}");
                false
            }
        }
    }

    /// Hit tests a point in local space against the visible fills, minus their holes.
    pub fn contains_point(&self, point: Point) -> bool {
        self.geometry.read().contains_point(point)
    }

    pub fn bounds(&self) -> Rect<f32> {
        self.geometry.write().bounds()
    }

    /// Whether the geometry is a single untransformed rect fill without holes or a visible
    /// stroke, which a renderer can draw as a plain quad.
    pub fn is_fast_rect(&self) -> bool {
        let geometry = self.geometry.read();
        let [data] = geometry.graphics_data() else {
            return false;
        };

        matches!(data.shape, Shape::Rect(_))
            && data.matrix.is_none()
            && data.holes.is_empty()
            && data.visible_line().is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use super::*;
    use crate::{Size, Texture};

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    fn records(g: &Graphics) -> Vec<GraphicsData> {
        g.cx(|geometry| geometry.graphics_data().to_vec())
    }

    #[test]
    fn path_is_recorded_on_finish() {
        let mut g = Graphics::new();
        g.move_to(0.0, 0.0).line_to(10.0, 0.0).line_to(10.0, 10.0);
        assert!(records(&g).is_empty());

        g.finish_poly();
        let data = records(&g);
        assert_eq!(data.len(), 1);
        let Shape::Polygon(polygon) = &data[0].shape else {
            panic!("expected a polygon");
        };
        assert_eq!(polygon.points, vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0]);
        assert!(!polygon.close_stroke);
        assert!(g.current_path().is_none());
    }

    #[test]
    fn style_change_splits_path_at_last_point() {
        let mut g = Graphics::new();
        g.move_to(0.0, 0.0).line_to(10.0, 0.0);
        g.begin_fill(0xff0000, 1.0);

        assert_eq!(records(&g).len(), 1);
        assert_eq!(g.current_path().unwrap().points, vec![10.0, 0.0]);

        g.line_to(10.0, 10.0).close_path();
        let data = records(&g);
        assert_eq!(data.len(), 2);
        assert!(data[1].fill_style.as_ref().unwrap().visible);
        assert!(data[1].shape.closes_stroke());
    }

    #[test]
    fn single_point_paths_are_discarded() {
        let mut g = Graphics::new();
        g.move_to(5.0, 5.0).line_to(5.0, 5.0).finish_poly();

        assert!(records(&g).is_empty());
        assert!(g.current_path().unwrap().points.is_empty());
    }

    #[test]
    fn style_change_keeps_the_move_to_point() {
        let mut g = Graphics::new();
        g.move_to(0.0, 0.0)
            .line_style(2.0, 0x000000, 1.0)
            .line_to(10.0, 0.0)
            .finish_poly();

        let data = records(&g);
        assert_eq!(data.len(), 1);
        let Shape::Polygon(polygon) = &data[0].shape else {
            panic!("expected a polygon");
        };
        assert_eq!(polygon.points, vec![0.0, 0.0, 10.0, 0.0]);
        assert_eq!(data[0].line_style.as_ref().map(|s| s.width), Some(2.0));
    }

    #[test]
    fn line_to_without_path_starts_at_origin() {
        let mut g = Graphics::new();
        g.line_to(10.0, 10.0);
        assert_eq!(g.current_path().unwrap().points, vec![0.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn quadratic_curve_ends_on_target() {
        let mut g = Graphics::new();
        g.quadratic_curve_to(10.0, 20.0, 20.0, 0.0);

        let points = &g.current_path().unwrap().points;
        assert_eq!(&points[..2], &[0.0, 0.0]);
        assert_eq!(last_point(points), Some(vec2(20.0, 0.0)));
    }

    #[test]
    fn arc_joins_current_point() {
        let mut g = Graphics::new();
        g.move_to(10.0, 0.0).arc(0.0, 0.0, 10.0, 0.0, PI, false);

        let points = &g.current_path().unwrap().points;
        // start point shared with the path, then 8 segments
        assert_eq!(points.len(), 18);
        assert!(!close(vec2(points[2], points[3]), vec2(10.0, 0.0)));
        assert!(close(last_point(points).unwrap(), vec2(-10.0, 0.0)));
    }

    #[test]
    fn arc_without_path_moves_to_start() {
        let mut g = Graphics::new();
        g.arc(0.0, 0.0, 10.0, 0.0, FRAC_PI_2, false);

        let points = &g.current_path().unwrap().points;
        assert_eq!(&points[..2], &[10.0, 0.0]);
        assert!(close(last_point(points).unwrap(), vec2(0.0, 10.0)));
    }

    #[test]
    fn arc_to_rounds_the_corner() {
        let mut g = Graphics::new();
        g.move_to(0.0, 0.0).arc_to(10.0, 0.0, 10.0, 10.0, 5.0);

        let points = &g.current_path().unwrap().points;
        assert!(close(vec2(points[2], points[3]), vec2(5.0, 0.0)));
        assert!(close(last_point(points).unwrap(), vec2(10.0, 5.0)));
    }

    #[test]
    fn collinear_arc_to_is_a_line() {
        let mut g = Graphics::new();
        g.move_to(0.0, 0.0).arc_to(10.0, 0.0, 20.0, 0.0, 5.0);
        assert_eq!(g.current_path().unwrap().points, vec![0.0, 0.0, 10.0, 0.0]);
    }

    #[test]
    fn recorded_styles_are_snapshots() {
        let mut g = Graphics::new();
        g.begin_fill(0xff0000, 1.0).draw_rect(0.0, 0.0, 10.0, 10.0);
        g.begin_fill(0x0000ff, 1.0).draw_rect(20.0, 0.0, 10.0, 10.0);

        let data = records(&g);
        assert_eq!(data[0].fill_style.as_ref().unwrap().color, 0xff0000);
        assert_eq!(data[1].fill_style.as_ref().unwrap().color, 0x0000ff);
    }

    #[test]
    fn invisible_styles_reset() {
        let mut g = Graphics::new();
        g.begin_fill(0xff0000, 0.0);
        assert_eq!(g.fill(), &FillStyle::default());

        g.line_style(0.0, 0xff0000, 1.0);
        assert_eq!(g.line(), &LineStyle::default());
    }

    #[test]
    fn texture_matrix_is_stored_inverted() {
        let mut g = Graphics::new();
        let mut style = FillStyle::textured(Texture::new(Size::new(8.0, 8.0)), 0xffffff, 1.0);
        style.matrix = Some(Mat3::from_scale(2.0, 2.0));
        g.begin_texture_fill(style);

        assert_eq!(g.fill().matrix, Some(Mat3::from_scale(0.5, 0.5)));
    }

    #[test]
    fn holes_cut_the_last_shape() {
        let mut g = Graphics::new();
        g.begin_fill(0xff0000, 1.0)
            .line_style(2.0, 0x0, 1.0)
            .draw_rect(0.0, 0.0, 100.0, 100.0)
            .begin_hole()
            .draw_rect(25.0, 25.0, 50.0, 50.0)
            .end_hole();

        let data = records(&g);
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].holes.len(), 1);
        assert!(data[0].holes[0].fill_style.is_none());
        assert_eq!(data[0].holes[0].line_style, data[0].line_style);

        assert!(!g.contains_point(vec2(50.0, 50.0)));
        assert!(g.contains_point(vec2(10.0, 10.0)));
    }

    #[test]
    fn hole_path_is_recorded_on_end_hole() {
        let mut g = Graphics::new();
        g.begin_fill(0xff0000, 1.0).draw_rect(0.0, 0.0, 100.0, 100.0);
        g.begin_hole()
            .move_to(40.0, 40.0)
            .line_to(60.0, 40.0)
            .line_to(50.0, 60.0)
            .end_hole();

        let data = records(&g);
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].holes.len(), 1);
        assert!(!g.contains_point(vec2(50.0, 45.0)));
    }

    #[test]
    fn matrix_applies_to_later_shapes() {
        let mut g = Graphics::new();
        g.begin_fill(0xff0000, 1.0)
            .set_matrix(Some(Mat3::from_translation(10.0, 0.0)))
            .draw_rect(0.0, 0.0, 5.0, 5.0);

        assert!(g.contains_point(vec2(12.0, 2.0)));
        assert!(!g.contains_point(vec2(2.0, 2.0)));
        assert_eq!(g.bounds(), Rect::xywh(10.0, 0.0, 5.0, 5.0));
    }

    #[test]
    fn fast_rect_detection() {
        let mut g = Graphics::new();
        g.begin_fill(0xff0000, 1.0).draw_rect(0.0, 0.0, 10.0, 10.0);
        assert!(g.is_fast_rect());

        g.draw_rect(20.0, 0.0, 10.0, 10.0);
        assert!(!g.is_fast_rect());

        let mut stroked = Graphics::new();
        stroked
            .line_style(2.0, 0x0, 1.0)
            .draw_rect(0.0, 0.0, 10.0, 10.0);
        assert!(!stroked.is_fast_rect());
    }

    #[test]
    fn clear_resets_front_end_state() {
        let mut g = Graphics::new();
        g.begin_fill(0xff0000, 1.0)
            .set_matrix(Some(Mat3::from_scale(2.0, 2.0)))
            .draw_rect(0.0, 0.0, 10.0, 10.0)
            .move_to(1.0, 1.0);
        g.clear();

        assert!(records(&g).is_empty());
        assert!(!g.fill().visible);
        assert!(g.matrix().is_none());
        assert!(g.current_path().is_none());
    }

    #[test]
    fn prepare_rect_and_circle() {
        let mut g = Graphics::new();
        g.begin_fill(0xff0000, 1.0)
            .draw_rect(0.0, 0.0, 50.0, 50.0)
            .begin_fill(0x0000ff, 1.0)
            .draw_circle(100.0, 100.0, 25.0);

        assert!(g.prepare(false));
        g.cx(|geometry| {
            assert_eq!(geometry.batches().len(), 2);
            assert!(geometry.is_batchable());
            assert_eq!(geometry.cache_dirty(), Some(geometry.dirty()));
        });
    }

    #[test]
    fn prepare_waits_for_textures() {
        let texture = Texture::pending(Size::new(16.0, 16.0));
        let mut g = Graphics::new();
        g.begin_texture_fill(FillStyle::textured(texture.clone(), 0xffffff, 1.0))
            .draw_rect(0.0, 0.0, 10.0, 10.0);

        assert!(!g.prepare(false));
        texture.set_ready(true);
        assert!(g.prepare(false));
        assert_eq!(g.cx(|geometry| geometry.batches().len()), 1);
    }

    #[test]
    fn shared_geometry_is_disposed_with_last_holder() {
        let mut g = Graphics::new();
        g.begin_fill(0xff0000, 1.0).draw_rect(0.0, 0.0, 10.0, 10.0);
        let geometry = g.geometry().clone();

        let other = g.share();
        assert!(other.geometry().ptr_eq(&geometry));
        assert_eq!(geometry.read().refs(), 2);

        drop(other);
        assert_eq!(geometry.read().refs(), 1);
        assert!(!geometry.read().is_empty());

        drop(g);
        assert_eq!(geometry.read().refs(), 0);
        assert!(geometry.read().is_empty());
    }
}
