use tessa_math::Mat3;

use super::Shape;
use crate::{FillStyle, LineStyle};

/// One recorded shape with snapshots of the styles and transform active when it was drawn.
#[derive(Debug, Clone)]
pub struct GraphicsData {
    pub shape: Shape,
    pub fill_style: Option<FillStyle>,
    pub line_style: Option<LineStyle>,
    pub matrix: Option<Mat3>,
    /// The flattened outline, in the space the matrix maps to. Rebuilt on every tessellation.
    pub points: Vec<f32>,
    pub holes: Vec<GraphicsData>,
}

impl GraphicsData {
    pub fn new(
        shape: Shape,
        fill_style: Option<FillStyle>,
        line_style: Option<LineStyle>,
        matrix: Option<Mat3>,
    ) -> Self {
        Self {
            shape,
            fill_style,
            line_style,
            matrix: matrix.filter(|m| !m.is_identity()),
            points: Vec::new(),
            holes: Vec::new(),
        }
    }

    pub(crate) fn visible_fill(&self) -> Option<&FillStyle> {
        self.fill_style.as_ref().filter(|style| style.visible)
    }

    pub(crate) fn visible_line(&self) -> Option<&LineStyle> {
        self.line_style.as_ref().filter(|style| style.visible)
    }

    /// Whether a local point hits this record's fill and none of its holes.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let local = |matrix: &Option<Mat3>| match matrix {
            Some(m) => m.apply_inverse((x, y).into()),
            None => (x, y).into(),
        };

        let p = local(&self.matrix);
        if !self.shape.contains(p.x, p.y) {
            return false;
        }

        !self.holes.iter().any(|hole| {
            let p = local(&hole.matrix);
            hole.shape.contains(p.x, p.y)
        })
    }
}
