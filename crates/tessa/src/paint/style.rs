use derive_more::derive::{Deref, DerefMut};
use tessa_math::Mat3;

use super::{premultiply_rgb, Texture};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineJoin {
    #[default]
    Miter,
    Bevel,
    Round,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillStyle {
    /// 0xRRGGBB
    pub color: u32,
    pub alpha: f32,
    pub texture: Texture,
    /// Maps local coordinates into texture space. Stored already inverted.
    pub matrix: Option<Mat3>,
    pub visible: bool,
}

impl Default for FillStyle {
    fn default() -> Self {
        Self {
            color: 0xffffff,
            alpha: 1.0,
            texture: Texture::white(),
            matrix: None,
            visible: false,
        }
    }
}

impl FillStyle {
    pub fn solid(color: u32, alpha: f32) -> Self {
        let mut style = Self {
            color,
            alpha,
            ..Default::default()
        };
        style.update_visibility();
        style
    }

    pub fn textured(texture: Texture, color: u32, alpha: f32) -> Self {
        let mut style = Self::solid(color, alpha);
        style.texture = texture;
        style
    }

    pub fn update_visibility(&mut self) {
        self.visible = self.alpha > 0.0;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Per vertex color of this style.
    pub fn premultiplied_color(&self) -> u32 {
        premultiply_rgb(self.color, self.alpha)
    }
}

/// Fill attributes plus the stroke shape parameters.
#[derive(Debug, Clone, PartialEq, Deref, DerefMut)]
pub struct LineStyle {
    #[deref]
    #[deref_mut]
    pub fill: FillStyle,
    pub width: f32,
    /// 0 strokes fully inside the shape, 0.5 centers the stroke, 1 strokes fully outside.
    pub alignment: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    /// Emit a gpu line list instead of triangles.
    pub native: bool,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            fill: FillStyle {
                color: 0x0,
                ..Default::default()
            },
            width: 0.0,
            alignment: 0.5,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            native: false,
        }
    }
}

impl LineStyle {
    pub fn new(width: f32, color: u32, alpha: f32) -> Self {
        let mut style = Self {
            width,
            fill: FillStyle {
                color,
                alpha,
                ..Default::default()
            },
            ..Default::default()
        };
        style.update_visibility();
        style
    }

    pub fn alignment(mut self, alignment: f32) -> Self {
        self.alignment = alignment.clamp(0.0, 1.0);
        self
    }

    pub fn cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn miter_limit(mut self, miter_limit: f32) -> Self {
        self.miter_limit = miter_limit;
        self
    }

    pub fn native(mut self, native: bool) -> Self {
        self.native = native;
        self
    }

    pub fn texture(mut self, texture: Texture) -> Self {
        self.fill.texture = texture;
        self
    }

    pub fn update_visibility(&mut self) {
        self.fill.visible = self.fill.alpha > 0.0 && self.width > 0.0;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_follows_alpha_and_width() {
        assert!(FillStyle::solid(0xff0000, 1.0).visible);
        assert!(!FillStyle::solid(0xff0000, 0.0).visible);
        assert!(LineStyle::new(2.0, 0x0, 1.0).visible);
        assert!(!LineStyle::new(0.0, 0x0, 1.0).visible);
        assert!(!LineStyle::new(2.0, 0x0, 0.0).visible);
        assert!(!FillStyle::default().visible);
    }

    #[test]
    fn clones_are_snapshots() {
        let mut style = LineStyle::new(4.0, 0x00ff00, 1.0);
        let recorded = style.clone();
        style.width = 10.0;
        style.color = 0xff0000;
        assert_eq!(recorded.width, 4.0);
        assert_eq!(recorded.color, 0x00ff00);
    }
}
