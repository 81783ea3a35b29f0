use std::ops::Mul;

use crate::{vec2, Vec2};

/// 2D affine transform laid out as
/// ```text
/// | a  c  tx |
/// | b  d  ty |
/// | 0  0  1  |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat3 {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    pub fn from_translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn from_scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn from_rotation(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    #[inline]
    pub fn apply(&self, point: Vec2<f32>) -> Vec2<f32> {
        vec2(
            self.a * point.x + self.c * point.y + self.tx,
            self.b * point.x + self.d * point.y + self.ty,
        )
    }

    /// Transforms `point` by the inverse of this matrix without building it.
    #[inline]
    pub fn apply_inverse(&self, point: Vec2<f32>) -> Vec2<f32> {
        let id = 1.0 / (self.a * self.d + self.c * -self.b);
        vec2(
            self.d * id * point.x
                + -self.c * id * point.y
                + (self.ty * self.c - self.tx * self.d) * id,
            self.a * id * point.y
                + -self.b * id * point.x
                + (-self.ty * self.a + self.tx * self.b) * id,
        )
    }

    /// Transforms a flat `[x0, y0, x1, y1, ..]` list in place.
    pub fn apply_flat(&self, points: &mut [f32]) {
        for pair in points.chunks_exact_mut(2) {
            let p = self.apply(vec2(pair[0], pair[1]));
            pair[0] = p.x;
            pair[1] = p.y;
        }
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// A singular matrix is left untouched.
    pub fn invert(&mut self) -> &mut Self {
        let n = self.determinant();
        if n == 0.0 {
            return self;
        }
        let Self { a, b, c, d, tx, ty } = *self;
        self.a = d / n;
        self.b = -b / n;
        self.c = -c / n;
        self.d = a / n;
        self.tx = (c * ty - d * tx) / n;
        self.ty = -(a * ty - b * tx) / n;
        self
    }

    pub fn inverse(&self) -> Self {
        let mut m = *self;
        m.invert();
        m
    }

    /// `self = self * other`, `other` is applied first.
    pub fn append(&mut self, other: &Mat3) -> &mut Self {
        let Self { a, b, c, d, .. } = *self;
        self.a = other.a * a + other.b * c;
        self.b = other.a * b + other.b * d;
        self.c = other.c * a + other.d * c;
        self.d = other.c * b + other.d * d;
        self.tx = other.tx * a + other.ty * c + self.tx;
        self.ty = other.tx * b + other.ty * d + self.ty;
        self
    }

    pub fn translate(&mut self, dx: f32, dy: f32) -> &mut Self {
        self.append(&Self::from_translation(dx, dy))
    }

    pub fn scale(&mut self, sx: f32, sy: f32) -> &mut Self {
        self.append(&Self::from_scale(sx, sy))
    }

    pub fn rotate(&mut self, angle: f32) -> &mut Self {
        self.append(&Self::from_rotation(angle))
    }
}

impl Mul<Vec2<f32>> for Mat3 {
    type Output = Vec2<f32>;

    fn mul(self, rhs: Vec2<f32>) -> Self::Output {
        self.apply(rhs)
    }
}

impl Mul<Vec2<f32>> for &Mat3 {
    type Output = Vec2<f32>;

    fn mul(self, rhs: Vec2<f32>) -> Self::Output {
        self.apply(rhs)
    }
}

impl Mul for Mat3 {
    type Output = Mat3;

    fn mul(self, rhs: Mat3) -> Self::Output {
        let mut out = self;
        out.append(&rhs);
        out
    }
}
