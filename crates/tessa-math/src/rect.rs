use crate::{vec2, Size, Vec2};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T> Rect<T> {
    #[inline]
    pub const fn xywh(x: T, y: T, width: T, height: T) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl Rect<f32> {
    pub const EMPTY: Self = Self::xywh(0.0, 0.0, 0.0, 0.0);

    pub fn from_corners(min: Vec2<f32>, max: Vec2<f32>) -> Self {
        Self::xywh(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Smallest rect containing every point; `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec2<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self::from_corners(min, max))
    }

    #[inline]
    pub fn min(&self) -> Vec2<f32> {
        vec2(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vec2<f32> {
        vec2(self.x + self.width, self.y + self.height)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn top_left(&self) -> Vec2<f32> {
        self.min()
    }

    #[inline]
    pub fn top_right(&self) -> Vec2<f32> {
        vec2(self.right(), self.y)
    }

    #[inline]
    pub fn bottom_left(&self) -> Vec2<f32> {
        vec2(self.x, self.bottom())
    }

    #[inline]
    pub fn bottom_right(&self) -> Vec2<f32> {
        self.max()
    }

    pub fn corners(&self) -> [Vec2<f32>; 4] {
        [
            self.top_left(),
            self.top_right(),
            self.bottom_right(),
            self.bottom_left(),
        ]
    }

    pub fn size(&self) -> Size<f32> {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Half open on the right and bottom edges.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 {
            return false;
        }
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::from_corners(self.min().min(other.min()), self.max().max(other.max()))
    }

    pub fn pad(&self, amount: f32) -> Self {
        Self::xywh(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }
}

impl From<(f32, f32, f32, f32)> for Rect<f32> {
    fn from((x, y, width, height): (f32, f32, f32, f32)) -> Self {
        Self::xywh(x, y, width, height)
    }
}
