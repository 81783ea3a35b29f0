use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd, Hash, Eq)]
#[repr(C)]
pub struct Vec2<T> {
    pub x: T,
    pub y: T,
}

#[inline(always)]
pub const fn vec2<T>(x: T, y: T) -> Vec2<T> {
    Vec2 { x, y }
}

impl<T> Vec2<T> {
    #[inline]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub fn map<U>(self, f: impl Fn(T) -> U) -> Vec2<U> {
        Vec2 {
            x: f(self.x),
            y: f(self.y),
        }
    }
}

impl Vec2<f32> {
    pub const ZERO: Self = vec2(0.0, 0.0);

    #[inline]
    pub fn dot(&self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// z component of the 3d cross product
    #[inline]
    pub fn cross(&self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn magnitude_sq(&self) -> f32 {
        self.dot(*self)
    }

    #[inline]
    pub fn magnitude(&self) -> f32 {
        self.magnitude_sq().sqrt()
    }

    #[inline]
    pub fn distance(&self, other: Self) -> f32 {
        (*self - other).magnitude()
    }

    /// Returns the zero vector when the length is zero.
    #[inline]
    pub fn normalize(&self) -> Self {
        let len = self.magnitude();
        if len > 0.0 {
            vec2(self.x / len, self.y / len)
        } else {
            Self::ZERO
        }
    }

    /// Rotates by 90 degrees (clockwise in a y-down space)
    #[inline]
    pub fn rot90(&self) -> Self {
        vec2(-self.y, self.x)
    }

    #[inline]
    pub fn lerp(&self, other: Self, t: f32) -> Self {
        vec2(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    #[inline]
    pub fn min(&self, other: Self) -> Self {
        vec2(self.x.min(other.x), self.y.min(other.y))
    }

    #[inline]
    pub fn max(&self, other: Self) -> Self {
        vec2(self.x.max(other.x), self.y.max(other.y))
    }

    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl<T> From<(T, T)> for Vec2<T> {
    fn from((x, y): (T, T)) -> Self {
        Self { x, y }
    }
}

impl<T> From<[T; 2]> for Vec2<T> {
    fn from([x, y]: [T; 2]) -> Self {
        Self { x, y }
    }
}

impl<T: Add<Output = T>> Add for Vec2<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        vec2(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: AddAssign> AddAssign for Vec2<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl<T: Sub<Output = T>> Sub for Vec2<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        vec2(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: SubAssign> SubAssign for Vec2<T> {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl<T: Mul<Output = T> + Copy> Mul<T> for Vec2<T> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self::Output {
        vec2(self.x * rhs, self.y * rhs)
    }
}

impl<T: Div<Output = T> + Copy> Div<T> for Vec2<T> {
    type Output = Self;

    fn div(self, rhs: T) -> Self::Output {
        vec2(self.x / rhs, self.y / rhs)
    }
}

impl<T: Neg<Output = T>> Neg for Vec2<T> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        vec2(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec2_cross_sign_follows_turn() {
        let right = vec2(1.0, 0.0);
        let down = vec2(0.0, 1.0);
        assert_eq!(right.cross(down), 1.0);
        assert_eq!(down.cross(right), -1.0);
    }

    #[test]
    fn vec2_normalize_zero() {
        assert_eq!(Vec2::<f32>::ZERO.normalize(), Vec2::ZERO);
        assert_eq!(vec2(3.0, 4.0).normalize(), vec2(0.6, 0.8));
    }
}
