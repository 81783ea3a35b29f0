#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub const fn new(width: T, height: T) -> Self {
        Self { width, height }
    }

    pub fn map<U>(self, f: impl Fn(T) -> U) -> Size<U> {
        Size {
            width: f(self.width),
            height: f(self.height),
        }
    }
}

impl<T: PartialOrd + Copy> Size<T> {
    pub fn max(&self, other: &Self) -> Self {
        Self {
            width: if self.width > other.width {
                self.width
            } else {
                other.width
            },
            height: if self.height > other.height {
                self.height
            } else {
                other.height
            },
        }
    }
}

impl<T> From<(T, T)> for Size<T> {
    fn from((width, height): (T, T)) -> Self {
        Self { width, height }
    }
}
