pub mod mat3;
pub mod rect;
pub mod size;
pub mod vec2;

pub use mat3::*;
pub use rect::*;
pub use size::*;
pub use vec2::*;

pub type Point = Vec2<f32>;
