pub mod color;
pub mod style;
pub mod texture;

pub use color::*;
pub use style::*;
pub use texture::*;
