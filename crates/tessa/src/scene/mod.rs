pub mod graphics;

pub use graphics::*;
