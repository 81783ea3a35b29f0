pub mod config;
pub mod earcut;
pub mod error;
pub mod paint;
pub mod path;
pub mod pool;
pub mod scene;

pub use tessa_math as math;

pub use config::{CurveResolution, GraphicsConfig, RoundedRectBuild};
pub use error::GraphicsError;
pub use math::{vec2, Mat3, Point, Rect, Size, Vec2};
pub use paint::{
    premultiply_rgb, Color, FillStyle, LineCap, LineJoin, LineStyle, Texture, TextureId,
};
pub use scene::{
    BatchPart, BatchStyle, Circle, DrawCall, Ellipse, Graphics, GraphicsData, GraphicsGeometry,
    GraphicsVertex, IndexBuffer, Polygon, RoundedRect, Shape, SharedGeometry,
};
