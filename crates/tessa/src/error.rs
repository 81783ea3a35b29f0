use thiserror::Error;

use crate::TextureId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// The geometry references a texture that has not finished loading. Nothing was tessellated;
    /// the next `update_batches` call starts over.
    #[error("Deferred tessellation: texture {texture} is not ready")]
    TextureNotReady { texture: TextureId },
    #[error("Invalid polygon: expected an even number of coordinates, got {0}")]
    OddCoordinateCount(usize),
}

impl GraphicsError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TextureNotReady { .. })
    }
}
