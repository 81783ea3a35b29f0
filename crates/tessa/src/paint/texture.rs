use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tessa_math::{Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(pub(crate) u64);

impl TextureId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BaseState {
    // size of the whole base texture
    size: Size<f32>,
    ready: bool,
}

/// A handle to a texture owned by the renderer. Every handle cut from the same base texture
/// shares its id and readiness, so frames of one atlas batch into a single texture slot.
/// Clones also share the frame; [`Texture::sub_texture`] gives a handle with its own.
#[derive(Clone)]
pub struct Texture {
    id: TextureId,
    base: Arc<RwLock<BaseState>>,
    // the region of the base texture this handle samples from
    frame: Arc<RwLock<Rect<f32>>>,
}

impl Texture {
    pub fn new(base_size: Size<f32>) -> Self {
        let frame = Rect::xywh(0.0, 0.0, base_size.width, base_size.height);
        Self::with_frame(base_size, frame)
    }

    /// A new base texture sampled through a sub region, e.g. the first atlas entry.
    pub fn with_frame(base_size: Size<f32>, frame: Rect<f32>) -> Self {
        Self {
            id: TextureId::next(),
            base: Arc::new(RwLock::new(BaseState {
                size: base_size,
                ready: true,
            })),
            frame: Arc::new(RwLock::new(frame)),
        }
    }

    /// Another region of this handle's base texture.
    pub fn sub_texture(&self, frame: Rect<f32>) -> Self {
        Self {
            id: self.id,
            base: self.base.clone(),
            frame: Arc::new(RwLock::new(frame)),
        }
    }

    /// A texture whose source is still loading. It can't be tessellated against until
    /// [`Texture::set_ready`] is called.
    pub fn pending(base_size: Size<f32>) -> Self {
        let texture = Self::new(base_size);
        texture.set_ready(false);
        texture
    }

    /// The shared 16x16 white texture used by untextured styles.
    pub fn white() -> Self {
        static WHITE: OnceLock<Texture> = OnceLock::new();
        WHITE
            .get_or_init(|| Texture::new(Size::new(16.0, 16.0)))
            .clone()
    }

    /// Identity of the base texture. Shared by every frame cut from it.
    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn is_ready(&self) -> bool {
        self.base.read().ready
    }

    pub fn set_ready(&self, ready: bool) {
        self.base.write().ready = ready;
    }

    pub fn frame(&self) -> Rect<f32> {
        *self.frame.read()
    }

    pub fn set_frame(&self, frame: Rect<f32>) {
        *self.frame.write() = frame;
    }

    pub fn base_size(&self) -> Size<f32> {
        self.base.read().size
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && (Arc::ptr_eq(&self.frame, &other.frame) || self.frame() == other.frame())
    }
}

impl Eq for Texture {}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("frame", &self.frame())
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_readiness() {
        let texture = Texture::pending(Size::new(32.0, 32.0));
        let other = texture.clone();
        assert!(!other.is_ready());
        texture.set_ready(true);
        assert!(other.is_ready());
        assert_eq!(texture, other);
    }

    #[test]
    fn white_is_a_singleton() {
        assert_eq!(Texture::white(), Texture::white());
        assert_ne!(Texture::white(), Texture::new(Size::new(16.0, 16.0)));
    }

    #[test]
    fn sub_textures_share_the_base() {
        let atlas = Texture::pending(Size::new(64.0, 64.0));
        let frame = atlas.sub_texture(Rect::xywh(32.0, 0.0, 32.0, 32.0));
        assert_eq!(frame.id(), atlas.id());
        assert_eq!(frame.base_size(), Size::new(64.0, 64.0));
        assert_ne!(frame, atlas);

        atlas.set_ready(true);
        assert!(frame.is_ready());

        frame.set_frame(Rect::xywh(0.0, 32.0, 32.0, 32.0));
        assert_eq!(atlas.frame(), Rect::xywh(0.0, 0.0, 64.0, 64.0));
    }
}
