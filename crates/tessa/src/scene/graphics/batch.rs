use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use smallvec::SmallVec;

use crate::{
    pool::{Pool, Reset},
    FillStyle, LineStyle, Texture, TextureId,
};

/// The parts of a fill or line style that decide whether two runs of geometry can share a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStyle {
    pub texture: Texture,
    /// 0xRRGGBB
    pub color: u32,
    pub alpha: f32,
    pub native: bool,
}

impl Default for BatchStyle {
    fn default() -> Self {
        Self {
            texture: Texture::white(),
            color: 0xffffff,
            alpha: 1.0,
            native: false,
        }
    }
}

impl BatchStyle {
    pub fn from_fill(style: &FillStyle) -> Self {
        Self {
            texture: style.texture.clone(),
            color: style.color,
            alpha: style.alpha,
            native: false,
        }
    }

    pub fn from_line(style: &LineStyle) -> Self {
        Self {
            native: style.native,
            ..Self::from_fill(style)
        }
    }

    pub fn premultiplied_color(&self) -> u32 {
        crate::premultiply_rgb(self.color, self.alpha)
    }

    pub fn batches_with(&self, other: &Self) -> bool {
        self.texture.id() == other.texture.id()
            && self.color == other.color
            && self.alpha == other.alpha
            && self.native == other.native
    }
}

/// A contiguous run of indices and vertex attributes drawn with one style.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchPart {
    pub style: BatchStyle,
    /// First index in the index buffer.
    pub start: usize,
    pub size: usize,
    /// First vertex.
    pub attrib_start: usize,
    pub attrib_size: usize,
}

impl BatchPart {
    pub(crate) fn begin(&mut self, style: BatchStyle, start: usize, attrib_start: usize) {
        self.style = style;
        self.start = start;
        self.size = 0;
        self.attrib_start = attrib_start;
        self.attrib_size = 0;
    }

    pub(crate) fn end(&mut self, end: usize, attrib_end: usize) {
        self.size = end - self.start;
        self.attrib_size = attrib_end - self.attrib_start;
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.start + self.size
    }

    pub fn attributes(&self) -> Range<usize> {
        self.attrib_start..self.attrib_start + self.attrib_size
    }
}

impl Reset for BatchPart {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// One gpu submission: a range of the index buffer and the textures bound for it. Vertices pick
/// their texture by slot, see [`GraphicsVertex::texture_id`].
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub topology: wgpu::PrimitiveTopology,
    pub start: usize,
    pub size: usize,
    pub textures: SmallVec<[Texture; 8]>,
}

impl Default for DrawCall {
    fn default() -> Self {
        Self {
            topology: wgpu::PrimitiveTopology::TriangleList,
            start: 0,
            size: 0,
            textures: SmallVec::new(),
        }
    }
}

impl Reset for DrawCall {
    fn reset(&mut self) {
        self.topology = wgpu::PrimitiveTopology::TriangleList;
        self.start = 0;
        self.size = 0;
        self.textures.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Default for IndexBuffer {
    fn default() -> Self {
        Self::U16(Vec::new())
    }
}

impl IndexBuffer {
    pub fn from_indices(indices: &[u32], wide: bool) -> Self {
        if wide {
            Self::U32(indices.to_vec())
        } else {
            Self::U16(indices.iter().map(|&i| i as u16).collect())
        }
    }

    pub fn format(&self) -> wgpu::IndexFormat {
        match self {
            Self::U16(_) => wgpu::IndexFormat::Uint16,
            Self::U32(_) => wgpu::IndexFormat::Uint32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U16(indices) => indices.len(),
            Self::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            Self::U16(indices) => indices.get(i).map(|&i| i as u32),
            Self::U32(indices) => indices.get(i).copied(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::U16(indices) => bytemuck::cast_slice(indices),
            Self::U32(indices) => bytemuck::cast_slice(indices),
        }
    }

    /// Makes the indices in `range` relative to `base`.
    pub(crate) fn rebase(&mut self, range: Range<usize>, base: u32) {
        match self {
            Self::U16(indices) => {
                for i in &mut indices[range] {
                    *i = i.wrapping_sub(base as u16);
                }
            }
            Self::U32(indices) => {
                for i in &mut indices[range] {
                    *i = i.wrapping_sub(base);
                }
            }
        }
    }
}

/// Interleaved vertex layout of a non batchable geometry.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GraphicsVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    /// Premultiplied rgba8, little endian.
    pub color: u32,
    /// Texture slot within the draw call.
    pub texture_id: f32,
}

impl GraphicsVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Unorm8x4,
        3 => Float32
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Tracks which slot each texture occupies in the draw call being built. Bumping the tick
/// invalidates every assignment at once. Entries only live for one build.
#[derive(Debug, Default)]
pub(crate) struct TextureSlots {
    tick: u64,
    slots: ahash::HashMap<TextureId, (u64, u32)>,
}

impl TextureSlots {
    fn advance(&mut self) {
        self.tick += 1;
    }

    fn get(&self, id: TextureId) -> Option<u32> {
        self.slots
            .get(&id)
            .filter(|(tick, _)| *tick == self.tick)
            .map(|(_, slot)| *slot)
    }

    fn assign(&mut self, id: TextureId, slot: u32) {
        self.slots.insert(id, (self.tick, slot));
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Groups batch parts into draw calls of at most `max_textures` textures, starting a new call
/// whenever the slots run out or the primitive topology changes. Writes each vertex's slot into
/// `texture_ids`.
pub(crate) fn build_draw_calls(
    batches: &[BatchPart],
    texture_ids: &mut [u32],
    max_textures: usize,
    pool: &mut Pool<DrawCall>,
    slots: &mut TextureSlots,
    draw_calls: &mut Vec<DrawCall>,
) {
    let max_textures = max_textures.max(1);

    let mut current = pool.acquire();
    let mut texture_count = 0;
    let mut current_texture = None;
    let mut native = false;
    let mut index = 0;

    slots.clear();
    slots.advance();

    for part in batches {
        let style = &part.style;
        let id = style.texture.id();

        if native != style.native {
            native = style.native;
            texture_count = max_textures;
            current_texture = None;
            slots.advance();
        }

        if current_texture != Some(id) {
            current_texture = Some(id);

            if slots.get(id).is_none() {
                if texture_count == max_textures {
                    slots.advance();
                    texture_count = 0;

                    if current.size > 0 {
                        draw_calls.push(std::mem::replace(&mut current, pool.acquire()));
                    }

                    current.start = index;
                    current.size = 0;
                    current.textures.clear();
                    current.topology = if native {
                        wgpu::PrimitiveTopology::LineList
                    } else {
                        wgpu::PrimitiveTopology::TriangleList
                    };
                }

                slots.assign(id, texture_count as u32);
                current.textures.push(style.texture.clone());
                texture_count += 1;
            }
        }

        current.size += part.size;
        index += part.size;

        let slot = slots.get(id).unwrap_or_default();
        texture_ids[part.attributes()].fill(slot);
    }

    draw_calls.push(current);

    for (i, call) in draw_calls.iter().enumerate() {
        log::trace!(
            "draw call {i}: {:?} indices {}..{} with {} textures",
            call.topology,
            call.start,
            call.start + call.size,
            call.textures.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rect, Size};

    fn part(texture: &Texture, native: bool, start: usize, size: usize) -> BatchPart {
        BatchPart {
            style: BatchStyle {
                texture: texture.clone(),
                native,
                ..Default::default()
            },
            start,
            size,
            attrib_start: start,
            attrib_size: size,
        }
    }

    fn build(batches: &[BatchPart], max_textures: usize) -> (Vec<DrawCall>, Vec<u32>) {
        let len = batches.last().map_or(0, |b| b.attrib_start + b.attrib_size);
        let mut ids = vec![u32::MAX; len];
        let mut calls = Vec::new();
        build_draw_calls(
            batches,
            &mut ids,
            max_textures,
            &mut Pool::default(),
            &mut TextureSlots::default(),
            &mut calls,
        );
        (calls, ids)
    }

    #[test]
    fn repeated_textures_share_a_slot() {
        let a = Texture::new(Size::new(4.0, 4.0));
        let b = Texture::new(Size::new(4.0, 4.0));
        let batches = [part(&a, false, 0, 3), part(&b, false, 3, 3), part(&a, false, 6, 3)];

        let (calls, ids) = build(&batches, 8);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].size, 9);
        assert_eq!(calls[0].textures.len(), 2);
        assert_eq!(ids, vec![0, 0, 0, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn atlas_frames_share_a_slot() {
        let atlas = Texture::new(Size::new(8.0, 8.0));
        let left = atlas.sub_texture(Rect::xywh(0.0, 0.0, 4.0, 8.0));
        let right = atlas.sub_texture(Rect::xywh(4.0, 0.0, 4.0, 8.0));
        let batches = [part(&left, false, 0, 3), part(&right, false, 3, 3)];

        let (calls, ids) = build(&batches, 1);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].textures.len(), 1);
        assert_eq!(ids, vec![0; 6]);
    }

    #[test]
    fn slots_only_hold_the_latest_build() {
        let mut slots = TextureSlots::default();
        let mut calls = Vec::new();
        let mut pool = Pool::default();

        for _ in 0..5 {
            let textures = (0..3)
                .map(|_| Texture::new(Size::new(4.0, 4.0)))
                .collect::<Vec<_>>();
            let batches = textures
                .iter()
                .enumerate()
                .map(|(i, t)| part(t, false, i * 3, 3))
                .collect::<Vec<_>>();

            pool.release_all(calls.drain(..));
            let mut ids = vec![0; 9];
            build_draw_calls(&batches, &mut ids, 8, &mut pool, &mut slots, &mut calls);
            assert_eq!(slots.len(), 3);
        }
    }

    #[test]
    fn slots_overflow_into_a_new_call() {
        let textures = (0..3)
            .map(|_| Texture::new(Size::new(4.0, 4.0)))
            .collect::<Vec<_>>();
        let batches = textures
            .iter()
            .enumerate()
            .map(|(i, t)| part(t, false, i * 6, 6))
            .collect::<Vec<_>>();

        let (calls, ids) = build(&batches, 2);
        assert_eq!(calls.len(), 2);
        assert_eq!((calls[0].start, calls[0].size), (0, 12));
        assert_eq!((calls[1].start, calls[1].size), (12, 6));
        assert_eq!(calls[1].textures[0], textures[2]);
        assert_eq!(ids[12..], [0; 6]);
    }

    #[test]
    fn native_lines_get_their_own_call() {
        let white = Texture::white();
        let batches = [
            part(&white, false, 0, 6),
            part(&white, true, 6, 4),
            part(&white, false, 10, 6),
        ];

        let (calls, _) = build(&batches, 8);
        let topologies = calls.iter().map(|c| c.topology).collect::<Vec<_>>();
        assert_eq!(
            topologies,
            vec![
                wgpu::PrimitiveTopology::TriangleList,
                wgpu::PrimitiveTopology::LineList,
                wgpu::PrimitiveTopology::TriangleList,
            ]
        );
        assert_eq!(calls[1].start, 6);
    }

    #[test]
    fn first_part_native_reuses_the_empty_call() {
        let white = Texture::white();
        let (calls, _) = build(&[part(&white, true, 0, 4)], 8);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].topology, wgpu::PrimitiveTopology::LineList);
    }

    #[test]
    fn index_buffer_width_and_rebase() {
        let mut buffer = IndexBuffer::from_indices(&[4, 5, 6, 7], false);
        assert_eq!(buffer.format(), wgpu::IndexFormat::Uint16);
        assert_eq!(buffer.as_bytes().len(), 8);

        buffer.rebase(2..4, 6);
        assert_eq!(buffer.iter().collect::<Vec<_>>(), vec![4, 5, 0, 1]);

        let wide = IndexBuffer::from_indices(&[70000], true);
        assert_eq!(wide.format(), wgpu::IndexFormat::Uint32);
        assert_eq!(wide.get(0), Some(70000));
    }

    #[test]
    fn vertex_layout_matches_struct() {
        let layout = GraphicsVertex::layout();
        assert_eq!(layout.array_stride, 24);
        assert_eq!(layout.attributes.len(), 4);
        assert_eq!(layout.attributes[2].offset, 16);
        assert_eq!(layout.attributes[3].offset, 20);
    }
}
