use std::sync::Arc;

use derive_more::derive::Deref;
use parking_lot::RwLock;
use tessa_math::{Mat3, Point, Rect};

use super::{
    batch::{self, BatchPart, BatchStyle, DrawCall, GraphicsVertex, IndexBuffer, TextureSlots},
    fill, stroke, GraphicsData, Shape,
};
use crate::{
    earcut::Earcut, pool::Pool, FillStyle, GraphicsConfig, GraphicsError, LineStyle, Texture,
};

/// Records shapes and tessellates them into buffers shared by every batch part and draw call.
///
/// Tessellation is incremental: records already processed by [`GraphicsGeometry::update_batches`]
/// are never triangulated again unless the geometry is cleared or a hole is added to them.
#[derive(Debug)]
pub struct GraphicsGeometry {
    config: GraphicsConfig,

    points: Vec<f32>,
    colors: Vec<u32>,
    uvs: Vec<f32>,
    indices: Vec<u32>,
    texture_ids: Vec<u32>,

    index_buffer: IndexBuffer,
    vertices: Vec<GraphicsVertex>,

    graphics_data: Vec<GraphicsData>,
    batches: Vec<BatchPart>,
    draw_calls: Vec<DrawCall>,
    batchable: bool,

    dirty: u64,
    cache_dirty: Option<u64>,
    batch_dirty: u64,
    clear_dirty: u64,
    shape_index: usize,
    needs_rebuild: bool,

    bounds: Option<(u64, Rect<f32>)>,
    refs: usize,

    earcut: Earcut<f32>,
    batch_pool: Pool<BatchPart>,
    draw_call_pool: Pool<DrawCall>,
    texture_slots: TextureSlots,
}

impl Default for GraphicsGeometry {
    fn default() -> Self {
        Self::new(GraphicsConfig::default())
    }
}

impl GraphicsGeometry {
    pub fn new(config: GraphicsConfig) -> Self {
        Self {
            config,
            points: Vec::new(),
            colors: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            texture_ids: Vec::new(),
            index_buffer: IndexBuffer::default(),
            vertices: Vec::new(),
            graphics_data: Vec::new(),
            batches: Vec::new(),
            draw_calls: Vec::new(),
            batchable: false,
            dirty: 0,
            cache_dirty: None,
            batch_dirty: 0,
            clear_dirty: 0,
            shape_index: 0,
            needs_rebuild: false,
            bounds: None,
            refs: 0,
            earcut: Earcut::new(),
            batch_pool: Pool::default(),
            draw_call_pool: Pool::default(),
            texture_slots: TextureSlots::default(),
        }
    }

    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    /// Flattened vertex positions, `[x0, y0, x1, y1, ..]`.
    pub fn points(&self) -> &[f32] {
        &self.points
    }

    /// Premultiplied rgba8 per vertex.
    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    /// Indices into the vertex buffers, always absolute.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn texture_ids(&self) -> &[u32] {
        &self.texture_ids
    }

    /// The indices in upload form. Relative to each batch part's first vertex when the geometry
    /// is batchable.
    pub fn index_buffer(&self) -> &IndexBuffer {
        &self.index_buffer
    }

    /// Interleaved vertices, only packed when the geometry is drawn with its own draw calls.
    pub fn vertices(&self) -> &[GraphicsVertex] {
        &self.vertices
    }

    pub fn graphics_data(&self) -> &[GraphicsData] {
        &self.graphics_data
    }

    pub fn batches(&self) -> &[BatchPart] {
        &self.batches
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn is_batchable(&self) -> bool {
        self.batchable
    }

    pub fn is_empty(&self) -> bool {
        self.graphics_data.is_empty()
    }

    /// Bumped for every recorded shape.
    pub fn dirty(&self) -> u64 {
        self.dirty
    }

    /// The `dirty` value last tessellated.
    pub fn cache_dirty(&self) -> Option<u64> {
        self.cache_dirty
    }

    /// Bumped whenever batches or draw calls are rebuilt.
    pub fn batch_dirty(&self) -> u64 {
        self.batch_dirty
    }

    /// Bumped when the buffers are thrown away.
    pub fn clear_dirty(&self) -> u64 {
        self.clear_dirty
    }

    /// Number of records already tessellated.
    pub fn shape_index(&self) -> usize {
        self.shape_index
    }

    pub fn refs(&self) -> usize {
        self.refs
    }

    pub(crate) fn retain(&mut self) {
        self.refs += 1;
    }

    /// Drops one reference, disposing of the buffers when it was the last.
    pub(crate) fn release(&mut self) {
        self.refs = self.refs.saturating_sub(1);
        if self.refs == 0 {
            self.dispose();
        }
    }

    pub fn draw_shape(
        &mut self,
        shape: Shape,
        fill_style: Option<FillStyle>,
        line_style: Option<LineStyle>,
        matrix: Option<Mat3>,
    ) -> &mut Self {
        self.graphics_data
            .push(GraphicsData::new(shape, fill_style, line_style, matrix));
        self.dirty += 1;
        self
    }

    /// Cuts `shape` out of the last recorded shape, stroking it with that shape's line style.
    /// Returns `None` when nothing has been recorded yet.
    pub fn draw_hole(&mut self, shape: Shape, matrix: Option<Mat3>) -> Option<&mut Self> {
        let index = self.graphics_data.len().checked_sub(1)?;
        let last = &mut self.graphics_data[index];

        let hole = GraphicsData::new(shape, None, last.line_style.clone(), matrix);
        last.holes.push(hole);

        if index < self.shape_index {
            self.needs_rebuild = true;
        }

        self.dirty += 1;
        Some(self)
    }

    pub fn clear(&mut self) -> &mut Self {
        if !self.graphics_data.is_empty() {
            self.invalidate();
            self.graphics_data.clear();
            self.needs_rebuild = false;
        }
        self
    }

    /// Throws away every tessellated buffer so the next update starts from the first record.
    pub fn invalidate(&mut self) {
        self.reset_buffers();
        self.dirty += 1;
        self.clear_dirty += 1;
        self.bounds = None;
    }

    fn reset_buffers(&mut self) {
        self.points.clear();
        self.colors.clear();
        self.uvs.clear();
        self.indices.clear();
        self.texture_ids.clear();
        self.index_buffer = IndexBuffer::default();
        self.vertices.clear();
        self.shape_index = 0;

        self.draw_call_pool.release_all(self.draw_calls.drain(..));
        self.batch_pool.release_all(self.batches.drain(..));
    }

    /// Releases the records, buffers and pools.
    pub fn dispose(&mut self) {
        log::debug!(
            "Disposing graphics geometry with {} shapes",
            self.graphics_data.len()
        );

        self.reset_buffers();
        self.graphics_data.clear();
        self.batch_pool = Pool::default();
        self.draw_call_pool = Pool::default();
        self.texture_slots.clear();
        self.earcut = Earcut::new();
        self.cache_dirty = None;
        self.bounds = None;
    }

    /// Tessellates every record added since the last call and rebuilds batches and draw calls.
    ///
    /// Returns [`GraphicsError::TextureNotReady`] without touching any buffer when a style uses
    /// a texture that is still loading; call again once it is ready.
    pub fn update_batches(&mut self, allow_32bit_indices: bool) -> Result<(), GraphicsError> {
        if self.graphics_data.is_empty() {
            self.batchable = true;
            return Ok(());
        }

        if self.cache_dirty == Some(self.dirty) {
            log::trace!("Graphics geometry is clean, skipping tessellation");
            return Ok(());
        }

        self.validate_textures()?;

        if self.needs_rebuild {
            log::debug!("Hole added to a tessellated shape, rebuilding from the first shape");
            self.reset_buffers();
            self.needs_rebuild = false;
        }

        self.cache_dirty = Some(self.dirty);
        self.tessellate();

        let index = self.indices.len();
        let attrib = self.points.len() / 2;
        if let Some(part) = self.batches.last_mut() {
            part.end(index, attrib);
        }

        if self.batches.is_empty() {
            self.batchable = true;
            return Ok(());
        }

        let need_32bit = attrib > 0xffff;
        if need_32bit && !allow_32bit_indices {
            log::warn!(
                "Graphics geometry has {attrib} vertices but 32 bit indices are not allowed, \
                 using them anyway"
            );
        }

        self.index_buffer = IndexBuffer::from_indices(&self.indices, need_32bit);
        self.batchable = self.check_batchable();

        if self.batchable {
            self.pack_batches();
        } else {
            self.build_draw_calls();
        }
        self.batch_dirty += 1;

        log::debug!(
            "Tessellated {} shapes: {} vertices, {} indices, {} batch parts, {} draw calls, batchable: {}",
            self.graphics_data.len(),
            attrib,
            index,
            self.batches.len(),
            self.draw_calls.len(),
            self.batchable
        );

        Ok(())
    }

    fn validate_textures(&self) -> Result<(), GraphicsError> {
        let pending = self.graphics_data.iter().find_map(|data| {
            let fill = data.fill_style.as_ref().map(|style| &style.texture);
            let line = data.line_style.as_ref().map(|style| &style.texture);
            fill.into_iter()
                .chain(line)
                .find(|texture| !texture.is_ready())
        });

        match pending {
            Some(texture) => {
                log::debug!(
                    "Deferring tessellation until texture {} is ready",
                    texture.id()
                );
                Err(GraphicsError::TextureNotReady {
                    texture: texture.id(),
                })
            }
            None => Ok(()),
        }
    }

    /// Scans the records from `shape_index`, appending their triangles and extending or opening
    /// batch parts.
    fn tessellate(&mut self) {
        let Self {
            config,
            points,
            colors,
            uvs,
            indices,
            texture_ids,
            graphics_data,
            batches,
            shape_index,
            earcut,
            batch_pool,
            ..
        } = self;

        for data in &mut graphics_data[*shape_index..] {
            *shape_index += 1;

            fill::build(data, config);
            if let Some(matrix) = data.matrix {
                matrix.apply_flat(&mut data.points);
            }

            let fill_style = data.visible_fill().cloned();
            let line_style = data.visible_line().cloned();
            if fill_style.is_none() && line_style.is_none() {
                continue;
            }

            for hole in &mut data.holes {
                fill::build(hole, config);
                if let Some(matrix) = hole.matrix {
                    matrix.apply_flat(&mut hole.points);
                }
            }

            if let Some(style) = fill_style {
                let index = indices.len();
                let attrib = points.len() / 2;

                if data.holes.is_empty() {
                    fill::triangulate(data, config, earcut, points, indices);
                } else {
                    let mut holes = data.holes.iter().map(|h| h.points.clone()).collect::<Vec<_>>();
                    fill::triangulate_polygon(&mut data.points, &mut holes, earcut, points, indices);
                }

                let size = points.len() / 2 - attrib;
                if size > 0 {
                    let batch = BatchStyle::from_fill(&style);
                    extend_batches(batches, batch_pool, &batch, index, attrib);
                    add_uvs(points, uvs, &style.texture, attrib, size, style.matrix.as_ref());
                    colors.extend(std::iter::repeat(batch.premultiplied_color()).take(size));
                    texture_ids.extend(std::iter::repeat(0).take(size));
                }
            }

            if let Some(style) = line_style {
                let index = indices.len();
                let attrib = points.len() / 2;

                stroke::build_line(data, config, points, indices);

                let size = points.len() / 2 - attrib;
                if size > 0 {
                    let batch = BatchStyle::from_line(&style);
                    extend_batches(batches, batch_pool, &batch, index, attrib);
                    add_uvs(points, uvs, &style.texture, attrib, size, style.matrix.as_ref());
                    colors.extend(std::iter::repeat(batch.premultiplied_color()).take(size));
                    texture_ids.extend(std::iter::repeat(0).take(size));
                }
            }
        }
    }

    fn check_batchable(&self) -> bool {
        if self.points.len() > 0xffff * 2 {
            return false;
        }

        if self.batches.iter().any(|part| part.style.native) {
            return false;
        }

        self.points.len() < self.config.batchable_size * 2
    }

    /// Makes each part's indices relative to its first vertex so the geometry can be copied into
    /// an outside batch at any offset.
    fn pack_batches(&mut self) {
        for part in &self.batches {
            self.index_buffer
                .rebase(part.indices(), part.attrib_start as u32);
        }

        self.draw_call_pool.release_all(self.draw_calls.drain(..));
        self.vertices.clear();
    }

    fn build_draw_calls(&mut self) {
        self.draw_call_pool.release_all(self.draw_calls.drain(..));

        batch::build_draw_calls(
            &self.batches,
            &mut self.texture_ids,
            self.config.max_textures,
            &mut self.draw_call_pool,
            &mut self.texture_slots,
            &mut self.draw_calls,
        );

        self.pack_attributes();
    }

    fn pack_attributes(&mut self) {
        self.vertices.clear();
        self.vertices.extend(
            self.points
                .chunks_exact(2)
                .zip(self.uvs.chunks_exact(2))
                .zip(self.colors.iter().zip(&self.texture_ids))
                .map(|((position, uv), (&color, &texture_id))| GraphicsVertex {
                    position: [position[0], position[1]],
                    uv: [uv[0], uv[1]],
                    color,
                    texture_id: texture_id as f32,
                }),
        );
    }

    /// Hit tests the visible fills in record order.
    pub fn contains_point(&self, point: Point) -> bool {
        self.graphics_data
            .iter()
            .filter(|data| data.visible_fill().is_some())
            .any(|data| data.contains(point.x, point.y))
    }

    /// Local bounds of every record including the part of visible strokes outside the shape.
    pub fn bounds(&mut self) -> Rect<f32> {
        if let Some((dirty, bounds)) = self.bounds {
            if dirty == self.dirty {
                return bounds;
            }
        }

        let bounds = self
            .graphics_data
            .iter()
            .map(|data| {
                let pad = data.visible_line().map_or(0.0, |line| match data.shape {
                    Shape::Polygon(_) => line.width * line.alignment.max(1.0 - line.alignment),
                    _ => line.width * line.alignment,
                });

                let local = data.shape.bounds().pad(pad);
                match data.matrix {
                    Some(matrix) => {
                        Rect::from_points(local.corners().map(|c| matrix.apply(c))).unwrap_or(local)
                    }
                    None => local,
                }
            })
            .reduce(|a, b| a.union(&b))
            .unwrap_or(Rect::EMPTY);

        self.bounds = Some((self.dirty, bounds));
        bounds
    }
}

fn extend_batches(
    batches: &mut Vec<BatchPart>,
    pool: &mut Pool<BatchPart>,
    style: &BatchStyle,
    index: usize,
    attrib: usize,
) {
    if let Some(part) = batches.last_mut() {
        if part.style.batches_with(style) {
            return;
        }
        part.end(index, attrib);
    }

    let mut part = pool.acquire();
    part.begin(style.clone(), index, attrib);
    batches.push(part);
}

/// Appends texture coordinates for the vertices `start..start + size`. Coordinates are in units
/// of the texture frame, so textures repeat across large shapes.
fn add_uvs(
    verts: &[f32],
    uvs: &mut Vec<f32>,
    texture: &Texture,
    start: usize,
    size: usize,
    matrix: Option<&Mat3>,
) {
    let frame = texture.frame();
    let uvs_start = uvs.len();

    for p in verts[start * 2..(start + size) * 2].chunks_exact(2) {
        let p = Point::new(p[0], p[1]);
        let p = matrix.map_or(p, |m| m.apply(p));
        uvs.extend_from_slice(&[p.x / frame.width, p.y / frame.height]);
    }

    let base = texture.base_size();
    if frame.width < base.width || frame.height < base.height {
        adjust_uvs(&mut uvs[uvs_start..], texture);
    }
}

/// Maps frame relative coordinates into a sub region of the base texture. The whole range is
/// shifted by whole frames so it starts inside the region.
fn adjust_uvs(uvs: &mut [f32], texture: &Texture) {
    const EPS: f32 = 1e-6;

    let frame = texture.frame();
    let base = texture.base_size();
    let scale_x = frame.width / base.width;
    let scale_y = frame.height / base.height;

    let (min_x, min_y) = uvs
        .chunks_exact(2)
        .fold((f32::INFINITY, f32::INFINITY), |(x, y), uv| {
            (x.min((uv[0] + EPS).floor()), y.min((uv[1] + EPS).floor()))
        });

    let offset_x = frame.x / frame.width - min_x;
    let offset_y = frame.y / frame.height - min_y;

    for uv in uvs.chunks_exact_mut(2) {
        uv[0] = (uv[0] + offset_x) * scale_x;
        uv[1] = (uv[1] + offset_y) * scale_y;
    }
}

/// A geometry shared by several [`crate::Graphics`]. Each holder counts as a reference; the
/// buffers are disposed when the last one lets go.
#[derive(Debug, Clone, Default, Deref)]
pub struct SharedGeometry(Arc<RwLock<GraphicsGeometry>>);

impl SharedGeometry {
    pub fn new(geometry: GraphicsGeometry) -> Self {
        Self(Arc::new(RwLock::new(geometry)))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
