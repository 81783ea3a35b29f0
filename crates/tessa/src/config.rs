/// Controls how many segments curves, arcs and round joins are flattened into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveResolution {
    /// When false every curve uses the caller supplied default segment count.
    pub adaptive: bool,
    /// Target length of a single flattened segment.
    pub max_length: f32,
    pub min_segments: u32,
    pub max_segments: u32,
    /// Triangles of the stroke strip with an area below `epsilon²` are dropped.
    pub epsilon: f32,
}

impl Default for CurveResolution {
    fn default() -> Self {
        Self {
            adaptive: true,
            max_length: 10.0,
            min_segments: 8,
            max_segments: 2048,
            epsilon: 0.0001,
        }
    }
}

impl CurveResolution {
    pub const DEFAULT_SEGMENTS: u32 = 20;

    pub fn segments_count(&self, length: f32, default_segments: u32) -> u32 {
        if !self.adaptive || length == 0.0 || !length.is_finite() {
            return default_segments;
        }

        let segments = (length / self.max_length).ceil() as u32;
        segments.clamp(self.min_segments, self.max_segments)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RoundedRectBuild {
    /// Quadratic corners, ear clipped.
    #[default]
    Bezier,
    /// Circle style point ring with straight edge offsets, fan triangulated.
    Arcs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsConfig {
    pub curves: CurveResolution,
    /// Geometry with fewer points than this (and no native lines) can be merged into an
    /// external batch.
    pub batchable_size: usize,
    /// Texture units available to a single draw call.
    pub max_textures: usize,
    /// Distance under which two points are treated as the same point.
    pub close_point_eps: f32,
    /// Joints whose cross product is below this are stroked as straight.
    pub straight_join_threshold: f32,
    /// Circle ring segments per quadrant are `ceil(factor * sqrt(rx + ry))`.
    pub circle_segment_factor: f32,
    pub rounded_rect: RoundedRectBuild,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            curves: CurveResolution::default(),
            batchable_size: 100,
            max_textures: 8,
            close_point_eps: 1e-4,
            straight_join_threshold: 0.1,
            circle_segment_factor: 2.3,
            rounded_rect: RoundedRectBuild::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_count_is_clamped() {
        let curves = CurveResolution::default();
        assert_eq!(curves.segments_count(1.0, 20), 8);
        assert_eq!(curves.segments_count(155.0, 20), 16);
        assert_eq!(curves.segments_count(1e9, 20), 2048);
    }

    #[test]
    fn segments_count_falls_back_to_default() {
        let mut curves = CurveResolution::default();
        assert_eq!(curves.segments_count(0.0, 20), 20);
        assert_eq!(curves.segments_count(f32::NAN, 12), 12);

        curves.adaptive = false;
        assert_eq!(curves.segments_count(500.0, 20), 20);
    }
}
