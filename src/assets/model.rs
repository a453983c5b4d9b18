use glam::Vec3;

/// Extents below this are padded so thin models stay clickable.
const MIN_EXTENT: f32 = 10.0;
const EXTENT_PAD: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Quads,
    Points,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Lines,
    LineStrip,
}

impl PrimitiveKind {
    /// Kinds whose vertices contribute to the tight bounding box.
    pub fn contributes_to_bounds(self) -> bool {
        matches!(self, Self::Triangles | Self::TriangleStrip | Self::Quads)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    /// Indices into [`ParsedModel::positions`].
    pub indices: Vec<u32>,
    /// Drawn in the effects pass instead of the normal pass.
    #[serde(default)]
    pub translucent: bool,
}

/// Geometry handed over by a [`super::ModelLoader`].
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ParsedModel {
    pub positions: Vec<[f32; 3]>,
    pub primitives: Vec<Primitive>,
    /// Bounds recorded in the file, used when no solid primitive exists.
    #[serde(default)]
    pub fallback_bounds: BoundingBox,
    /// Texture archive resolved by the loader, if any.
    #[serde(skip)]
    pub texture: Option<String>,
}

impl ParsedModel {
    /// Bounding box over the vertices of solid primitives, padded.
    pub fn real_bounds(&self) -> BoundingBox {
        let mut bounds: Option<BoundingBox> = None;
        for primitive in &self.primitives {
            if !primitive.kind.contributes_to_bounds() {
                continue;
            }
            for &index in &primitive.indices {
                let Some(position) = self.positions.get(index as usize) else {
                    continue;
                };
                let point = Vec3::from_array(*position);
                bounds = Some(match bounds {
                    Some(current) => current.including(point),
                    None => BoundingBox::new(point, point),
                });
            }
        }
        bounds.unwrap_or(self.fallback_bounds).padded()
    }
}

/// Axis-aligned box in model space.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: [0.0; 3],
            max: [0.0; 3],
        }
    }
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max).to_array(),
            max: min.max(max).to_array(),
        }
    }

    pub fn cube(half_extent: f32) -> Self {
        Self::new(Vec3::splat(-half_extent), Vec3::splat(half_extent))
    }

    pub fn min(&self) -> Vec3 {
        Vec3::from_array(self.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::from_array(self.max)
    }

    pub fn center(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max() - self.min()
    }

    pub fn including(self, point: Vec3) -> Self {
        Self::new(self.min().min(point), self.max().max(point))
    }

    pub fn contains(&self, point: Vec3, tolerance: f32) -> bool {
        let min = self.min() - Vec3::splat(tolerance);
        let max = self.max() + Vec3::splat(tolerance);
        point.cmpge(min).all() && point.cmple(max).all()
    }

    /// Pads each axis thinner than the minimum extent by a fixed margin on both sides.
    pub fn padded(self) -> Self {
        let mut min = self.min();
        let mut max = self.max();
        for axis in 0..3 {
            if max[axis] - min[axis] < MIN_EXTENT {
                min[axis] -= EXTENT_PAD;
                max[axis] += EXTENT_PAD;
            }
        }
        Self::new(min, max)
    }

    /// Component-wise scale; negative factors keep min <= max.
    pub fn scaled(self, scale: Vec3) -> Self {
        Self::new(self.min() * scale, self.max() * scale)
    }
}

/// Decoded RGBA8 texture.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTexture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(kind: PrimitiveKind, positions: Vec<[f32; 3]>) -> ParsedModel {
        let indices = (0..positions.len() as u32).collect();
        ParsedModel {
            positions,
            primitives: vec![Primitive {
                kind,
                indices,
                translucent: false,
            }],
            fallback_bounds: BoundingBox::cube(3.0),
            texture: None,
        }
    }

    #[test]
    fn real_bounds_cover_triangle_vertices() {
        let parsed = model(
            PrimitiveKind::Triangles,
            vec![[-50.0, 0.0, -20.0], [50.0, 100.0, 0.0], [0.0, 40.0, 20.0]],
        );
        let bounds = parsed.real_bounds();
        assert_eq!(bounds.min, [-50.0, 0.0, -20.0]);
        assert_eq!(bounds.max, [50.0, 100.0, 20.0]);
    }

    #[test]
    fn thin_axes_are_padded() {
        let parsed = model(
            PrimitiveKind::Quads,
            vec![
                [-30.0, 0.0, -30.0],
                [30.0, 0.0, -30.0],
                [30.0, 0.0, 30.0],
                [-30.0, 0.0, 30.0],
            ],
        );
        let bounds = parsed.real_bounds();
        assert_eq!(bounds.min, [-30.0, -5.0, -30.0]);
        assert_eq!(bounds.max, [30.0, 5.0, 30.0]);
    }

    #[test]
    fn line_only_models_use_fallback_bounds() {
        let parsed = model(
            PrimitiveKind::Lines,
            vec![[-500.0, 0.0, 0.0], [500.0, 0.0, 0.0]],
        );
        let bounds = parsed.real_bounds();
        // Fallback is +-3 on every axis, padded by 5.
        assert_eq!(bounds.min, [-8.0; 3]);
        assert_eq!(bounds.max, [8.0; 3]);
    }

    #[test]
    fn out_of_range_indices_are_skipped() {
        let mut parsed = model(
            PrimitiveKind::Triangles,
            vec![[-20.0, -20.0, -20.0], [20.0, 20.0, 20.0]],
        );
        parsed.primitives[0].indices.push(99);
        let bounds = parsed.real_bounds();
        assert_eq!(bounds.max, [20.0; 3]);
    }

    #[test]
    fn negative_scale_keeps_ordering() {
        let bounds = BoundingBox::cube(1.0).scaled(Vec3::new(-2.0, 1.0, 3.0));
        assert_eq!(bounds.min, [-2.0, -1.0, -3.0]);
        assert_eq!(bounds.max, [2.0, 1.0, 3.0]);
    }
}
