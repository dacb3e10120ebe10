/// Geometry primitives shared by the builder and its callers
use nalgebra::{Point3, Vector3};

/// Cross products shorter than this are treated as degenerate triangles.
pub const MIN_NORMAL_LENGTH: f32 = 1e-12;

/// Normal used for triangles with no usable area.
pub fn default_normal() -> Vector3<f32> {
    Vector3::y()
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl BoundingBox {
    /// An inverted box that any point will expand.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Point3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn include(&mut self, point: &Point3<f32>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Midpoint per axis, halved before adding so extreme bounds cannot overflow.
    pub fn center(&self) -> Point3<f32> {
        Point3::from(self.min.coords * 0.5 + self.max.coords * 0.5)
    }

    /// Width, height and depth
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn max_extent(&self) -> f32 {
        self.size().max()
    }

    /// Camera pull-back along Z that keeps the X/Y extent in view.
    pub fn fit_distance(&self) -> f32 {
        let size = self.size();
        size.x + size.y
    }

    /// The same box moved by `-offset`
    pub fn translated(&self, offset: &Vector3<f32>) -> Self {
        Self {
            min: self.min - offset,
            max: self.max - offset,
        }
    }

    /// Flat `[min_x, max_x, min_y, max_y, min_z, max_z]`
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.min.x, self.max.x, self.min.y, self.max.y, self.min.z, self.max.z,
        ]
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

/// Calculate the unit normal of triangle `(v0, v1, v2)` from `(v1 - v0) x (v2 - v0)`.
///
/// Returns `None` when the triangle has no area. Works in f64 so edges and
/// cross products of coordinates near `f32::MAX` stay finite.
pub fn face_normal(v0: &Point3<f32>, v1: &Point3<f32>, v2: &Point3<f32>) -> Option<Vector3<f32>> {
    let (v0, v1, v2) = (
        v0.coords.cast::<f64>(),
        v1.coords.cast::<f64>(),
        v2.coords.cast::<f64>(),
    );
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    edge1
        .cross(&edge2)
        .try_normalize(f64::from(MIN_NORMAL_LENGTH))
        .map(|normal| normal.cast::<f32>())
        .filter(|normal| normal.iter().all(|c| c.is_finite()))
}
