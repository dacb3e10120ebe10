/// Geometry builder: turns decoded records into render-ready buffers
use std::collections::BTreeSet;

use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use crate::error::{ObjError, Result};
use crate::geometry::{default_normal, face_normal, BoundingBox};
use crate::index::{fix_index, IndexBase};
use crate::parser::FormatErrorPolicy;
use crate::record::{Command, Record, VertexRef};

/// Flat geometry buffers handed to the rendering layer.
///
/// Only meaningful when `has_error()` is false.
#[derive(Debug, Clone, Default)]
pub struct Attrib {
    /// Centered positions, 3 floats per declared vertex
    pub vertices: Vec<f32>,
    /// Declared texture coordinates, 2 floats each
    pub vertex_texture: Vec<f32>,
    /// Declared normals, 3 floats each
    pub vertex_normal: Vec<f32>,
    /// Unique undirected edges as `(first, second)` pairs with `first <= second`
    pub edges: Vec<u32>,
    /// Shaded stream positions, 3 floats per triangle corner
    pub shade_vertices: Vec<f32>,
    /// Shaded stream texture coordinates, 2 floats per corner; empty without `vt` records
    pub shade_texture: Vec<f32>,
    /// Shaded stream normals, 3 floats per corner
    pub shade_normals: Vec<f32>,
    /// Bounds in centered coordinates
    pub bounds: BoundingBox,
    pub num_vertices: usize,
    pub num_faces: usize,
    pub(crate) error: bool,
}

impl Attrib {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every buffer, keeping allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.vertex_texture.clear();
        self.vertex_normal.clear();
        self.edges.clear();
        self.shade_vertices.clear();
        self.shade_texture.clear();
        self.shade_normals.clear();
        self.bounds = BoundingBox::empty();
        self.num_vertices = 0;
        self.num_faces = 0;
        self.error = false;
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len() / 2
    }

    pub fn num_triangles(&self) -> usize {
        self.shade_vertices.len() / 9
    }

    pub(crate) fn vertex(&self, index: usize) -> Point3<f32> {
        Point3::new(
            self.vertices[3 * index],
            self.vertices[3 * index + 1],
            self.vertices[3 * index + 2],
        )
    }
}

/// One triangle corner, resolved to zero-based indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Corner {
    v: usize,
    vt: Option<usize>,
    vn: Option<usize>,
}

/// Element counts, either running or file-wide.
#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    v: usize,
    vt: usize,
    vn: usize,
}

impl Counts {
    fn of(records: &[Record]) -> Self {
        let mut counts = Self::default();
        for record in records {
            match record.command {
                Command::Vertex { .. } => counts.v += 1,
                Command::TexCoord { .. } => counts.vt += 1,
                Command::Normal { .. } => counts.vn += 1,
                _ => {}
            }
        }
        counts
    }
}

/// Per-call builder state. Created fresh for every build.
pub struct GeometryBuilder<'a> {
    attrib: &'a mut Attrib,
    index_base: IndexBase,
    on_format_error: FormatErrorPolicy,
    totals: Counts,
    running: Counts,
    edges: BTreeSet<(u32, u32)>,
    corners: Vec<Corner>,
}

impl<'a> GeometryBuilder<'a> {
    pub fn new(
        attrib: &'a mut Attrib,
        index_base: IndexBase,
        on_format_error: FormatErrorPolicy,
    ) -> Self {
        Self {
            attrib,
            index_base,
            on_format_error,
            totals: Counts::default(),
            running: Counts::default(),
            edges: BTreeSet::new(),
            corners: Vec::new(),
        }
    }

    /// Run the bounds, accumulate and materialize passes over `records`.
    ///
    /// The attrib is cleared first and fully repopulated.
    pub fn build(mut self, records: &[Record]) -> Result<()> {
        self.attrib.clear();
        self.totals = Counts::of(records);
        if self.totals.v == 0 {
            return Err(ObjError::EmptyModel);
        }

        let bounds = Self::bounds(records);
        let center = bounds.center().coords;
        debug!(
            "Bounds {:?} to {:?}, centering on {:?}",
            bounds.min, bounds.max, center
        );

        self.attrib.vertices = vec![0.0; 3 * self.totals.v];
        self.attrib.num_vertices = self.totals.v;
        self.attrib.bounds = bounds.translated(&center);

        for record in records {
            self.accumulate(record, &center)?;
        }

        let edges = std::mem::take(&mut self.edges);
        self.attrib.edges.reserve(edges.len() * 2);
        for (first, second) in edges {
            self.attrib.edges.push(first);
            self.attrib.edges.push(second);
        }

        self.materialize();
        Ok(())
    }

    fn bounds(records: &[Record]) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        for record in records {
            if let Command::Vertex { x, y, z } = record.command {
                bounds.include(&Point3::new(x, y, z));
            }
        }
        bounds
    }

    fn accumulate(&mut self, record: &Record, center: &Vector3<f32>) -> Result<()> {
        match &record.command {
            Command::Vertex { x, y, z } => {
                let slot = 3 * self.running.v;
                self.attrib.vertices[slot] = x - center.x;
                self.attrib.vertices[slot + 1] = y - center.y;
                self.attrib.vertices[slot + 2] = z - center.z;
                self.running.v += 1;
            }
            Command::TexCoord { u, v } => {
                self.attrib.vertex_texture.extend_from_slice(&[*u, *v]);
                self.running.vt += 1;
            }
            Command::Normal { x, y, z } => {
                self.attrib.vertex_normal.extend_from_slice(&[*x, *y, *z]);
                self.running.vn += 1;
            }
            Command::Face(refs) => match self.resolve_face(refs, record.line) {
                Ok(corners) => self.add_face(&corners),
                Err(err) => match self.on_format_error {
                    FormatErrorPolicy::Abort => return Err(err),
                    FormatErrorPolicy::SkipLine => warn!("Skipping face: {}", err),
                },
            },
            Command::Empty => {}
        }
        Ok(())
    }

    fn base(&self) -> Counts {
        match self.index_base {
            IndexBase::Running => self.running,
            IndexBase::Total => self.totals,
        }
    }

    fn resolve_face(&self, refs: &[VertexRef], line: usize) -> Result<Vec<Corner>> {
        if refs.len() < 3 {
            return Err(ObjError::format(line, "face needs at least 3 vertices"));
        }
        let base = self.base();
        refs.iter()
            .map(|r| -> Result<Corner> {
                Ok(Corner {
                    v: resolve(r.v, base.v, self.totals.v, "vertex", line)?,
                    vt: r
                        .vt
                        .map(|vt| resolve(vt, base.vt, self.totals.vt, "texcoord", line))
                        .transpose()?,
                    vn: r
                        .vn
                        .map(|vn| resolve(vn, base.vn, self.totals.vn, "normal", line))
                        .transpose()?,
                })
            })
            .collect()
    }

    fn add_face(&mut self, corners: &[Corner]) {
        self.attrib.num_faces += 1;

        let mut previous = corners[corners.len() - 1].v;
        for corner in corners {
            let (a, b) = (previous as u32, corner.v as u32);
            self.edges.insert((a.min(b), a.max(b)));
            previous = corner.v;
        }

        // Fan around the first corner
        for i in 2..corners.len() {
            self.corners.push(corners[0]);
            self.corners.push(corners[i - 1]);
            self.corners.push(corners[i]);
        }
    }

    fn materialize(&mut self) {
        let corners = std::mem::take(&mut self.corners);
        let attrib = &mut *self.attrib;
        let with_texture = !attrib.vertex_texture.is_empty();
        let with_normals = !attrib.vertex_normal.is_empty();

        attrib.shade_vertices.reserve(corners.len() * 3);
        attrib.shade_normals.reserve(corners.len() * 3);
        if with_texture {
            attrib.shade_texture.reserve(corners.len() * 2);
        }

        let mut degenerate = 0usize;
        for triangle in corners.chunks_exact(3) {
            let positions = [
                attrib.vertex(triangle[0].v),
                attrib.vertex(triangle[1].v),
                attrib.vertex(triangle[2].v),
            ];

            let needs_face_normal =
                !with_normals || triangle.iter().any(|corner| corner.vn.is_none());
            let synthesized = if needs_face_normal {
                face_normal(&positions[0], &positions[1], &positions[2]).unwrap_or_else(|| {
                    degenerate += 1;
                    default_normal()
                })
            } else {
                default_normal()
            };

            for (corner, position) in triangle.iter().zip(&positions) {
                attrib
                    .shade_vertices
                    .extend_from_slice(&[position.x, position.y, position.z]);

                if with_texture {
                    let uv = match corner.vt {
                        Some(vt) => [
                            attrib.vertex_texture[2 * vt],
                            attrib.vertex_texture[2 * vt + 1],
                        ],
                        None => [0.0, 0.0],
                    };
                    attrib.shade_texture.extend_from_slice(&uv);
                }

                let normal = match corner.vn {
                    Some(vn) if with_normals => [
                        attrib.vertex_normal[3 * vn],
                        attrib.vertex_normal[3 * vn + 1],
                        attrib.vertex_normal[3 * vn + 2],
                    ],
                    _ => [synthesized.x, synthesized.y, synthesized.z],
                };
                attrib.shade_normals.extend_from_slice(&normal);
            }
        }

        if degenerate > 0 {
            warn!(
                "{} degenerate triangles given the default normal",
                degenerate
            );
        }
    }
}

/// Resolve `raw` against `base` and check it lands inside the `total` declared elements.
fn resolve(raw: i32, base: usize, total: usize, what: &str, line: usize) -> Result<usize> {
    let index = fix_index(raw, base);
    let past_start = raw < 0 && raw.unsigned_abs() as usize > base;
    if past_start || index >= total {
        return Err(ObjError::format(
            line,
            format!("{} reference {} is out of range ({} declared)", what, raw, total),
        ));
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(line: usize, x: f32, y: f32, z: f32) -> Record {
        Record {
            line,
            command: Command::Vertex { x, y, z },
        }
    }

    fn face(line: usize, refs: &[i32]) -> Record {
        Record {
            line,
            command: Command::Face(refs.iter().map(|&v| VertexRef::new(v, None, None)).collect()),
        }
    }

    fn build(records: &[Record], index_base: IndexBase) -> Result<Attrib> {
        let mut attrib = Attrib::new();
        GeometryBuilder::new(&mut attrib, index_base, FormatErrorPolicy::Abort).build(records)?;
        Ok(attrib)
    }

    fn square() -> Vec<Record> {
        vec![
            vertex(1, 0.0, 0.0, 0.0),
            vertex(2, 2.0, 0.0, 0.0),
            vertex(3, 2.0, 2.0, 0.0),
            vertex(4, 0.0, 2.0, 0.0),
            face(5, &[1, 2, 3, 4]),
        ]
    }

    #[test]
    fn test_no_vertices_is_error() {
        let records = vec![Record {
            line: 1,
            command: Command::Normal {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        }];
        assert!(matches!(
            build(&records, IndexBase::Running),
            Err(ObjError::EmptyModel)
        ));
    }

    #[test]
    fn test_vertices_are_centered() {
        let attrib = build(&square(), IndexBase::Running).unwrap();
        assert_eq!(attrib.num_vertices, 4);
        assert_eq!(
            attrib.vertices,
            vec![-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0]
        );
        assert_eq!(attrib.bounds.to_array(), [-1.0, 1.0, -1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_quad_edges_and_fan() {
        let attrib = build(&square(), IndexBase::Running).unwrap();
        assert_eq!(attrib.edges, vec![0, 1, 0, 3, 1, 2, 2, 3]);
        assert_eq!(attrib.num_faces, 1);
        assert_eq!(attrib.num_triangles(), 2);
        assert_eq!(attrib.shade_vertices.len(), 2 * 3 * 3);
        assert!(attrib.shade_texture.is_empty());
        // Second triangle is (r0, r2, r3)
        assert_eq!(
            &attrib.shade_vertices[9..18],
            &[-1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_shared_edges_deduplicated() {
        let mut records = square();
        records.push(face(6, &[1, 3, 4]));
        let attrib = build(&records, IndexBase::Running).unwrap();
        // Diagonal 0-2 is new, 2-3 and 0-3 are shared
        assert_eq!(attrib.num_edges(), 5);
        assert_eq!(attrib.num_triangles(), 3);
    }

    #[test]
    fn test_synthesized_normals() {
        let attrib = build(&square(), IndexBase::Running).unwrap();
        assert_eq!(attrib.shade_normals.len(), attrib.shade_vertices.len());
        for normal in attrib.shade_normals.chunks_exact(3) {
            assert!((normal[0]).abs() < 1e-6);
            assert!((normal[1]).abs() < 1e-6);
            assert!((normal[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_triangle_uses_default_normal() {
        let records = vec![
            vertex(1, 0.0, 0.0, 0.0),
            vertex(2, 1.0, 1.0, 1.0),
            vertex(3, 2.0, 2.0, 2.0),
            face(4, &[1, 2, 3]),
        ];
        let attrib = build(&records, IndexBase::Running).unwrap();
        for normal in attrib.shade_normals.chunks_exact(3) {
            assert_eq!(normal, &[0.0, 1.0, 0.0]);
        }
        assert!(attrib.shade_normals.iter().all(|n| n.is_finite()));
    }

    #[test]
    fn test_declared_normals_and_texcoords() {
        let records = vec![
            vertex(1, 0.0, 0.0, 0.0),
            vertex(2, 1.0, 0.0, 0.0),
            vertex(3, 0.0, 1.0, 0.0),
            Record {
                line: 4,
                command: Command::TexCoord { u: 0.5, v: 0.25 },
            },
            Record {
                line: 5,
                command: Command::Normal {
                    x: 0.0,
                    y: 0.0,
                    z: -1.0,
                },
            },
            Record {
                line: 6,
                command: Command::Face(vec![
                    VertexRef::new(1, Some(1), Some(1)),
                    VertexRef::new(2, None, Some(1)),
                    VertexRef::new(3, Some(1), None),
                ]),
            },
        ];
        let attrib = build(&records, IndexBase::Running).unwrap();
        assert_eq!(attrib.shade_texture, vec![0.5, 0.25, 0.0, 0.0, 0.5, 0.25]);
        assert_eq!(&attrib.shade_normals[0..3], &[0.0, 0.0, -1.0]);
        assert_eq!(&attrib.shade_normals[3..6], &[0.0, 0.0, -1.0]);
        // Missing vn falls back to the face normal
        assert!((attrib.shade_normals[8] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_face_with_two_references_is_rejected() {
        let records = vec![
            vertex(1, 0.0, 0.0, 0.0),
            vertex(2, 1.0, 0.0, 0.0),
            face(3, &[1, 2]),
        ];
        let err = build(&records, IndexBase::Running).unwrap_err();
        assert!(matches!(err, ObjError::Format { line: 3, .. }));

        let records = vec![vertex(1, 0.0, 0.0, 0.0), face(2, &[])];
        assert!(build(&records, IndexBase::Running).is_err());
    }

    #[test]
    fn test_huge_coordinates_stay_finite() {
        let records = vec![
            vertex(1, 3.0e38, 0.0, 0.0),
            vertex(2, 3.3e38, 1.0, 0.0),
            vertex(3, 3.2e38, 0.0, 1.0),
            face(4, &[1, 2, 3]),
        ];
        let attrib = build(&records, IndexBase::Running).unwrap();
        assert!(attrib.vertices.iter().all(|c| c.is_finite()));
        assert!(attrib.shade_normals.iter().all(|c| c.is_finite()));
        let [min_x, max_x, ..] = attrib.bounds.to_array();
        assert!(min_x.is_finite() && max_x.is_finite());
        assert!(((min_x + max_x) / 2.0).abs() <= 1e-4 * max_x);
    }

    #[test]
    fn test_negative_texcoord_and_normal_use_own_counts() {
        let records = vec![
            vertex(1, 0.0, 0.0, 0.0),
            vertex(2, 1.0, 0.0, 0.0),
            vertex(3, 0.0, 1.0, 0.0),
            Record {
                line: 4,
                command: Command::TexCoord { u: 0.1, v: 0.1 },
            },
            Record {
                line: 5,
                command: Command::TexCoord { u: 0.9, v: 0.9 },
            },
            Record {
                line: 6,
                command: Command::Normal {
                    x: 0.0,
                    y: 0.0,
                    z: -1.0,
                },
            },
            Record {
                line: 7,
                command: Command::Face(vec![
                    VertexRef::new(-3, Some(-2), Some(-1)),
                    VertexRef::new(-2, Some(-1), Some(-1)),
                    VertexRef::new(-1, Some(-1), Some(-1)),
                ]),
            },
        ];
        let attrib = build(&records, IndexBase::Running).unwrap();
        assert_eq!(attrib.shade_texture, vec![0.1, 0.1, 0.9, 0.9, 0.9, 0.9]);
        assert_eq!(
            attrib.shade_normals,
            vec![0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0]
        );
    }

    #[test]
    fn test_negative_index_running_base() {
        let records = vec![
            vertex(1, 0.0, 0.0, 0.0),
            vertex(2, 1.0, 0.0, 0.0),
            vertex(3, 0.0, 1.0, 0.0),
            face(4, &[-3, -2, -1]),
            vertex(5, 5.0, 5.0, 5.0),
        ];
        let attrib = build(&records, IndexBase::Running).unwrap();
        assert_eq!(attrib.edges, vec![0, 1, 0, 2, 1, 2]);
    }

    #[test]
    fn test_negative_index_total_base() {
        let records = vec![
            vertex(1, 0.0, 0.0, 0.0),
            vertex(2, 1.0, 0.0, 0.0),
            vertex(3, 0.0, 1.0, 0.0),
            face(4, &[-3, -2, -1]),
            vertex(5, 5.0, 5.0, 5.0),
        ];
        let attrib = build(&records, IndexBase::Total).unwrap();
        assert_eq!(attrib.edges, vec![1, 2, 1, 3, 2, 3]);
    }

    #[test]
    fn test_out_of_range_reference() {
        let mut records = square();
        records.push(face(6, &[1, 2, 9]));
        let err = build(&records, IndexBase::Running).unwrap_err();
        assert!(matches!(err, ObjError::Format { line: 6, .. }));

        let records = vec![vertex(1, 0.0, 0.0, 0.0), face(2, &[-1, -2, -3])];
        assert!(build(&records, IndexBase::Running).is_err());
    }

    #[test]
    fn test_skip_policy_drops_bad_face() {
        let mut records = square();
        records.push(face(6, &[1, 2, 9]));
        let mut attrib = Attrib::new();
        GeometryBuilder::new(&mut attrib, IndexBase::Running, FormatErrorPolicy::SkipLine)
            .build(&records)
            .unwrap();
        assert_eq!(attrib.num_faces, 1);
        assert_eq!(attrib.num_triangles(), 2);
    }

    #[test]
    fn test_rebuild_clears_previous_contents() {
        let mut attrib = Attrib::new();
        GeometryBuilder::new(&mut attrib, IndexBase::Running, FormatErrorPolicy::Abort)
            .build(&square())
            .unwrap();
        let records = vec![
            vertex(1, 0.0, 0.0, 0.0),
            vertex(2, 1.0, 0.0, 0.0),
            vertex(3, 0.0, 1.0, 0.0),
            face(4, &[1, 2, 3]),
        ];
        GeometryBuilder::new(&mut attrib, IndexBase::Running, FormatErrorPolicy::Abort)
            .build(&records)
            .unwrap();
        assert_eq!(attrib.vertices.len(), 9);
        assert_eq!(attrib.num_edges(), 3);
        assert_eq!(attrib.num_triangles(), 1);
    }
}
