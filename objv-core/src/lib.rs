/// objv Core Library - Wavefront OBJ to render-ready geometry
///
/// This library reads an OBJ model and produces flat buffers for display:
/// a deduplicated edge list for wireframe, a fan-triangulated shaded stream
/// with normals, and a centered bounding box.

pub mod builder;
pub mod error;
pub mod geometry;
pub mod index;
pub mod lines;
pub mod loader;
pub mod parser;
pub mod record;

// Re-export commonly used types
pub use builder::Attrib;
pub use error::{ErrorKind, ObjError, Result};
pub use geometry::BoundingBox;
pub use index::IndexBase;
pub use parser::{FormatErrorPolicy, ParseOptions, Parser};
