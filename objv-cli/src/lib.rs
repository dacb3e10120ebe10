/// Terminal front-end for objv: load a model and report what the viewer would draw
use std::io::{self, Write};
use std::path::Path;

use clap::ValueEnum;
use objv_core::{Attrib, BoundingBox, FormatErrorPolicy, IndexBase, ParseOptions, Parser};

pub mod report;

pub use report::Report;

/// Negative-index base as exposed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndexBaseArg {
    Running,
    Total,
}

impl From<IndexBaseArg> for IndexBase {
    fn from(arg: IndexBaseArg) -> Self {
        match arg {
            IndexBaseArg::Running => IndexBase::Running,
            IndexBaseArg::Total => IndexBase::Total,
        }
    }
}

/// Model statistics shown after a successful load
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub vertices: usize,
    pub faces: usize,
    pub edges: usize,
    pub triangles: usize,
    pub texcoords: usize,
    pub normals: usize,
    pub bounds: BoundingBox,
}

impl Summary {
    pub fn from_attrib(attrib: &Attrib) -> Self {
        Self {
            vertices: attrib.num_vertices,
            faces: attrib.num_faces,
            edges: attrib.num_edges(),
            triangles: attrib.num_triangles(),
            texcoords: attrib.vertex_texture.len() / 2,
            normals: attrib.vertex_normal.len() / 3,
            bounds: attrib.bounds,
        }
    }
}

/// Build parser options from command-line values
pub fn parse_options(
    index_base: IndexBaseArg,
    skip_bad_lines: bool,
    max_line_len: usize,
    max_face_refs: usize,
) -> ParseOptions {
    let policy = if skip_bad_lines {
        FormatErrorPolicy::SkipLine
    } else {
        FormatErrorPolicy::Abort
    };
    ParseOptions::new()
        .index_base(index_base.into())
        .on_format_error(policy)
        .max_line_len(max_line_len)
        .max_face_refs(max_face_refs)
}

/// Parse `path` and print the outcome to `out`.
///
/// Returns whether the load succeeded.
pub fn run<W: Write>(out: &mut W, path: &Path, options: ParseOptions) -> io::Result<bool> {
    let mut parser = Parser::with_options(options);
    let mut attrib = Attrib::new();
    parser.parse_obj(&mut attrib, path);

    let report = Report::new(path);
    match parser.last_error() {
        None => report.success(out, &Summary::from_attrib(&attrib))?,
        Some(err) => report.failure(out, &err.to_string())?,
    }
    out.flush()?;
    Ok(!parser.has_error())
}
