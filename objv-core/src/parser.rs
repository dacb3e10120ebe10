/// OBJ file parser: loader, segmenter, record parser and builder wired together
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::builder::{Attrib, GeometryBuilder};
use crate::error::{ObjError, Result};
use crate::index::IndexBase;
use crate::lines::segment_lines;
use crate::loader::read_file;
use crate::record::{parse_line, Command, Record, MAX_FACE_REFS, MAX_LINE_LEN};

/// What to do with a malformed line or face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatErrorPolicy {
    /// Fail the whole parse.
    #[default]
    Abort,
    /// Log a warning and leave the line out.
    SkipLine,
}

/// Parser configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub max_line_len: usize,
    pub max_face_refs: usize,
    pub index_base: IndexBase,
    pub on_format_error: FormatErrorPolicy,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    pub fn max_face_refs(mut self, max_face_refs: usize) -> Self {
        self.max_face_refs = max_face_refs;
        self
    }

    pub fn index_base(mut self, index_base: IndexBase) -> Self {
        self.index_base = index_base;
        self
    }

    pub fn on_format_error(mut self, policy: FormatErrorPolicy) -> Self {
        self.on_format_error = policy;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_line_len: MAX_LINE_LEN,
            max_face_refs: MAX_FACE_REFS,
            index_base: IndexBase::default(),
            on_format_error: FormatErrorPolicy::default(),
        }
    }
}

/// Wavefront OBJ parser.
///
/// Holds only its options and the outcome of the last call; all build state
/// is local to a single parse. Calls take `&mut self`, so a shared instance
/// must be wrapped in a lock to be used from several threads.
#[derive(Debug, Default)]
pub struct Parser {
    options: ParseOptions,
    last_error: Option<ObjError>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            last_error: None,
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse the file at `path` into `attrib`.
    ///
    /// `attrib` is cleared and repopulated. Check [`Parser::has_error`]
    /// afterwards; on error the contents of `attrib` must not be used.
    pub fn parse_obj(&mut self, attrib: &mut Attrib, path: impl AsRef<Path>) {
        let path = path.as_ref();
        attrib.clear();
        let result = read_file(path).and_then(|data| self.parse_into(attrib, &data));

        match result {
            Ok(()) => {
                info!(
                    "Loaded {:?}: {} vertices, {} faces, {} edges, {} triangles",
                    path,
                    attrib.num_vertices,
                    attrib.num_faces,
                    attrib.num_edges(),
                    attrib.num_triangles()
                );
                self.last_error = None;
            }
            Err(err) => {
                error!("Failed to load {:?}: {}", path, err);
                attrib.error = true;
                self.last_error = Some(err);
            }
        }
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    /// The failure behind the last `has_error() == true`
    pub fn last_error(&self) -> Option<&ObjError> {
        self.last_error.as_ref()
    }

    /// Load and parse the file at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Attrib> {
        let data = read_file(path.as_ref())?;
        self.parse_bytes(&data)
    }

    /// Parse an in-memory OBJ document.
    pub fn parse_bytes(&self, data: &[u8]) -> Result<Attrib> {
        let mut attrib = Attrib::new();
        self.parse_into(&mut attrib, data)?;
        Ok(attrib)
    }

    fn parse_into(&self, attrib: &mut Attrib, data: &[u8]) -> Result<()> {
        attrib.clear();
        let records = self.parse_records(data)?;
        GeometryBuilder::new(attrib, self.options.index_base, self.options.on_format_error)
            .build(&records)
    }

    /// Segment `data` and decode every line, dropping `Empty` records.
    pub fn parse_records(&self, data: &[u8]) -> Result<Vec<Record>> {
        let spans = segment_lines(data);
        if spans.is_empty() {
            return Err(ObjError::NoLines);
        }
        debug!("Segmented {} lines", spans.len());

        let mut records = Vec::new();
        for (i, span) in spans.iter().enumerate() {
            let line = i + 1;
            let command = match parse_line(
                span.slice(data),
                line,
                self.options.max_line_len,
                self.options.max_face_refs,
            ) {
                Ok(command) => command,
                Err(err) => match self.options.on_format_error {
                    FormatErrorPolicy::Abort => return Err(err),
                    FormatErrorPolicy::SkipLine => {
                        warn!("Skipping line: {}", err);
                        continue;
                    }
                },
            };

            if command != Command::Empty {
                records.push(Record { line, command });
            }
        }

        debug!("Decoded {} records", records.len());
        Ok(records)
    }
}
