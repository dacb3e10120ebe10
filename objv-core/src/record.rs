/// OBJ record parser
use std::str::SplitAsciiWhitespace;

use nom::{
    character::complete::{self as cc, char},
    combinator::{all_consuming, opt},
    number::complete::float,
    sequence::preceded,
    IResult,
};

use crate::error::{ObjError, Result};

/// Longest line accepted before tokenization, in bytes.
pub const MAX_LINE_LEN: usize = 4096;

/// Most vertex references accepted on one face line.
pub const MAX_FACE_REFS: usize = 200;

/// One face corner as written in the file: `v[/vt][/vn]`, raw OBJ values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexRef {
    pub v: i32,
    pub vt: Option<i32>,
    pub vn: Option<i32>,
}

impl VertexRef {
    pub fn new(v: i32, vt: Option<i32>, vn: Option<i32>) -> Self {
        Self { v, vt, vn }
    }
}

/// A decoded OBJ line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Vertex { x: f32, y: f32, z: f32 },
    TexCoord { u: f32, v: f32 },
    Normal { x: f32, y: f32, z: f32 },
    Face(Vec<VertexRef>),
    Empty,
}

/// A command tagged with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: usize,
    pub command: Command,
}

/// Decode one line.
///
/// Blank lines, comments and unknown directives come back as
/// [`Command::Empty`]. `line_no` is only used for error messages.
pub fn parse_line(
    line: &[u8],
    line_no: usize,
    max_line_len: usize,
    max_face_refs: usize,
) -> Result<Command> {
    if line.len() > max_line_len {
        return Err(ObjError::format(
            line_no,
            format!("line is {} bytes, limit is {}", line.len(), max_line_len),
        ));
    }

    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let rest = &line[start..];
    let keyword_len = rest
        .iter()
        .position(|b| *b == b' ' || *b == b'\t')
        .unwrap_or(rest.len());

    let keyword = &rest[..keyword_len];
    if !matches!(keyword, b"v" | b"vt" | b"vn" | b"f") {
        return Ok(Command::Empty);
    }

    let body = std::str::from_utf8(&rest[keyword_len..])
        .map_err(|_| ObjError::format(line_no, "record is not valid UTF-8"))?;
    // Inline comment
    let body = body.split('#').next().unwrap_or_default();
    let mut fields = body.split_ascii_whitespace();

    match keyword {
        b"v" => {
            let [x, y, z] = parse_floats::<3>(&mut fields, line_no)?;
            Ok(Command::Vertex { x, y, z })
        }
        b"vt" => {
            let [u, v] = parse_floats::<2>(&mut fields, line_no)?;
            Ok(Command::TexCoord { u, v })
        }
        b"vn" => {
            let [x, y, z] = parse_floats::<3>(&mut fields, line_no)?;
            Ok(Command::Normal { x, y, z })
        }
        _ => parse_face(fields, line_no, max_face_refs),
    }
}

fn parse_floats<const N: usize>(
    fields: &mut SplitAsciiWhitespace<'_>,
    line_no: usize,
) -> Result<[f32; N]> {
    let mut values = [0.0; N];
    for (i, value) in values.iter_mut().enumerate() {
        let token = fields.next().ok_or_else(|| {
            ObjError::format(line_no, format!("expected {} numbers, found {}", N, i))
        })?;
        *value = match all_consuming(number)(token) {
            Ok((_, value)) if value.is_finite() => value,
            _ => {
                return Err(ObjError::format(
                    line_no,
                    format!("invalid number {:?}", token),
                ))
            }
        };
    }
    // Trailing components (v w, vt w) are ignored
    Ok(values)
}

fn parse_face(
    fields: SplitAsciiWhitespace<'_>,
    line_no: usize,
    max_face_refs: usize,
) -> Result<Command> {
    let mut refs = Vec::new();
    for token in fields {
        if refs.len() == max_face_refs {
            return Err(ObjError::format(
                line_no,
                format!("face has more than {} vertices", max_face_refs),
            ));
        }
        match all_consuming(vertex_ref)(token) {
            Ok((_, vertex)) => refs.push(vertex),
            Err(_) => {
                return Err(ObjError::format(
                    line_no,
                    format!("invalid vertex reference {:?}", token),
                ))
            }
        }
    }

    if refs.len() < 3 {
        return Err(ObjError::format(
            line_no,
            format!("face needs at least 3 vertices, found {}", refs.len()),
        ));
    }

    Ok(Command::Face(refs))
}

fn number(input: &str) -> IResult<&str, f32> {
    float(input)
}

fn vertex_ref(input: &str) -> IResult<&str, VertexRef> {
    let (input, v) = cc::i32(input)?;
    let (input, vt) = opt(preceded(char('/'), opt(cc::i32)))(input)?;
    let (input, vn) = match vt {
        Some(_) => opt(preceded(char('/'), opt(cc::i32)))(input)?,
        None => (input, None),
    };
    Ok((input, VertexRef::new(v, vt.flatten(), vn.flatten())))
}
