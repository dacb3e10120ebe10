/// Line segmentation over a raw byte buffer

/// One line of the input, as an offset/length pair into the source buffer.
/// The terminator is not included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub offset: usize,
    pub len: usize,
}

impl LineSpan {
    pub fn slice<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.offset..self.offset + self.len]
    }
}

/// Split `data` into line spans without copying.
///
/// `\n`, `\r\n` and a lone `\r` each end a line. `\0` ends the line it
/// appears on and stops the scan. A trailing fragment with no terminator
/// still yields a span.
pub fn segment_lines(data: &[u8]) -> Vec<LineSpan> {
    let mut spans = Vec::new();
    let mut line_start = 0;
    let mut i = 0;

    while i < data.len() {
        match data[i] {
            b'\0' => {
                spans.push(LineSpan {
                    offset: line_start,
                    len: i - line_start,
                });
                return spans;
            }
            b'\n' => {
                spans.push(LineSpan {
                    offset: line_start,
                    len: i - line_start,
                });
                line_start = i + 1;
            }
            b'\r' => {
                spans.push(LineSpan {
                    offset: line_start,
                    len: i - line_start,
                });
                // \r\n counts once
                if data.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                line_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    if line_start < data.len() {
        spans.push(LineSpan {
            offset: line_start,
            len: data.len() - line_start,
        });
    }

    spans
}
