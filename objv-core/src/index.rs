/// OBJ reference resolution

/// Map a raw OBJ reference to a zero-based index.
///
/// Positive references are 1-based. Negative references count back from
/// `count`. Zero is not a legal OBJ index and maps to the first element. A
/// negative reference reaching past the start saturates at 0 as well; range
/// checking against the declared element count is the caller's job.
pub fn fix_index(raw: i32, count: usize) -> usize {
    if raw > 0 {
        raw as usize - 1
    } else if raw == 0 {
        0
    } else {
        count.saturating_sub(raw.unsigned_abs() as usize)
    }
}

/// Which element count negative references are relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexBase {
    /// Elements declared before the referencing line.
    #[default]
    Running,
    /// Elements declared in the whole file.
    Total,
}
