use std::io;

/// Failure of a whole annotation call. No partial output is produced.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("annotation {index} start out of bounds: {start}")]
    InvalidStart { index: usize, start: i64 },
    /// The declared close point of the annotation is never reached: it lies
    /// past the end of the text, or before the annotation's own start.
    #[error("annotation {index} end out of bounds: [{start}, {end}) in text of {len} code points")]
    UnclosedRange {
        index: usize,
        start: i64,
        end: i64,
        len: usize,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
