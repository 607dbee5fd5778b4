use thiserror::Error;

/// All errors that can occur while decoding or encoding a FITS file.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed FITS header block.
    #[error("invalid FITS header: {0}")]
    InvalidHeader(&'static str),
    /// Premature end of data while reading.
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Unrecognized BITPIX value.
    #[error("invalid BITPIX value: {0}")]
    InvalidBitpix(i64),
    /// Malformed keyword name in a header card.
    #[error("invalid keyword name")]
    InvalidKeyword,
    /// A header value could not be used where it was expected.
    #[error("invalid header value for {0}")]
    InvalidValue(&'static str),
    /// A required keyword was not found in the header.
    #[error("missing required keyword: {0}")]
    MissingKeyword(&'static str),
    /// No END card in the first header block or anywhere after it.
    #[error("no END card found in header")]
    MissingEnd,
    /// The END card sits in a later block; only single-block headers are supported.
    #[error("header spans {0} blocks, only a single header block is supported")]
    MultipleHeaderBlocks(usize),
    /// The header has more entries than fit in one block next to the END card.
    #[error("header has {0} entries, at most 35 fit in a single block")]
    HeaderTooLarge(usize),
    /// Declared geometry needs more bytes than the payload holds (strict mode only).
    #[error("declared geometry needs {expected} payload bytes, found {actual}")]
    GeometryExceedsPayload { expected: usize, actual: usize },
    /// A data row does not have the width declared by NAXIS1 and BITPIX.
    #[error("row {row} is {actual} bytes, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },
    /// The number of data rows does not match NAXIS2.
    #[error("found {actual} rows, NAXIS2 declares {expected}")]
    RowCount { expected: usize, actual: usize },
    /// An I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A network error from the HTTP byte source.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
