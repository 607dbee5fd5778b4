//! Splitting the data payload into one byte row per scan line.

use tracing::warn;

use crate::error::{Error, Result};
use crate::header::Header;
use crate::stats::Geometry;

/// How to treat a declared geometry that needs more bytes than the payload has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeometryCheck {
    /// Rows past the end of the payload are filled with zero bytes, as if
    /// the block padding continued.
    #[default]
    Lenient,
    /// Fail with [`Error::GeometryExceedsPayload`].
    Strict,
}

/// Split `payload` into NAXIS2 rows of `NAXIS1 * |BITPIX| / 8` bytes each,
/// zero-filling any rows that run past the end of `payload`.
///
/// `payload` is the data section only (after the header block), normally
/// already padded to whole blocks. Missing BITPIX/NAXIS1/NAXIS2 is a
/// contract violation and returned as an error.
pub fn build_matrix(payload: &[u8], header: &Header) -> Result<Vec<Vec<u8>>> {
    build_matrix_with(payload, header, GeometryCheck::Lenient)
}

/// [`build_matrix`] with an explicit geometry check.
pub fn build_matrix_with(
    payload: &[u8],
    header: &Header,
    check: GeometryCheck,
) -> Result<Vec<Vec<u8>>> {
    let geometry = Geometry::from_header(header)?;
    let row_bytes = geometry.row_bytes()?;
    let expected = geometry.data_bytes()?;

    if expected > payload.len() {
        match check {
            GeometryCheck::Strict => {
                return Err(Error::GeometryExceedsPayload {
                    expected,
                    actual: payload.len(),
                })
            }
            GeometryCheck::Lenient => warn!(
                expected,
                actual = payload.len(),
                "declared geometry exceeds payload, zero-filling trailing rows"
            ),
        }
    }

    let rows = (0..geometry.naxis2)
        .map(|i| {
            let start = (i * row_bytes).min(payload.len());
            let end = ((i + 1) * row_bytes).min(payload.len());
            let mut row = payload[start..end].to_vec();
            row.resize(row_bytes, 0);
            row
        })
        .collect();

    Ok(rows)
}
