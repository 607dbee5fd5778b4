//! The assembled header + row matrix.

use crate::bitpix::Bitpix;
use crate::error::{Error, Result};
use crate::header::Header;
use crate::stats::{Geometry, PhysicalRange, Scaling};

/// A decoded FITS file: header entries plus raw, still big-endian data rows.
///
/// Construction checks that there are NAXIS2 rows of
/// `NAXIS1 * |BITPIX| / 8` bytes. The value is immutable; build a new one to
/// change content.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    header: Header,
    data: Vec<Vec<u8>>,
}

impl ParsedFile {
    /// Assemble a parsed file, checking the rows against the header geometry.
    pub fn new(header: Header, data: Vec<Vec<u8>>) -> Result<Self> {
        let geometry = Geometry::from_header(&header)?;
        let row_bytes = geometry.row_bytes()?;

        if data.len() != geometry.naxis2 {
            return Err(Error::RowCount {
                expected: geometry.naxis2,
                actual: data.len(),
            });
        }
        if let Some((row, r)) = data.iter().enumerate().find(|(_, r)| r.len() != row_bytes) {
            return Err(Error::RowLength {
                row,
                expected: row_bytes,
                actual: r.len(),
            });
        }

        Ok(ParsedFile { header, data })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Raw rows in file order.
    pub fn data(&self) -> &[Vec<u8>] {
        &self.data
    }

    pub fn row(&self, index: usize) -> Option<&[u8]> {
        self.data.get(index).map(Vec::as_slice)
    }

    /// Consume the file, returning its parts.
    pub fn into_parts(self) -> (Header, Vec<Vec<u8>>) {
        (self.header, self.data)
    }

    fn bitpix(&self) -> Result<Bitpix> {
        Ok(Geometry::from_header(&self.header)?.bitpix)
    }

    /// Decode one row into physical values (`BZERO + BSCALE * stored`).
    pub fn physical_row(&self, index: usize) -> Result<Option<Vec<f64>>> {
        let Some(row) = self.row(index) else {
            return Ok(None);
        };
        let bitpix = self.bitpix()?;
        let scaling = Scaling::from_header(&self.header);
        Ok(Some(
            bitpix
                .decode_all(row)
                .into_iter()
                .map(|v| scaling.physical(v))
                .collect(),
        ))
    }

    /// Physical min/max over every row, NaN excluded.
    pub fn physical_range(&self) -> Result<Option<PhysicalRange>> {
        let bitpix = self.bitpix()?;
        let scaling = Scaling::from_header(&self.header);
        Ok(PhysicalRange::from_values(self.data.iter().flat_map(|row| {
            row.chunks_exact(bitpix.bytes_per_element())
                .map(move |e| scaling.physical(bitpix.decode(e)))
        })))
    }

    /// All physical values as a `NAXIS2 x NAXIS1` array.
    #[cfg(feature = "array")]
    pub fn physical_array(&self) -> Result<ndarray::Array2<f64>> {
        let geometry = Geometry::from_header(&self.header)?;
        let scaling = Scaling::from_header(&self.header);
        let values: Vec<f64> = self
            .data
            .iter()
            .flat_map(|row| geometry.bitpix.decode_all(row))
            .map(|v| scaling.physical(v))
            .collect();
        ndarray::Array2::from_shape_vec((geometry.naxis2, geometry.naxis1), values)
            .map_err(|_| Error::InvalidHeader("row data does not match NAXIS1 x NAXIS2"))
    }
}
