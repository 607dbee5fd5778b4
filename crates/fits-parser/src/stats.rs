//! Physical-value statistics over the data payload.
//!
//! Stored elements are mapped to physical values with
//! `physical = BZERO + BSCALE * stored` and the running minimum and maximum
//! are written back to the header as DATAMIN/DATAMAX.

use tracing::{debug, trace};

use crate::bitpix::Bitpix;
use crate::block::DATA_OFFSET;
use crate::error::{Error, Result};
use crate::header::{keywords, Header, HeaderEntry};
use crate::value::Value;

/// The BSCALE/BZERO affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub bscale: f64,
    pub bzero: f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Scaling {
            bscale: 1.0,
            bzero: 0.0,
        }
    }
}

impl Scaling {
    /// Read BSCALE and BZERO from `header`, defaulting to 1 and 0.
    pub fn from_header(header: &Header) -> Self {
        let default = Scaling::default();
        Scaling {
            bscale: header.float(keywords::BSCALE).unwrap_or(default.bscale),
            bzero: header.float(keywords::BZERO).unwrap_or(default.bzero),
        }
    }

    #[inline]
    pub fn physical(&self, stored: f64) -> f64 {
        self.bzero + self.bscale * stored
    }
}

/// Smallest and largest physical value in a payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalRange {
    pub min: f64,
    pub max: f64,
}

impl PhysicalRange {
    /// Fold physical values into a range. NaN values are skipped; returns
    /// `None` when nothing is left.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| !v.is_nan())
            .fold(None, |range, v| {
                Some(match range {
                    None => PhysicalRange { min: v, max: v },
                    Some(r) => PhysicalRange {
                        min: r.min.min(v),
                        max: r.max.max(v),
                    },
                })
            })
    }

    pub fn contains(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }
}

/// Element geometry required by the statistics pass and the matrix builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub bitpix: Bitpix,
    /// Elements per row (NAXIS1).
    pub naxis1: usize,
    /// Number of rows (NAXIS2).
    pub naxis2: usize,
}

impl Geometry {
    /// Read BITPIX, NAXIS1 and NAXIS2 from `header`.
    pub fn from_header(header: &Header) -> Result<Self> {
        let bitpix = Bitpix::from_value(header.require_integer(keywords::BITPIX)?)?;
        let naxis1 = header.require_axis(keywords::NAXIS1)?;
        let naxis2 = header.require_axis(keywords::NAXIS2)?;
        Ok(Geometry {
            bitpix,
            naxis1,
            naxis2,
        })
    }

    /// Bytes in one row: `NAXIS1 * |BITPIX| / 8`.
    pub fn row_bytes(&self) -> Result<usize> {
        self.naxis1
            .checked_mul(self.bitpix.bytes_per_element())
            .ok_or(Error::InvalidValue(keywords::NAXIS1))
    }

    /// Bytes in the whole data array, before block padding.
    pub fn data_bytes(&self) -> Result<usize> {
        self.row_bytes()?
            .checked_mul(self.naxis2)
            .ok_or(Error::InvalidValue(keywords::NAXIS2))
    }
}

/// Compute the physical range of the payload in `raw` (a full file buffer,
/// header block included).
///
/// Returns `Ok(None)` when the array holds no elements or only NaN.
pub fn physical_range(header: &Header, raw: &[u8]) -> Result<Option<PhysicalRange>> {
    let geometry = Geometry::from_header(header)?;
    let bpe = geometry.bitpix.bytes_per_element();
    let end = DATA_OFFSET
        .checked_add(geometry.data_bytes()?)
        .ok_or(Error::UnexpectedEof)?;
    let data = raw.get(DATA_OFFSET..end).ok_or(Error::UnexpectedEof)?;

    let scaling = Scaling::from_header(header);
    trace!(?geometry, ?scaling, "scanning payload");

    let bitpix = geometry.bitpix;
    Ok(PhysicalRange::from_values(
        data.chunks_exact(bpe)
            .map(|element| scaling.physical(bitpix.decode(element))),
    ))
}

/// Return a copy of `header` with DATAMIN/DATAMAX set to `range`.
///
/// Existing entries are overwritten in place and keep their comments; new
/// ones are appended.
pub fn with_range(header: &Header, range: PhysicalRange) -> Header {
    let mut updated = header.clone();
    for (keyword, v) in [(keywords::DATAMIN, range.min), (keywords::DATAMAX, range.max)] {
        let mut entry = HeaderEntry::new(keyword, Value::Float(v));
        entry.comment = header.get(keyword).and_then(|e| e.comment.clone());
        updated.set(entry);
    }
    updated
}

/// Run the statistics pass, returning the updated header or the reason it
/// could not run.
pub fn try_compute_physical_min_max(header: &Header, raw: &[u8]) -> Result<Header> {
    match physical_range(header, raw)? {
        Some(range) => {
            debug!(min = range.min, max = range.max, "computed physical range");
            Ok(with_range(header, range))
        }
        None => {
            debug!("payload has no defined elements, DATAMIN/DATAMAX left as is");
            Ok(header.clone())
        }
    }
}

/// Run the statistics pass. A header missing BITPIX/NAXIS1/NAXIS2, or a
/// payload shorter than the declared array, yields `None`.
pub fn compute_physical_min_max(header: &Header, raw: &[u8]) -> Option<Header> {
    try_compute_physical_min_max(header, raw)
        .map_err(|e| debug!(error = %e, "statistics pass failed"))
        .ok()
}
