//! Load and save entry points.
//!
//! Loading: fetch bytes, parse the header block, run the statistics pass,
//! split the payload into rows. Any failure along the way is logged and
//! surfaces as `None`; nothing here panics on bad input.
//!
//! The statistics pass reads every declared pixel, so a payload shorter than
//! the geometry fails there with [`Error::UnexpectedEof`] and the row split
//! never has to zero-fill. [`crate::matrix::build_matrix_with`] is the place
//! to choose between zero-fill and refusal when splitting a buffer directly.
//!
//! Saving: assemble the complete byte stream first, then hand it to a sink
//! in one call.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::block::padded_payload;
use crate::error::{Error, Result};
use crate::matrix::build_matrix;
use crate::parsed::ParsedFile;
use crate::parser::parse_header;
use crate::source::{AutoSource, ByteSink, ByteSource, LocalFileSink};
use crate::stats::try_compute_physical_min_max;
use crate::writer::write_fits;

/// Decode a complete FITS buffer, reporting why it failed.
///
/// The returned header has DATAMIN/DATAMAX set from the payload.
pub fn try_parse_fits(raw: &[u8]) -> Result<ParsedFile> {
    if raw.is_empty() {
        return Err(Error::UnexpectedEof);
    }

    let header = parse_header(raw)?;
    let header = try_compute_physical_min_max(&header, raw)?;
    let payload = padded_payload(raw);
    let rows = build_matrix(&payload, &header)?;
    ParsedFile::new(header, rows)
}

/// Decode a complete FITS buffer. Failures are logged and yield `None`.
pub fn parse_fits(raw: &[u8]) -> Option<ParsedFile> {
    if raw.is_empty() {
        debug!("no bytes to parse");
        return None;
    }
    match try_parse_fits(raw) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!(error = %e, len = raw.len(), "could not decode FITS bytes");
            None
        }
    }
}

/// Load the FITS file at `location`, an `http(s)` URL or a local path.
pub async fn load(location: &str) -> Option<ParsedFile> {
    let source = match AutoSource::new() {
        Ok(source) => source,
        Err(e) => {
            error!(error = %e, "could not set up byte source");
            return None;
        }
    };
    load_with(&source, location).await
}

/// Load `location` through `source`.
pub async fn load_with<S>(source: &S, location: &str) -> Option<ParsedFile>
where
    S: ByteSource + ?Sized,
{
    let raw = source.fetch(location).await;
    if raw.is_empty() {
        info!(location, "nothing loaded");
        return None;
    }

    let file = parse_fits(&raw)?;
    debug!(
        location,
        entries = file.header().len(),
        rows = file.data().len(),
        "loaded FITS file"
    );
    Some(file)
}

/// Write `file` to a local path, replacing anything already there.
pub async fn save(file: &ParsedFile, path: impl AsRef<Path>) -> Result<()> {
    save_with(&LocalFileSink, file, path.as_ref()).await
}

/// Serialize `file` and hand the bytes to `sink`.
///
/// Serialization errors are returned before the sink is touched.
pub async fn save_with<K>(sink: &K, file: &ParsedFile, path: &Path) -> Result<()>
where
    K: ByteSink + ?Sized,
{
    let bytes = write_fits(file).map_err(|e| {
        warn!(path = %path.display(), error = %e, "could not serialize FITS file");
        e
    })?;
    sink.persist(path, &bytes).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "could not write FITS file");
        e
    })
}
