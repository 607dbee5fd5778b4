//! Single-HDU FITS codec.
//!
//! Reads a FITS file whose header fits in the first 2880-byte block, fills in
//! DATAMIN/DATAMAX from the payload and exposes the data as one byte row per
//! scan line. Writes the same structure back as a block-padded byte stream.

pub mod bitpix;
pub mod block;
pub mod error;
pub mod header;
pub mod loader;
pub mod matrix;
pub mod parsed;
pub mod parser;
pub mod source;
pub mod stats;
pub mod value;
pub mod writer;

pub use bitpix::Bitpix;
pub use block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE, DATA_OFFSET};
pub use error::{Error, Result};
pub use header::{Header, HeaderEntry};
pub use loader::{load, load_with, parse_fits, save, save_with, try_parse_fits};
pub use matrix::{build_matrix, build_matrix_with, GeometryCheck};
pub use parsed::ParsedFile;
pub use parser::parse_header;
pub use source::{AutoSource, ByteSink, ByteSource, LocalFileSink, LocalFileSource};
#[cfg(feature = "http")]
pub use source::{HttpConfig, HttpSource};
pub use stats::compute_physical_min_max;
pub use value::Value;
pub use writer::write_fits;
