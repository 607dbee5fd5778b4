//! Block geometry of a single-HDU file: one header block, then the payload.

/// Size of a FITS logical record. Header and data sections are both padded
/// to a multiple of it.
pub const BLOCK_SIZE: usize = 2880;

/// Size of one header card.
pub const CARD_SIZE: usize = 80;

/// Header cards per block, END included.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Fill for unused header card slots (ASCII space).
pub const HEADER_PAD_BYTE: u8 = b' ';

/// Fill for the tail of the last data block.
pub const DATA_PAD_BYTE: u8 = 0;

/// Where the payload starts.
///
/// Only files with exactly one header block are supported, so the payload
/// always starts right after the first block. [`crate::parser::header_block_count`]
/// checks that precondition on a raw buffer.
pub const DATA_OFFSET: usize = BLOCK_SIZE;

/// Round `len` up to a whole number of blocks. Zero stays zero.
pub const fn round_up_to_block(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// Bytes taken by a header of `entries` cards plus its END card.
pub const fn header_len(entries: usize) -> usize {
    round_up_to_block((entries + 1) * CARD_SIZE)
}

/// Grow `buf` with `fill` to the next block boundary.
pub fn pad_to_block(mut buf: Vec<u8>, fill: u8) -> Vec<u8> {
    buf.resize(round_up_to_block(buf.len()), fill);
    buf
}

/// Copy of everything after the header block, zero-filled to a block
/// boundary. A buffer with no payload gives an empty vector.
pub fn padded_payload(raw: &[u8]) -> Vec<u8> {
    match raw.get(DATA_OFFSET..) {
        Some(payload) => pad_to_block(payload.to_vec(), DATA_PAD_BYTE),
        None => Vec::new(),
    }
}
