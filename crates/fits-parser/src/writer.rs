//! Serializing a header and row matrix back into block-padded FITS bytes.

use crate::block::{
    header_len, pad_to_block, CARDS_PER_BLOCK, CARD_SIZE, DATA_PAD_BYTE, HEADER_PAD_BYTE,
};
use crate::error::{Error, Result};
use crate::header::{Header, HeaderEntry};
use crate::parsed::ParsedFile;
use crate::parser::parse_card;
use crate::stats::Geometry;
use crate::value::{format_value, value_extent, VALUE_FIELD_SIZE};

/// Most entries a header can hold and still leave room for END in one block.
pub const MAX_HEADER_ENTRIES: usize = CARDS_PER_BLOCK - 1;

fn check_keyword(keyword: &str) -> Result<()> {
    let valid = keyword.len() <= 8
        && keyword
            .bytes()
            .all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidKeyword)
    }
}

fn check_ascii(text: &str) -> Result<()> {
    if text.is_ascii() {
        Ok(())
    } else {
        Err(Error::InvalidHeader("card text is not ASCII"))
    }
}

/// Insert `/ comment` after the rendered value in a 70-byte value field.
/// Comments that do not fit are truncated; if there is no room at all the
/// comment is dropped.
fn insert_comment(field: &mut [u8; VALUE_FIELD_SIZE], comment: &str) {
    let sep_start = value_extent(field) + 1;
    if sep_start + 3 >= VALUE_FIELD_SIZE {
        return;
    }

    field[sep_start] = b'/';
    field[sep_start + 1] = b' ';

    let comment_start = sep_start + 2;
    let bytes = comment.as_bytes();
    let len = bytes.len().min(VALUE_FIELD_SIZE - comment_start);
    field[comment_start..comment_start + len].copy_from_slice(&bytes[..len]);
}

/// Render a header entry as an 80-byte card.
///
/// An entry decoded from a file and not modified since is written back as
/// its raw record, byte for byte, even when its keyword or text would not
/// pass the checks below. Otherwise valued entries get `= ` in columns 9-10
/// and the value in fixed format (free format for reals wider than 20
/// columns), and entries whose value could not be decoded are still
/// replayed from their raw record.
pub fn format_card(entry: &HeaderEntry) -> Result<[u8; CARD_SIZE]> {
    if let Some(raw) = entry.raw_card() {
        if parse_card(raw).is_ok_and(|decoded| decoded == *entry) {
            return Ok(*raw);
        }
    }

    check_keyword(&entry.keyword)?;
    if let Some(comment) = &entry.comment {
        check_ascii(comment)?;
    }

    let mut buf = [b' '; CARD_SIZE];
    buf[..entry.keyword.len()].copy_from_slice(entry.keyword.as_bytes());

    match &entry.value {
        Some(value) => {
            if let Some(s) = value.as_str() {
                check_ascii(s)?;
            }
            let mut field = format_value(value);
            if let Some(comment) = &entry.comment {
                insert_comment(&mut field, comment);
            }
            buf[8] = b'=';
            buf[9] = b' ';
            buf[10..].copy_from_slice(&field);
        }
        None => match entry.raw_card() {
            Some(raw) if !entry.is_commentary() && &raw[8..10] == b"= " => {
                buf = *raw;
            }
            _ => {
                if let Some(text) = &entry.comment {
                    let bytes = text.as_bytes();
                    let len = bytes.len().min(CARD_SIZE - 8);
                    buf[8..8 + len].copy_from_slice(&bytes[..len]);
                }
            }
        },
    }

    Ok(buf)
}

/// Create the standard FITS END card.
pub fn format_end_card() -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..3].copy_from_slice(b"END");
    buf
}

/// Serialize header entries followed by END, space-padded to whole blocks.
///
/// Headers that would need a second block are refused, since the reader
/// only ever looks at the first one.
pub fn serialize_header(header: &Header) -> Result<Vec<u8>> {
    if header.len() > MAX_HEADER_ENTRIES {
        return Err(Error::HeaderTooLarge(header.len()));
    }

    let mut buf = vec![HEADER_PAD_BYTE; header_len(header.len())];

    for (i, entry) in header.iter().enumerate() {
        let offset = i * CARD_SIZE;
        buf[offset..offset + CARD_SIZE].copy_from_slice(&format_card(entry)?);
    }

    let end_offset = header.len() * CARD_SIZE;
    buf[end_offset..end_offset + CARD_SIZE].copy_from_slice(&format_end_card());

    Ok(buf)
}

/// Concatenate rows in order and zero-pad to whole blocks.
pub fn serialize_data(rows: &[Vec<u8>]) -> Vec<u8> {
    let raw = rows.concat();
    pad_to_block(raw, DATA_PAD_BYTE)
}

/// Serialize a parsed file into one contiguous FITS byte stream.
///
/// The whole stream is assembled in memory; nothing is written on error.
pub fn write_fits(file: &ParsedFile) -> Result<Vec<u8>> {
    Geometry::from_header(file.header())?;

    let mut out = serialize_header(file.header())?;
    out.extend_from_slice(&serialize_data(file.data()));
    Ok(out)
}
