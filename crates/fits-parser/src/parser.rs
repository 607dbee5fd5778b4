//! Header parsing: 80-byte cards from the first 2880-byte block.

use tracing::debug;

use crate::block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
use crate::error::{Error, Result};
use crate::header::{Header, HeaderEntry};
use crate::value::parse_value;

const END_KEYWORD: &[u8; 8] = b"END     ";

/// Keywords whose bytes 8..80 are free text even when they look like `= `.
const COMMENTARY_KEYWORDS: [&[u8; 8]; 3] = [b"COMMENT ", b"HISTORY ", b"        "];

fn card_at(data: &[u8], index: usize) -> Result<&[u8; CARD_SIZE]> {
    let start = index * CARD_SIZE;
    data.get(start..start + CARD_SIZE)
        .and_then(|card| card.try_into().ok())
        .ok_or(Error::UnexpectedEof)
}

fn free_text(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end();
    (!text.is_empty()).then(|| text.to_string())
}

fn is_standard_keyword(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b' ' | b'-' | b'_'))
}

/// Parse a single 80-byte header card.
///
/// Decoding is lenient: a keyword outside the FITS character set is kept
/// as written, and bytes that are not UTF-8 decode as U+FFFD. The entry
/// keeps the raw card so the writer can emit it unchanged.
pub fn parse_card(card: &[u8; CARD_SIZE]) -> Result<HeaderEntry> {
    let mut keyword_bytes = [b' '; 8];
    keyword_bytes.copy_from_slice(&card[..8]);

    let keyword = String::from_utf8_lossy(&keyword_bytes)
        .trim_end()
        .to_string();
    if !is_standard_keyword(&keyword_bytes) {
        debug!(keyword = %keyword, "non-standard keyword");
    }

    let valued = !COMMENTARY_KEYWORDS.contains(&&keyword_bytes) && &card[8..10] == b"= ";
    if !valued {
        let text = free_text(&card[8..]);
        return Ok(HeaderEntry::from_card(keyword, None, text, *card));
    }

    let (value, comment) = parse_value(&card[10..]);
    Ok(HeaderEntry::from_card(
        keyword,
        value,
        comment.map(|c| c.into_owned()),
        *card,
    ))
}

fn is_text_block(block: &[u8]) -> bool {
    block.iter().all(|b| (0x20..=0x7E).contains(b))
}

/// Number of blocks the header occupies, found by locating the END card.
///
/// The first block is always searched. Later blocks are searched only
/// while they consist entirely of printable ASCII, the way header blocks
/// are written; the first block holding anything else is taken to be data
/// and ends the scan. A data block that happens to be printable text with
/// `END` on a card boundary is still miscounted.
///
/// A result above 1 means the file breaks the single-header-block
/// precondition the rest of the codec relies on.
pub fn header_block_count(raw: &[u8]) -> Result<usize> {
    if raw.len() < BLOCK_SIZE {
        return Err(Error::UnexpectedEof);
    }

    for (index, block) in raw.chunks_exact(BLOCK_SIZE).enumerate() {
        if index > 0 && !is_text_block(block) {
            break;
        }
        if block
            .chunks_exact(CARD_SIZE)
            .any(|card| &card[..8] == END_KEYWORD)
        {
            return Ok(index + 1);
        }
    }
    Err(Error::MissingEnd)
}

/// Parse the header from the first block of `raw`.
///
/// Cards are read in order until END; the padding cards after END are
/// discarded. Headers that continue past the first block are rejected with
/// [`Error::MultipleHeaderBlocks`].
pub fn parse_header(raw: &[u8]) -> Result<Header> {
    if raw.len() < BLOCK_SIZE {
        return Err(Error::UnexpectedEof);
    }

    let mut header = Header::new();
    for i in 0..CARDS_PER_BLOCK {
        let card = card_at(raw, i)?;
        if &card[..8] == END_KEYWORD {
            debug!(entries = header.len(), "parsed FITS header");
            return Ok(header);
        }
        header.push(parse_card(card)?);
    }

    match header_block_count(raw)? {
        1 => Err(Error::MissingEnd),
        n => Err(Error::MultipleHeaderBlocks(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::keywords;
    use crate::value::Value;

    fn make_card(s: &str) -> [u8; CARD_SIZE] {
        let mut buf = [b' '; CARD_SIZE];
        let bytes = s.as_bytes();
        let len = bytes.len().min(CARD_SIZE);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    fn make_blocks(cards: &[&str], blocks: usize) -> Vec<u8> {
        assert!(cards.len() <= blocks * CARDS_PER_BLOCK);
        let mut data = vec![b' '; blocks * BLOCK_SIZE];
        for (i, card) in cards.iter().enumerate() {
            data[i * CARD_SIZE..(i + 1) * CARD_SIZE].copy_from_slice(&make_card(card));
        }
        data
    }

    // ---- parse_card ----

    #[test]
    fn parse_card_integer_with_comment() {
        let e = parse_card(&make_card("BITPIX  =                  -64 / bits per pixel")).unwrap();
        assert_eq!(e.keyword, "BITPIX");
        assert_eq!(e.value, Some(Value::Integer(-64)));
        assert_eq!(e.comment.as_deref(), Some("bits per pixel"));
    }

    #[test]
    fn parse_card_string_value() {
        let e = parse_card(&make_card("ORIGIN  = 'ESA     '           / data source")).unwrap();
        assert_eq!(e.value, Some(Value::String("ESA".into())));
        assert_eq!(e.comment.as_deref(), Some("data source"));
    }

    #[test]
    fn parse_card_keeps_raw_record() {
        let card = make_card("NAXIS   =                    2");
        let e = parse_card(&card).unwrap();
        assert_eq!(e.raw_card(), Some(&card));
    }

    #[test]
    fn parse_card_comment_keyword() {
        let e = parse_card(&make_card("COMMENT   HEALPix order 8")).unwrap();
        assert_eq!(e.keyword, keywords::COMMENT);
        assert!(e.value.is_none());
        assert_eq!(e.comment.as_deref(), Some("  HEALPix order 8"));
    }

    #[test]
    fn parse_card_history_with_equals_is_text() {
        let e = parse_card(&make_card("HISTORY = not a value")).unwrap();
        assert!(e.value.is_none());
        assert_eq!(e.comment.as_deref(), Some("= not a value"));
    }

    #[test]
    fn parse_card_without_value_indicator() {
        let e = parse_card(&make_card("NOVALUE   just text")).unwrap();
        assert_eq!(e.keyword, "NOVALUE");
        assert!(e.value.is_none());
        assert_eq!(e.comment.as_deref(), Some("  just text"));
    }

    #[test]
    fn parse_card_blank() {
        let e = parse_card(&make_card("")).unwrap();
        assert_eq!(e.keyword, "");
        assert!(e.is_commentary());
        assert!(e.comment.is_none());
    }

    #[test]
    fn parse_card_undefined_value() {
        let e = parse_card(&make_card("BLANK   =                      / undefined")).unwrap();
        assert!(e.value.is_none());
        assert_eq!(e.comment.as_deref(), Some("undefined"));
    }

    #[test]
    fn parse_card_lowercase_keyword_kept() {
        let card = make_card("date-obs= '2020-01-01'");
        let e = parse_card(&card).unwrap();
        assert_eq!(e.keyword, "date-obs");
        assert_eq!(e.value, Some(Value::String("2020-01-01".into())));
        assert_eq!(e.raw_card(), Some(&card));
    }

    #[test]
    fn parse_card_latin1_comment_text() {
        let mut card = make_card("COMMENT   cooled to -20 C");
        card[23] = 0xB0;
        let e = parse_card(&card).unwrap();
        assert!(e.value.is_none());
        assert_eq!(e.comment.as_deref(), Some("  cooled to -20\u{FFFD}C"));
        assert_eq!(e.raw_card(), Some(&card));
    }

    #[test]
    fn parse_header_accepts_nonstandard_cards() {
        let mut data = make_blocks(
            &[
                "SIMPLE  =                    T",
                "date-obs= '2020-01-01'",
                "COMMENT   cooled to -20 C",
                "END",
            ],
            1,
        );
        data[2 * CARD_SIZE + 23] = 0xB0;
        let header = parse_header(&data).unwrap();
        assert_eq!(header.len(), 3);
        assert_eq!(header.string("date-obs"), Some("2020-01-01"));
    }

    // ---- parse_header ----

    #[test]
    fn parse_header_stops_at_end() {
        let data = make_blocks(
            &[
                "SIMPLE  =                    T",
                "BITPIX  =                    8",
                "NAXIS   =                    0",
                "END",
                "GARBAGE =                    1",
            ],
            1,
        );
        let header = parse_header(&data).unwrap();
        assert_eq!(header.len(), 3);
        assert!(header.get("GARBAGE").is_none());
        assert!(header.get(keywords::END).is_none());
    }

    #[test]
    fn parse_header_preserves_order_and_repeats() {
        let data = make_blocks(
            &[
                "SIMPLE  =                    T",
                "COMMENT one",
                "BITPIX  =                   16",
                "COMMENT two",
                "END",
            ],
            1,
        );
        let header = parse_header(&data).unwrap();
        let names: Vec<&str> = header.iter().map(|e| e.keyword.as_str()).collect();
        assert_eq!(names, ["SIMPLE", "COMMENT", "BITPIX", "COMMENT"]);
    }

    #[test]
    fn parse_header_end_in_last_card_slot() {
        let mut cards = vec!["COMMENT filler"; CARDS_PER_BLOCK - 1];
        cards.push("END");
        let data = make_blocks(&cards, 1);
        assert_eq!(parse_header(&data).unwrap().len(), CARDS_PER_BLOCK - 1);
    }

    #[test]
    fn parse_header_too_short() {
        assert!(matches!(
            parse_header(&[b' '; 100]),
            Err(Error::UnexpectedEof)
        ));
    }

    #[test]
    fn parse_header_missing_end() {
        let data = make_blocks(&["SIMPLE  =                    T"], 1);
        assert!(matches!(parse_header(&data), Err(Error::MissingEnd)));
    }

    #[test]
    fn parse_header_rejects_second_block() {
        let mut cards = vec!["COMMENT filler"; CARDS_PER_BLOCK + 2];
        cards.push("END");
        let data = make_blocks(&cards, 2);
        assert!(matches!(
            parse_header(&data),
            Err(Error::MultipleHeaderBlocks(2))
        ));
    }

    // ---- header_block_count ----

    #[test]
    fn block_count_single() {
        let data = make_blocks(&["SIMPLE  =                    T", "END"], 1);
        assert_eq!(header_block_count(&data).unwrap(), 1);
    }

    #[test]
    fn block_count_ignores_trailing_partial_block() {
        let mut data = make_blocks(&["SIMPLE  =                    T", "END"], 1);
        data.extend_from_slice(&[0u8; 100]);
        assert_eq!(header_block_count(&data).unwrap(), 1);
    }

    #[test]
    fn block_count_without_end() {
        let data = make_blocks(&[], 2);
        assert!(matches!(header_block_count(&data), Err(Error::MissingEnd)));
    }

    #[test]
    fn block_count_stops_at_binary_data() {
        let mut data = make_blocks(&["SIMPLE  =                    T"], 1);
        let mut payload = vec![0u8; 2 * BLOCK_SIZE];
        payload[BLOCK_SIZE + 5 * CARD_SIZE..BLOCK_SIZE + 5 * CARD_SIZE + 8]
            .copy_from_slice(END_KEYWORD);
        data.extend_from_slice(&payload);
        assert!(matches!(header_block_count(&data), Err(Error::MissingEnd)));
        assert!(matches!(parse_header(&data), Err(Error::MissingEnd)));
    }

    #[test]
    fn block_count_stops_before_end_in_mixed_block() {
        let mut data = make_blocks(&["COMMENT filler"], 2);
        data[BLOCK_SIZE] = 0xFF;
        data[BLOCK_SIZE + CARD_SIZE..BLOCK_SIZE + CARD_SIZE + 8].copy_from_slice(END_KEYWORD);
        assert!(matches!(header_block_count(&data), Err(Error::MissingEnd)));
    }
}
