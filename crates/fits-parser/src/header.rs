//! Ordered header model: entries in on-disk card order with typed lookup.

use crate::block::CARD_SIZE;
use crate::error::{Error, Result};
use crate::value::Value;

/// Keyword names the codec reads or writes. Every other keyword is passed
/// through untouched.
pub mod keywords {
    pub const SIMPLE: &str = "SIMPLE";
    pub const BITPIX: &str = "BITPIX";
    pub const NAXIS: &str = "NAXIS";
    pub const NAXIS1: &str = "NAXIS1";
    pub const NAXIS2: &str = "NAXIS2";
    pub const BZERO: &str = "BZERO";
    pub const BSCALE: &str = "BSCALE";
    pub const DATAMIN: &str = "DATAMIN";
    pub const DATAMAX: &str = "DATAMAX";
    pub const END: &str = "END";
    pub const COMMENT: &str = "COMMENT";
    pub const HISTORY: &str = "HISTORY";
}

/// One header card: keyword, optional typed value, optional comment.
///
/// Entries decoded from a file also keep the exact 80-byte record they came
/// from. That record is provenance only and does not take part in equality.
#[derive(Debug, Clone)]
pub struct HeaderEntry {
    /// Keyword with trailing blanks removed. Empty for blank cards.
    pub keyword: String,
    /// Decoded value, or `None` for commentary cards and undefined values.
    pub value: Option<Value>,
    /// Comment text after `/`, or the free text of a commentary card.
    pub comment: Option<String>,
    raw: Option<[u8; CARD_SIZE]>,
}

impl HeaderEntry {
    /// Create a valued entry with no comment.
    pub fn new(keyword: impl Into<String>, value: Value) -> Self {
        HeaderEntry {
            keyword: keyword.into(),
            value: Some(value),
            comment: None,
            raw: None,
        }
    }

    /// Create a commentary entry (`COMMENT`, `HISTORY` or blank keyword).
    pub fn commentary(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        HeaderEntry {
            keyword: keyword.into(),
            value: None,
            comment: Some(text.into()),
            raw: None,
        }
    }

    /// Attach a comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub(crate) fn from_card(
        keyword: String,
        value: Option<Value>,
        comment: Option<String>,
        raw: [u8; CARD_SIZE],
    ) -> Self {
        HeaderEntry {
            keyword,
            value,
            comment,
            raw: Some(raw),
        }
    }

    /// The exact 80-byte record this entry was decoded from, if any.
    pub fn raw_card(&self) -> Option<&[u8; CARD_SIZE]> {
        self.raw.as_ref()
    }

    /// Returns `true` for `COMMENT`, `HISTORY` and blank-keyword cards.
    pub fn is_commentary(&self) -> bool {
        matches!(
            self.keyword.as_str(),
            keywords::COMMENT | keywords::HISTORY | ""
        )
    }
}

impl PartialEq for HeaderEntry {
    fn eq(&self, other: &Self) -> bool {
        self.keyword == other.keyword && self.value == other.value && self.comment == other.comment
    }
}

/// An ordered sequence of header entries.
///
/// Order is significant and round-trips through the writer. Keywords may
/// repeat; lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    entries: Vec<HeaderEntry>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in card order. The END card is not an entry.
    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry after the existing ones.
    pub fn push(&mut self, entry: HeaderEntry) {
        self.entries.push(entry);
    }

    /// Overwrite the first entry with the same keyword, or append if none exists.
    pub fn set(&mut self, entry: HeaderEntry) {
        match self.position(&entry.keyword) {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Index of the first entry with `keyword`.
    pub fn position(&self, keyword: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.keyword == keyword)
    }

    /// First entry with `keyword`.
    pub fn get(&self, keyword: &str) -> Option<&HeaderEntry> {
        self.entries.iter().find(|e| e.keyword == keyword)
    }

    /// Value of the first entry with `keyword`, if it has one.
    pub fn value(&self, keyword: &str) -> Option<&Value> {
        self.get(keyword).and_then(|e| e.value.as_ref())
    }

    pub fn integer(&self, keyword: &str) -> Option<i64> {
        self.value(keyword).and_then(Value::as_i64)
    }

    /// Numeric value of `keyword`; integer values are promoted to `f64`.
    pub fn float(&self, keyword: &str) -> Option<f64> {
        self.value(keyword).and_then(Value::as_f64)
    }

    pub fn string(&self, keyword: &str) -> Option<&str> {
        self.value(keyword).and_then(Value::as_str)
    }

    pub fn logical(&self, keyword: &str) -> Option<bool> {
        self.value(keyword).and_then(Value::as_bool)
    }

    /// Integer value of a keyword the caller cannot proceed without.
    pub fn require_integer(&self, keyword: &'static str) -> Result<i64> {
        match self.value(keyword) {
            Some(Value::Integer(n)) => Ok(*n),
            Some(_) => Err(Error::InvalidValue(keyword)),
            None => Err(Error::MissingKeyword(keyword)),
        }
    }

    /// Non-negative axis length for NAXIS1/NAXIS2.
    pub fn require_axis(&self, keyword: &'static str) -> Result<usize> {
        let n = self.require_integer(keyword)?;
        usize::try_from(n).map_err(|_| Error::InvalidValue(keyword))
    }
}

impl From<Vec<HeaderEntry>> for Header {
    fn from(entries: Vec<HeaderEntry>) -> Self {
        Header { entries }
    }
}

impl FromIterator<HeaderEntry> for Header {
    fn from_iter<I: IntoIterator<Item = HeaderEntry>>(iter: I) -> Self {
        Header {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Header {
    type Item = &'a HeaderEntry;
    type IntoIter = core::slice::Iter<'a, HeaderEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
