//! Header value decoding and encoding for the 70-byte value field of a card.

use std::borrow::Cow;
use std::fmt;

/// Width of the value field (card bytes 10..80).
pub const VALUE_FIELD_SIZE: usize = 70;

/// Width of the fixed-format field that numeric and logical values are
/// right-justified in (card columns 11-30).
const FIXED_FIELD_WIDTH: usize = 20;

/// A decoded FITS header value.
///
/// A card without a value (commentary cards, or `= ` followed by blanks) is
/// represented by `Option::<Value>::None` on the entry rather than a variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Character string (content between single quotes, trailing blanks trimmed).
    String(String),
    /// Integer value.
    Integer(i64),
    /// Real value. `D` exponents are accepted on input.
    Float(f64),
    /// Logical value (`T` or `F`).
    Logical(bool),
}

impl Value {
    /// Returns the value as `f64` when it is numeric. Integers are promoted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as `i64` when it is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string content when the value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the logical value when the value is `T`/`F`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Logical(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(v) => f.write_str(&format_float(*v)),
            Value::Logical(b) => f.write_str(if *b { "T" } else { "F" }),
        }
    }
}

// ── Parsing ──

/// Trim the surrounding blanks off a comment tail. Bytes that are not
/// valid UTF-8 become U+FFFD.
fn comment_text(tail: &[u8]) -> Option<Cow<'_, str>> {
    let text = match String::from_utf8_lossy(tail) {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim()),
        Cow::Owned(s) => Cow::Owned(s.trim().to_string()),
    };
    (!text.is_empty()).then_some(text)
}

/// Parse a quoted string starting at `field[0] == '\''`.
///
/// Doubled quotes collapse to one. An unterminated string is accepted as-is.
fn parse_string(field: &[u8]) -> (Value, Option<Cow<'_, str>>) {
    let mut value = Vec::new();
    let mut i = 1;

    while i < field.len() {
        if field[i] == b'\'' {
            if field.get(i + 1) == Some(&b'\'') {
                value.push(b'\'');
                i += 2;
                continue;
            }
            i += 1;
            break;
        }
        value.push(field[i]);
        i += 1;
    }

    let rest = field.get(i..).unwrap_or(&[]);
    let comment = rest
        .iter()
        .position(|&b| b == b'/')
        .and_then(|slash| comment_text(&rest[slash + 1..]));

    let value = String::from_utf8_lossy(&value).trim_end().to_string();
    (Value::String(value), comment)
}

/// Parse a real number, treating FITS `D` exponents as `E`.
pub fn parse_float_str(s: &str) -> Option<f64> {
    s.replace(['D', 'd'], "E").parse::<f64>().ok()
}

/// Parse the 70-byte value field of a card (bytes 10..80).
///
/// Returns the decoded value, if any, and the comment that follows an
/// unquoted `/`. The caller checks the `= ` indicator in bytes 8..10.
/// Non-UTF-8 bytes never fail the parse; they decode as U+FFFD.
pub fn parse_value(field: &[u8]) -> (Option<Value>, Option<Cow<'_, str>>) {
    let start = field.iter().position(|&b| b != b' ');
    let Some(start) = start else {
        return (None, None);
    };
    let field = &field[start..];

    if field[0] == b'\'' {
        let (value, comment) = parse_string(field);
        return (Some(value), comment);
    }

    let (value_part, comment) = match field.iter().position(|&b| b == b'/') {
        Some(slash) => (&field[..slash], comment_text(&field[slash + 1..])),
        None => (field, None),
    };

    let text = String::from_utf8_lossy(value_part);
    let text = text.trim();

    let value = match text {
        "" => None,
        "T" => Some(Value::Logical(true)),
        "F" => Some(Value::Logical(false)),
        _ => text
            .parse::<i64>()
            .ok()
            .map(Value::Integer)
            .or_else(|| parse_float_str(text).map(Value::Float)),
    };

    (value, comment)
}

// ── Formatting ──

/// Render a real number as the shortest text that parses back to the same
/// `f64`, with an upper-case exponent and at least one fraction digit.
///
/// The result may be wider than the 20-column fixed field; at most 24
/// characters (`-2.2250738585072014E-308`).
pub fn format_float(f: f64) -> String {
    let shortest = format!("{f:?}").to_uppercase();
    match shortest.find('E') {
        Some(e) if !shortest[..e].contains('.') => {
            format!("{}.0{}", &shortest[..e], &shortest[e..])
        }
        _ => shortest,
    }
}

/// Copy `src` into the right end of `dest`; `dest` is assumed blank.
fn right_justify(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    let start = dest.len() - len;
    dest[start..].copy_from_slice(&src[..len]);
}

fn write_string(s: &str, buf: &mut [u8; VALUE_FIELD_SIZE]) {
    let last = VALUE_FIELD_SIZE - 1;
    buf[0] = b'\'';
    let mut pos = 1;

    for ch in s.bytes() {
        let needed = if ch == b'\'' { 2 } else { 1 };
        if pos + needed > last {
            break;
        }
        buf[pos] = ch;
        if ch == b'\'' {
            buf[pos + 1] = b'\'';
        }
        pos += needed;
    }

    // Strings are padded to at least 8 characters between the quotes.
    pos = pos.max(9);
    buf[pos] = b'\'';
}

/// Serialize a value into the 70-byte value field of a card.
///
/// Numeric and logical values are right-justified in the first 20 bytes
/// (card columns 11-30). A real whose exact text is wider than that is
/// written in free format from byte 0 instead. Strings start at byte 0 with
/// a single quote.
pub fn format_value(value: &Value) -> [u8; VALUE_FIELD_SIZE] {
    let mut buf = [b' '; VALUE_FIELD_SIZE];

    match value {
        Value::Logical(b) => {
            buf[FIXED_FIELD_WIDTH - 1] = if *b { b'T' } else { b'F' };
        }
        Value::Integer(n) => {
            right_justify(n.to_string().as_bytes(), &mut buf[..FIXED_FIELD_WIDTH]);
        }
        Value::Float(f) => {
            let text = format_float(*f);
            if text.len() <= FIXED_FIELD_WIDTH {
                right_justify(text.as_bytes(), &mut buf[..FIXED_FIELD_WIDTH]);
            } else {
                buf[..text.len()].copy_from_slice(text.as_bytes());
            }
        }
        Value::String(s) => write_string(s, &mut buf),
    }

    buf
}

/// Byte offset just past the rendered value inside a formatted field.
///
/// Never less than the fixed-field width for non-string values, so comments
/// on ordinary numbers start at column 32.
pub(crate) fn value_extent(field: &[u8; VALUE_FIELD_SIZE]) -> usize {
    if field[0] != b'\'' {
        let end = field.iter().rposition(|&b| b != b' ').map_or(0, |p| p + 1);
        return end.max(FIXED_FIELD_WIDTH);
    }
    let mut i = 1;
    while i < VALUE_FIELD_SIZE {
        if field[i] == b'\'' {
            if field.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    VALUE_FIELD_SIZE
}
