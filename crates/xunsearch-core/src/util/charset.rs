//! Recursive charset conversion.
//!
//! Values travelling to and from the search servers may be in the project's
//! default charset (GBK, BIG5, ...) rather than UTF-8, so they are held as raw
//! bytes inside a [`CharsetValue`] tree. [`convert`] walks the tree and
//! transcodes every leaf, leaving structure and key order untouched.
//!
//! # Example
//!
//! ```rust
//! use xunsearch_core::util::charset::{convert, CharsetValue};
//!
//! let value = CharsetValue::from("搜索");
//! let gbk = convert(value.clone(), "GBK", "UTF-8").unwrap();
//! assert_eq!(gbk.as_bytes().map(<[u8]>::len), Some(4));
//!
//! let back = convert(gbk, "UTF-8", "GBK").unwrap();
//! assert_eq!(back, value);
//! ```

use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// A string leaf or an arbitrarily nested container of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharsetValue {
    /// Encoded text.
    Bytes(Vec<u8>),
    /// Ordered list.
    List(Vec<CharsetValue>),
    /// Ordered map; keys are never transcoded.
    Map(Vec<(String, CharsetValue)>),
}

impl CharsetValue {
    /// The raw bytes of a leaf.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CharsetValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// A leaf decoded as UTF-8, if it is valid UTF-8.
    pub fn as_utf8(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }
}

impl From<&str> for CharsetValue {
    fn from(s: &str) -> Self {
        CharsetValue::Bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for CharsetValue {
    fn from(s: String) -> Self {
        CharsetValue::Bytes(s.into_bytes())
    }
}

impl From<Vec<u8>> for CharsetValue {
    fn from(b: Vec<u8>) -> Self {
        CharsetValue::Bytes(b)
    }
}

/// Something able to re-encode bytes between charsets.
pub trait Transcoder {
    /// Re-encode `data` from charset `from` into charset `to`.
    fn transcode(&self, data: &[u8], to: &str, from: &str) -> Result<Vec<u8>>;
}

/// [`Transcoder`] backed by `encoding_rs` (WHATWG encodings).
///
/// Characters that cannot be represented in the target charset are written
/// as HTML numeric character references.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingRsTranscoder;

impl Transcoder for EncodingRsTranscoder {
    fn transcode(&self, data: &[u8], to: &str, from: &str) -> Result<Vec<u8>> {
        let source = lookup(from)?;
        let target = lookup(to)?;
        let (decoded, _) = source.decode_without_bom_handling(data);
        let (encoded, _, _) = target.encode(&decoded);
        Ok(encoded.into_owned())
    }
}

fn lookup(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| Error::unsupported_charset(label))
}

/// Convert `data` from charset `from` into charset `to` with the default
/// transcoder.
///
/// # Errors
///
/// Returns [`Error::UnsupportedCharset`] when a leaf needs transcoding and
/// either charset is unknown.
pub fn convert(data: CharsetValue, to: &str, from: &str) -> Result<CharsetValue> {
    convert_with(&EncodingRsTranscoder, data, to, from)
}

/// Convert `data` with an explicit transcoder.
///
/// Returns the input untouched, without traversal, when the charsets are
/// equal (ASCII case-insensitive). Leaves without any byte in `0x81..=0xFE`
/// are returned unchanged.
pub fn convert_with(
    transcoder: &dyn Transcoder,
    data: CharsetValue,
    to: &str,
    from: &str,
) -> Result<CharsetValue> {
    if to.eq_ignore_ascii_case(from) {
        return Ok(data);
    }
    walk(transcoder, data, to, from)
}

fn walk(transcoder: &dyn Transcoder, data: CharsetValue, to: &str, from: &str) -> Result<CharsetValue> {
    match data {
        CharsetValue::Bytes(bytes) => {
            if has_high_bytes(&bytes) {
                Ok(CharsetValue::Bytes(transcoder.transcode(&bytes, to, from)?))
            } else {
                Ok(CharsetValue::Bytes(bytes))
            }
        }
        CharsetValue::List(items) => items
            .into_iter()
            .map(|item| walk(transcoder, item, to, from))
            .collect::<Result<Vec<_>>>()
            .map(CharsetValue::List),
        CharsetValue::Map(entries) => entries
            .into_iter()
            .map(|(key, value)| Ok((key, walk(transcoder, value, to, from)?)))
            .collect::<Result<Vec<_>>>()
            .map(CharsetValue::Map),
    }
}

fn has_high_bytes(bytes: &[u8]) -> bool {
    bytes.iter().any(|b| (0x81..=0xfe).contains(b))
}
