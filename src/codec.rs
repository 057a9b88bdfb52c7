//! Binary VDF codec for `shortcuts.vdf`.
//!
//! Grammar (all integers little-endian):
//!
//! ```text
//! object := entry* TAG_END
//! entry  := TAG_OBJECT key object
//!         | TAG_STRING key cstr
//!         | TAG_INT32  key u32
//! key    := cstr
//! cstr   := byte* 0x00
//! ```
//!
//! The root is a bare `object` with no leading tag or key. Decoding and encoding
//! never reinterpret integer bits; see [`crate::IntView`] for display.

use crate::value::{PropertyMap, PropertyValue};
use byteorder::{LittleEndian, ReadBytesExt};
use indexmap::IndexMap;
use std::io::Cursor;
use thiserror::Error;
use tracing::warn;

pub const TAG_OBJECT: u8 = 0x00;
pub const TAG_STRING: u8 = 0x01;
pub const TAG_INT32: u8 = 0x02;
pub const TAG_END: u8 = 0x08;

/// Nesting limit for decode. Real files nest three levels deep (root/shortcuts/entry/tags).
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("stream ended at byte {offset} while reading {context}")]
    TruncatedStream { offset: usize, context: &'static str },
    #[error("unknown type tag 0x{tag:02x} at byte {offset}")]
    MalformedTag { tag: u8, offset: usize },
    #[error("objects nested deeper than {max} levels at byte {offset}", max = MAX_DEPTH)]
    TooDeep { offset: usize },
    #[error("root value must be an object")]
    RootNotObject,
    #[error("key {key:?} contains a NUL byte")]
    NulInKey { key: String },
    #[error("text value of {key:?} contains a NUL byte")]
    NulInText { key: String },
}

/// Non-fatal observations made while decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Bytes up to and including the root terminator.
    pub consumed: usize,
    /// Bytes after the root terminator. Dropped on re-encode.
    pub trailing_bytes: usize,
    /// Keys that were not valid UTF-8 and were decoded lossily.
    pub lossy_keys: usize,
}

pub fn decode(bytes: &[u8]) -> Result<PropertyValue, CodecError> {
    decode_with_report(bytes).map(|(root, _)| root)
}

pub fn decode_with_report(bytes: &[u8]) -> Result<(PropertyValue, DecodeReport), CodecError> {
    let mut decoder = Decoder {
        cursor: Cursor::new(bytes),
        lossy_keys: 0,
    };
    let root = decoder.read_object(0)?;

    let consumed = decoder.offset();
    let report = DecodeReport {
        consumed,
        trailing_bytes: bytes.len() - consumed,
        lossy_keys: decoder.lossy_keys,
    };
    if report.trailing_bytes > 0 {
        warn!(
            offset = consumed,
            trailing = report.trailing_bytes,
            "ignoring bytes after root terminator"
        );
    }
    Ok((PropertyValue::Object(root), report))
}

struct Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
    lossy_keys: usize,
}

impl<'a> Decoder<'a> {
    fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    fn read_object(&mut self, depth: usize) -> Result<PropertyMap, CodecError> {
        if depth > MAX_DEPTH {
            return Err(CodecError::TooDeep {
                offset: self.offset(),
            });
        }

        let mut map = IndexMap::new();
        loop {
            let tag_offset = self.offset();
            let tag = self.read_u8("type tag")?;
            let (key, value) = match tag {
                TAG_END => return Ok(map),
                TAG_OBJECT => {
                    let key = self.read_key()?;
                    (key, PropertyValue::Object(self.read_object(depth + 1)?))
                }
                TAG_STRING => {
                    let key = self.read_key()?;
                    (key, PropertyValue::Text(self.read_cstr("string value")?.to_vec()))
                }
                TAG_INT32 => {
                    let key = self.read_key()?;
                    (key, PropertyValue::Integer(self.read_u32()?))
                }
                tag => {
                    return Err(CodecError::MalformedTag {
                        tag,
                        offset: tag_offset,
                    });
                }
            };
            map.insert(key, value);
        }
    }

    fn read_u8(&mut self, context: &'static str) -> Result<u8, CodecError> {
        let offset = self.offset();
        self.cursor
            .read_u8()
            .map_err(|_| CodecError::TruncatedStream { offset, context })
    }

    fn read_u32(&mut self) -> Result<u32, CodecError> {
        let offset = self.offset();
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| CodecError::TruncatedStream {
                offset,
                context: "int32 value",
            })
    }

    /// Read up to the next NUL, consuming the NUL but not returning it.
    fn read_cstr(&mut self, context: &'static str) -> Result<&'a [u8], CodecError> {
        let bytes: &'a [u8] = *self.cursor.get_ref();
        let start = self.offset().min(bytes.len());
        let Some(len) = bytes[start..].iter().position(|&b| b == 0) else {
            return Err(CodecError::TruncatedStream {
                offset: bytes.len(),
                context,
            });
        };
        self.cursor.set_position((start + len + 1) as u64);
        Ok(&bytes[start..start + len])
    }

    fn read_key(&mut self) -> Result<String, CodecError> {
        let offset = self.offset();
        let raw = self.read_cstr("key")?;
        match std::str::from_utf8(raw) {
            Ok(key) => Ok(key.to_owned()),
            Err(_) => {
                warn!(offset, "key is not valid UTF-8; decoding lossily");
                self.lossy_keys += 1;
                Ok(String::from_utf8_lossy(raw).into_owned())
            }
        }
    }
}

/// Encode a tree whose root is an `Object`.
///
/// Only fails for trees that cannot be written in NUL-terminated form.
pub fn encode(root: &PropertyValue) -> Result<Vec<u8>, CodecError> {
    let PropertyValue::Object(map) = root else {
        return Err(CodecError::RootNotObject);
    };
    let mut out = Vec::new();
    write_object(&mut out, map)?;
    Ok(out)
}

fn write_object(out: &mut Vec<u8>, map: &PropertyMap) -> Result<(), CodecError> {
    for (key, value) in map {
        if key.as_bytes().contains(&0) {
            return Err(CodecError::NulInKey { key: key.clone() });
        }
        let tag = match value {
            PropertyValue::Object(_) => TAG_OBJECT,
            PropertyValue::Text(_) => TAG_STRING,
            PropertyValue::Integer(_) => TAG_INT32,
        };
        out.push(tag);
        write_cstr(out, key.as_bytes());
        match value {
            PropertyValue::Object(nested) => write_object(out, nested)?,
            PropertyValue::Text(bytes) => {
                if bytes.contains(&0) {
                    return Err(CodecError::NulInText { key: key.clone() });
                }
                write_cstr(out, bytes);
            }
            PropertyValue::Integer(raw) => out.extend_from_slice(&raw.to_le_bytes()),
        }
    }
    out.push(TAG_END);
    Ok(())
}

fn write_cstr(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(bytes);
    out.push(0);
}
