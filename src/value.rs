use crate::statics;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, de};
use std::borrow::Cow;

/// Ordered field map. Insertion order is the on-disk order and the display order.
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// How the raw bits of an `Integer` leaf are shown to (and read back from) a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntView {
    /// Two's-complement i32. Suits arithmetic fields (timestamps, flags).
    Signed,
    /// Plain u32. Suits bit-packed identifiers such as generated icon handles.
    #[default]
    Unsigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Object,
}

impl ValueKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Text => statics::EN_TYPE_TEXT,
            ValueKind::Integer => statics::EN_TYPE_INTEGER,
            ValueKind::Object => statics::EN_TYPE_OBJECT,
        }
    }
}

/// A node of the binary VDF property tree.
///
/// `Text` keeps the exact bytes read from disk; decoding to UTF-8 only happens for display.
/// `Integer` keeps the exact 4-byte bit pattern; signed/unsigned is a view, see [`IntView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Text(Vec<u8>),
    Integer(u32),
    Object(PropertyMap),
}

impl PropertyValue {
    pub fn text(s: impl Into<String>) -> Self {
        PropertyValue::Text(s.into().into_bytes())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::Text(_) => ValueKind::Text,
            PropertyValue::Integer(_) => ValueKind::Integer,
            PropertyValue::Object(_) => ValueKind::Object,
        }
    }

    pub fn as_object(&self) -> Option<&PropertyMap> {
        match self {
            PropertyValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut PropertyMap> {
        match self {
            PropertyValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_text_bytes(&self) -> Option<&[u8]> {
        match self {
            PropertyValue::Text(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Lossy UTF-8 view of a `Text` leaf. Malformed sequences become U+FFFD.
    pub fn as_str_lossy(&self) -> Option<Cow<'_, str>> {
        self.as_text_bytes().map(String::from_utf8_lossy)
    }

    pub fn as_unsigned(&self) -> Option<u32> {
        match self {
            PropertyValue::Integer(raw) => Some(*raw),
            _ => None,
        }
    }

    pub fn as_signed(&self) -> Option<i32> {
        self.as_unsigned().map(|raw| raw as i32)
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.as_object().and_then(|m| m.get(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PropertyValue> {
        self.as_object_mut().and_then(|m| m.get_mut(key))
    }

    /// Text shown in an edit box for this value.
    /// Leaves render on one line; objects render as pretty structured text.
    pub fn display_text(&self, view: IntView) -> String {
        match self {
            PropertyValue::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            PropertyValue::Integer(raw) => int_to_text(*raw, view),
            PropertyValue::Object(_) => self.to_structured_text(view),
        }
    }

    /// Render as JSON with 2-space indentation. Integers use `view`.
    pub fn to_structured_text(&self, view: IntView) -> String {
        let mut out = String::new();
        self.write_structured(&mut out, 0, view);
        out
    }

    /// Parse the structured text form back into an `Object`.
    /// Anything that is not an object of strings, in-range integers and nested objects is rejected.
    pub fn parse_structured_text(text: &str) -> anyhow::Result<PropertyValue> {
        let value = json5::from_str::<PropertyValue>(text)?;
        if value.kind() != ValueKind::Object {
            anyhow::bail!("expected an object, found {}", value.kind().type_name());
        }
        Ok(value)
    }

    fn write_structured(&self, out: &mut String, indent: usize, view: IntView) {
        match self {
            PropertyValue::Text(bytes) => write_escaped_string(out, &String::from_utf8_lossy(bytes)),
            PropertyValue::Integer(raw) => out.push_str(&int_to_text(*raw, view)),
            PropertyValue::Object(map) => {
                out.push('{');
                if map.is_empty() {
                    out.push('}');
                    return;
                }
                out.push('\n');
                for (i, (k, v)) in map.iter().enumerate() {
                    out.push_str(&" ".repeat(indent + 2));
                    write_escaped_string(out, k);
                    out.push_str(": ");
                    v.write_structured(out, indent + 2, view);
                    if i + 1 != map.len() {
                        out.push(',');
                    }
                    out.push('\n');
                }
                out.push_str(&" ".repeat(indent));
                out.push('}');
            }
        }
    }
}

pub fn int_to_text(raw: u32, view: IntView) -> String {
    match view {
        IntView::Signed => (raw as i32).to_string(),
        IntView::Unsigned => raw.to_string(),
    }
}

/// Inverse of [`int_to_text`] for either view.
///
/// Accepts any decimal in `i32::MIN..=u32::MAX`. The two views only overlap on
/// `0..=i32::MAX`, where they agree, so the bit pattern is unambiguous.
pub fn int_from_text(text: &str) -> Option<u32> {
    let n: i64 = text.trim().parse().ok()?;
    int_from_i64(n)
}

fn int_from_i64(n: i64) -> Option<u32> {
    if n < 0 {
        i32::try_from(n).ok().map(|v| v as u32)
    } else {
        u32::try_from(n).ok()
    }
}

fn write_escaped_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write as _;
                write!(out, "\\u{:04x}", c as u32).ok();
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> de::Visitor<'de> for ValueVisitor {
            type Value = PropertyValue;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a string, a 32-bit integer or an object")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                int_from_i64(v)
                    .map(PropertyValue::Integer)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                u32::try_from(v)
                    .map(PropertyValue::Integer)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(PropertyValue::text(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(PropertyValue::Text(v.into_bytes()))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut values = IndexMap::new();
                while let Some((key, value)) = map.next_entry::<String, PropertyValue>()? {
                    values.insert(key, value);
                }
                Ok(PropertyValue::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
