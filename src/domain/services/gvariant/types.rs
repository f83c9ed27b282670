//! GVariant type strings
//!
//! Parses the type grammar and answers the two layout questions the framing
//! rules need: alignment and (for fixed-size types) size.

use std::fmt;
use std::sync::Arc;

use super::GVariantError;

/// Deepest type nesting accepted, matching GLib's limit
pub const MAX_DEPTH: usize = 128;

/// A single complete GVariant type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantType {
    Bool,
    Byte,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Handle,
    Double,
    String,
    ObjectPath,
    Signature,
    Variant,
    Array(Arc<VariantType>),
    Maybe(Arc<VariantType>),
    Tuple(Vec<Arc<VariantType>>),
    DictEntry(Arc<VariantType>, Arc<VariantType>),
}

impl VariantType {
    /// Parse a string holding exactly one complete type
    pub fn parse(type_string: &str) -> Result<Arc<Self>, GVariantError> {
        let bytes = type_string.as_bytes();
        let mut pos = 0;
        let ty = parse_one(bytes, &mut pos, 0).map_err(|message| GVariantError::InvalidType {
            type_string: type_string.to_string(),
            message,
        })?;
        if pos != bytes.len() {
            return Err(GVariantError::InvalidType {
                type_string: type_string.to_string(),
                message: format!("trailing characters after position {}", pos),
            });
        }
        Ok(Arc::new(ty))
    }

    /// Alignment in bytes
    pub fn alignment(&self) -> usize {
        match self {
            VariantType::Bool | VariantType::Byte => 1,
            VariantType::Int16 | VariantType::Uint16 => 2,
            VariantType::Int32 | VariantType::Uint32 | VariantType::Handle => 4,
            VariantType::Int64 | VariantType::Uint64 | VariantType::Double => 8,
            VariantType::String | VariantType::ObjectPath | VariantType::Signature => 1,
            VariantType::Variant => 8,
            VariantType::Array(elem) | VariantType::Maybe(elem) => elem.alignment(),
            VariantType::Tuple(items) => items.iter().map(|t| t.alignment()).max().unwrap_or(1),
            VariantType::DictEntry(k, v) => k.alignment().max(v.alignment()),
        }
    }

    /// Serialized size when every value of this type has the same size
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            VariantType::Bool | VariantType::Byte => Some(1),
            VariantType::Int16 | VariantType::Uint16 => Some(2),
            VariantType::Int32 | VariantType::Uint32 | VariantType::Handle => Some(4),
            VariantType::Int64 | VariantType::Uint64 | VariantType::Double => Some(8),
            VariantType::String
            | VariantType::ObjectPath
            | VariantType::Signature
            | VariantType::Variant
            | VariantType::Array(_)
            | VariantType::Maybe(_) => None,
            VariantType::Tuple(items) => tuple_fixed_size(items.iter().map(|t| &**t)),
            VariantType::DictEntry(k, v) => tuple_fixed_size([&**k, &**v]),
        }
    }

    pub fn is_basic(&self) -> bool {
        !matches!(
            self,
            VariantType::Variant
                | VariantType::Array(_)
                | VariantType::Maybe(_)
                | VariantType::Tuple(_)
                | VariantType::DictEntry(_, _)
        )
    }

    /// Member types of a tuple or dict entry
    pub fn members(&self) -> Option<Vec<Arc<VariantType>>> {
        match self {
            VariantType::Tuple(items) => Some(items.clone()),
            VariantType::DictEntry(k, v) => Some(vec![k.clone(), v.clone()]),
            _ => None,
        }
    }
}

fn tuple_fixed_size<'a>(items: impl IntoIterator<Item = &'a VariantType>) -> Option<usize> {
    let mut size = 0;
    let mut alignment = 1;
    let mut empty = true;
    for item in items {
        empty = false;
        let a = item.alignment();
        size = align_up(size, a) + item.fixed_size()?;
        alignment = alignment.max(a);
    }
    if empty {
        // the unit tuple occupies one zero byte
        return Some(1);
    }
    Some(align_up(size, alignment))
}

pub(crate) fn align_up(offset: usize, alignment: usize) -> usize {
    offset.div_ceil(alignment) * alignment
}

fn parse_one(bytes: &[u8], pos: &mut usize, depth: usize) -> Result<VariantType, String> {
    if depth >= MAX_DEPTH {
        return Err("type nested too deeply".to_string());
    }
    let Some(&c) = bytes.get(*pos) else {
        return Err("unexpected end of type string".to_string());
    };
    *pos += 1;
    let ty = match c {
        b'b' => VariantType::Bool,
        b'y' => VariantType::Byte,
        b'n' => VariantType::Int16,
        b'q' => VariantType::Uint16,
        b'i' => VariantType::Int32,
        b'u' => VariantType::Uint32,
        b'x' => VariantType::Int64,
        b't' => VariantType::Uint64,
        b'h' => VariantType::Handle,
        b'd' => VariantType::Double,
        b's' => VariantType::String,
        b'o' => VariantType::ObjectPath,
        b'g' => VariantType::Signature,
        b'v' => VariantType::Variant,
        b'a' => VariantType::Array(Arc::new(parse_one(bytes, pos, depth + 1)?)),
        b'm' => VariantType::Maybe(Arc::new(parse_one(bytes, pos, depth + 1)?)),
        b'(' => {
            let mut items = Vec::new();
            loop {
                match bytes.get(*pos) {
                    Some(b')') => {
                        *pos += 1;
                        break;
                    }
                    Some(_) => items.push(Arc::new(parse_one(bytes, pos, depth + 1)?)),
                    None => return Err("unterminated tuple".to_string()),
                }
            }
            VariantType::Tuple(items)
        }
        b'{' => {
            let key = parse_one(bytes, pos, depth + 1)?;
            if !key.is_basic() {
                return Err("dict entry key must be a basic type".to_string());
            }
            let value = parse_one(bytes, pos, depth + 1)?;
            if bytes.get(*pos) != Some(&b'}') {
                return Err("unterminated dict entry".to_string());
            }
            *pos += 1;
            VariantType::DictEntry(Arc::new(key), Arc::new(value))
        }
        other => return Err(format!("unknown type character '{}'", other as char)),
    };
    Ok(ty)
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantType::Bool => f.write_str("b"),
            VariantType::Byte => f.write_str("y"),
            VariantType::Int16 => f.write_str("n"),
            VariantType::Uint16 => f.write_str("q"),
            VariantType::Int32 => f.write_str("i"),
            VariantType::Uint32 => f.write_str("u"),
            VariantType::Int64 => f.write_str("x"),
            VariantType::Uint64 => f.write_str("t"),
            VariantType::Handle => f.write_str("h"),
            VariantType::Double => f.write_str("d"),
            VariantType::String => f.write_str("s"),
            VariantType::ObjectPath => f.write_str("o"),
            VariantType::Signature => f.write_str("g"),
            VariantType::Variant => f.write_str("v"),
            VariantType::Array(elem) => write!(f, "a{}", elem),
            VariantType::Maybe(elem) => write!(f, "m{}", elem),
            VariantType::Tuple(items) => {
                f.write_str("(")?;
                for item in items {
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            VariantType::DictEntry(k, v) => write!(f, "{{{}{}}}", k, v),
        }
    }
}
