//! GVariant reader
//!
//! Zero-copy access to data serialized in the GVariant format, which is what
//! the content-addressed store uses for commits and delta superblocks.
//!
//! Unlike GLib, this reader is strict: data that is not in normal form is an
//! error, never silently replaced by a default value. Nothing read from a
//! package is trusted until its framing has been checked.
//!
//! ## Framing rules
//!
//! - Fixed-size values occupy exactly their size, little-endian
//! - Strings end in a single NUL
//! - Variable-size arrays end in a table of element end offsets
//! - Tuples store end offsets of variable-size members (except the last)
//!   at their end, in reverse order
//! - Offsets are 1, 2, 4 or 8 bytes wide depending on the container size
//! - A variant is its child followed by a NUL and the child's type string

mod encode;
mod types;

use std::sync::Arc;

pub use encode::Value;
pub use types::{VariantType, MAX_DEPTH};

use types::align_up;

/// Decoding failures
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum GVariantError {
    #[error("invalid type string '{type_string}': {message}")]
    InvalidType {
        type_string: String,
        message: String,
    },

    #[error("expected type '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    #[error("value of type '{type_string}' must be {expected} bytes, got {actual}")]
    SizeMismatch {
        type_string: String,
        expected: usize,
        actual: usize,
    },

    #[error("framing offset {offset} out of bounds for container of {len} bytes")]
    BadOffset { offset: usize, len: usize },

    #[error("invalid string: {message}")]
    BadString { message: String },

    #[error("invalid boolean byte {0:#04x}")]
    BadBool(u8),

    #[error("variant has no type separator")]
    BadVariant,

    #[error("child index {index} out of range ({len} children)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("value nested deeper than {0} levels")]
    TooDeep(usize),
}

type Result<T> = std::result::Result<T, GVariantError>;

/// A typed view into serialized GVariant data
#[derive(Debug, Clone)]
pub struct Variant<'a> {
    ty: Arc<VariantType>,
    data: &'a [u8],
}

impl<'a> Variant<'a> {
    /// View `data` as a value of `ty`. No validation happens yet.
    pub fn new(ty: Arc<VariantType>, data: &'a [u8]) -> Self {
        Self { ty, data }
    }

    /// Parse `type_string` and view `data` as a value of that type
    pub fn from_type_str(type_string: &str, data: &'a [u8]) -> Result<Self> {
        Ok(Self::new(VariantType::parse(type_string)?, data))
    }

    pub fn ty(&self) -> &VariantType {
        &self.ty
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Walk the whole value and check every framing rule
    pub fn validate(&self) -> Result<()> {
        self.validate_at(0)
    }

    fn validate_at(&self, depth: usize) -> Result<()> {
        if depth >= MAX_DEPTH {
            return Err(GVariantError::TooDeep(MAX_DEPTH));
        }
        match &*self.ty {
            VariantType::Bool => self.as_bool().map(drop),
            VariantType::String | VariantType::ObjectPath | VariantType::Signature => {
                self.as_str().map(drop)
            }
            VariantType::Variant => self.variant_inner()?.validate_at(depth + 1),
            ty if ty.is_basic() => self.fixed_bytes().map(drop),
            VariantType::Array(elem) if **elem == VariantType::Byte => Ok(()),
            _ => {
                for child in self.children()? {
                    child.validate_at(depth + 1)?;
                }
                Ok(())
            }
        }
    }

    fn mismatch(&self, expected: &str) -> GVariantError {
        GVariantError::TypeMismatch {
            expected: expected.to_string(),
            found: self.ty.to_string(),
        }
    }

    fn fixed_bytes(&self) -> Result<&'a [u8]> {
        let size = self.ty.fixed_size().ok_or_else(|| self.mismatch("fixed-size"))?;
        if self.data.len() != size {
            return Err(GVariantError::SizeMismatch {
                type_string: self.ty.to_string(),
                expected: size,
                actual: self.data.len(),
            });
        }
        Ok(self.data)
    }

    fn expect_type(&self, expected: VariantType) -> Result<[u8; 8]> {
        if *self.ty != expected {
            return Err(self.mismatch(&expected.to_string()));
        }
        let bytes = self.fixed_bytes()?;
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(buf)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self.expect_type(VariantType::Bool)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(GVariantError::BadBool(other)),
        }
    }

    pub fn as_u8(&self) -> Result<u8> {
        Ok(self.expect_type(VariantType::Byte)?[0])
    }

    pub fn as_u32(&self) -> Result<u32> {
        let b = self.expect_type(VariantType::Uint32)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn as_i32(&self) -> Result<i32> {
        let b = self.expect_type(VariantType::Int32)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn as_u64(&self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.expect_type(VariantType::Uint64)?))
    }

    pub fn as_i64(&self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.expect_type(VariantType::Int64)?))
    }

    /// The raw eight bytes of a `t`, for fields stored big-endian on purpose
    pub fn as_u64_raw(&self) -> Result<[u8; 8]> {
        self.expect_type(VariantType::Uint64)
    }

    /// Contents of `s`, `o` or `g`
    pub fn as_str(&self) -> Result<&'a str> {
        if !matches!(
            &*self.ty,
            VariantType::String | VariantType::ObjectPath | VariantType::Signature
        ) {
            return Err(self.mismatch("s"));
        }
        let Some((&0, body)) = self.data.split_last() else {
            return Err(GVariantError::BadString {
                message: "missing NUL terminator".to_string(),
            });
        };
        if body.contains(&0) {
            return Err(GVariantError::BadString {
                message: "embedded NUL".to_string(),
            });
        }
        std::str::from_utf8(body).map_err(|e| GVariantError::BadString {
            message: e.to_string(),
        })
    }

    /// Contents of an `ay`
    pub fn as_bytes(&self) -> Result<&'a [u8]> {
        match &*self.ty {
            VariantType::Array(elem) if **elem == VariantType::Byte => Ok(self.data),
            _ => Err(self.mismatch("ay")),
        }
    }

    /// Child of a `v`
    pub fn variant_inner(&self) -> Result<Variant<'a>> {
        if *self.ty != VariantType::Variant {
            return Err(self.mismatch("v"));
        }
        let sep = self
            .data
            .iter()
            .rposition(|&b| b == 0)
            .ok_or(GVariantError::BadVariant)?;
        let type_string =
            std::str::from_utf8(&self.data[sep + 1..]).map_err(|_| GVariantError::BadVariant)?;
        let ty = VariantType::parse(type_string)?;
        Ok(Variant::new(ty, &self.data[..sep]))
    }

    /// Number of children of an array, maybe, tuple, dict entry or variant
    pub fn n_children(&self) -> Result<usize> {
        match &*self.ty {
            VariantType::Variant => Ok(1),
            VariantType::Array(elem) => Ok(array_frames(elem, self.data)?.len()),
            VariantType::Maybe(elem) => Ok(maybe_frame(elem, self.data)?.is_some() as usize),
            VariantType::Tuple(items) => Ok(items.len()),
            VariantType::DictEntry(_, _) => Ok(2),
            _ => Err(self.mismatch("container")),
        }
    }

    /// The `index`th child
    pub fn child(&self, index: usize) -> Result<Variant<'a>> {
        let children = self.children()?;
        let len = children.len();
        children
            .into_iter()
            .nth(index)
            .ok_or(GVariantError::IndexOutOfRange { index, len })
    }

    /// All children, in order
    pub fn children(&self) -> Result<Vec<Variant<'a>>> {
        let data = self.data;
        match &*self.ty {
            VariantType::Variant => Ok(vec![self.variant_inner()?]),
            VariantType::Array(elem) => Ok(array_frames(elem, data)?
                .into_iter()
                .map(|(start, end)| Variant::new(elem.clone(), &data[start..end]))
                .collect()),
            VariantType::Maybe(_) => Ok(self.maybe()?.into_iter().collect()),
            VariantType::Tuple(_) | VariantType::DictEntry(_, _) => {
                let members = self.ty.members().unwrap_or_default();
                let frames = tuple_frames(&members, data, &self.ty)?;
                Ok(members
                    .into_iter()
                    .zip(frames)
                    .map(|(ty, (start, end))| Variant::new(ty, &data[start..end]))
                    .collect())
            }
            _ => Err(self.mismatch("container")),
        }
    }

    /// Value of `Just x`, or `None` for `Nothing`
    pub fn maybe(&self) -> Result<Option<Variant<'a>>> {
        match &*self.ty {
            VariantType::Maybe(elem) => Ok(maybe_frame(elem, self.data)?
                .map(|(start, end)| Variant::new(elem.clone(), &self.data[start..end]))),
            _ => Err(self.mismatch("m")),
        }
    }

    /// Look up a key in an `a{s*}` dictionary
    pub fn lookup(&self, key: &str) -> Result<Option<Variant<'a>>> {
        let string_keyed = match &*self.ty {
            VariantType::Array(elem) => {
                matches!(&**elem, VariantType::DictEntry(k, _) if **k == VariantType::String)
            }
            _ => false,
        };
        if !string_keyed {
            return Err(self.mismatch("a{s*}"));
        }
        for entry in self.children()? {
            if entry.child(0)?.as_str()? == key {
                return entry.child(1).map(Some);
            }
        }
        Ok(None)
    }
}

/// Width of framing offsets for a container of `len` bytes
pub fn offset_size(len: usize) -> usize {
    match len {
        0 => 0,
        1..=0xff => 1,
        0x100..=0xffff => 2,
        0x1_0000..=0xffff_ffff => 4,
        _ => 8,
    }
}

fn read_offset(data: &[u8], at: usize, size: usize) -> Result<usize> {
    let bytes = data.get(at..at + size).ok_or(GVariantError::BadOffset {
        offset: at,
        len: data.len(),
    })?;
    let mut buf = [0u8; 8];
    buf[..size].copy_from_slice(bytes);
    let value = u64::from_le_bytes(buf);
    usize::try_from(value).map_err(|_| GVariantError::BadOffset {
        offset: usize::MAX,
        len: data.len(),
    })
}

fn array_frames(elem: &VariantType, data: &[u8]) -> Result<Vec<(usize, usize)>> {
    if let Some(size) = elem.fixed_size() {
        if data.len() % size != 0 {
            return Err(GVariantError::SizeMismatch {
                type_string: format!("a{}", elem),
                expected: align_up(data.len(), size),
                actual: data.len(),
            });
        }
        return Ok((0..data.len() / size)
            .map(|i| (i * size, (i + 1) * size))
            .collect());
    }

    if data.is_empty() {
        return Ok(Vec::new());
    }
    let osz = offset_size(data.len());
    let table_start = read_offset(data, data.len() - osz, osz)?;
    if table_start > data.len() || (data.len() - table_start) % osz != 0 {
        return Err(GVariantError::BadOffset {
            offset: table_start,
            len: data.len(),
        });
    }
    let count = (data.len() - table_start) / osz;
    if count == 0 {
        return Err(GVariantError::BadOffset {
            offset: table_start,
            len: data.len(),
        });
    }
    let alignment = elem.alignment();
    let mut frames = Vec::with_capacity(count);
    let mut prev_end = 0;
    for i in 0..count {
        let end = read_offset(data, table_start + i * osz, osz)?;
        let start = align_up(prev_end, alignment);
        if start > end || end > table_start {
            return Err(GVariantError::BadOffset {
                offset: end,
                len: data.len(),
            });
        }
        frames.push((start, end));
        prev_end = end;
    }
    Ok(frames)
}

fn maybe_frame(elem: &VariantType, data: &[u8]) -> Result<Option<(usize, usize)>> {
    if data.is_empty() {
        return Ok(None);
    }
    match elem.fixed_size() {
        Some(size) if data.len() == size => Ok(Some((0, size))),
        Some(size) => Err(GVariantError::SizeMismatch {
            type_string: format!("m{}", elem),
            expected: size,
            actual: data.len(),
        }),
        None => match data.last() {
            Some(0) => Ok(Some((0, data.len() - 1))),
            _ => Err(GVariantError::BadOffset {
                offset: data.len(),
                len: data.len(),
            }),
        },
    }
}

fn tuple_frames(
    members: &[Arc<VariantType>],
    data: &[u8],
    tuple_ty: &VariantType,
) -> Result<Vec<(usize, usize)>> {
    if let Some(size) = tuple_ty.fixed_size() {
        if data.len() != size {
            return Err(GVariantError::SizeMismatch {
                type_string: tuple_ty.to_string(),
                expected: size,
                actual: data.len(),
            });
        }
    }

    let osz = offset_size(data.len());
    let mut offsets_start = data.len();
    let mut pos = 0;
    let mut frames = Vec::with_capacity(members.len());
    for (i, member) in members.iter().enumerate() {
        let start = align_up(pos, member.alignment());
        let end = match member.fixed_size() {
            Some(size) => start + size,
            None if i + 1 == members.len() => offsets_start,
            None => {
                if osz == 0 || offsets_start < osz {
                    return Err(GVariantError::BadOffset {
                        offset: offsets_start,
                        len: data.len(),
                    });
                }
                offsets_start -= osz;
                read_offset(data, offsets_start, osz)?
            }
        };
        if start > end || end > offsets_start {
            return Err(GVariantError::BadOffset {
                offset: end,
                len: data.len(),
            });
        }
        frames.push((start, end));
        pos = end;
    }

    if tuple_ty.fixed_size().is_none() && pos != offsets_start {
        return Err(GVariantError::SizeMismatch {
            type_string: tuple_ty.to_string(),
            expected: pos,
            actual: offsets_start,
        });
    }
    Ok(frames)
}
