//! GVariant writer
//!
//! Produces normal-form serialized data. Used to build commit and superblock
//! fixtures and by anything that needs to hand GVariant data to the store.

use std::sync::Arc;

use super::offset_size;
use super::types::{align_up, VariantType};

/// An owned GVariant value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Double(f64),
    Str(String),
    ObjectPath(String),
    Signature(String),
    Variant(Box<Value>),
    /// Element type is explicit so empty arrays still have a type
    Array(Arc<VariantType>, Vec<Value>),
    Maybe(Arc<VariantType>, Option<Box<Value>>),
    Tuple(Vec<Value>),
    DictEntry(Box<Value>, Box<Value>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// An `ay`
    pub fn bytes(bytes: &[u8]) -> Self {
        Value::Array(
            Arc::new(VariantType::Byte),
            bytes.iter().copied().map(Value::Byte).collect(),
        )
    }

    /// An `a{sv}` from key/value pairs
    pub fn vardict(entries: Vec<(&str, Value)>) -> Self {
        let entry_ty = Arc::new(VariantType::DictEntry(
            Arc::new(VariantType::String),
            Arc::new(VariantType::Variant),
        ));
        Value::Array(
            entry_ty,
            entries
                .into_iter()
                .map(|(k, v)| {
                    Value::DictEntry(Box::new(Value::str(k)), Box::new(Value::Variant(Box::new(v))))
                })
                .collect(),
        )
    }

    /// An empty array of `elem`
    pub fn empty_array(elem: &str) -> Self {
        let ty = VariantType::parse(elem).unwrap_or_else(|_| Arc::new(VariantType::Byte));
        Value::Array(ty, Vec::new())
    }

    pub fn type_of(&self) -> VariantType {
        match self {
            Value::Bool(_) => VariantType::Bool,
            Value::Byte(_) => VariantType::Byte,
            Value::Int16(_) => VariantType::Int16,
            Value::Uint16(_) => VariantType::Uint16,
            Value::Int32(_) => VariantType::Int32,
            Value::Uint32(_) => VariantType::Uint32,
            Value::Int64(_) => VariantType::Int64,
            Value::Uint64(_) => VariantType::Uint64,
            Value::Double(_) => VariantType::Double,
            Value::Str(_) => VariantType::String,
            Value::ObjectPath(_) => VariantType::ObjectPath,
            Value::Signature(_) => VariantType::Signature,
            Value::Variant(_) => VariantType::Variant,
            Value::Array(elem, _) => VariantType::Array(elem.clone()),
            Value::Maybe(elem, _) => VariantType::Maybe(elem.clone()),
            Value::Tuple(items) => {
                VariantType::Tuple(items.iter().map(|v| Arc::new(v.type_of())).collect())
            }
            Value::DictEntry(k, v) => {
                VariantType::DictEntry(Arc::new(k.type_of()), Arc::new(v.type_of()))
            }
        }
    }

    /// Serialize in normal form
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Bool(b) => vec![*b as u8],
            Value::Byte(b) => vec![*b],
            Value::Int16(v) => v.to_le_bytes().to_vec(),
            Value::Uint16(v) => v.to_le_bytes().to_vec(),
            Value::Int32(v) => v.to_le_bytes().to_vec(),
            Value::Uint32(v) => v.to_le_bytes().to_vec(),
            Value::Int64(v) => v.to_le_bytes().to_vec(),
            Value::Uint64(v) => v.to_le_bytes().to_vec(),
            Value::Double(v) => v.to_le_bytes().to_vec(),
            Value::Str(s) | Value::ObjectPath(s) | Value::Signature(s) => {
                let mut out = s.as_bytes().to_vec();
                out.push(0);
                out
            }
            Value::Variant(inner) => {
                let mut out = inner.to_bytes();
                out.push(0);
                out.extend_from_slice(inner.type_of().to_string().as_bytes());
                out
            }
            Value::Array(elem, items) => encode_array(elem, items),
            Value::Maybe(elem, item) => match item {
                None => Vec::new(),
                Some(v) => {
                    let mut out = v.to_bytes();
                    if elem.fixed_size().is_none() {
                        out.push(0);
                    }
                    out
                }
            },
            Value::Tuple(items) => encode_tuple(&self.type_of(), items.iter()),
            Value::DictEntry(k, v) => encode_tuple(&self.type_of(), [&**k, &**v].into_iter()),
        }
    }
}

fn encode_array(elem: &VariantType, items: &[Value]) -> Vec<u8> {
    let mut body = Vec::new();
    if elem.fixed_size().is_some() {
        for item in items {
            body.extend(item.to_bytes());
        }
        return body;
    }
    let mut ends = Vec::with_capacity(items.len());
    for item in items {
        pad_to(&mut body, elem.alignment());
        body.extend(item.to_bytes());
        ends.push(body.len());
    }
    append_offsets(body, &ends)
}

fn encode_tuple<'v>(ty: &VariantType, items: impl Iterator<Item = &'v Value>) -> Vec<u8> {
    let items: Vec<&Value> = items.collect();
    let mut body = Vec::new();
    let mut ends = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let item_ty = item.type_of();
        pad_to(&mut body, item_ty.alignment());
        body.extend(item.to_bytes());
        if item_ty.fixed_size().is_none() && i + 1 != items.len() {
            ends.push(body.len());
        }
    }
    if let Some(size) = ty.fixed_size() {
        body.resize(size, 0);
        return body;
    }
    ends.reverse();
    append_offsets(body, &ends)
}

fn pad_to(buf: &mut Vec<u8>, alignment: usize) {
    let target = align_up(buf.len(), alignment);
    buf.resize(target, 0);
}

fn append_offsets(mut body: Vec<u8>, offsets: &[usize]) -> Vec<u8> {
    if offsets.is_empty() {
        return body;
    }
    let osz = [1usize, 2, 4, 8]
        .into_iter()
        .find(|&osz| offset_size(body.len() + offsets.len() * osz) <= osz)
        .unwrap_or(8);
    for &offset in offsets {
        body.extend_from_slice(&(offset as u64).to_le_bytes()[..osz]);
    }
    body
}
