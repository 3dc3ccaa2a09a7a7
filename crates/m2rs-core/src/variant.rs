//! Variant value model shared by the TNetstring and JSON codecs.
//!
//! A `Variant` is a closed tagged union. Compound values own their children,
//! so dropping a dict or list tears down the whole subtree exactly once.
//! Typed accessors return `None` on a tag mismatch and never coerce.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::error::{M2Error, Result};

/// Dict payload. Keys are raw byte strings; a later insert replaces the earlier value.
pub type Dict = BTreeMap<Bytes, Variant>;

/// Wire tag of a value, as written after a TNetstring payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    String,
    Integer,
    Float,
    Boolean,
    Null,
    Dict,
    List,
}

impl Tag {
    /// The TNetstring tag byte.
    pub fn as_byte(self) -> u8 {
        match self {
            Tag::String => b',',
            Tag::Integer => b'#',
            Tag::Float => b'^',
            Tag::Boolean => b'!',
            Tag::Null => b'~',
            Tag::Dict => b'}',
            Tag::List => b']',
        }
    }

    /// Resolve a TNetstring tag byte. Unknown bytes yield `None`.
    pub fn from_byte(b: u8) -> Option<Tag> {
        match b {
            b',' => Some(Tag::String),
            b'#' => Some(Tag::Integer),
            b'^' => Some(Tag::Float),
            b'!' => Some(Tag::Boolean),
            b'~' => Some(Tag::Null),
            b'}' => Some(Tag::Dict),
            b']' => Some(Tag::List),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tag::String => "string",
            Tag::Integer => "integer",
            Tag::Float => "float",
            Tag::Boolean => "boolean",
            Tag::Null => "null",
            Tag::Dict => "dict",
            Tag::List => "list",
        }
    }
}

/// Decoded value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    /// Raw bytes, not required to be UTF-8.
    String(Bytes),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    Dict(Dict),
    List(Vec<Variant>),
}

impl Variant {
    /// Construct an empty value of the given kind.
    pub fn new(tag: Tag) -> Self {
        match tag {
            Tag::String => Variant::String(Bytes::new()),
            Tag::Integer => Variant::Integer(0),
            Tag::Float => Variant::Float(0.0),
            Tag::Boolean => Variant::Boolean(false),
            Tag::Null => Variant::Null,
            Tag::Dict => Variant::Dict(Dict::new()),
            Tag::List => Variant::List(Vec::new()),
        }
    }

    pub fn tag(&self) -> Tag {
        match self {
            Variant::String(_) => Tag::String,
            Variant::Integer(_) => Tag::Integer,
            Variant::Float(_) => Tag::Float,
            Variant::Boolean(_) => Tag::Boolean,
            Variant::Null => Tag::Null,
            Variant::Dict(_) => Tag::Dict,
            Variant::List(_) => Tag::List,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Variant::String(b) => Some(b.as_ref()),
            _ => None,
        }
    }

    /// String payload as UTF-8 text. `None` if not a string or not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Variant::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Variant::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Null)
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Variant::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Variant]> {
        match self {
            Variant::List(l) => Some(l.as_slice()),
            _ => None,
        }
    }

    /// Insert `value` under `key`, taking ownership of both.
    ///
    /// An existing entry for `key` is replaced and its value dropped.
    pub fn dict_set(&mut self, key: impl Into<Bytes>, value: Variant) -> Result<()> {
        match self {
            Variant::Dict(d) => {
                // replaced value (if any) drops here
                d.insert(key.into(), value);
                Ok(())
            }
            other => Err(mismatch(Tag::Dict, other)),
        }
    }

    /// Look up `key`. `None` if this is not a dict or the key is missing.
    pub fn dict_get(&self, key: &[u8]) -> Option<&Variant> {
        self.as_dict().and_then(|d| d.get(key))
    }

    /// Look up `key` and return it as UTF-8 text.
    pub fn dict_get_str(&self, key: &[u8]) -> Option<&str> {
        self.dict_get(key).and_then(Variant::as_str)
    }

    pub fn list_append(&mut self, item: Variant) -> Result<()> {
        match self {
            Variant::List(l) => {
                l.push(item);
                Ok(())
            }
            other => Err(mismatch(Tag::List, other)),
        }
    }

    /// Nesting depth: scalars and empty compounds are 1.
    pub fn depth(&self) -> usize {
        match self {
            Variant::Dict(d) => 1 + d.values().map(Variant::depth).max().unwrap_or(0),
            Variant::List(l) => 1 + l.iter().map(Variant::depth).max().unwrap_or(0),
            _ => 1,
        }
    }
}

fn mismatch(expected: Tag, found: &Variant) -> M2Error {
    M2Error::TypeMismatch {
        expected: expected.name(),
        found: found.tag().name(),
    }
}

impl From<i64> for Variant {
    fn from(n: i64) -> Self {
        Variant::Integer(n)
    }
}

impl From<f64> for Variant {
    fn from(f: f64) -> Self {
        Variant::Float(f)
    }
}

impl From<bool> for Variant {
    fn from(b: bool) -> Self {
        Variant::Boolean(b)
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Variant::String(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Variant {
    fn from(s: String) -> Self {
        Variant::String(Bytes::from(s))
    }
}

impl From<Bytes> for Variant {
    fn from(b: Bytes) -> Self {
        Variant::String(b)
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(l: Vec<Variant>) -> Self {
        Variant::List(l)
    }
}

impl From<Dict> for Variant {
    fn from(d: Dict) -> Self {
        Variant::Dict(d)
    }
}
