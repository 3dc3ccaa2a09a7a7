//! JSON bridge: JSON text to and from `Variant`.
//!
//! Numbers without a fraction or exponent become `Integer`, everything else
//! `Float`. Dumping requires UTF-8 strings and keys and finite floats; other
//! values cannot be represented and fail instead of being mangled.

use std::fmt;

use bytes::Bytes;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize, SerializeMap, SerializeSeq, Serializer};

use super::DEFAULT_MAX_DEPTH;
use crate::error::{M2Error, Result};
use crate::variant::{Dict, Variant};

/// Deepest nesting serde_json parses before giving up.
pub const JSON_MAX_DEPTH: usize = 128;

/// Parse JSON text into a `Variant` tree.
pub fn parse_json(text: &str) -> Result<Variant> {
    parse_json_with_depth(text, DEFAULT_MAX_DEPTH)
}

/// Like [`parse_json`] with an explicit nesting limit.
///
/// serde_json stops at [`JSON_MAX_DEPTH`] nested containers on its own; that
/// is reported as `TooDeep` as well, whatever `max_depth` asks for.
pub fn parse_json_with_depth(text: &str, max_depth: usize) -> Result<Variant> {
    let value: Variant = serde_json::from_str(text).map_err(|e| {
        if is_recursion_limit(&e) {
            M2Error::TooDeep(max_depth.min(JSON_MAX_DEPTH))
        } else {
            M2Error::from(e)
        }
    })?;
    if value.depth() > max_depth {
        return Err(M2Error::TooDeep(max_depth));
    }
    Ok(value)
}

/// Dump a `Variant` tree as compact JSON text.
pub fn dump_json(value: &Variant) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn dump_json_pretty(value: &Variant) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Convert into a `serde_json::Value` (for comparisons and embedding).
pub fn to_json_value(value: &Variant) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

fn is_recursion_limit(e: &serde_json::Error) -> bool {
    e.is_syntax() && e.to_string().starts_with("recursion limit exceeded")
}

fn utf8<'a, E: ser::Error>(b: &'a [u8], what: &str) -> std::result::Result<&'a str, E> {
    std::str::from_utf8(b).map_err(|_| E::custom(format!("{what} is not valid UTF-8")))
}

impl Serialize for Variant {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Variant::String(b) => s.serialize_str(utf8::<S::Error>(b, "string")?),
            Variant::Integer(n) => s.serialize_i64(*n),
            Variant::Float(f) if f.is_finite() => s.serialize_f64(*f),
            Variant::Float(f) => Err(ser::Error::custom(format!(
                "non-finite float {f} has no JSON form"
            ))),
            Variant::Boolean(b) => s.serialize_bool(*b),
            Variant::Null => s.serialize_unit(),
            Variant::Dict(d) => {
                let mut map = s.serialize_map(Some(d.len()))?;
                for (k, v) in d {
                    map.serialize_entry(utf8::<S::Error>(k, "dict key")?, v)?;
                }
                map.end()
            }
            Variant::List(l) => {
                let mut seq = s.serialize_seq(Some(l.len()))?;
                for v in l {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
        }
    }
}

struct VariantVisitor;

impl<'de> Visitor<'de> for VariantVisitor {
    type Value = Variant;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Variant, E> {
        Ok(Variant::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Variant, E> {
        Ok(Variant::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Variant, E> {
        i64::try_from(v)
            .map(Variant::Integer)
            .map_err(|_| E::custom(format!("integer {v} out of range")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Variant, E> {
        Ok(Variant::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Variant, E> {
        Ok(Variant::String(Bytes::copy_from_slice(v.as_bytes())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Variant, E> {
        Ok(Variant::String(Bytes::from(v)))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Variant, E> {
        Ok(Variant::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Variant, E> {
        Ok(Variant::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> std::result::Result<Variant, D::Error> {
        Deserialize::deserialize(d)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Variant, A::Error> {
        let mut list = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Variant>()? {
            list.push(item);
        }
        Ok(Variant::List(list))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Variant, A::Error> {
        let mut dict = Dict::new();
        // duplicate keys: last one wins
        while let Some((k, v)) = map.next_entry::<String, Variant>()? {
            dict.insert(Bytes::from(k), v);
        }
        Ok(Variant::Dict(dict))
    }
}

impl<'de> Deserialize<'de> for Variant {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Variant, D::Error> {
        d.deserialize_any(VariantVisitor)
    }
}
