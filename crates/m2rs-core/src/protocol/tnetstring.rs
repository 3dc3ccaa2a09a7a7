//! TNetstring parsing (panic-free).
//!
//! Grammar per value: `<len>:<payload><tag>`, where `<len>` is the decimal
//! byte length of `<payload>`. Dict and list payloads are concatenations of
//! nested values and are parsed over their own sub-slice, so a nested value
//! can never consume bytes that belong to its parent's siblings.
//!
//! Parsing rules:
//! - Never index past a slice: split and check lengths first.
//! - Any failure drops whatever was built so far; no partial tree escapes.

use bytes::Bytes;

use super::DEFAULT_MAX_DEPTH;
use crate::error::{M2Error, Result};
use crate::variant::{Dict, Tag, Variant};

/// Longest accepted length prefix (lengths below one billion bytes).
const MAX_LENGTH_DIGITS: usize = 9;

/// Parse one value starting at `start`, returning it with the number of bytes consumed.
pub fn parse(data: &[u8], start: usize) -> Result<(Variant, usize)> {
    let slice = data.get(start..).ok_or(M2Error::OutOfBounds {
        declared: start,
        available: data.len(),
    })?;
    let (value, rest) = parse_prefix(slice)?;
    Ok((value, slice.len() - rest.len()))
}

/// Parse one value from the front of `data`, returning it with the residual slice.
pub fn parse_prefix(data: &[u8]) -> Result<(Variant, &[u8])> {
    parse_prefix_with_depth(data, DEFAULT_MAX_DEPTH)
}

/// Like [`parse_prefix`] with an explicit nesting limit.
pub fn parse_prefix_with_depth(data: &[u8], max_depth: usize) -> Result<(Variant, &[u8])> {
    parse_value(data, 1, max_depth)
}

/// Parse exactly one value; trailing bytes are an error.
pub fn parse_exact(data: &[u8]) -> Result<Variant> {
    let (value, rest) = parse_prefix(data)?;
    if !rest.is_empty() {
        return Err(M2Error::malformed(format!(
            "{} trailing bytes after value",
            rest.len()
        )));
    }
    Ok(value)
}

fn parse_value(data: &[u8], depth: usize, max_depth: usize) -> Result<(Variant, &[u8])> {
    if depth > max_depth {
        return Err(M2Error::TooDeep(max_depth));
    }

    let (len, rest) = split_length(data)?;

    // payload plus the trailing tag byte
    if rest.len() <= len {
        return Err(M2Error::OutOfBounds {
            declared: len,
            available: rest.len(),
        });
    }
    let (payload, rest) = rest.split_at(len);
    let (&tag_byte, rest) = rest.split_first().ok_or(M2Error::OutOfBounds {
        declared: len,
        available: len,
    })?;
    let tag = Tag::from_byte(tag_byte).ok_or(M2Error::UnknownTag(tag_byte))?;

    let value = match tag {
        Tag::String => Variant::String(Bytes::copy_from_slice(payload)),
        Tag::Integer => Variant::Integer(parse_integer(payload)?),
        Tag::Float => Variant::Float(parse_float(payload)?),
        Tag::Boolean => Variant::Boolean(parse_bool(payload)?),
        Tag::Null => {
            if !payload.is_empty() {
                return Err(M2Error::malformed(format!(
                    "null payload must be empty, got {} bytes",
                    payload.len()
                )));
            }
            Variant::Null
        }
        Tag::Dict => Variant::Dict(parse_dict(payload, depth, max_depth)?),
        Tag::List => Variant::List(parse_list(payload, depth, max_depth)?),
    };

    Ok((value, rest))
}

/// Split `<digits>:` off the front of `data`.
fn split_length(data: &[u8]) -> Result<(usize, &[u8])> {
    if data.is_empty() {
        return Err(M2Error::malformed("empty input"));
    }

    let digits = data.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return Err(M2Error::malformed("missing length prefix"));
    }
    if digits > MAX_LENGTH_DIGITS {
        return Err(M2Error::malformed(format!(
            "length prefix longer than {MAX_LENGTH_DIGITS} digits"
        )));
    }

    let (prefix, rest) = data.split_at(digits);
    let rest = match rest.split_first() {
        Some((b':', rest)) => rest,
        Some((other, _)) => {
            return Err(M2Error::malformed(format!(
                "expected ':' after length, found {other:#04x}"
            )))
        }
        None => return Err(M2Error::malformed("truncated after length prefix")),
    };

    let len = prefix
        .iter()
        .fold(0usize, |acc, d| acc * 10 + usize::from(d - b'0'));
    Ok((len, rest))
}

fn payload_text<'a>(payload: &'a [u8], kind: &str) -> Result<&'a str> {
    std::str::from_utf8(payload)
        .map_err(|_| M2Error::malformed(format!("{kind} payload is not ASCII")))
}

fn parse_integer(payload: &[u8]) -> Result<i64> {
    let text = payload_text(payload, "integer")?;
    text.parse::<i64>()
        .map_err(|e| M2Error::malformed(format!("invalid integer {text:?}: {e}")))
}

fn parse_float(payload: &[u8]) -> Result<f64> {
    let text = payload_text(payload, "float")?;
    text.parse::<f64>()
        .map_err(|e| M2Error::malformed(format!("invalid float {text:?}: {e}")))
}

fn parse_bool(payload: &[u8]) -> Result<bool> {
    match payload {
        b"true" => Ok(true),
        b"false" => Ok(false),
        _ => Err(M2Error::malformed(format!(
            "boolean payload must be exactly true or false, got {:?}",
            String::from_utf8_lossy(payload)
        ))),
    }
}

fn parse_dict(mut remaining: &[u8], depth: usize, max_depth: usize) -> Result<Dict> {
    let mut dict = Dict::new();

    while !remaining.is_empty() {
        let (key, rest) = parse_value(remaining, depth + 1, max_depth)?;
        let key = match key {
            Variant::String(k) => k,
            other => {
                return Err(M2Error::TypeMismatch {
                    expected: "string dict key",
                    found: other.tag().name(),
                })
            }
        };
        if rest.is_empty() {
            return Err(M2Error::malformed("dict key without a value"));
        }

        let (value, rest) = parse_value(rest, depth + 1, max_depth)?;
        dict.insert(key, value);
        remaining = rest;
    }

    Ok(dict)
}

fn parse_list(mut remaining: &[u8], depth: usize, max_depth: usize) -> Result<Vec<Variant>> {
    let mut list = Vec::new();

    while !remaining.is_empty() {
        let (item, rest) = parse_value(remaining, depth + 1, max_depth)?;
        list.push(item);
        remaining = rest;
    }

    Ok(list)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn length_prefix_rules() {
        assert_eq!(split_length(b"12:x").unwrap().0, 12);
        assert_eq!(split_length(b"0:").unwrap(), (0, &b""[..]));
        assert!(split_length(b"+1:x").is_err());
        assert!(split_length(b"-1:x").is_err());
        assert!(split_length(b" 1:x").is_err());
        assert!(split_length(b"1234567890:").is_err());
        assert!(split_length(b"12").is_err());
        assert!(split_length(b"1;x").is_err());
    }

    #[test]
    fn consumed_count_covers_prefix_payload_and_tag() {
        let (v, used) = parse(b"5:hello,trailing", 0).unwrap();
        assert_eq!(v.as_bytes(), Some(&b"hello"[..]));
        assert_eq!(used, 1 + 1 + 5 + 1);

        let (v, used) = parse(b"xx2:42#", 2).unwrap();
        assert_eq!(v.as_integer(), Some(42));
        assert_eq!(used, 5);
    }

    #[test]
    fn start_past_end_is_out_of_bounds() {
        let e = parse(b"0:~", 9).unwrap_err();
        assert_eq!(e.code().as_str(), "OUT_OF_BOUNDS");
    }

    #[test]
    fn nested_value_cannot_escape_parent_range() {
        // inner string claims 5 bytes but the list payload only has 4
        let e = parse_exact(b"4:5:ab]").unwrap_err();
        assert_eq!(e.code().as_str(), "OUT_OF_BOUNDS");
    }

    #[test]
    fn depth_limit() {
        let nested = b"6:3:0:]]]";
        assert!(parse_prefix_with_depth(nested, 3).is_ok());
        let e = parse_prefix_with_depth(nested, 2).unwrap_err();
        assert_eq!(e.code().as_str(), "TOO_DEEP");
    }

    #[test]
    fn dict_keys_must_be_strings() {
        // payload "1:1#0:~" is 7 bytes: integer key then null value
        let e = parse_exact(b"7:1:1#0:~}").unwrap_err();
        assert_eq!(e.code().as_str(), "TYPE_MISMATCH");
        assert!(parse_exact(b"7:1:k,0:~}").is_ok());
    }
}
