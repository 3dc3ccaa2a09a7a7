//! TNetstring codec vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use m2rs_core::protocol::json::to_json_value;
use m2rs_core::protocol::tnetstring;

mod vector_loader;
use vector_loader::load;

#[test]
fn tnetstring_vectors() {
    let files = [
        "tnetstring_scalars.json",
        "tnetstring_compound.json",
        "tnetstring_errors.json",
    ];

    for f in files {
        for v in load(f) {
            let raw = v.frame.decode();
            let res = tnetstring::parse(&raw, 0);

            if let Some(err) = v.expect_error {
                let e = res.expect_err("expected error");
                assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
                continue;
            }

            let (value, consumed) = res.expect("expected ok value");
            let ex = v.expect.expect("missing expect block");

            assert_eq!(consumed as u64, ex["consumed"].as_u64().unwrap(), "vector={}", v.description);

            if let Some(hex_bytes) = ex.get("bytes_hex") {
                let want = hex::decode(hex_bytes.as_str().unwrap()).unwrap();
                assert_eq!(value.as_bytes(), Some(&want[..]), "vector={}", v.description);
            } else {
                let got = to_json_value(&value).unwrap();
                assert_eq!(got, ex["json"], "vector={}", v.description);
            }
        }
    }
}

#[test]
fn consumed_matches_prefix_arithmetic() {
    for (raw, len) in [(&b"5:hello,"[..], 5usize), (&b"0:~"[..], 0), (&b"11:hello world,"[..], 11)] {
        let digits = len.to_string().len();
        let (_, consumed) = tnetstring::parse(raw, 0).unwrap();
        assert_eq!(consumed, digits + 1 + len + 1);
    }
}

#[test]
fn bounds_are_checked_against_the_slice_not_the_allocation() {
    // the backing buffer holds a full value, but the caller only hands over 10 bytes
    let backing = b"1000:abcd,".repeat(200);
    let window = &backing[..10];
    let e = tnetstring::parse(window, 0).unwrap_err();
    assert_eq!(e.code().as_str(), "OUT_OF_BOUNDS");
}

#[test]
fn parse_at_offset_walks_a_stream() {
    let stream = b"2:42#5:hello,0:~";
    let mut offset = 0;
    let mut tags = Vec::new();
    while offset < stream.len() {
        let (value, used) = tnetstring::parse(stream, offset).unwrap();
        tags.push(value.tag().as_byte());
        offset += used;
    }
    assert_eq!(tags, b"#,~");
}

#[test]
fn parse_exact_rejects_trailing_bytes() {
    assert!(tnetstring::parse_exact(b"0:~").is_ok());
    let e = tnetstring::parse_exact(b"0:~x").unwrap_err();
    assert_eq!(e.code().as_str(), "MALFORMED");
}
