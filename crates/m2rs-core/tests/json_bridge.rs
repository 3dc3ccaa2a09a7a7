//! JSON bridge round-trip tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use m2rs_core::protocol::json::{dump_json, dump_json_pretty, parse_json};
use m2rs_core::protocol::tnetstring;
use m2rs_core::{Tag, Variant};

fn sample() -> Variant {
    let mut inner = Variant::new(Tag::List);
    inner.list_append(Variant::from(1i64)).unwrap();
    inner.list_append(Variant::from(2.5f64)).unwrap();
    inner.list_append(Variant::new(Tag::Dict)).unwrap();
    inner.list_append(Variant::new(Tag::List)).unwrap();
    inner.list_append(Variant::Null).unwrap();

    let mut root = Variant::new(Tag::Dict);
    root.dict_set("name", Variant::from("m2 \"quoted\" \u{e9}")).unwrap();
    root.dict_set("ok", Variant::from(true)).unwrap();
    root.dict_set("neg", Variant::from(-9i64)).unwrap();
    root.dict_set("whole", Variant::from(3.0f64)).unwrap();
    root.dict_set("items", inner).unwrap();
    root
}

#[test]
fn dump_then_parse_reconstructs_tree() {
    let v = sample();
    let text = dump_json(&v).unwrap();
    assert_eq!(parse_json(&text).unwrap(), v);

    let pretty = dump_json_pretty(&v).unwrap();
    assert_eq!(parse_json(&pretty).unwrap(), v);
}

#[test]
fn separators_between_mixed_children() {
    let mut l = Variant::new(Tag::List);
    l.list_append(Variant::new(Tag::Dict)).unwrap();
    l.list_append(Variant::from(1i64)).unwrap();
    l.list_append(Variant::new(Tag::List)).unwrap();
    l.list_append(Variant::from("x")).unwrap();
    assert_eq!(dump_json(&l).unwrap(), r#"[{},1,[],"x"]"#);
}

#[test]
fn tnetstring_tree_dumps_as_json() {
    let v = tnetstring::parse_exact(b"18:1:k,10:4:true!0:~]}").unwrap();
    assert_eq!(dump_json(&v).unwrap(), r#"{"k":[true,null]}"#);
}

#[test]
fn object_keys_keep_last_duplicate() {
    let v = parse_json(r#"{"a":1,"a":2}"#).unwrap();
    assert_eq!(v.dict_get(b"a"), Some(&Variant::Integer(2)));
}

#[test]
fn invalid_json_is_an_error() {
    for bad in ["", "{", "[1,]", "{\"a\" 1}", "tru"] {
        let e = parse_json(bad).unwrap_err();
        assert_eq!(e.code().as_str(), "JSON", "input={bad:?}");
    }
}
