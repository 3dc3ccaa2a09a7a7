#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use m2rs_core::protocol::envelope::HeaderFormat;
use m2rs_handler::config::{self, HeaderFormatConfig};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
handler:
  recv_addr: "tcp://127.0.0.1:9997"
  send_addr: "tcp://127.0.0.1:9996"
  max_mesage_bytes: 1024 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
handler:
  recv_addr: "tcp://127.0.0.1:9997"
  send_addr: "tcp://127.0.0.1:9996"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert!(cfg.handler.sender_id.is_none());
    assert_eq!(cfg.handler.header_format, HeaderFormatConfig::Tnetstring);
    assert_eq!(cfg.handler.max_message_bytes, 256 * 1024);
    assert_eq!(cfg.handler.max_depth, 64);
    assert_eq!(cfg.log.filter, "info");
}

#[test]
fn full_config_maps_to_parse_options() {
    let ok = r#"
version: 1
handler:
  sender_id: "82209006-86FF-4982-B5EA-D1E29E55D481"
  recv_addr: "tcp://127.0.0.1:9997"
  send_addr: "tcp://127.0.0.1:9996"
  header_format: auto
  max_message_bytes: 4096
  max_depth: 8
log:
  filter: "m2rs_handler=debug"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    let opts = cfg.handler.parse_options();
    assert_eq!(opts.header_format, HeaderFormat::Auto);
    assert_eq!(opts.max_depth, 8);
    assert_eq!(cfg.handler.sender_id.as_deref(), Some("82209006-86FF-4982-B5EA-D1E29E55D481"));
}

#[test]
fn rejects_out_of_range_values() {
    let cases = [
        // wrong version
        "version: 2\nhandler: { recv_addr: a, send_addr: b }\n",
        // same address both ways
        "version: 1\nhandler: { recv_addr: a, send_addr: a }\n",
        // empty address
        "version: 1\nhandler: { recv_addr: '', send_addr: b }\n",
        // sender id with a space breaks reply framing
        "version: 1\nhandler: { sender_id: 'a b', recv_addr: a, send_addr: b }\n",
        "version: 1\nhandler: { recv_addr: a, send_addr: b, max_message_bytes: 10 }\n",
        "version: 1\nhandler: { recv_addr: a, send_addr: b, max_depth: 0 }\n",
        // deeper than JSON headers can nest
        "version: 1\nhandler: { recv_addr: a, send_addr: b, max_depth: 129 }\n",
        "version: 1\nhandler: { recv_addr: a, send_addr: b, header_format: xml }\n",
        // handler section is required
        "version: 1\n",
    ];
    for c in cases {
        let err = config::load_from_str(c).expect_err(c);
        assert_eq!(err.code().as_str(), "BAD_CONFIG", "case={c}");
    }
}

#[test]
fn missing_file_is_a_config_error() {
    let err = config::load_from_file("does/not/exist.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn shipped_config_is_valid() {
    let cfg = config::load_from_file("m2rs.yaml").expect("m2rs.yaml must load");
    assert_eq!(cfg.handler.recv_addr, "tcp://127.0.0.1:9997");
}
