#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use gripwire_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
routing:
  edge_domain_sufix: ".edgecompute.app" # typo should fail
handoff:
  self_upstream: "127.0.0.1:7999"
  origin_upstream: "127.0.0.1:7999"
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
handoff:
  self_upstream: "127.0.0.1:7999"
  origin_upstream: "127.0.0.1:7998"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8080");
    assert_eq!(cfg.routing.edge_domain_suffix, ".edgecompute.app");
    assert_eq!(cfg.routing.test_path_prefix, "/test/");
    assert_eq!(cfg.routing.signal_header, "Grip-Sig");
    assert_eq!(cfg.routing.test_channel, "test");
    assert!(cfg.ops.listen_addr().unwrap().is_none());
}

#[test]
fn rejects_unsupported_version() {
    let bad = r#"
version: 2
handoff:
  self_upstream: "127.0.0.1:7999"
  origin_upstream: "127.0.0.1:7999"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(matches!(err, gripwire_core::GripError::UnsupportedVersion));
}

#[test]
fn rejects_bad_upstream_and_channel() {
    let bad_upstream = r#"
version: 1
handoff:
  self_upstream: "fanout.internal"
  origin_upstream: "127.0.0.1:7999"
"#;
    let err = config::load_from_str(bad_upstream).expect_err("must fail");
    assert!(err.to_string().contains("handoff.self_upstream"));

    let bad_channel = r#"
version: 1
routing:
  test_channel: "a\r\nb"
handoff:
  self_upstream: "127.0.0.1:7999"
  origin_upstream: "127.0.0.1:7999"
"#;
    let err = config::load_from_str(bad_channel).expect_err("must fail");
    assert!(err.to_string().contains("routing.test_channel"));
}

#[test]
fn missing_handoff_section_fails() {
    let err = config::load_from_str("version: 1\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}
