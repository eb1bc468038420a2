//! Integration tests for group-wide SSL redirect
//!
//! Redirected listeners answer with a 301 to the HTTPS port and carry no rules;
//! invalid or conflicting redirect ports abort the build.

mod common;

use common::*;
use ingress_stack::stack::ResourceKind;
use ingress_stack::{Member, Rule, StackError};
use pretty_assertions::assert_eq;
use serde_json::json;

const BOTH_PORTS: &str = r#"[{"HTTP": 80}, {"HTTPS": 443}]"#;

fn redirected_member(port: &str) -> Member {
    vanilla_member()
        .with_annotation(annotation("listen-ports"), BOTH_PORTS)
        .with_annotation(annotation("certificate-arn"), "arn-1")
        .with_annotation(annotation("ssl-redirect"), port)
}

#[test]
fn test_plain_listener_redirects_to_https() {
    let stack = build(vec![redirected_member("443")]).unwrap();

    let http = stack.get(ResourceKind::Listener, "80").unwrap().as_listener().unwrap();
    assert_eq!(
        serde_json::to_value(&http.default_actions).unwrap(),
        json!([{
            "type": "redirect",
            "redirectConfig": {"port": "443", "protocol": "HTTPS", "statusCode": "HTTP_301"}
        }])
    );

    let https = stack.get(ResourceKind::Listener, "443").unwrap().as_listener().unwrap();
    assert_eq!(
        serde_json::to_value(&https.default_actions).unwrap(),
        json!([{
            "type": "fixed-response",
            "fixedResponseConfig": {"contentType": "text/plain", "statusCode": "404"}
        }])
    );

    let rule_keys: Vec<&str> =
        stack.resources_of(ResourceKind::ListenerRule).map(|(key, _)| key).collect();
    assert_eq!(rule_keys, vec!["443:1", "443:2", "443:3"]);

    let sg = stack
        .get(ResourceKind::SecurityGroup, "ManagedLBSecurityGroup")
        .unwrap()
        .as_security_group()
        .unwrap();
    let ports: Vec<i64> = sg.ingress.iter().map(|permission| permission.from_port).collect();
    assert_eq!(ports, vec![80, 443]);
}

#[test]
fn test_agreeing_members_share_redirect() {
    let other = Member::new("ns-1", "ing-2")
        .with_annotation(annotation("listen-ports"), BOTH_PORTS)
        .with_annotation(annotation("certificate-arn"), "arn-1")
        .with_annotation(annotation("ssl-redirect"), "443")
        .with_rule(Rule::new("app-3.example.com", "/", backend("svc-1", "http")));
    let stack = build(vec![redirected_member("443"), other]).unwrap();
    assert_eq!(stack.count(ResourceKind::Listener), 2);
    assert_eq!(stack.count(ResourceKind::ListenerRule), 4);
}

#[test]
fn test_redirect_to_missing_listener() {
    let err = build(vec![redirected_member("8443")]).unwrap_err();
    assert!(matches!(err, StackError::SslRedirect(_)));
    assert_eq!(err.to_string(), "listener does not exist for SSLRedirect port: 8443");
}

#[test]
fn test_redirect_to_plain_listener() {
    let err = build(vec![redirected_member("80")]).unwrap_err();
    assert_eq!(err.to_string(), "listener protocol non-SSL for SSLRedirect port: 80");
}

#[test]
fn test_conflicting_redirect_ports() {
    let other = Member::new("ns-1", "ing-2")
        .with_annotation(annotation("listen-ports"), r#"[{"HTTPS": 8443}]"#)
        .with_annotation(annotation("certificate-arn"), "arn-1")
        .with_annotation(annotation("ssl-redirect"), "8443");
    let err = build(vec![redirected_member("443"), other]).unwrap_err();
    assert_eq!(err.to_string(), "conflicting sslRedirect port: [443 8443]");
}

#[test]
fn test_malformed_redirect_port() {
    let err = build(vec![redirected_member("https")]).unwrap_err();
    assert!(matches!(err, StackError::Annotation { .. }));
    assert!(err.to_string().contains("alb.ingress.kubernetes.io/ssl-redirect"));
}
