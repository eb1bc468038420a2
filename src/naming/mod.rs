//! # Naming & Identity
//!
//! Internal stack keys and cloud-facing resource names.
//!
//! Cloud names look like `k8s-ns1-ing1-f75a4874a1`: a readable prefix built from
//! sanitized identity parts, then ten hex characters of a SHA-256 digest. Stable
//! names hash only identity, so content changes update the resource in place.
//! Settings-hash names also hash attributes the provider cannot change in place, so
//! changing one yields a new name and thus a replacement resource.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::domain::{GroupId, PortSpecifier};
use crate::model::{Protocol, ProtocolVersion, Scheme, TargetType};

/// Provider limit on load balancer, target group and security group names
pub const MAX_NAME_LENGTH: usize = 32;
const HASH_LENGTH: usize = 10;
const PART_LENGTH: usize = 8;

pub const SECURITY_GROUP_KEY: &str = "ManagedLBSecurityGroup";
pub const LOAD_BALANCER_KEY: &str = "LoadBalancer";

static INVALID_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("valid regex"));

/// Strip everything but ASCII alphanumerics
pub fn sanitize(part: &str) -> String {
    INVALID_NAME_CHARS.replace_all(part, "").into_owned()
}

/// Hex digest of the inputs, separated so that `["ab", "c"]` and `["a", "bc"]` differ
pub fn short_hash(inputs: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input.as_bytes());
        hasher.update([0u8]);
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(HASH_LENGTH);
    digest
}

pub fn listener_key(port: i64) -> String {
    port.to_string()
}

pub fn listener_rule_key(port: i64, priority: i64) -> String {
    format!("{}:{}", port, priority)
}

/// `{group}-{service}:{port}`, with the service namespace spelled out for explicit
/// groups whose members span namespaces.
pub fn target_group_key(
    group: &GroupId,
    service_namespace: &str,
    service_name: &str,
    port: &PortSpecifier,
) -> String {
    if group.is_explicit() {
        format!("{}-{}/{}:{}", group, service_namespace, service_name, port)
    } else {
        format!("{}-{}:{}", group, service_name, port)
    }
}

/// Produces cloud-facing names under a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNamer {
    prefix: String,
}

impl ResourceNamer {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Stable: identity of the group only
    pub fn security_group_name(&self, group: &GroupId) -> String {
        self.compose(&[&group.namespace, &group.name], &[&group.namespace, &group.name])
    }

    /// Settings-hash: scheme cannot change on a live load balancer
    pub fn load_balancer_name(&self, group: &GroupId, scheme: Scheme) -> String {
        self.compose(
            &[&group.namespace, &group.name],
            &[&group.namespace, &group.name, scheme.as_str()],
        )
    }

    /// Settings-hash over everything a target group cannot change in place.
    #[allow(clippy::too_many_arguments)]
    pub fn target_group_name(
        &self,
        group: &GroupId,
        service_namespace: &str,
        service_name: &str,
        service_port: &PortSpecifier,
        target_type: TargetType,
        port: i64,
        protocol: Protocol,
        protocol_version: ProtocolVersion,
    ) -> String {
        let literal_port = service_port.to_string();
        let port = port.to_string();
        self.compose(
            &[service_namespace, service_name],
            &[
                &group.namespace,
                &group.name,
                service_namespace,
                service_name,
                &literal_port,
                target_type.as_str(),
                &port,
                protocol.as_str(),
                protocol_version.as_str(),
            ],
        )
    }

    /// Stable: group, service and the literal port
    pub fn binding_name(
        &self,
        group: &GroupId,
        service_namespace: &str,
        service_name: &str,
        service_port: &PortSpecifier,
    ) -> String {
        let literal_port = service_port.to_string();
        self.compose(
            &[service_namespace, service_name],
            &[&group.namespace, &group.name, service_namespace, service_name, &literal_port],
        )
    }

    fn compose(&self, readable: &[&str], hashed: &[&str]) -> String {
        let mut parts = Vec::with_capacity(readable.len() + 1);
        let prefix = sanitize(&self.prefix);
        if !prefix.is_empty() {
            parts.push(prefix);
        }
        for part in readable {
            let mut part = sanitize(part);
            part.truncate(PART_LENGTH);
            if !part.is_empty() {
                parts.push(part);
            }
        }

        let mut head = parts.join("-");
        head.truncate(MAX_NAME_LENGTH - HASH_LENGTH - 1);
        let head = head.trim_end_matches('-');

        let hash = short_hash(hashed);
        if head.is_empty() {
            hash
        } else {
            format!("{}-{}", head, hash)
        }
    }
}

impl Default for ResourceNamer {
    fn default() -> Self {
        Self::new("k8s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> GroupId {
        GroupId::new("ns-1", "ing-1")
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("ns-1"), "ns1");
        assert_eq!(sanitize("my_app.v2"), "myappv2");
    }

    #[test]
    fn test_security_group_name_shape() {
        let name = ResourceNamer::default().security_group_name(&group());
        assert!(name.starts_with("k8s-ns1-ing1-"));
        assert_eq!(name.len(), "k8s-ns1-ing1-".len() + 10);
        assert!(name["k8s-ns1-ing1-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_long_parts_truncate_but_keep_hash() {
        let namer = ResourceNamer::new("a-very-long-cluster-prefix");
        let long = GroupId::new("production-namespace", "checkout-frontend-ingress");
        let name = namer.security_group_name(&long);
        assert!(name.len() <= MAX_NAME_LENGTH);
        assert_eq!(&name[name.len() - 10..], short_hash(&[&long.namespace, &long.name]));
        assert!(!name.contains("--"));
    }

    #[test]
    fn test_truncation_never_collides() {
        let namer = ResourceNamer::default();
        let a = namer.security_group_name(&GroupId::new("namespace-aaaa-1", "ing"));
        let b = namer.security_group_name(&GroupId::new("namespace-aaaa-2", "ing"));
        assert_eq!(a[..a.len() - 10], b[..b.len() - 10]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_load_balancer_name_depends_on_scheme() {
        let namer = ResourceNamer::default();
        assert_ne!(
            namer.load_balancer_name(&group(), Scheme::Internal),
            namer.load_balancer_name(&group(), Scheme::InternetFacing)
        );
    }

    #[test]
    fn test_hash_separates_inputs() {
        assert_ne!(short_hash(&["ab", "c"]), short_hash(&["a", "bc"]));
    }

    #[test]
    fn test_explicit_group_keys() {
        assert_eq!(
            target_group_key(&group(), "ns-1", "svc-1", &"http".into()),
            "ns-1/ing-1-svc-1:http"
        );
        assert_eq!(
            target_group_key(&GroupId::explicit("shared"), "ns-2", "svc-1", &80.into()),
            "shared-ns-2/svc-1:80"
        );
        assert_eq!(listener_rule_key(443, 2), "443:2");
    }

    #[test]
    fn test_literal_port_changes_names() {
        let namer = ResourceNamer::default();
        let by_name = namer.binding_name(&group(), "ns-1", "svc-1", &"http".into());
        let by_number = namer.binding_name(&group(), "ns-1", "svc-1", &80.into());
        assert_ne!(by_name, by_number);
    }
}
