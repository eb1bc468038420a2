//! Typed Ingress-level options.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{keys, AnnotationError, AnnotationParser, Annotations};
use crate::domain::PortSpecifier;
use crate::model::{IpAddressType, Protocol, Scheme};

/// Load balancer names: alphanumerics and inner hyphens, at most 32 characters
static LOAD_BALANCER_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,30}[a-zA-Z0-9])?$").expect("valid regex")
});

const GROUP_ORDER_RANGE: std::ops::RangeInclusive<i64> = -1000..=1000;

/// Every option an Ingress can set on its group's load balancer and listeners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngressAnnotations {
    pub scheme: Option<Scheme>,
    pub ip_address_type: Option<IpAddressType>,
    pub subnets: Option<Vec<String>>,
    pub load_balancer_name: Option<String>,
    pub load_balancer_attributes: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub inbound_cidrs: Vec<String>,
    pub listen_ports: Option<Vec<(Protocol, i64)>>,
    pub certificate_arns: Option<Vec<String>>,
    pub ssl_policy: Option<String>,
    pub ssl_redirect: Option<i64>,
    pub group_order: i64,
    /// `actions.<service-name>` entries keyed by service name
    pub actions: BTreeMap<String, ActionConfig>,
}

impl IngressAnnotations {
    pub fn resolve(
        parser: &AnnotationParser,
        annotations: &Annotations,
    ) -> Result<Self, AnnotationError> {
        let sources = [annotations];

        let mut actions = BTreeMap::new();
        for name in parser.sub_keys(keys::ACTIONS_PREFIX, &sources) {
            let suffix = format!("{}{}", keys::ACTIONS_PREFIX, name);
            if let Some(action) = parser.parse_json::<ActionConfig>(&suffix, &sources)? {
                action.validate(&parser.key(&suffix))?;
                actions.insert(name, action);
            }
        }

        let group_order = parser.parse_int(keys::GROUP_ORDER, &sources)?.unwrap_or(0);
        if !GROUP_ORDER_RANGE.contains(&group_order) {
            return Err(AnnotationError::invalid(
                parser.key(keys::GROUP_ORDER),
                group_order.to_string(),
                "group order must be between -1000 and 1000",
            ));
        }

        let load_balancer_name = parser.parse_string(keys::LOAD_BALANCER_NAME, &sources);
        if let Some(name) = &load_balancer_name {
            if !LOAD_BALANCER_NAME_REGEX.is_match(name) {
                return Err(AnnotationError::invalid(
                    parser.key(keys::LOAD_BALANCER_NAME),
                    name,
                    "must be at most 32 alphanumeric or hyphen characters, not starting or ending with a hyphen",
                ));
            }
        }

        let inbound_cidrs =
            parser.parse_string_list(keys::INBOUND_CIDRS, &sources).unwrap_or_default();
        for cidr in &inbound_cidrs {
            validate_cidr(cidr).map_err(|reason| {
                AnnotationError::invalid(parser.key(keys::INBOUND_CIDRS), cidr, reason)
            })?;
        }

        Ok(Self {
            scheme: parse_enum(parser, keys::SCHEME, &sources)?,
            ip_address_type: parse_enum(parser, keys::IP_ADDRESS_TYPE, &sources)?,
            subnets: parser.parse_string_list(keys::SUBNETS, &sources),
            load_balancer_name,
            load_balancer_attributes: parser
                .parse_string_map(keys::LOAD_BALANCER_ATTRIBUTES, &sources)?
                .unwrap_or_default(),
            tags: parser.parse_string_map(keys::TAGS, &sources)?.unwrap_or_default(),
            inbound_cidrs,
            listen_ports: parse_listen_ports(parser, &sources)?,
            certificate_arns: parser.parse_string_list(keys::CERTIFICATE_ARN, &sources),
            ssl_policy: parser.parse_string(keys::SSL_POLICY, &sources),
            ssl_redirect: parser.parse_int(keys::SSL_REDIRECT, &sources)?,
            group_order,
            actions,
        })
    }
}

/// Parse a closed set of string literals into its enum
pub(crate) fn parse_enum<T: FromStr<Err = String>>(
    parser: &AnnotationParser,
    suffix: &str,
    sources: &[&Annotations],
) -> Result<Option<T>, AnnotationError> {
    match parser.parse_string(suffix, sources) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|reason| AnnotationError::invalid(parser.key(suffix), raw, reason)),
    }
}

fn parse_listen_ports(
    parser: &AnnotationParser,
    sources: &[&Annotations],
) -> Result<Option<Vec<(Protocol, i64)>>, AnnotationError> {
    let Some(entries) =
        parser.parse_json::<Vec<BTreeMap<String, i64>>>(keys::LISTEN_PORTS, sources)?
    else {
        return Ok(None);
    };
    let key = parser.key(keys::LISTEN_PORTS);
    let raw = parser.parse_string(keys::LISTEN_PORTS, sources).unwrap_or_default();

    let mut ports = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.len() != 1 {
            return Err(AnnotationError::invalid(
                &key,
                &raw,
                "each listen port entry must hold exactly one protocol: port pair",
            ));
        }
        for (protocol, port) in entry {
            let protocol = protocol
                .parse::<Protocol>()
                .map_err(|reason| AnnotationError::invalid(&key, &raw, reason))?;
            if !(1..=65535).contains(&port) {
                return Err(AnnotationError::invalid(
                    &key,
                    &raw,
                    format!("listen port {} must be between 1 and 65535", port),
                ));
            }
            ports.push((protocol, port));
        }
    }
    if ports.is_empty() {
        return Err(AnnotationError::invalid(key, raw, "at least one listen port is required"));
    }
    Ok(Some(ports))
}

fn validate_cidr(cidr: &str) -> Result<(), String> {
    let (address, prefix) =
        cidr.split_once('/').ok_or_else(|| "expected CIDR notation address/prefix".to_string())?;
    let address: IpAddr = address.parse().map_err(|e| format!("invalid address: {}", e))?;
    let prefix: u8 = prefix.parse().map_err(|e| format!("invalid prefix length: {}", e))?;
    let max = if address.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(format!("prefix length {} exceeds {}", prefix, max));
    }
    Ok(())
}

/// `actions.<name>` annotation body
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionConfig {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub forward_config: Option<ForwardActionConfig>,
}

impl ActionConfig {
    pub const FORWARD: &'static str = "forward";

    fn validate(&self, key: &str) -> Result<(), AnnotationError> {
        if self.action_type != Self::FORWARD {
            return Err(AnnotationError::invalid(
                key,
                &self.action_type,
                "unsupported action type, expected forward",
            ));
        }
        match &self.forward_config {
            Some(config) if !config.target_groups.is_empty() => Ok(()),
            _ => Err(AnnotationError::invalid(
                key,
                &self.action_type,
                "forward action requires at least one target group",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardActionConfig {
    pub target_groups: Vec<WeightedServiceConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedServiceConfig {
    pub service_name: String,
    pub service_port: PortSpecifier,
    #[serde(default)]
    pub weight: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(pairs: &[(&str, &str)]) -> Result<IngressAnnotations, AnnotationError> {
        let annotations: Annotations = pairs
            .iter()
            .map(|(k, v)| (format!("alb.ingress.kubernetes.io/{}", k), v.to_string()))
            .collect();
        IngressAnnotations::resolve(&AnnotationParser::default(), &annotations)
    }

    #[test]
    fn test_defaults_when_unannotated() {
        let parsed = resolve(&[]).unwrap();
        assert_eq!(parsed, IngressAnnotations::default());
    }

    #[test]
    fn test_typed_values() {
        let parsed = resolve(&[
            ("scheme", "internet-facing"),
            ("listen-ports", r#"[{"HTTP": 80}, {"HTTPS": 443}]"#),
            ("certificate-arn", "arn-2,arn-3,arn-1,,arn-1"),
            ("ssl-redirect", "443"),
            ("group.order", "-10"),
            ("inbound-cidrs", "10.0.0.0/8, 2001:db8::/32"),
        ])
        .unwrap();
        assert_eq!(parsed.scheme, Some(Scheme::InternetFacing));
        assert_eq!(parsed.listen_ports, Some(vec![(Protocol::Http, 80), (Protocol::Https, 443)]));
        assert_eq!(
            parsed.certificate_arns,
            Some(vec!["arn-2".to_string(), "arn-3".to_string(), "arn-1".to_string()])
        );
        assert_eq!(parsed.ssl_redirect, Some(443));
        assert_eq!(parsed.group_order, -10);
        assert_eq!(parsed.inbound_cidrs.len(), 2);
    }

    #[test]
    fn test_bad_scheme_names_key() {
        let err = resolve(&[("scheme", "public")]).unwrap_err();
        assert_eq!(err.key(), "alb.ingress.kubernetes.io/scheme");
    }

    #[test]
    fn test_bad_listen_ports() {
        assert!(resolve(&[("listen-ports", r#"[{"TCP": 80}]"#)]).is_err());
        assert!(resolve(&[("listen-ports", r#"[{"HTTP": 70000}]"#)]).is_err());
        assert!(resolve(&[("listen-ports", r#"[{"HTTP": 80, "HTTPS": 443}]"#)]).is_err());
        assert!(resolve(&[("listen-ports", "[]")]).is_err());
        assert!(resolve(&[("listen-ports", "not json")]).is_err());
    }

    #[test]
    fn test_group_order_range() {
        assert!(resolve(&[("group.order", "1001")]).is_err());
        assert!(resolve(&[("group.order", "1000")]).is_ok());
    }

    #[test]
    fn test_inbound_cidr_validation() {
        assert!(resolve(&[("inbound-cidrs", "10.0.0.0/33")]).is_err());
        assert!(resolve(&[("inbound-cidrs", "10.0.0.0")]).is_err());
    }

    #[test]
    fn test_load_balancer_name_validation() {
        assert!(resolve(&[("load-balancer-name", "my-alb")]).is_ok());
        assert!(resolve(&[("load-balancer-name", "-bad")]).is_err());
        let long = "x".repeat(33);
        assert!(resolve(&[("load-balancer-name", long.as_str())]).is_err());
    }

    #[test]
    fn test_weighted_actions() {
        let parsed = resolve(&[(
            "actions.blue-green",
            r#"{"type":"forward","forwardConfig":{"targetGroups":[
                {"serviceName":"blue","servicePort":"80","weight":80},
                {"serviceName":"green","servicePort":"http","weight":20}]}}"#,
        )])
        .unwrap();
        let action = parsed.actions.get("blue-green").unwrap();
        let targets = &action.forward_config.as_ref().unwrap().target_groups;
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].weight, Some(80));
        assert_eq!(targets[1].service_port, PortSpecifier::name("http"));
    }

    #[test]
    fn test_unsupported_action_type() {
        let err = resolve(&[("actions.x", r#"{"type":"fixed-response"}"#)]).unwrap_err();
        assert_eq!(err.key(), "alb.ingress.kubernetes.io/actions.x");
    }
}
