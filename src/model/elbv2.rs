//! Elastic Load Balancing v2 resource specs: load balancer, listener, listener rule
//! and target group, plus the shared action/condition shapes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::stack::Deferred;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => {
                        let allowed: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        Err(format!("expected one of: {}", allowed.join(", ")))
                    }
                }
            }
        }
    };
}

string_enum!(
    /// Whether the load balancer is reachable from the internet
    Scheme { Internal => "internal", InternetFacing => "internet-facing" }
);

string_enum!(IpAddressType { Ipv4 => "ipv4", Dualstack => "dualstack" });

string_enum!(LoadBalancerType { Application => "application" });

string_enum!(
    /// Listener and target group protocol
    Protocol { Http => "HTTP", Https => "HTTPS" }
);

string_enum!(ProtocolVersion { Http1 => "HTTP1", Http2 => "HTTP2", Grpc => "GRPC" });

string_enum!(
    /// How targets are registered: by node port on instances or by pod IP
    TargetType { Instance => "instance", Ip => "ip" }
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetMapping {
    #[serde(rename = "subnetID")]
    pub subnet_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

/// Convert a string map into attribute pairs ordered by key
pub fn attributes_from_map(map: &BTreeMap<String, String>) -> Vec<Attribute> {
    map.iter().map(|(key, value)| Attribute { key: key.clone(), value: value.clone() }).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub lb_type: LoadBalancerType,
    pub scheme: Scheme,
    pub ip_address_type: IpAddressType,
    pub subnet_mapping: Vec<SubnetMapping>,
    pub security_groups: Vec<Deferred<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub load_balancer_attributes: Vec<Attribute>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    #[serde(rename = "certificateARN")]
    pub certificate_arn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerSpec {
    #[serde(rename = "loadBalancerARN")]
    pub load_balancer_arn: Deferred<String>,
    pub port: i64,
    pub protocol: Protocol,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub certificates: Vec<Certificate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_policy: Option<String>,
    pub default_actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerRuleSpec {
    #[serde(rename = "listenerARN")]
    pub listener_arn: Deferred<String>,
    pub priority: i64,
    pub actions: Vec<Action>,
    pub conditions: Vec<RuleCondition>,
}

/// What a listener or rule does with a matched request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Action {
    #[serde(rename = "fixed-response", rename_all = "camelCase")]
    FixedResponse { fixed_response_config: FixedResponseActionConfig },

    #[serde(rename = "forward", rename_all = "camelCase")]
    Forward { forward_config: ForwardActionConfig },

    #[serde(rename = "redirect", rename_all = "camelCase")]
    Redirect { redirect_config: RedirectActionConfig },
}

impl Action {
    /// The catch-all answer for requests no rule matched
    pub fn not_found() -> Self {
        Action::FixedResponse {
            fixed_response_config: FixedResponseActionConfig {
                content_type: Some("text/plain".to_string()),
                message_body: None,
                status_code: "404".to_string(),
            },
        }
    }

    pub fn redirect_to_https(port: i64, status_code: &str) -> Self {
        Action::Redirect {
            redirect_config: RedirectActionConfig {
                port: Some(port.to_string()),
                protocol: Some(Protocol::Https.to_string()),
                status_code: status_code.to_string(),
            },
        }
    }

    /// Target group references carried by this action
    pub fn target_groups(&self) -> Vec<&Deferred<String>> {
        match self {
            Action::Forward { forward_config } => {
                forward_config.target_groups.iter().map(|tg| &tg.target_group_arn).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedResponseActionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_body: Option<String>,
    pub status_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardActionConfig {
    pub target_groups: Vec<TargetGroupTuple>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetGroupTuple {
    #[serde(rename = "targetGroupARN")]
    pub target_group_arn: Deferred<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectActionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    pub status_code: String,
}

/// Match condition of a listener rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field")]
pub enum RuleCondition {
    #[serde(rename = "host-header", rename_all = "camelCase")]
    HostHeader { host_header_config: ValuesConfig },

    #[serde(rename = "path-pattern", rename_all = "camelCase")]
    PathPattern { path_pattern_config: ValuesConfig },
}

impl RuleCondition {
    pub fn host_header<S: Into<String>>(host: S) -> Self {
        RuleCondition::HostHeader { host_header_config: ValuesConfig { values: vec![host.into()] } }
    }

    pub fn path_pattern<S: Into<String>>(path: S) -> Self {
        RuleCondition::PathPattern {
            path_pattern_config: ValuesConfig { values: vec![path.into()] },
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            RuleCondition::HostHeader { host_header_config } => &host_header_config.values,
            RuleCondition::PathPattern { path_pattern_config } => &path_pattern_config.values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValuesConfig {
    pub values: Vec<String>,
}

/// Health check port: the target group's own traffic port or a fixed number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheckPort {
    TrafficPort,
    Port(i64),
}

impl HealthCheckPort {
    pub const TRAFFIC_PORT: &'static str = "traffic-port";
}

impl FromStr for HealthCheckPort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::TRAFFIC_PORT {
            return Ok(HealthCheckPort::TrafficPort);
        }
        match s.parse::<i64>() {
            Ok(port) if (1..=65535).contains(&port) => Ok(HealthCheckPort::Port(port)),
            _ => Err(format!("expected {} or a port between 1 and 65535", Self::TRAFFIC_PORT)),
        }
    }
}

impl Serialize for HealthCheckPort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HealthCheckPort::TrafficPort => serializer.serialize_str(Self::TRAFFIC_PORT),
            HealthCheckPort::Port(port) => serializer.serialize_i64(*port),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckMatcher {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckConfig {
    pub port: HealthCheckPort,
    pub protocol: Protocol,
    pub path: String,
    pub matcher: HealthCheckMatcher,
    pub interval_seconds: i64,
    pub timeout_seconds: i64,
    pub healthy_threshold_count: i64,
    pub unhealthy_threshold_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroupSpec {
    pub name: String,
    pub target_type: TargetType,
    pub port: i64,
    pub protocol: Protocol,
    pub protocol_version: ProtocolVersion,
    pub health_check_config: HealthCheckConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_group_attributes: Vec<Attribute>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}
