//! EC2 resource specs: the managed front-door security group.

use std::collections::BTreeMap;

use serde::Serialize;

pub const IP_PROTOCOL_TCP: &str = "tcp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupSpec {
    pub group_name: String,
    pub description: String,
    pub ingress: Vec<IpPermission>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpPermission {
    pub ip_protocol: String,
    pub from_port: i64,
    pub to_port: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ip_ranges: Vec<IpRange>,
    #[serde(rename = "ipv6Ranges", skip_serializing_if = "Vec::is_empty")]
    pub ipv6_ranges: Vec<Ipv6Range>,
}

impl IpPermission {
    /// TCP permission for a single port from the given CIDR ranges
    pub fn tcp_port(port: i64, cidrs: &[String]) -> Self {
        let (v6, v4): (Vec<&String>, Vec<&String>) = cidrs.iter().partition(|c| c.contains(':'));
        Self {
            ip_protocol: IP_PROTOCOL_TCP.to_string(),
            from_port: port,
            to_port: port,
            ip_ranges: v4.into_iter().map(|cidr| IpRange { cidr_ip: cidr.clone() }).collect(),
            ipv6_ranges: v6.into_iter().map(|cidr| Ipv6Range { cidr_ipv6: cidr.clone() }).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpRange {
    #[serde(rename = "cidrIP")]
    pub cidr_ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ipv6Range {
    #[serde(rename = "cidrIPv6")]
    pub cidr_ipv6: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tcp_port_splits_address_families() {
        let permission =
            IpPermission::tcp_port(443, &["10.0.0.0/8".to_string(), "::/0".to_string()]);
        assert_eq!(
            serde_json::to_value(&permission).unwrap(),
            json!({
                "ipProtocol": "tcp",
                "fromPort": 443,
                "toPort": 443,
                "ipRanges": [{"cidrIP": "10.0.0.0/8"}],
                "ipv6Ranges": [{"cidrIPv6": "::/0"}]
            })
        );
    }
}
