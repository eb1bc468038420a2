//! Target-group binding: wires a target group to its backing Service and grants the
//! managed security group access to the Service's pods.

use serde::Serialize;

use crate::domain::PortSpecifier;
use crate::model::elbv2::TargetType;
use crate::stack::Deferred;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetGroupBindingSpec {
    pub template: TargetGroupBindingTemplate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetGroupBindingTemplate {
    pub metadata: ObjectMeta,
    pub spec: TargetGroupBindingTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroupBindingTemplateSpec {
    #[serde(rename = "targetGroupARN")]
    pub target_group_arn: Deferred<String>,
    pub target_type: TargetType,
    pub service_ref: ServiceReference,
    pub networking: BindingNetworking,
}

/// Service name and the port exactly as the Ingress wrote it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceReference {
    pub name: String,
    pub port: PortSpecifier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingNetworking {
    pub ingress: Vec<NetworkingIngressRule>,
}

impl BindingNetworking {
    /// Allow the given security group to reach every TCP port on the targets
    pub fn from_security_group(group_id: Deferred<String>) -> Self {
        Self {
            ingress: vec![NetworkingIngressRule {
                from: vec![NetworkingPeer { security_group: SecurityGroupPeer { group_id } }],
                ports: vec![NetworkingPort { protocol: NetworkingProtocol::Tcp, port: None }],
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkingIngressRule {
    pub from: Vec<NetworkingPeer>,
    pub ports: Vec<NetworkingPort>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkingPeer {
    pub security_group: SecurityGroupPeer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityGroupPeer {
    #[serde(rename = "groupID")]
    pub group_id: Deferred<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkingPort {
    pub protocol: NetworkingProtocol,
    /// Absent means all ports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PortSpecifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NetworkingProtocol {
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}
