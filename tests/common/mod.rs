//! Common test utilities for all integration tests.
//!
//! Provides the Services, resolvers and Ingress fixtures shared by the
//! model builder tests.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use std::sync::Arc;

use ingress_stack::domain::PortSpecifier;
use ingress_stack::model::Scheme;
use ingress_stack::resolvers::{StaticCertificateResolver, StaticSubnetResolver};
use ingress_stack::{
    BackendRef, BuilderConfig, Group, GroupId, Member, ModelBuilder, Rule, Service, ServicePort,
    ServiceStore, Stack, StackError,
};

pub const ANNOTATION_PREFIX: &str = "alb.ingress.kubernetes.io/";
pub const NODE_PORT: i32 = 32768;
pub const WILDCARD_CERT_ARN: &str =
    "arn:aws:acm:us-west-2:000000000000:certificate/11111111-2222-3333-4444-555555555555";

pub const SG_REF: &str =
    "#/resources/AWS::EC2::SecurityGroup/ManagedLBSecurityGroup/status/groupID";
pub const LB_REF: &str =
    "#/resources/AWS::ElasticLoadBalancingV2::LoadBalancer/LoadBalancer/status/loadBalancerARN";

/// `$ref` pointer to a listener's ARN
pub fn listener_ref(port: i64) -> String {
    format!("#/resources/AWS::ElasticLoadBalancingV2::Listener/{}/status/listenerARN", port)
}

/// `$ref` pointer to a target group's ARN
pub fn target_group_ref(key: &str) -> String {
    format!("#/resources/AWS::ElasticLoadBalancingV2::TargetGroup/{}/status/targetGroupARN", key)
}

pub fn annotation(suffix: &str) -> String {
    format!("{}{}", ANNOTATION_PREFIX, suffix)
}

/// svc-1 and svc-2 expose `http` 80 -> 8080, svc-3 exposes `https` 443 -> 8443,
/// all with node port 32768.
pub fn services() -> ServiceStore {
    vec![
        Service::new("ns-1", "svc-1").with_port(
            ServicePort::new(Some("http"), 80, 8080.into()).with_node_port(NODE_PORT),
        ),
        Service::new("ns-1", "svc-2").with_port(
            ServicePort::new(Some("http"), 80, 8080.into()).with_node_port(NODE_PORT),
        ),
        Service::new("ns-1", "svc-3").with_port(
            ServicePort::new(Some("https"), 443, 8443.into()).with_node_port(NODE_PORT),
        ),
    ]
    .into_iter()
    .collect()
}

pub fn subnet_resolver() -> StaticSubnetResolver {
    StaticSubnetResolver::new()
        .with_subnets(Scheme::Internal, ["subnet-a", "subnet-b"])
        .with_subnets(Scheme::InternetFacing, ["subnet-c", "subnet-d"])
}

pub fn certificate_resolver() -> StaticCertificateResolver {
    StaticCertificateResolver::new().with_certificate("*.example.com", WILDCARD_CERT_ARN)
}

pub fn builder() -> ModelBuilder {
    builder_with(BuilderConfig::default())
}

pub fn builder_with(config: BuilderConfig) -> ModelBuilder {
    ModelBuilder::new(config, Arc::new(subnet_resolver()), Arc::new(certificate_resolver()))
        .expect("default config is valid")
}

pub fn backend(service: &str, port: impl Into<PortSpecifier>) -> BackendRef {
    BackendRef::new(service, port.into())
}

/// The three-rule Ingress used across tests: two hosts, three Services, ports
/// referenced by name.
pub fn vanilla_member() -> Member {
    Member::new("ns-1", "ing-1")
        .with_rule(Rule::new("app-1.example.com", "/svc-1", backend("svc-1", "http")))
        .with_rule(Rule::new("app-1.example.com", "/svc-2", backend("svc-2", "http")))
        .with_rule(Rule::new("app-2.example.com", "/svc-3", backend("svc-3", "https")))
}

pub fn group_of(members: Vec<Member>) -> Group {
    Group::new(GroupId::new("ns-1", "ing-1"), members)
}

pub fn build(members: Vec<Member>) -> Result<Stack, StackError> {
    builder().build(&group_of(members), &services())
}
