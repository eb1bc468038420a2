//! Target groups and their bindings back to Services.

use std::collections::BTreeMap;

use tracing::debug;

use super::backend::ServiceBackend;
use super::task::{BuildTask, MemberContext};
use crate::annotations::TargetGroupAnnotations;
use crate::domain::{PortSpecifier, Service, ServicePort};
use crate::errors::{Result, StackError};
use crate::model::binding::{
    BindingNetworking, ObjectMeta, ServiceReference, TargetGroupBindingTemplate,
    TargetGroupBindingTemplateSpec,
};
use crate::model::elbv2::{attributes_from_map, HealthCheckMatcher};
use crate::model::{
    HealthCheckConfig, HealthCheckPort, Protocol, ProtocolVersion, TargetGroupBindingSpec,
    TargetGroupSpec, TargetType,
};
use crate::naming::{self, SECURITY_GROUP_KEY};
use crate::stack::ResourceRef;

pub const DEFAULT_HEALTH_CHECK_PATH: &str = "/";
pub const DEFAULT_HTTP_SUCCESS_CODES: &str = "200";
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECONDS: i64 = 15;
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS: i64 = 5;
pub const DEFAULT_HEALTHY_THRESHOLD_COUNT: i64 = 2;
pub const DEFAULT_UNHEALTHY_THRESHOLD_COUNT: i64 = 2;

pub const DEFAULT_GRPC_HEALTH_CHECK_PATH: &str = "/AWS.ALB/healthcheck";
pub const DEFAULT_GRPC_SUCCESS_CODES: &str = "12";

/// Target group port for `ip` targets whose container port is only known by name;
/// the binding resolves real ports per endpoint.
const NAMED_TARGET_PORT_PLACEHOLDER: i64 = 1;

/// Health check settings with every unannotated field defaulted.
pub fn health_check_config(
    annotations: &TargetGroupAnnotations,
    protocol: Protocol,
    protocol_version: ProtocolVersion,
) -> HealthCheckConfig {
    let grpc = protocol_version == ProtocolVersion::Grpc;
    let path = annotations.healthcheck_path.clone().unwrap_or_else(|| {
        if grpc { DEFAULT_GRPC_HEALTH_CHECK_PATH } else { DEFAULT_HEALTH_CHECK_PATH }.to_string()
    });
    let default_codes = if grpc { DEFAULT_GRPC_SUCCESS_CODES } else { DEFAULT_HTTP_SUCCESS_CODES };
    let codes = annotations.success_codes.clone().unwrap_or_else(|| default_codes.to_string());
    let matcher = if grpc {
        HealthCheckMatcher { http_code: None, grpc_code: Some(codes) }
    } else {
        HealthCheckMatcher { http_code: Some(codes), grpc_code: None }
    };

    HealthCheckConfig {
        port: annotations.healthcheck_port.unwrap_or(HealthCheckPort::TrafficPort),
        protocol: annotations.healthcheck_protocol.unwrap_or(protocol),
        path,
        matcher,
        interval_seconds: annotations
            .healthcheck_interval_seconds
            .unwrap_or(DEFAULT_HEALTH_CHECK_INTERVAL_SECONDS),
        timeout_seconds: annotations
            .healthcheck_timeout_seconds
            .unwrap_or(DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS),
        healthy_threshold_count: annotations
            .healthy_threshold_count
            .unwrap_or(DEFAULT_HEALTHY_THRESHOLD_COUNT),
        unhealthy_threshold_count: annotations
            .unhealthy_threshold_count
            .unwrap_or(DEFAULT_UNHEALTHY_THRESHOLD_COUNT),
    }
}

/// Port traffic is sent to: the node port for instance targets, the container
/// port for ip targets.
fn target_port(service: &Service, port: &ServicePort, target_type: TargetType) -> Result<i64> {
    match target_type {
        TargetType::Instance => port.node_port.map(i64::from).ok_or_else(|| {
            StackError::NodePortNotAllocated {
                service: service.id(),
                port: port.name.clone().unwrap_or_else(|| port.port.to_string()),
            }
        }),
        TargetType::Ip => Ok(match &port.target_port {
            PortSpecifier::Number(number) => i64::from(*number),
            PortSpecifier::Name(_) => NAMED_TARGET_PORT_PLACEHOLDER,
        }),
    }
}

impl BuildTask<'_> {
    /// Target group and binding for `backend`. Every use resolves its own settings;
    /// later uses of a key must agree with the first.
    pub(crate) fn build_target_group(
        &mut self,
        ctx: &MemberContext<'_>,
        backend: &ServiceBackend,
    ) -> Result<ResourceRef> {
        let key = naming::target_group_key(
            &self.group.id,
            &backend.namespace,
            &backend.name,
            &backend.port,
        );
        let reference = ResourceRef::target_group_arn(key.clone());

        let service = self
            .services
            .get_service(&backend.namespace, &backend.name)
            .ok_or_else(|| StackError::service_not_found(&backend.namespace, &backend.name))?;
        let service_port =
            service.find_port(&backend.port).ok_or_else(|| StackError::ServicePortNotFound {
                service: service.id(),
                port: backend.port.to_string(),
            })?;

        let annotations = TargetGroupAnnotations::resolve(
            &self.builder.parser,
            &[&service.annotations, &ctx.member.annotations],
        )
        .map_err(|e| {
            StackError::annotation(format!("{} backend {}", ctx.member.id(), service.id()), e)
        })?;

        let target_type =
            annotations.target_type.unwrap_or(self.builder.config.default_target_type);
        let port = target_port(service, service_port, target_type)?;
        let protocol = annotations.backend_protocol.unwrap_or(Protocol::Http);
        let protocol_version =
            annotations.backend_protocol_version.unwrap_or(ProtocolVersion::Http1);

        let name = self.builder.namer.target_group_name(
            &self.group.id,
            &backend.namespace,
            &backend.name,
            &backend.port,
            target_type,
            port,
            protocol,
            protocol_version,
        );
        let mut tags: BTreeMap<String, String> = self.builder.config.default_tags.clone();
        tags.extend(annotations.tags.clone());

        let target_group = TargetGroupSpec {
            name,
            target_type,
            port,
            protocol,
            protocol_version,
            health_check_config: health_check_config(&annotations, protocol, protocol_version),
            target_group_attributes: attributes_from_map(&annotations.target_group_attributes),
            tags,
        };

        if let Some(existing) = self.stack.get(reference.kind, &key) {
            if existing.as_target_group() != Some(&target_group) {
                return Err(StackError::conflict(format!(
                    "conflicting target group settings for backend {}:{}: {}",
                    service.id(),
                    backend.port,
                    ctx.member.id()
                )));
            }
            return Ok(reference);
        }
        self.stack.add(key.clone(), target_group)?;

        let binding_name = self.builder.namer.binding_name(
            &self.group.id,
            &backend.namespace,
            &backend.name,
            &backend.port,
        );
        self.stack.add(
            key.clone(),
            TargetGroupBindingSpec {
                template: TargetGroupBindingTemplate {
                    metadata: ObjectMeta {
                        name: binding_name,
                        namespace: backend.namespace.clone(),
                    },
                    spec: TargetGroupBindingTemplateSpec {
                        target_group_arn: reference.clone().into(),
                        target_type,
                        service_ref: ServiceReference {
                            name: backend.name.clone(),
                            port: backend.port.clone(),
                        },
                        networking: BindingNetworking::from_security_group(
                            ResourceRef::security_group_id(SECURITY_GROUP_KEY).into(),
                        ),
                    },
                },
            },
        )?;

        debug!(key = %key, target_type = %target_type, port, "built target group");
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_defaults() {
        let config = health_check_config(
            &TargetGroupAnnotations::default(),
            Protocol::Http,
            ProtocolVersion::Http1,
        );
        assert_eq!(
            config,
            HealthCheckConfig {
                port: HealthCheckPort::TrafficPort,
                protocol: Protocol::Http,
                path: "/".to_string(),
                matcher: HealthCheckMatcher { http_code: Some("200".to_string()), grpc_code: None },
                interval_seconds: 15,
                timeout_seconds: 5,
                healthy_threshold_count: 2,
                unhealthy_threshold_count: 2,
            }
        );
    }

    #[test]
    fn test_grpc_health_check_defaults() {
        let config = health_check_config(
            &TargetGroupAnnotations::default(),
            Protocol::Https,
            ProtocolVersion::Grpc,
        );
        assert_eq!(config.path, "/AWS.ALB/healthcheck");
        assert_eq!(config.matcher.grpc_code.as_deref(), Some("12"));
        assert_eq!(config.matcher.http_code, None);
        assert_eq!(config.protocol, Protocol::Https);
    }

    #[test]
    fn test_target_port_by_type() {
        let service = Service::new("ns-1", "svc-1");
        let named = ServicePort::new(Some("http"), 80, "web".into()).with_node_port(32768);
        let numbered = ServicePort::new(None, 80, 8080.into());

        assert_eq!(target_port(&service, &named, TargetType::Instance).unwrap(), 32768);
        assert_eq!(target_port(&service, &named, TargetType::Ip).unwrap(), 1);
        assert_eq!(target_port(&service, &numbered, TargetType::Ip).unwrap(), 8080);
        assert!(matches!(
            target_port(&service, &numbered, TargetType::Instance),
            Err(StackError::NodePortNotAllocated { .. })
        ));
    }
}
