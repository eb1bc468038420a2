//! Exposed ports and their per-port listener settings.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::task::{BuildTask, MemberContext};
use crate::annotations::IngressAnnotations;
use crate::errors::{Result, StackError};
use crate::model::Protocol;

/// Merged settings of one exposed port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenPortConfig {
    pub protocol: Protocol,
    /// Set for HTTPS ports only
    pub ssl_policy: Option<String>,
    pub certificate_arns: Vec<String>,
}

impl ListenPortConfig {
    pub fn new(protocol: Protocol) -> Self {
        Self { protocol, ssl_policy: None, certificate_arns: Vec::new() }
    }
}

/// Ports a single Member asks for: explicit `listen-ports`, else HTTPS:443 when
/// certificates are annotated, else HTTP:80.
pub(crate) fn member_listen_ports(annotations: &IngressAnnotations) -> Vec<(Protocol, i64)> {
    match (&annotations.listen_ports, &annotations.certificate_arns) {
        (Some(ports), _) => ports.clone(),
        (None, Some(_)) => vec![(Protocol::Https, 443)],
        (None, None) => vec![(Protocol::Http, 80)],
    }
}

impl BuildTask<'_> {
    pub(crate) fn build_listen_port_configs(
        &self,
        members: &[MemberContext<'_>],
    ) -> Result<BTreeMap<i64, ListenPortConfig>> {
        let mut configs: BTreeMap<i64, ListenPortConfig> = BTreeMap::new();
        let mut discovery_ports: BTreeSet<i64> = BTreeSet::new();
        let mut discovery_hosts: BTreeSet<String> = BTreeSet::new();

        for ctx in members {
            for (protocol, port) in &ctx.listen_ports {
                let config =
                    configs.entry(*port).or_insert_with(|| ListenPortConfig::new(*protocol));
                if config.protocol != *protocol {
                    return Err(StackError::conflict(format!(
                        "conflicting protocol for listen port {}: {} and {}",
                        port, config.protocol, protocol
                    )));
                }
                if *protocol != Protocol::Https {
                    continue;
                }

                if let Some(policy) = &ctx.annotations.ssl_policy {
                    match &config.ssl_policy {
                        Some(existing) if existing != policy => {
                            return Err(StackError::conflict(format!(
                                "conflicting sslPolicy for listen port {}: {} and {}",
                                port, existing, policy
                            )));
                        }
                        _ => config.ssl_policy = Some(policy.clone()),
                    }
                }

                match &ctx.annotations.certificate_arns {
                    Some(arns) => {
                        for arn in arns {
                            if !config.certificate_arns.contains(arn) {
                                config.certificate_arns.push(arn.clone());
                            }
                        }
                    }
                    None => {
                        discovery_ports.insert(*port);
                        discovery_hosts.extend(
                            ctx.member
                                .rules
                                .iter()
                                .filter(|rule| !rule.host.is_empty())
                                .map(|rule| rule.host.clone()),
                        );
                    }
                }
            }
        }

        if !discovery_ports.is_empty() && !discovery_hosts.is_empty() {
            let hosts: Vec<String> = discovery_hosts.into_iter().collect();
            let discovered = self
                .builder
                .certificate_resolver
                .resolve_certificates(&hosts)
                .map_err(|e| StackError::resolver("certificate", e))?;
            debug!(hosts = ?hosts, certificates = ?discovered, "discovered certificates");
            for port in &discovery_ports {
                if let Some(config) = configs.get_mut(port) {
                    for arn in &discovered {
                        if !config.certificate_arns.contains(arn) {
                            config.certificate_arns.push(arn.clone());
                        }
                    }
                }
            }
        }

        for (port, config) in configs.iter_mut() {
            if config.protocol != Protocol::Https {
                continue;
            }
            if config.certificate_arns.is_empty() {
                return Err(StackError::MissingCertificate { port: *port });
            }
            if config.ssl_policy.is_none() {
                config.ssl_policy = Some(self.builder.config.default_ssl_policy.clone());
            }
        }

        Ok(configs)
    }
}
