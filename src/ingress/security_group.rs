//! The managed front-door security group.
//!
//! Ingress rules follow the listener ports only. Load balancer to pod traffic is
//! granted separately by each target-group binding.

use std::collections::BTreeMap;

use tracing::debug;

use super::listen_port::ListenPortConfig;
use super::load_balancer::LoadBalancerSettings;
use super::task::BuildTask;
use crate::errors::Result;
use crate::model::ec2::IpPermission;
use crate::model::{IpAddressType, SecurityGroupSpec};
use crate::naming::SECURITY_GROUP_KEY;
use crate::stack::ResourceRef;

pub const MANAGED_SG_DESCRIPTION: &str = "[k8s] Managed SecurityGroup for LoadBalancer";

pub const DEFAULT_IPV4_CIDR: &str = "0.0.0.0/0";
pub const DEFAULT_IPV6_CIDR: &str = "::/0";

/// Source ranges: annotated CIDRs, else everything for the address families in use.
pub fn source_cidrs(inbound_cidrs: &[String], ip_address_type: IpAddressType) -> Vec<String> {
    if !inbound_cidrs.is_empty() {
        return inbound_cidrs.to_vec();
    }
    match ip_address_type {
        IpAddressType::Ipv4 => vec![DEFAULT_IPV4_CIDR.to_string()],
        IpAddressType::Dualstack => {
            vec![DEFAULT_IPV4_CIDR.to_string(), DEFAULT_IPV6_CIDR.to_string()]
        }
    }
}

impl BuildTask<'_> {
    pub(crate) fn build_managed_security_group(
        &mut self,
        ports: &BTreeMap<i64, ListenPortConfig>,
        settings: &LoadBalancerSettings,
    ) -> Result<ResourceRef> {
        let cidrs = source_cidrs(&settings.inbound_cidrs, settings.ip_address_type);
        let ingress: Vec<IpPermission> =
            ports.keys().map(|&port| IpPermission::tcp_port(port, &cidrs)).collect();
        debug!(ports = ingress.len(), cidrs = cidrs.len(), "built managed security group");

        self.stack.add(
            SECURITY_GROUP_KEY,
            SecurityGroupSpec {
                group_name: self.builder.namer.security_group_name(&self.group.id),
                description: MANAGED_SG_DESCRIPTION.to_string(),
                ingress,
                tags: settings.tags.clone(),
            },
        )?;
        Ok(ResourceRef::security_group_id(SECURITY_GROUP_KEY))
    }
}
