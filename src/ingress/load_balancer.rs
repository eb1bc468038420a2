//! The group's load balancer and the settings every Member must agree on.

use std::collections::BTreeMap;
use std::fmt::Display;

use tracing::debug;

use super::task::{BuildTask, MemberContext};
use crate::errors::{Result, StackError};
use crate::model::elbv2::{attributes_from_map, LoadBalancerType, SubnetMapping};
use crate::model::{IpAddressType, LoadBalancerSpec, Scheme};
use crate::naming::LOAD_BALANCER_KEY;
use crate::stack::ResourceRef;

/// Load balancer settings merged across all Members of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadBalancerSettings {
    pub scheme: Scheme,
    pub ip_address_type: IpAddressType,
    /// Explicit subnets; empty means discover by scheme
    pub subnets: Vec<String>,
    pub name: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub inbound_cidrs: Vec<String>,
}

/// Keep the first explicit value; a different later value is a conflict.
fn merge_explicit<T>(what: &str, merged: &mut Option<T>, value: Option<&T>) -> Result<()>
where
    T: Clone + PartialEq + std::fmt::Debug,
{
    let Some(value) = value else {
        return Ok(());
    };
    match merged {
        Some(existing) if existing != value => Err(StackError::conflict(format!(
            "conflicting {}: {:?} and {:?}",
            what, existing, value
        ))),
        Some(_) => Ok(()),
        None => {
            *merged = Some(value.clone());
            Ok(())
        }
    }
}

fn merge_map<V>(
    what: &str,
    merged: &mut BTreeMap<String, V>,
    values: &BTreeMap<String, V>,
) -> Result<()>
where
    V: Clone + PartialEq + Display,
{
    for (key, value) in values {
        match merged.get(key) {
            Some(existing) if existing != value => {
                return Err(StackError::conflict(format!(
                    "conflicting {} {}: {} and {}",
                    what, key, existing, value
                )));
            }
            Some(_) => {}
            None => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(())
}

impl BuildTask<'_> {
    pub(crate) fn merge_load_balancer_settings(
        &self,
        members: &[MemberContext<'_>],
    ) -> Result<LoadBalancerSettings> {
        let config = &self.builder.config;
        let mut scheme = None;
        let mut ip_address_type = None;
        let mut subnets: Option<Vec<String>> = None;
        let mut name = None;
        let mut attributes = BTreeMap::new();
        let mut annotated_tags = BTreeMap::new();
        let mut inbound_cidrs: Vec<String> = Vec::new();

        for ctx in members {
            let annotations = &ctx.annotations;
            merge_explicit("scheme", &mut scheme, annotations.scheme.as_ref())?;
            merge_explicit(
                "ip address type",
                &mut ip_address_type,
                annotations.ip_address_type.as_ref(),
            )?;
            merge_explicit("subnets", &mut subnets, annotations.subnets.as_ref())?;
            merge_explicit(
                "load balancer name",
                &mut name,
                annotations.load_balancer_name.as_ref(),
            )?;
            merge_map(
                "load balancer attribute",
                &mut attributes,
                &annotations.load_balancer_attributes,
            )?;
            merge_map("tag", &mut annotated_tags, &annotations.tags)?;
            for cidr in &annotations.inbound_cidrs {
                if !inbound_cidrs.contains(cidr) {
                    inbound_cidrs.push(cidr.clone());
                }
            }
        }

        let mut tags = config.default_tags.clone();
        tags.extend(annotated_tags);

        Ok(LoadBalancerSettings {
            scheme: scheme.unwrap_or(config.default_scheme),
            ip_address_type: ip_address_type.unwrap_or(config.default_ip_address_type),
            subnets: subnets.unwrap_or_default(),
            name,
            attributes,
            tags,
            inbound_cidrs,
        })
    }

    pub(crate) fn build_load_balancer(
        &mut self,
        settings: &LoadBalancerSettings,
        security_group: ResourceRef,
    ) -> Result<()> {
        let subnets = self
            .builder
            .subnet_resolver
            .resolve_subnets(settings.scheme, &settings.subnets)
            .map_err(|e| StackError::resolver("subnet", e))?;

        let name = match &settings.name {
            Some(name) => name.clone(),
            None => self.builder.namer.load_balancer_name(&self.group.id, settings.scheme),
        };
        debug!(
            name = %name,
            scheme = %settings.scheme,
            subnets = subnets.len(),
            "resolved load balancer"
        );

        self.stack.add(
            LOAD_BALANCER_KEY,
            LoadBalancerSpec {
                name,
                lb_type: LoadBalancerType::Application,
                scheme: settings.scheme,
                ip_address_type: settings.ip_address_type,
                subnet_mapping: subnets
                    .into_iter()
                    .map(|subnet_id| SubnetMapping { subnet_id })
                    .collect(),
                security_groups: vec![security_group.into()],
                load_balancer_attributes: attributes_from_map(&settings.attributes),
                tags: settings.tags.clone(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_explicit_keeps_first() {
        let mut merged = None;
        merge_explicit("scheme", &mut merged, None).unwrap();
        merge_explicit("scheme", &mut merged, Some(&Scheme::InternetFacing)).unwrap();
        merge_explicit("scheme", &mut merged, Some(&Scheme::InternetFacing)).unwrap();
        assert_eq!(merged, Some(Scheme::InternetFacing));

        let err = merge_explicit("scheme", &mut merged, Some(&Scheme::Internal)).unwrap_err();
        assert!(matches!(err, StackError::Conflict(_)));
        assert!(err.to_string().contains("conflicting scheme"));
    }

    #[test]
    fn test_merge_map_rejects_differing_values() {
        let mut merged = BTreeMap::from([("team".to_string(), "a".to_string())]);
        let same = BTreeMap::from([("team".to_string(), "a".to_string())]);
        merge_map("tag", &mut merged, &same).unwrap();

        let extra = BTreeMap::from([("env".to_string(), "prod".to_string())]);
        merge_map("tag", &mut merged, &extra).unwrap();
        assert_eq!(merged.len(), 2);

        let other = BTreeMap::from([("team".to_string(), "b".to_string())]);
        let err = merge_map("tag", &mut merged, &other).unwrap_err();
        assert!(err.to_string().contains("conflicting tag team: a and b"));
    }
}
