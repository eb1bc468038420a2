use tracing::info;

use super::listen_port::member_listen_ports;
use super::ssl_redirect::resolve_ssl_redirect;
use super::ModelBuilder;
use crate::annotations::IngressAnnotations;
use crate::domain::{Group, Member, ServiceSource};
use crate::errors::{Result, StackError};
use crate::model::Protocol;
use crate::stack::{ResourceKind, Stack, StackBuilder};

/// A Member with its annotations already parsed.
#[derive(Debug)]
pub(crate) struct MemberContext<'a> {
    pub member: &'a Member,
    pub annotations: IngressAnnotations,
    pub listen_ports: Vec<(Protocol, i64)>,
}

impl MemberContext<'_> {
    pub fn listens_on(&self, port: i64) -> bool {
        self.listen_ports.iter().any(|(_, p)| *p == port)
    }
}

/// State for one invocation of [`ModelBuilder::build`].
pub(crate) struct BuildTask<'a> {
    pub builder: &'a ModelBuilder,
    pub group: &'a Group,
    pub services: &'a dyn ServiceSource,
    pub stack: StackBuilder,
}

impl<'a> BuildTask<'a> {
    pub fn new(
        builder: &'a ModelBuilder,
        group: &'a Group,
        services: &'a dyn ServiceSource,
    ) -> Self {
        Self { builder, group, services, stack: StackBuilder::new(group.id.to_string()) }
    }

    pub fn run(mut self) -> Result<Stack> {
        let members = self.load_members()?;

        let ports = self.build_listen_port_configs(&members)?;
        let requested = members.iter().filter_map(|m| m.annotations.ssl_redirect);
        let ssl_redirect = resolve_ssl_redirect(requested, &ports)?;
        let settings = self.merge_load_balancer_settings(&members)?;

        let security_group = self.build_managed_security_group(&ports, &settings)?;
        self.build_load_balancer(&settings, security_group)?;
        self.build_listeners(&members, &ports, ssl_redirect.as_ref())?;

        let stack = self.stack.build()?;
        info!(
            group = %self.group.id,
            resources = stack.len(),
            listeners = stack.count(ResourceKind::Listener),
            rules = stack.count(ResourceKind::ListenerRule),
            target_groups = stack.count(ResourceKind::TargetGroup),
            "built resource stack"
        );
        Ok(stack)
    }

    /// Parse annotations and order Members by group order, then namespace and name.
    fn load_members(&self) -> Result<Vec<MemberContext<'a>>> {
        let mut members = self
            .group
            .members
            .iter()
            .map(|member| {
                let annotations =
                    IngressAnnotations::resolve(&self.builder.parser, &member.annotations)
                        .map_err(|e| StackError::annotation(member.id(), e))?;
                let listen_ports = member_listen_ports(&annotations);
                Ok(MemberContext { member, annotations, listen_ports })
            })
            .collect::<Result<Vec<_>>>()?;

        members.sort_by(|a, b| {
            (a.annotations.group_order, &a.member.namespace, &a.member.name).cmp(&(
                b.annotations.group_order,
                &b.member.namespace,
                &b.member.name,
            ))
        });
        Ok(members)
    }
}
