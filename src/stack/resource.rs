use std::fmt;

use serde::{Serialize, Serializer};

use super::ResourceRef;
use crate::model::{
    Action, ListenerRuleSpec, ListenerSpec, LoadBalancerSpec, SecurityGroupSpec,
    TargetGroupBindingSpec, TargetGroupSpec,
};

/// Resource kinds a stack can hold, in the order the deploy engine lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    SecurityGroup,
    LoadBalancer,
    Listener,
    ListenerRule,
    TargetGroup,
    TargetGroupBinding,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::SecurityGroup,
        ResourceKind::LoadBalancer,
        ResourceKind::Listener,
        ResourceKind::ListenerRule,
        ResourceKind::TargetGroup,
        ResourceKind::TargetGroupBinding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::SecurityGroup => "AWS::EC2::SecurityGroup",
            ResourceKind::LoadBalancer => "AWS::ElasticLoadBalancingV2::LoadBalancer",
            ResourceKind::Listener => "AWS::ElasticLoadBalancingV2::Listener",
            ResourceKind::ListenerRule => "AWS::ElasticLoadBalancingV2::ListenerRule",
            ResourceKind::TargetGroup => "AWS::ElasticLoadBalancingV2::TargetGroup",
            ResourceKind::TargetGroupBinding => "K8S::ElasticLoadBalancingV2::TargetGroupBinding",
        }
    }

    /// Status field other resources may reference, if any
    pub fn status_field(&self) -> Option<&'static str> {
        match self {
            ResourceKind::SecurityGroup => Some("groupID"),
            ResourceKind::LoadBalancer => Some("loadBalancerARN"),
            ResourceKind::Listener => Some("listenerARN"),
            ResourceKind::TargetGroup => Some("targetGroupARN"),
            ResourceKind::ListenerRule | ResourceKind::TargetGroupBinding => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind plus internal key: the identity of one resource inside a stack.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub key: String,
}

impl ResourceId {
    pub fn new<S: Into<String>>(kind: ResourceKind, key: S) -> Self {
        Self { kind, key: key.into() }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.key)
    }
}

impl From<&ResourceRef> for ResourceId {
    fn from(reference: &ResourceRef) -> Self {
        ResourceId::new(reference.kind, reference.id.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    SecurityGroup(SecurityGroupSpec),
    LoadBalancer(LoadBalancerSpec),
    Listener(ListenerSpec),
    ListenerRule(ListenerRuleSpec),
    TargetGroup(TargetGroupSpec),
    TargetGroupBinding(TargetGroupBindingSpec),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::SecurityGroup(_) => ResourceKind::SecurityGroup,
            Resource::LoadBalancer(_) => ResourceKind::LoadBalancer,
            Resource::Listener(_) => ResourceKind::Listener,
            Resource::ListenerRule(_) => ResourceKind::ListenerRule,
            Resource::TargetGroup(_) => ResourceKind::TargetGroup,
            Resource::TargetGroupBinding(_) => ResourceKind::TargetGroupBinding,
        }
    }

    /// Every deferred reference held by this resource's spec
    pub fn dependencies(&self) -> Vec<&ResourceRef> {
        match self {
            Resource::SecurityGroup(_) | Resource::TargetGroup(_) => Vec::new(),
            Resource::LoadBalancer(spec) => {
                spec.security_groups.iter().filter_map(|sg| sg.reference()).collect()
            }
            Resource::Listener(spec) => spec
                .load_balancer_arn
                .reference()
                .into_iter()
                .chain(action_dependencies(&spec.default_actions))
                .collect(),
            Resource::ListenerRule(spec) => spec
                .listener_arn
                .reference()
                .into_iter()
                .chain(action_dependencies(&spec.actions))
                .collect(),
            Resource::TargetGroupBinding(binding) => {
                let spec = &binding.template.spec;
                spec.target_group_arn
                    .reference()
                    .into_iter()
                    .chain(
                        spec.networking
                            .ingress
                            .iter()
                            .flat_map(|rule| rule.from.iter())
                            .filter_map(|peer| peer.security_group.group_id.reference()),
                    )
                    .collect()
            }
        }
    }

    pub fn as_security_group(&self) -> Option<&SecurityGroupSpec> {
        match self {
            Resource::SecurityGroup(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_load_balancer(&self) -> Option<&LoadBalancerSpec> {
        match self {
            Resource::LoadBalancer(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_listener(&self) -> Option<&ListenerSpec> {
        match self {
            Resource::Listener(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_listener_rule(&self) -> Option<&ListenerRuleSpec> {
        match self {
            Resource::ListenerRule(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_target_group(&self) -> Option<&TargetGroupSpec> {
        match self {
            Resource::TargetGroup(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_target_group_binding(&self) -> Option<&TargetGroupBindingSpec> {
        match self {
            Resource::TargetGroupBinding(spec) => Some(spec),
            _ => None,
        }
    }
}

fn action_dependencies<'a>(actions: &'a [Action]) -> impl Iterator<Item = &'a ResourceRef> {
    actions.iter().flat_map(|action| action.target_groups()).filter_map(|tg| tg.reference())
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Resource::SecurityGroup(spec) => spec.serialize(serializer),
            Resource::LoadBalancer(spec) => spec.serialize(serializer),
            Resource::Listener(spec) => spec.serialize(serializer),
            Resource::ListenerRule(spec) => spec.serialize(serializer),
            Resource::TargetGroup(spec) => spec.serialize(serializer),
            Resource::TargetGroupBinding(spec) => spec.serialize(serializer),
        }
    }
}

macro_rules! impl_from_spec {
    ($($variant:ident($spec:ty)),+ $(,)?) => {
        $(
            impl From<$spec> for Resource {
                fn from(spec: $spec) -> Self {
                    Resource::$variant(spec)
                }
            }
        )+
    };
}

impl_from_spec!(
    SecurityGroup(SecurityGroupSpec),
    LoadBalancer(LoadBalancerSpec),
    Listener(ListenerSpec),
    ListenerRule(ListenerRuleSpec),
    TargetGroup(TargetGroupSpec),
    TargetGroupBinding(TargetGroupBindingSpec),
);
