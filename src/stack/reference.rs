//! Deferred references into resources that do not exist yet.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::ResourceKind;

/// "Field `field` of resource `kind`/`id`, once the deploy engine has created it."
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: String,
    pub field: &'static str,
}

impl ResourceRef {
    pub fn new<S: Into<String>>(kind: ResourceKind, id: S, field: &'static str) -> Self {
        Self { kind, id: id.into(), field }
    }

    pub fn security_group_id<S: Into<String>>(id: S) -> Self {
        Self::new(ResourceKind::SecurityGroup, id, "groupID")
    }

    pub fn load_balancer_arn<S: Into<String>>(id: S) -> Self {
        Self::new(ResourceKind::LoadBalancer, id, "loadBalancerARN")
    }

    pub fn listener_arn<S: Into<String>>(id: S) -> Self {
        Self::new(ResourceKind::Listener, id, "listenerARN")
    }

    pub fn target_group_arn<S: Into<String>>(id: S) -> Self {
        Self::new(ResourceKind::TargetGroup, id, "targetGroupARN")
    }

    /// Pointer expression into the stack document, e.g.
    /// `#/resources/AWS::EC2::SecurityGroup/ManagedLBSecurityGroup/status/groupID`
    pub fn pointer(&self) -> String {
        format!("#/resources/{}/{}/status/{}", self.kind.as_str(), self.id, self.field)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pointer())
    }
}

impl Serialize for ResourceRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$ref", &self.pointer())?;
        map.end()
    }
}

/// A resource attribute that is either known now or resolved later from another
/// resource's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred<T> {
    Value(T),
    Ref(ResourceRef),
}

impl<T> Deferred<T> {
    pub fn reference(&self) -> Option<&ResourceRef> {
        match self {
            Deferred::Ref(reference) => Some(reference),
            Deferred::Value(_) => None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Deferred::Value(value) => Some(value),
            Deferred::Ref(_) => None,
        }
    }
}

impl<T> From<ResourceRef> for Deferred<T> {
    fn from(reference: ResourceRef) -> Self {
        Deferred::Ref(reference)
    }
}

impl From<String> for Deferred<String> {
    fn from(value: String) -> Self {
        Deferred::Value(value)
    }
}

impl From<&str> for Deferred<String> {
    fn from(value: &str) -> Self {
        Deferred::Value(value.to_string())
    }
}

impl<T: Serialize> Serialize for Deferred<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Deferred::Value(value) => value.serialize(serializer),
            Deferred::Ref(reference) => reference.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_pointer() {
        let reference = ResourceRef::target_group_arn("ns-1/ing-1-svc-1:http");
        assert_eq!(
            reference.pointer(),
            "#/resources/AWS::ElasticLoadBalancingV2::TargetGroup/ns-1/ing-1-svc-1:http/status/targetGroupARN"
        );
    }

    #[test]
    fn test_deferred_serialization() {
        let value: Deferred<String> = "sg-123".into();
        let reference: Deferred<String> =
            ResourceRef::security_group_id("ManagedLBSecurityGroup").into();
        assert_eq!(serde_json::to_value(&value).unwrap(), json!("sg-123"));
        assert_eq!(
            serde_json::to_value(&reference).unwrap(),
            json!({"$ref": "#/resources/AWS::EC2::SecurityGroup/ManagedLBSecurityGroup/status/groupID"})
        );
        assert!(value.reference().is_none());
        assert_eq!(reference.reference().map(|r| r.field), Some("groupID"));
    }
}
