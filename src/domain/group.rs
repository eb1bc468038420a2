//! Ingress group input types
//!
//! A [`Group`] is the set of Ingress declarations sharing one load balancer. It is
//! assembled by the reconciliation layer and only read here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::annotations::Annotations;

/// Backend port literal reserved for `actions.<service>` annotations
pub const USE_ANNOTATION_PORT: &str = "use-annotation";

/// Identity of a group: namespace + name for implicit groups, bare name for explicit
/// cross-namespace groups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
}

impl GroupId {
    pub fn new<N: Into<String>, S: Into<String>>(namespace: N, name: S) -> Self {
        Self { namespace: namespace.into(), name: name.into() }
    }

    /// Explicit groups span namespaces and carry no namespace of their own
    pub fn explicit<S: Into<String>>(name: S) -> Self {
        Self { namespace: String::new(), name: name.into() }
    }

    pub fn is_explicit(&self) -> bool {
        self.namespace.is_empty()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_explicit() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Group {
    pub fn new(id: GroupId, members: Vec<Member>) -> Self {
        Self { id, members }
    }
}

/// One source Ingress declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Ingress-level default backend, served for requests no rule matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_backend: Option<BackendRef>,
}

impl Member {
    pub fn new<N: Into<String>, S: Into<String>>(namespace: N, name: S) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            annotations: Annotations::new(),
            rules: Vec::new(),
            default_backend: None,
        }
    }

    pub fn with_annotation<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_default_backend(mut self, backend: BackendRef) -> Self {
        self.default_backend = Some(backend);
        self
    }

    /// `namespace/name` of the source object
    pub fn id(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// A single host + path routing rule. Empty strings mean "any".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub path: String,
    pub backend: BackendRef,
}

impl Rule {
    pub fn new<H: Into<String>, P: Into<String>>(host: H, path: P, backend: BackendRef) -> Self {
        Self { host: host.into(), path: path.into(), backend }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendRef {
    pub service_name: String,
    pub service_port: PortSpecifier,
}

impl BackendRef {
    pub fn new<S: Into<String>>(service_name: S, service_port: PortSpecifier) -> Self {
        Self { service_name: service_name.into(), service_port }
    }

    pub fn uses_annotation(&self) -> bool {
        matches!(&self.service_port, PortSpecifier::Name(name) if name == USE_ANNOTATION_PORT)
    }
}

/// A port named or numbered exactly as written in the declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpecifier {
    Number(i32),
    Name(String),
}

impl PortSpecifier {
    pub fn name<S: Into<String>>(name: S) -> Self {
        PortSpecifier::Name(name.into())
    }

    /// Numeric strings become numbers, anything else stays a name
    pub fn parse(literal: &str) -> Self {
        match literal.parse::<i32>() {
            Ok(number) => PortSpecifier::Number(number),
            Err(_) => PortSpecifier::Name(literal.to_string()),
        }
    }
}

impl From<i32> for PortSpecifier {
    fn from(number: i32) -> Self {
        PortSpecifier::Number(number)
    }
}

impl From<&str> for PortSpecifier {
    fn from(name: &str) -> Self {
        PortSpecifier::Name(name.to_string())
    }
}

impl fmt::Display for PortSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSpecifier::Number(number) => write!(f, "{}", number),
            PortSpecifier::Name(name) => write!(f, "{}", name),
        }
    }
}
