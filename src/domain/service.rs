//! Kubernetes Services referenced by Ingress backends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::annotations::Annotations;
use crate::domain::PortSpecifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

impl Service {
    pub fn new<N: Into<String>, S: Into<String>>(namespace: N, name: S) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            annotations: Annotations::new(),
            ports: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: ServicePort) -> Self {
        self.ports.push(port);
        self
    }

    pub fn with_annotation<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Find the port a backend refers to: names match the port name, numbers match
    /// the service port number.
    pub fn find_port(&self, specifier: &PortSpecifier) -> Option<&ServicePort> {
        self.ports.iter().find(|port| match specifier {
            PortSpecifier::Name(name) => port.name.as_deref() == Some(name.as_str()),
            PortSpecifier::Number(number) => port.port == *number,
        })
    }

    pub fn id(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub port: i32,
    pub target_port: PortSpecifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_port: Option<i32>,
}

impl ServicePort {
    pub fn new(name: Option<&str>, port: i32, target_port: PortSpecifier) -> Self {
        Self { name: name.map(str::to_string), port, target_port, node_port: None }
    }

    pub fn with_node_port(mut self, node_port: i32) -> Self {
        self.node_port = Some(node_port);
        self
    }
}

/// Read access to Services, already fetched by the caller.
pub trait ServiceSource {
    fn get_service(&self, namespace: &str, name: &str) -> Option<&Service>;
}

/// In-memory service lookup keyed by namespace and name.
#[derive(Debug, Clone, Default)]
pub struct ServiceStore {
    services: BTreeMap<(String, String), Service>,
}

impl ServiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, service: Service) -> Option<Service> {
        self.services.insert((service.namespace.clone(), service.name.clone()), service)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl FromIterator<Service> for ServiceStore {
    fn from_iter<I: IntoIterator<Item = Service>>(iter: I) -> Self {
        let mut store = ServiceStore::new();
        for service in iter {
            store.insert(service);
        }
        store
    }
}

impl ServiceSource for ServiceStore {
    fn get_service(&self, namespace: &str, name: &str) -> Option<&Service> {
        self.services.get(&(namespace.to_string(), name.to_string()))
    }
}
