//! # Resource Graph
//!
//! A [`Stack`] is the immutable output of one build: resources keyed by kind and
//! internal key, cross-linked through [`Deferred`] attributes. It is assembled through
//! a [`StackBuilder`] local to the build, which rejects duplicate keys and, on
//! [`StackBuilder::build`], dangling or cyclic references.

pub mod reference;
pub mod resource;

use std::collections::{BTreeMap, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::errors::{Result, StackError};

pub use reference::{Deferred, ResourceRef};
pub use resource::{Resource, ResourceId, ResourceKind};

type ResourceTable = BTreeMap<ResourceKind, BTreeMap<String, Resource>>;

/// Accumulates resources for a single build.
#[derive(Debug)]
pub struct StackBuilder {
    id: String,
    resources: ResourceTable,
}

impl StackBuilder {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self { id: id.into(), resources: BTreeMap::new() }
    }

    /// Add a resource under `key`. A key may be used once per kind; reuse is a
    /// contract violation.
    pub fn add<K: Into<String>, R: Into<Resource>>(&mut self, key: K, resource: R) -> Result<()> {
        let key = key.into();
        let resource = resource.into();
        let kind = resource.kind();
        let table = self.resources.entry(kind).or_default();
        if table.contains_key(&key) {
            return Err(StackError::internal(format!(
                "duplicate resource key {} for {}",
                key, kind
            )));
        }
        debug!(kind = %kind, key = %key, "added resource to stack");
        table.insert(key, resource);
        Ok(())
    }

    pub fn contains(&self, kind: ResourceKind, key: &str) -> bool {
        self.resources.get(&kind).is_some_and(|table| table.contains_key(key))
    }

    pub fn get(&self, kind: ResourceKind, key: &str) -> Option<&Resource> {
        self.resources.get(&kind).and_then(|table| table.get(key))
    }

    pub fn len(&self) -> usize {
        self.resources.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate every reference and freeze the stack.
    pub fn build(self) -> Result<Stack> {
        let mut graph: DiGraph<ResourceId, ()> = DiGraph::new();
        let mut nodes: HashMap<ResourceId, NodeIndex> = HashMap::new();

        for (kind, table) in &self.resources {
            for key in table.keys() {
                let id = ResourceId::new(*kind, key.clone());
                let index = graph.add_node(id.clone());
                nodes.insert(id, index);
            }
        }

        for (kind, table) in &self.resources {
            for (key, resource) in table {
                let dependent = nodes[&ResourceId::new(*kind, key.clone())];
                for reference in resource.dependencies() {
                    if reference.kind.status_field() != Some(reference.field) {
                        return Err(StackError::internal(format!(
                            "{}/{} references unknown status field {}",
                            kind, key, reference
                        )));
                    }
                    let target = nodes.get(&ResourceId::from(reference)).ok_or_else(|| {
                        StackError::internal(format!(
                            "{}/{} references missing resource {}",
                            kind, key, reference
                        ))
                    })?;
                    graph.update_edge(*target, dependent, ());
                }
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            StackError::internal(format!(
                "reference cycle through {}",
                graph[cycle.node_id()]
            ))
        })?;
        let order = order.into_iter().map(|index| graph[index].clone()).collect();

        Ok(Stack { id: self.id, resources: self.resources, order })
    }
}

/// Built resource graph for one group.
#[derive(Debug, Clone)]
pub struct Stack {
    id: String,
    resources: ResourceTable,
    order: Vec<ResourceId>,
}

impl Stack {
    /// Group identity the stack was built for
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, kind: ResourceKind, key: &str) -> Option<&Resource> {
        self.resources.get(&kind).and_then(|table| table.get(key))
    }

    /// Resources of one kind ordered by key
    pub fn resources_of(&self, kind: ResourceKind) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources
            .get(&kind)
            .into_iter()
            .flat_map(|table| table.iter().map(|(key, resource)| (key.as_str(), resource)))
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.resources.get(&kind).map_or(0, BTreeMap::len)
    }

    pub fn len(&self) -> usize {
        self.resources.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every resource, referenced resources before the resources referencing them.
    pub fn topological_order(&self) -> &[ResourceId] {
        &self.order
    }

    pub fn to_document(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| StackError::serialization(e, "stack document"))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| StackError::serialization(e, "stack json"))
    }
}

struct ResourceEntry<'a> {
    spec: &'a Resource,
}

impl Serialize for ResourceEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("spec", self.spec)?;
        map.end()
    }
}

impl Serialize for Stack {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let resources: BTreeMap<&str, BTreeMap<&str, ResourceEntry<'_>>> = self
            .resources
            .iter()
            .filter(|(_, table)| !table.is_empty())
            .map(|(kind, table)| {
                let entries = table
                    .iter()
                    .map(|(key, spec)| (key.as_str(), ResourceEntry { spec }))
                    .collect();
                (kind.as_str(), entries)
            })
            .collect();

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("resources", &resources)?;
        map.end()
    }
}
