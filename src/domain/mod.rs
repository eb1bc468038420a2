//! Domain layer
//!
//! Input entities consumed read-only by the stack builder: the Ingress group with
//! its members and rules, and the Services those rules point at.

pub mod group;
pub mod service;

pub use group::{BackendRef, Group, GroupId, Member, PortSpecifier, Rule, USE_ANNOTATION_PORT};
pub use service::{Service, ServicePort, ServiceSource, ServiceStore};
