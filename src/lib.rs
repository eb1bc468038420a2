//! # Ingress Stack
//!
//! Compiles a group of Kubernetes Ingress declarations that share one Application
//! Load Balancer into a self-contained, cross-referenced resource stack. The stack is
//! a desired-state document for an external deploy engine: attributes that only exist
//! once a resource is created are expressed as deferred references into that
//! resource's future status.
//!
//! ## Architecture
//!
//! ```text
//! Group + Services → ModelBuilder → StackBuilder → Stack → JSON document
//!                        ↓
//!          Subnet / Certificate resolvers
//! ```
//!
//! ## Core Components
//!
//! - **Annotations**: typed access to the prefixed annotation maps
//! - **Naming**: stable and settings-hash names for cloud resources
//! - **Model builder**: security group, load balancer, listeners, rules, target groups
//!   and their bindings
//! - **Stack**: the resource graph with reference checking and deploy ordering
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ingress_stack::resolvers::{StaticCertificateResolver, StaticSubnetResolver};
//! use ingress_stack::{BuilderConfig, Group, ModelBuilder, Result, ServiceStore};
//!
//! fn compile(group: &Group, services: &ServiceStore) -> Result<String> {
//!     let builder = ModelBuilder::new(
//!         BuilderConfig::from_env()?,
//!         Arc::new(StaticSubnetResolver::new()),
//!         Arc::new(StaticCertificateResolver::new()),
//!     )?;
//!     builder.build(group, services)?.to_json()
//! }
//! ```

pub mod annotations;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ingress;
pub mod model;
pub mod naming;
pub mod observability;
pub mod resolvers;
pub mod stack;

// Re-export commonly used types and traits
pub use config::{BuilderConfig, LoggingConfig};
pub use domain::{BackendRef, Group, GroupId, Member, Rule, Service, ServicePort, ServiceStore};
pub use errors::{Result, StackError};
pub use ingress::ModelBuilder;
pub use observability::init_logging;
pub use stack::{Stack, StackBuilder};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
