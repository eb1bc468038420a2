//! # Model Builder
//!
//! Compiles an Ingress [`Group`] into a [`Stack`]. The [`ModelBuilder`] is long-lived
//! and holds configuration and the two resolver collaborators; every call to
//! [`ModelBuilder::build`] runs a fresh build task that owns its own
//! [`StackBuilder`](crate::stack::StackBuilder) and returns an immutable stack or the
//! first error.
//!
//! Build order:
//! 1. parse each Member's annotations and sort Members canonically
//! 2. merge listen ports, discover certificates
//! 3. resolve the SSL redirect
//! 4. managed security group, then the load balancer
//! 5. listeners and listener rules, creating target groups and bindings on first use

pub mod backend;
pub mod listen_port;
pub mod listener;
pub mod load_balancer;
pub mod rule_optimizer;
pub mod security_group;
pub mod ssl_redirect;
pub mod target_group;
mod task;

use std::sync::Arc;

use crate::annotations::AnnotationParser;
use crate::config::BuilderConfig;
use crate::domain::{Group, ServiceSource};
use crate::errors::Result;
use crate::naming::ResourceNamer;
use crate::resolvers::{CertificateResolver, SubnetResolver};
use crate::stack::Stack;

pub use backend::{BackendAction, ServiceBackend, WeightedBackend};
pub use listen_port::ListenPortConfig;
pub use rule_optimizer::RuleDraft;
pub use ssl_redirect::SslRedirectConfig;

/// Builds resource stacks for Ingress groups.
pub struct ModelBuilder {
    config: BuilderConfig,
    parser: AnnotationParser,
    namer: ResourceNamer,
    subnet_resolver: Arc<dyn SubnetResolver>,
    certificate_resolver: Arc<dyn CertificateResolver>,
}

impl ModelBuilder {
    pub fn new(
        config: BuilderConfig,
        subnet_resolver: Arc<dyn SubnetResolver>,
        certificate_resolver: Arc<dyn CertificateResolver>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            parser: AnnotationParser::new(config.annotation_prefix.clone()),
            namer: ResourceNamer::new(config.name_prefix.clone()),
            config,
            subnet_resolver,
            certificate_resolver,
        })
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Compile `group` into a stack. Services are looked up through `services`; the
    /// subnet and certificate resolvers are each called at most once.
    pub fn build(&self, group: &Group, services: &dyn ServiceSource) -> Result<Stack> {
        let span = crate::build_span!(group.id, members = group.members.len());
        let _guard = span.enter();
        task::BuildTask::new(self, group, services).run()
    }
}

impl std::fmt::Debug for ModelBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBuilder")
            .field("config", &self.config)
            .field("parser", &self.parser)
            .field("namer", &self.namer)
            .finish_non_exhaustive()
    }
}
