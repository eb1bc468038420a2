//! Backend resolution: a rule's backend reference plus any `actions.<name>`
//! annotation, turned into a closed set of forward shapes.

use crate::annotations::{keys, AnnotationError, AnnotationParser, IngressAnnotations};
use crate::domain::{BackendRef, Member, PortSpecifier};
use crate::errors::{Result, StackError};
use crate::model::elbv2::{ForwardActionConfig, TargetGroupTuple};
use crate::model::Action;

use super::task::{BuildTask, MemberContext};

/// A Service port in the Member's namespace, named exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceBackend {
    pub namespace: String,
    pub name: String,
    pub port: PortSpecifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedBackend {
    pub backend: ServiceBackend,
    pub weight: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendAction {
    Forward(ServiceBackend),
    WeightedForward(Vec<WeightedBackend>),
}

impl BackendAction {
    pub fn backends(&self) -> Vec<&ServiceBackend> {
        match self {
            BackendAction::Forward(backend) => vec![backend],
            BackendAction::WeightedForward(targets) => targets.iter().map(|t| &t.backend).collect(),
        }
    }
}

/// Resolve `backend` as declared on `member`.
///
/// A `use-annotation` port defers to the `actions.<service-name>` annotation; port
/// literals inside the annotation are read as numbers when they parse as one.
pub fn resolve_backend(
    parser: &AnnotationParser,
    member: &Member,
    annotations: &IngressAnnotations,
    backend: &BackendRef,
) -> Result<BackendAction> {
    if !backend.uses_annotation() {
        return Ok(BackendAction::Forward(ServiceBackend {
            namespace: member.namespace.clone(),
            name: backend.service_name.clone(),
            port: backend.service_port.clone(),
        }));
    }

    let suffix = format!("{}{}", keys::ACTIONS_PREFIX, backend.service_name);
    let action = annotations.actions.get(&backend.service_name).ok_or_else(|| {
        StackError::annotation(member.id(), AnnotationError::missing(parser.key(&suffix)))
    })?;
    let targets =
        action.forward_config.as_ref().map(|c| c.target_groups.as_slice()).unwrap_or_default();

    let mut weighted = Vec::with_capacity(targets.len());
    for target in targets {
        let port = match &target.service_port {
            PortSpecifier::Name(literal) => PortSpecifier::parse(literal),
            number => number.clone(),
        };
        let nested = BackendRef::new(target.service_name.clone(), port.clone());
        if nested.uses_annotation() {
            return Err(StackError::annotation(
                member.id(),
                AnnotationError::invalid(
                    parser.key(&suffix),
                    &target.service_name,
                    "weighted targets cannot defer to another action",
                ),
            ));
        }
        weighted.push(WeightedBackend {
            backend: ServiceBackend {
                namespace: member.namespace.clone(),
                name: target.service_name.clone(),
                port,
            },
            weight: target.weight,
        });
    }
    Ok(BackendAction::WeightedForward(weighted))
}

impl BuildTask<'_> {
    /// Forward action for `backend`, creating its target groups on first use.
    pub(crate) fn forward_action(
        &mut self,
        ctx: &MemberContext<'_>,
        backend: &BackendRef,
    ) -> Result<Action> {
        let resolved =
            resolve_backend(&self.builder.parser, ctx.member, &ctx.annotations, backend)?;

        let target_groups = match resolved {
            BackendAction::Forward(service) => {
                let arn = self.build_target_group(ctx, &service)?;
                vec![TargetGroupTuple { target_group_arn: arn.into(), weight: None }]
            }
            BackendAction::WeightedForward(targets) => {
                let mut tuples = Vec::with_capacity(targets.len());
                for target in targets {
                    let arn = self.build_target_group(ctx, &target.backend)?;
                    tuples.push(TargetGroupTuple {
                        target_group_arn: arn.into(),
                        weight: target.weight,
                    });
                }
                tuples
            }
        };

        Ok(Action::Forward { forward_config: ForwardActionConfig { target_groups } })
    }
}
