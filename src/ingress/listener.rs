//! Listeners and listener rules.

use std::collections::BTreeMap;

use super::listen_port::ListenPortConfig;
use super::rule_optimizer::{self, RuleDraft};
use super::ssl_redirect::SslRedirectConfig;
use super::task::{BuildTask, MemberContext};
use crate::domain::Rule;
use crate::errors::{Result, StackError};
use crate::model::elbv2::Certificate;
use crate::model::{Action, ListenerRuleSpec, ListenerSpec, RuleCondition};
use crate::naming::{self, LOAD_BALANCER_KEY};
use crate::stack::ResourceRef;

/// Path pattern of a rule that names neither host nor path
pub const MATCH_ALL_PATH: &str = "/*";

/// Match conditions for a rule: host-header and path-pattern when set.
pub fn rule_conditions(rule: &Rule) -> Vec<RuleCondition> {
    let mut conditions = Vec::with_capacity(2);
    if !rule.host.is_empty() {
        conditions.push(RuleCondition::host_header(rule.host.clone()));
    }
    if !rule.path.is_empty() {
        conditions.push(RuleCondition::path_pattern(rule.path.clone()));
    }
    if conditions.is_empty() {
        conditions.push(RuleCondition::path_pattern(MATCH_ALL_PATH));
    }
    conditions
}

impl BuildTask<'_> {
    pub(crate) fn build_listeners(
        &mut self,
        members: &[MemberContext<'_>],
        ports: &BTreeMap<i64, ListenPortConfig>,
        ssl_redirect: Option<&SslRedirectConfig>,
    ) -> Result<()> {
        for (&port, config) in ports {
            let redirect = ssl_redirect.filter(|redirect| redirect.ssl_port != port);
            let default_actions = match redirect {
                Some(redirect) => {
                    vec![Action::redirect_to_https(redirect.ssl_port, &redirect.status_code)]
                }
                None => self.default_actions(members, port)?,
            };

            let listener_key = naming::listener_key(port);
            self.stack.add(
                listener_key.clone(),
                ListenerSpec {
                    load_balancer_arn: ResourceRef::load_balancer_arn(LOAD_BALANCER_KEY).into(),
                    port,
                    protocol: config.protocol,
                    certificates: config
                        .certificate_arns
                        .iter()
                        .map(|arn| Certificate { certificate_arn: arn.clone() })
                        .collect(),
                    ssl_policy: config.ssl_policy.clone(),
                    default_actions,
                },
            )?;

            if redirect.is_none() {
                self.build_listener_rules(members, port, &listener_key)?;
            }
        }
        Ok(())
    }

    /// Default backend forward if Members listening on `port` declare one, else 404.
    fn default_actions(
        &mut self,
        members: &[MemberContext<'_>],
        port: i64,
    ) -> Result<Vec<Action>> {
        let mut chosen: Option<Action> = None;
        for ctx in members.iter().filter(|ctx| ctx.listens_on(port)) {
            let Some(backend) = &ctx.member.default_backend else {
                continue;
            };
            let action = self.forward_action(ctx, backend)?;
            match &chosen {
                Some(existing) if *existing != action => {
                    return Err(StackError::conflict(format!(
                        "conflicting default backend for listen port {}: {}",
                        port,
                        ctx.member.id()
                    )));
                }
                Some(_) => {}
                None => chosen = Some(action),
            }
        }
        Ok(vec![chosen.unwrap_or_else(Action::not_found)])
    }

    fn build_listener_rules(
        &mut self,
        members: &[MemberContext<'_>],
        port: i64,
        listener_key: &str,
    ) -> Result<()> {
        let mut drafts = Vec::new();
        for (index, ctx) in members.iter().enumerate() {
            if !ctx.listens_on(port) {
                continue;
            }
            for rule in &ctx.member.rules {
                drafts.push(RuleDraft::new(rule_conditions(rule), (index, &rule.backend)));
            }
        }

        for (position, draft) in rule_optimizer::optimize(drafts).into_iter().enumerate() {
            let (index, backend) = draft.target;
            let action = self.forward_action(&members[index], backend)?;
            let priority = position as i64 + 1;
            self.stack.add(
                naming::listener_rule_key(port, priority),
                ListenerRuleSpec {
                    listener_arn: ResourceRef::listener_arn(listener_key).into(),
                    priority,
                    actions: vec![action],
                    conditions: draft.conditions,
                },
            )?;
        }
        Ok(())
    }
}
