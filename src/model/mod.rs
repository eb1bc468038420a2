//! Resource specs emitted into the stack.
//!
//! - `ec2`: the managed security group
//! - `elbv2`: load balancer, listeners, listener rules and target groups
//! - `binding`: target-group bindings back to Kubernetes Services

pub mod binding;
pub mod ec2;
pub mod elbv2;

pub use binding::TargetGroupBindingSpec;
pub use ec2::SecurityGroupSpec;
pub use elbv2::{
    Action, HealthCheckConfig, HealthCheckPort, IpAddressType, ListenerRuleSpec, ListenerSpec,
    LoadBalancerSpec, Protocol, ProtocolVersion, RuleCondition, Scheme, TargetGroupSpec,
    TargetType,
};
