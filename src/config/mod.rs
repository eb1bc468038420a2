//! # Configuration Management
//!
//! Builder defaults and logging settings, with environment overrides under the
//! `INGRESS_STACK_` prefix.

pub mod settings;

pub use settings::{BuilderConfig, LoggingConfig, DEFAULT_SSL_POLICY};
