//! # Configuration Settings
//!
//! Defaults the builder applies when annotations say nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::annotations::{keys, split_string_list};
use crate::errors::{Result, StackError};
use crate::model::{IpAddressType, Scheme, TargetType};

/// Default listener SSL policy for HTTPS ports
pub const DEFAULT_SSL_POLICY: &str = "ELBSecurityPolicy-2016-08";

/// Model builder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BuilderConfig {
    /// Annotation key prefix
    #[validate(length(min = 1, message = "Annotation prefix cannot be empty"))]
    pub annotation_prefix: String,

    /// Leading part of every generated cloud resource name
    #[validate(length(min = 1, max = 8, message = "Name prefix must be 1 to 8 characters"))]
    pub name_prefix: String,

    #[validate(length(min = 1, message = "SSL policy cannot be empty"))]
    pub default_ssl_policy: String,

    pub default_target_type: TargetType,
    pub default_scheme: Scheme,
    pub default_ip_address_type: IpAddressType,

    /// Tags applied to every taggable resource, overridden by annotation tags
    #[serde(default)]
    pub default_tags: BTreeMap<String, String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            annotation_prefix: keys::DEFAULT_PREFIX.to_string(),
            name_prefix: "k8s".to_string(),
            default_ssl_policy: DEFAULT_SSL_POLICY.to_string(),
            default_target_type: TargetType::Instance,
            default_scheme: Scheme::Internal,
            default_ip_address_type: IpAddressType::Ipv4,
            default_tags: BTreeMap::new(),
        }
    }
}

impl BuilderConfig {
    /// Create BuilderConfig from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create BuilderConfig from `INGRESS_STACK_*` values returned by `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let annotation_prefix =
            lookup("INGRESS_STACK_ANNOTATION_PREFIX").unwrap_or(defaults.annotation_prefix);
        let name_prefix = lookup("INGRESS_STACK_NAME_PREFIX").unwrap_or(defaults.name_prefix);
        let default_ssl_policy =
            lookup("INGRESS_STACK_DEFAULT_SSL_POLICY").unwrap_or(defaults.default_ssl_policy);

        let default_target_type = parse_var(&lookup, "INGRESS_STACK_DEFAULT_TARGET_TYPE")?
            .unwrap_or(defaults.default_target_type);
        let default_scheme =
            parse_var(&lookup, "INGRESS_STACK_DEFAULT_SCHEME")?.unwrap_or(defaults.default_scheme);
        let default_ip_address_type = parse_var(&lookup, "INGRESS_STACK_DEFAULT_IP_ADDRESS_TYPE")?
            .unwrap_or(defaults.default_ip_address_type);

        let default_tags = match lookup("INGRESS_STACK_DEFAULT_TAGS") {
            Some(raw) => parse_tags(&raw)?,
            None => defaults.default_tags,
        };

        Ok(Self {
            annotation_prefix,
            name_prefix,
            default_ssl_policy,
            default_target_type,
            default_scheme,
            default_ip_address_type,
            default_tags,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(StackError::from)?;

        if !self.name_prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StackError::config("Name prefix must be alphanumeric"));
        }
        if self.annotation_prefix.ends_with('/') {
            return Err(StackError::config("Annotation prefix must not end with '/'"));
        }

        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| StackError::config(format!("Invalid {}: {}", name, e))),
        None => Ok(None),
    }
}

fn parse_tags(raw: &str) -> Result<BTreeMap<String, String>> {
    let mut tags = BTreeMap::new();
    for pair in split_string_list(raw) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| StackError::config(format!("Invalid default tag '{}'", pair)))?;
        tags.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(tags)
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub level: String,

    /// Enable JSON structured logging
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let level = lookup("INGRESS_STACK_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let json = lookup("INGRESS_STACK_LOG_JSON")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Self { level, json }
    }

    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(StackError::from)
    }
}
