//! # Annotation Accessor
//!
//! Typed reads from key/value annotation sets under a fixed key prefix
//! (`alb.ingress.kubernetes.io` by default).
//!
//! Raw annotation maps never leave this module: the builders consume
//! [`IngressAnnotations`] and [`TargetGroupAnnotations`], which enumerate every
//! logical option once with its type. Lookups take an ordered slice of
//! annotation sets; the first set carrying the key wins, so a Service can override
//! what its Ingress says.
//!
//! Malformed values are always reported, never silently defaulted.

pub mod ingress;
pub mod keys;
pub mod target_group;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;

pub use ingress::{ActionConfig, ForwardActionConfig, IngressAnnotations, WeightedServiceConfig};
pub use target_group::TargetGroupAnnotations;

/// Raw annotations as attached to a Kubernetes object
pub type Annotations = BTreeMap<String, String>;

/// A malformed or missing annotation value
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("invalid value \"{value}\" for annotation {key}: {reason}")]
    Invalid { key: String, value: String, reason: String },

    #[error("missing required annotation {key}")]
    Missing { key: String },
}

impl AnnotationError {
    pub fn invalid<K: Into<String>, V: Into<String>, R: Into<String>>(
        key: K,
        value: V,
        reason: R,
    ) -> Self {
        Self::Invalid { key: key.into(), value: value.into(), reason: reason.into() }
    }

    pub fn missing<K: Into<String>>(key: K) -> Self {
        Self::Missing { key: key.into() }
    }

    /// Fully qualified annotation key this error refers to
    pub fn key(&self) -> &str {
        match self {
            AnnotationError::Invalid { key, .. } | AnnotationError::Missing { key } => key,
        }
    }
}

/// Parses annotations under a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationParser {
    prefix: String,
}

impl AnnotationParser {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Fully qualified key for a suffix, e.g. `alb.ingress.kubernetes.io/scheme`
    pub fn key(&self, suffix: &str) -> String {
        format!("{}/{}", self.prefix, suffix)
    }

    fn lookup<'a>(&self, suffix: &str, sources: &[&'a Annotations]) -> Option<(String, &'a str)> {
        let key = self.key(suffix);
        sources
            .iter()
            .find_map(|annotations| annotations.get(&key))
            .map(|value| (key, value.as_str()))
    }

    /// Raw string value
    pub fn parse_string(&self, suffix: &str, sources: &[&Annotations]) -> Option<String> {
        self.lookup(suffix, sources).map(|(_, value)| value.to_string())
    }

    /// Comma-separated list; empty segments are dropped and duplicates removed
    /// keeping first-occurrence order.
    pub fn parse_string_list(&self, suffix: &str, sources: &[&Annotations]) -> Option<Vec<String>> {
        self.lookup(suffix, sources).map(|(_, value)| split_string_list(value))
    }

    pub fn parse_int(
        &self,
        suffix: &str,
        sources: &[&Annotations],
    ) -> Result<Option<i64>, AnnotationError> {
        let Some((key, value)) = self.lookup(suffix, sources) else {
            return Ok(None);
        };
        value
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| {
                AnnotationError::invalid(key, value, format!("expected an integer: {}", e))
            })
    }

    pub fn parse_bool(
        &self,
        suffix: &str,
        sources: &[&Annotations],
    ) -> Result<Option<bool>, AnnotationError> {
        let Some((key, value)) = self.lookup(suffix, sources) else {
            return Ok(None);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(AnnotationError::invalid(key, value, "expected true or false")),
        }
    }

    /// Duration given as bare seconds (`15`) or with units (`15s`, `1m30s`, `500ms`)
    pub fn parse_duration(
        &self,
        suffix: &str,
        sources: &[&Annotations],
    ) -> Result<Option<Duration>, AnnotationError> {
        let Some((key, value)) = self.lookup(suffix, sources) else {
            return Ok(None);
        };
        parse_duration_literal(value)
            .map(Some)
            .map_err(|reason| AnnotationError::invalid(key, value, reason))
    }

    /// `key1=value1,key2=value2`; a later duplicate key replaces an earlier one
    pub fn parse_string_map(
        &self,
        suffix: &str,
        sources: &[&Annotations],
    ) -> Result<Option<BTreeMap<String, String>>, AnnotationError> {
        let Some((key, value)) = self.lookup(suffix, sources) else {
            return Ok(None);
        };
        let mut parsed = BTreeMap::new();
        for segment in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (k, v) = segment.split_once('=').ok_or_else(|| {
                AnnotationError::invalid(
                    &key,
                    value,
                    format!("segment '{}' is not a key=value pair", segment),
                )
            })?;
            let k = k.trim();
            if k.is_empty() {
                return Err(AnnotationError::invalid(&key, value, "empty key in key=value pair"));
            }
            parsed.insert(k.to_string(), v.trim().to_string());
        }
        Ok(Some(parsed))
    }

    pub fn parse_json<T: DeserializeOwned>(
        &self,
        suffix: &str,
        sources: &[&Annotations],
    ) -> Result<Option<T>, AnnotationError> {
        let Some((key, value)) = self.lookup(suffix, sources) else {
            return Ok(None);
        };
        serde_json::from_str(value)
            .map(Some)
            .map_err(|e| AnnotationError::invalid(key, value, format!("invalid JSON: {}", e)))
    }

    /// Suffixes below `group` present in any source, e.g. `actions.` → `["svc-a", "svc-b"]`
    pub fn sub_keys(&self, group: &str, sources: &[&Annotations]) -> Vec<String> {
        let full = self.key(group);
        let mut names: Vec<String> = sources
            .iter()
            .flat_map(|annotations| annotations.keys())
            .filter_map(|key| key.strip_prefix(&full))
            .filter(|rest| !rest.is_empty())
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl Default for AnnotationParser {
    fn default() -> Self {
        Self::new(keys::DEFAULT_PREFIX)
    }
}

/// Split on commas, trim, drop empties, dedupe keeping first occurrence.
pub fn split_string_list(value: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}

fn parse_duration_literal(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(seconds) = value.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }

    let mut total = Duration::ZERO;
    let mut rest = value;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("expected a number at '{}'", rest));
        }
        let amount: u64 = rest[..digits].parse().map_err(|e| format!("invalid number: {}", e))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let part = match unit {
            "ms" => Some(Duration::from_millis(amount)),
            "s" => Some(Duration::from_secs(amount)),
            "m" => amount.checked_mul(60).map(Duration::from_secs),
            "h" => amount.checked_mul(3600).map(Duration::from_secs),
            "" => return Err("missing unit after number".to_string()),
            other => return Err(format!("unknown duration unit '{}'", other)),
        };
        total = part
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| format!("duration out of range: {}", value))?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations(pairs: &[(&str, &str)]) -> Annotations {
        pairs
            .iter()
            .map(|(k, v)| (format!("alb.ingress.kubernetes.io/{}", k), v.to_string()))
            .collect()
    }

    #[test]
    fn test_string_list_dedupes_in_first_occurrence_order() {
        let parser = AnnotationParser::default();
        let set = annotations(&[("certificate-arn", "C2,C3,C1,,C1")]);
        assert_eq!(
            parser.parse_string_list("certificate-arn", &[&set]),
            Some(vec!["C2".to_string(), "C3".to_string(), "C1".to_string()])
        );
        assert_eq!(split_string_list("B,C,A,,A"), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_first_source_wins() {
        let parser = AnnotationParser::default();
        let service = annotations(&[("target-type", "ip")]);
        let ingress = annotations(&[("target-type", "instance"), ("backend-protocol", "HTTPS")]);
        assert_eq!(
            parser.parse_string("target-type", &[&service, &ingress]),
            Some("ip".to_string())
        );
        assert_eq!(
            parser.parse_string("backend-protocol", &[&service, &ingress]),
            Some("HTTPS".to_string())
        );
        assert_eq!(parser.parse_string("scheme", &[&service, &ingress]), None);
    }

    #[test]
    fn test_int_parse_error_names_key() {
        let parser = AnnotationParser::default();
        let set = annotations(&[("ssl-redirect", "four-four-three")]);
        let err = parser.parse_int("ssl-redirect", &[&set]).unwrap_err();
        assert_eq!(err.key(), "alb.ingress.kubernetes.io/ssl-redirect");
        assert!(err.to_string().contains("four-four-three"));
    }

    #[test]
    fn test_bool_literals() {
        let parser = AnnotationParser::default();
        let set = annotations(&[("a", "TRUE"), ("b", "false"), ("c", "yes")]);
        assert_eq!(parser.parse_bool("a", &[&set]).unwrap(), Some(true));
        assert_eq!(parser.parse_bool("b", &[&set]).unwrap(), Some(false));
        assert!(parser.parse_bool("c", &[&set]).is_err());
        assert_eq!(parser.parse_bool("d", &[&set]).unwrap(), None);
    }

    #[test]
    fn test_duration_forms() {
        assert_eq!(parse_duration_literal("15"), Ok(Duration::from_secs(15)));
        assert_eq!(parse_duration_literal("15s"), Ok(Duration::from_secs(15)));
        assert_eq!(parse_duration_literal("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration_literal("500ms"), Ok(Duration::from_millis(500)));
        assert!(parse_duration_literal("10x").is_err());
        assert!(parse_duration_literal("s").is_err());
        assert!(parse_duration_literal("").is_err());
    }

    #[test]
    fn test_duration_overflow_is_an_error() {
        assert!(parse_duration_literal("6000000000000000h").is_err());
        assert!(parse_duration_literal("18446744073709551615s1s").is_err());
        assert_eq!(
            parse_duration_literal("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );

        let parser = AnnotationParser::default();
        let set = annotations(&[("healthcheck-interval-seconds", "6000000000000000h")]);
        let err = parser.parse_duration("healthcheck-interval-seconds", &[&set]).unwrap_err();
        assert_eq!(err.key(), "alb.ingress.kubernetes.io/healthcheck-interval-seconds");
    }

    #[test]
    fn test_string_map() {
        let parser = AnnotationParser::default();
        let set = annotations(&[("tags", "Env=prod, Team = core,,"), ("bad", "novalue")]);
        let tags = parser.parse_string_map("tags", &[&set]).unwrap().unwrap();
        assert_eq!(tags.get("Env"), Some(&"prod".to_string()));
        assert_eq!(tags.get("Team"), Some(&"core".to_string()));
        assert_eq!(tags.len(), 2);
        assert!(parser.parse_string_map("bad", &[&set]).is_err());
    }

    #[test]
    fn test_sub_keys() {
        let parser = AnnotationParser::default();
        let set = annotations(&[("actions.svc-b", "{}"), ("actions.svc-a", "{}"), ("scheme", "x")]);
        assert_eq!(parser.sub_keys("actions.", &[&set]), vec!["svc-a", "svc-b"]);
    }
}
