//! Typed target-group options. Sources are ordered Service first, then Ingress.

use std::collections::BTreeMap;
use std::time::Duration;

use super::ingress::parse_enum;
use super::{keys, AnnotationError, AnnotationParser, Annotations};
use crate::model::{HealthCheckPort, Protocol, ProtocolVersion, TargetType};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetGroupAnnotations {
    pub target_type: Option<TargetType>,
    pub backend_protocol: Option<Protocol>,
    pub backend_protocol_version: Option<ProtocolVersion>,
    pub healthcheck_protocol: Option<Protocol>,
    pub healthcheck_port: Option<HealthCheckPort>,
    pub healthcheck_path: Option<String>,
    pub healthcheck_interval_seconds: Option<i64>,
    pub healthcheck_timeout_seconds: Option<i64>,
    pub healthy_threshold_count: Option<i64>,
    pub unhealthy_threshold_count: Option<i64>,
    pub success_codes: Option<String>,
    pub target_group_attributes: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
}

impl TargetGroupAnnotations {
    pub fn resolve(
        parser: &AnnotationParser,
        sources: &[&Annotations],
    ) -> Result<Self, AnnotationError> {
        Ok(Self {
            target_type: parse_enum(parser, keys::TARGET_TYPE, sources)?,
            backend_protocol: parse_enum(parser, keys::BACKEND_PROTOCOL, sources)?,
            backend_protocol_version: parse_enum(parser, keys::BACKEND_PROTOCOL_VERSION, sources)?,
            healthcheck_protocol: parse_enum(parser, keys::HEALTHCHECK_PROTOCOL, sources)?,
            healthcheck_port: parse_enum(parser, keys::HEALTHCHECK_PORT, sources)?,
            healthcheck_path: parser.parse_string(keys::HEALTHCHECK_PATH, sources),
            healthcheck_interval_seconds: parse_seconds(
                parser,
                keys::HEALTHCHECK_INTERVAL_SECONDS,
                sources,
            )?,
            healthcheck_timeout_seconds: parse_seconds(
                parser,
                keys::HEALTHCHECK_TIMEOUT_SECONDS,
                sources,
            )?,
            healthy_threshold_count: parse_count(parser, keys::HEALTHY_THRESHOLD_COUNT, sources)?,
            unhealthy_threshold_count: parse_count(
                parser,
                keys::UNHEALTHY_THRESHOLD_COUNT,
                sources,
            )?,
            success_codes: parser.parse_string(keys::SUCCESS_CODES, sources),
            target_group_attributes: parser
                .parse_string_map(keys::TARGET_GROUP_ATTRIBUTES, sources)?
                .unwrap_or_default(),
            tags: parser.parse_string_map(keys::TAGS, sources)?.unwrap_or_default(),
        })
    }
}

fn parse_seconds(
    parser: &AnnotationParser,
    suffix: &str,
    sources: &[&Annotations],
) -> Result<Option<i64>, AnnotationError> {
    let Some(duration) = parser.parse_duration(suffix, sources)? else {
        return Ok(None);
    };
    let invalid = |reason: &str| {
        AnnotationError::invalid(
            parser.key(suffix),
            parser.parse_string(suffix, sources).unwrap_or_default(),
            reason,
        )
    };
    if duration.subsec_nanos() != 0 {
        return Err(invalid("must be a whole number of seconds"));
    }
    if duration == Duration::ZERO {
        return Err(invalid("must be greater than zero"));
    }
    i64::try_from(duration.as_secs()).map(Some).map_err(|_| invalid("out of range"))
}

fn parse_count(
    parser: &AnnotationParser,
    suffix: &str,
    sources: &[&Annotations],
) -> Result<Option<i64>, AnnotationError> {
    match parser.parse_int(suffix, sources)? {
        Some(count) if count < 1 => Err(AnnotationError::invalid(
            parser.key(suffix),
            count.to_string(),
            "must be at least 1",
        )),
        other => Ok(other),
    }
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
    fn test_service_overrides_ingress() {
        let service = annotations(&[("target-type", "ip"), ("healthcheck-path", "/svc")]);
        let ingress = annotations(&[
            ("target-type", "instance"),
            ("healthcheck-path", "/ing"),
            ("backend-protocol", "HTTPS"),
        ]);
        let parsed =
            TargetGroupAnnotations::resolve(&AnnotationParser::default(), &[&service, &ingress])
                .unwrap();
        assert_eq!(parsed.target_type, Some(TargetType::Ip));
        assert_eq!(parsed.healthcheck_path.as_deref(), Some("/svc"));
        assert_eq!(parsed.backend_protocol, Some(Protocol::Https));
    }

    #[test]
    fn test_durations_and_counts() {
        let set = annotations(&[
            ("healthcheck-interval-seconds", "1m"),
            ("healthcheck-timeout-seconds", "10"),
            ("healthy-threshold-count", "3"),
            ("healthcheck-port", "9090"),
        ]);
        let parsed =
            TargetGroupAnnotations::resolve(&AnnotationParser::default(), &[&set]).unwrap();
        assert_eq!(parsed.healthcheck_interval_seconds, Some(60));
        assert_eq!(parsed.healthcheck_timeout_seconds, Some(10));
        assert_eq!(parsed.healthy_threshold_count, Some(3));
        assert_eq!(parsed.healthcheck_port, Some(HealthCheckPort::Port(9090)));
        assert_eq!(parsed.unhealthy_threshold_count, None);
    }

    #[test]
    fn test_rejects_bad_values() {
        let parser = AnnotationParser::default();
        for (key, value) in [
            ("healthcheck-interval-seconds", "1500ms"),
            ("healthcheck-interval-seconds", "0"),
            ("healthcheck-timeout-seconds", "soon"),
            ("healthy-threshold-count", "0"),
            ("target-type", "lambda"),
            ("backend-protocol-version", "HTTP3"),
            ("healthcheck-port", "traffic"),
        ] {
            let set = annotations(&[(key, value)]);
            let err = TargetGroupAnnotations::resolve(&parser, &[&set]).unwrap_err();
            assert_eq!(err.key(), format!("alb.ingress.kubernetes.io/{}", key));
        }
    }
}
