//! Annotation key suffixes understood by the builder.

pub const DEFAULT_PREFIX: &str = "alb.ingress.kubernetes.io";

// Load balancer and group level
pub const SCHEME: &str = "scheme";
pub const IP_ADDRESS_TYPE: &str = "ip-address-type";
pub const SUBNETS: &str = "subnets";
pub const LOAD_BALANCER_NAME: &str = "load-balancer-name";
pub const LOAD_BALANCER_ATTRIBUTES: &str = "load-balancer-attributes";
pub const TAGS: &str = "tags";
pub const INBOUND_CIDRS: &str = "inbound-cidrs";
pub const GROUP_ORDER: &str = "group.order";

// Listeners
pub const LISTEN_PORTS: &str = "listen-ports";
pub const CERTIFICATE_ARN: &str = "certificate-arn";
pub const SSL_POLICY: &str = "ssl-policy";
pub const SSL_REDIRECT: &str = "ssl-redirect";

/// Prefix of per-backend action annotations, `actions.<service-name>`
pub const ACTIONS_PREFIX: &str = "actions.";

// Target groups
pub const TARGET_TYPE: &str = "target-type";
pub const BACKEND_PROTOCOL: &str = "backend-protocol";
pub const BACKEND_PROTOCOL_VERSION: &str = "backend-protocol-version";
pub const TARGET_GROUP_ATTRIBUTES: &str = "target-group-attributes";
pub const HEALTHCHECK_PROTOCOL: &str = "healthcheck-protocol";
pub const HEALTHCHECK_PORT: &str = "healthcheck-port";
pub const HEALTHCHECK_PATH: &str = "healthcheck-path";
pub const HEALTHCHECK_INTERVAL_SECONDS: &str = "healthcheck-interval-seconds";
pub const HEALTHCHECK_TIMEOUT_SECONDS: &str = "healthcheck-timeout-seconds";
pub const HEALTHY_THRESHOLD_COUNT: &str = "healthy-threshold-count";
pub const UNHEALTHY_THRESHOLD_COUNT: &str = "unhealthy-threshold-count";
pub const SUCCESS_CODES: &str = "success-codes";
