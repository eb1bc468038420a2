//! # Error Types
//!
//! Error types for stack construction using `thiserror`.

use crate::annotations::AnnotationError;

/// Custom result type for stack construction
pub type Result<T> = std::result::Result<T, StackError>;

/// Boxed error returned by external collaborators (subnet and certificate resolvers)
pub type ResolverSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for building a resource stack from an Ingress group.
///
/// Every variant aborts the whole build; no partial stack is ever returned.
#[derive(thiserror::Error, Debug)]
pub enum StackError {
    /// A typed annotation carried a malformed value
    #[error("failed to parse annotations on {object}: {source}")]
    Annotation {
        object: String,
        #[source]
        source: AnnotationError,
    },

    /// A rule references a Service that does not exist
    #[error("service not found: {namespace}/{name}")]
    ServiceNotFound { namespace: String, name: String },

    /// A rule references a port the Service does not expose
    #[error("service port {port} not found in service {service}")]
    ServicePortNotFound { service: String, port: String },

    /// Instance targets require an allocated node port
    #[error("service {service} port {port} has no node port allocated, required by instance target type")]
    NodePortNotAllocated { service: String, port: String },

    /// SSL-redirect validation or conflict
    #[error("{0}")]
    SslRedirect(String),

    /// Members of one group disagree on a group-wide setting
    #[error("{0}")]
    Conflict(String),

    /// An HTTPS listener ended up without any certificate
    #[error("no certificate found for HTTPS listener port: {port}")]
    MissingCertificate { port: i64 },

    /// Subnet or certificate resolution failed; the source is surfaced unchanged
    #[error("{source}")]
    Resolver {
        resolver: &'static str,
        #[source]
        source: ResolverSource,
    },

    /// Builder configuration failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Contract violation inside the builder (duplicate key, dangling reference, cycle)
    #[error("internal error: {0}")]
    Internal(String),

    /// Document encoding failures
    #[error("serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },
}

impl StackError {
    /// Create an annotation error for the named object
    pub fn annotation<S: Into<String>>(object: S, source: AnnotationError) -> Self {
        Self::Annotation { object: object.into(), source }
    }

    /// Create a service-not-found error
    pub fn service_not_found<N: Into<String>, S: Into<String>>(namespace: N, name: S) -> Self {
        Self::ServiceNotFound { namespace: namespace.into(), name: name.into() }
    }

    /// Create an SSL-redirect error
    pub fn ssl_redirect<S: Into<String>>(message: S) -> Self {
        Self::SslRedirect(message.into())
    }

    /// Create a group conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict(message.into())
    }

    /// Wrap a collaborator failure
    pub fn resolver(resolver: &'static str, source: ResolverSource) -> Self {
        Self::Resolver { resolver, source }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Wrap a JSON encoding failure with context
    pub fn serialization<S: Into<String>>(source: serde_json::Error, context: S) -> Self {
        Self::Serialization { source, context: context.into() }
    }

    /// Create an internal contract-violation error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error is a defect in the builder rather than bad user input
    pub fn is_internal(&self) -> bool {
        matches!(self, StackError::Internal(_))
    }

    /// Whether this error came from an external collaborator
    pub fn is_resolver(&self) -> bool {
        matches!(self, StackError::Resolver { .. })
    }
}

impl From<serde_json::Error> for StackError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON serialization failed".to_string() }
    }
}

impl From<validator::ValidationErrors> for StackError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::config(format!("Validation failed: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_redirect_message_is_verbatim() {
        let error = StackError::ssl_redirect("conflicting sslRedirect port: [443 8443]");
        assert_eq!(error.to_string(), "conflicting sslRedirect port: [443 8443]");
    }

    #[test]
    fn test_resolver_error_surfaces_source_message() {
        let source: ResolverSource = "subnet discovery failed: throttled".into();
        let error = StackError::resolver("subnets", source);
        assert!(error.is_resolver());
        assert_eq!(error.to_string(), "subnet discovery failed: throttled");
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_internal_errors_are_flagged() {
        assert!(StackError::internal("duplicate key").is_internal());
        assert!(!StackError::conflict("conflicting scheme").is_internal());
    }

    #[test]
    fn test_annotation_error_names_object_and_key() {
        let error = StackError::annotation(
            "ns-1/ing-1",
            AnnotationError::invalid(
                "alb.ingress.kubernetes.io/ssl-redirect",
                "abc",
                "expected an integer",
            ),
        );
        let message = error.to_string();
        assert!(message.contains("ns-1/ing-1"));
        assert!(message.contains("alb.ingress.kubernetes.io/ssl-redirect"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: StackError = json_error.into();
        assert!(matches!(error, StackError::Serialization { .. }));
    }
}
