//! # External collaborators
//!
//! Subnet and certificate discovery live outside the builder. The builder calls
//! each at most once per build and surfaces their errors unchanged.

use std::collections::BTreeMap;

use crate::errors::ResolverSource;
use crate::model::Scheme;

/// Picks the subnets a load balancer attaches to.
pub trait SubnetResolver: Send + Sync {
    /// `explicit` holds subnet IDs or names from annotations; empty means discover
    /// by tags for the given scheme.
    fn resolve_subnets(
        &self,
        scheme: Scheme,
        explicit: &[String],
    ) -> std::result::Result<Vec<String>, ResolverSource>;
}

/// Finds certificates covering a set of hostnames.
pub trait CertificateResolver: Send + Sync {
    fn resolve_certificates(
        &self,
        hosts: &[String],
    ) -> std::result::Result<Vec<String>, ResolverSource>;
}

/// Subnet resolver over a fixed per-scheme table.
#[derive(Debug, Clone, Default)]
pub struct StaticSubnetResolver {
    by_scheme: BTreeMap<Scheme, Vec<String>>,
}

impl StaticSubnetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subnets<I, S>(mut self, scheme: Scheme, subnets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_scheme.insert(scheme, subnets.into_iter().map(Into::into).collect());
        self
    }
}

impl SubnetResolver for StaticSubnetResolver {
    fn resolve_subnets(
        &self,
        scheme: Scheme,
        explicit: &[String],
    ) -> std::result::Result<Vec<String>, ResolverSource> {
        if !explicit.is_empty() {
            return Ok(explicit.to_vec());
        }
        match self.by_scheme.get(&scheme) {
            Some(subnets) if !subnets.is_empty() => Ok(subnets.clone()),
            _ => Err(format!("unable to discover at least one subnet for {} load balancer", scheme)
                .into()),
        }
    }
}

/// Certificate resolver over a fixed table of domain name to certificate ARN.
/// Domains may carry a leading `*.` wildcard covering exactly one label.
#[derive(Debug, Clone, Default)]
pub struct StaticCertificateResolver {
    certificates: Vec<(String, String)>,
}

impl StaticCertificateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_certificate<D: Into<String>, A: Into<String>>(mut self, domain: D, arn: A) -> Self {
        self.certificates.push((domain.into().to_ascii_lowercase(), arn.into()));
        self
    }
}

fn domain_matches(domain: &str, host: &str) -> bool {
    if domain == host {
        return true;
    }
    match (domain.strip_prefix("*."), host.split_once('.')) {
        (Some(suffix), Some((label, rest))) => !label.is_empty() && rest == suffix,
        _ => false,
    }
}

impl CertificateResolver for StaticCertificateResolver {
    fn resolve_certificates(
        &self,
        hosts: &[String],
    ) -> std::result::Result<Vec<String>, ResolverSource> {
        let mut arns: Vec<String> = Vec::new();
        for host in hosts {
            let host = host.to_ascii_lowercase();
            let matched: Vec<&String> = self
                .certificates
                .iter()
                .filter(|(domain, _)| domain_matches(domain, &host))
                .map(|(_, arn)| arn)
                .collect();
            if matched.is_empty() {
                return Err(format!("no certificate found for host: {}", host).into());
            }
            for arn in matched {
                if !arns.contains(arn) {
                    arns.push(arn.clone());
                }
            }
        }
        Ok(arns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_subnets_win() {
        let resolver = StaticSubnetResolver::new().with_subnets(Scheme::Internal, ["subnet-a"]);
        let explicit = vec!["subnet-x".to_string()];
        assert_eq!(resolver.resolve_subnets(Scheme::Internal, &explicit).unwrap(), explicit);
        assert_eq!(resolver.resolve_subnets(Scheme::Internal, &[]).unwrap(), vec!["subnet-a"]);
        assert!(resolver.resolve_subnets(Scheme::InternetFacing, &[]).is_err());
    }

    #[test]
    fn test_wildcard_certificates() {
        let resolver = StaticCertificateResolver::new()
            .with_certificate("*.example.com", "arn:wild")
            .with_certificate("app-1.example.com", "arn:app-1");
        let hosts = vec!["app-1.example.com".to_string(), "app-2.example.com".to_string()];
        assert_eq!(resolver.resolve_certificates(&hosts).unwrap(), vec!["arn:wild", "arn:app-1"]);
        assert!(resolver.resolve_certificates(&["a.b.example.com".to_string()]).is_err());
    }
}
