//! Group-wide SSL redirect.
//!
//! Members name the HTTPS port plain traffic should be redirected to. All Members
//! naming a port must agree on it; the port must be an HTTPS listener.

use std::collections::{BTreeMap, BTreeSet};

use super::listen_port::ListenPortConfig;
use crate::errors::{Result, StackError};
use crate::model::Protocol;

pub const SSL_REDIRECT_STATUS_CODE: &str = "HTTP_301";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslRedirectConfig {
    pub ssl_port: i64,
    pub status_code: String,
}

/// Resolve the redirect target from every Member's requested port.
///
/// Disagreement is reported before the adopted port is checked against the
/// listeners, so `[443, 8443]` is a conflict even when 8443 does not exist.
pub fn resolve_ssl_redirect<I>(
    requested: I,
    ports: &BTreeMap<i64, ListenPortConfig>,
) -> Result<Option<SslRedirectConfig>>
where
    I: IntoIterator<Item = i64>,
{
    let distinct: BTreeSet<i64> = requested.into_iter().collect();
    if distinct.len() > 1 {
        let listed: Vec<String> = distinct.iter().map(i64::to_string).collect();
        return Err(StackError::ssl_redirect(format!(
            "conflicting sslRedirect port: [{}]",
            listed.join(" ")
        )));
    }
    let Some(&ssl_port) = distinct.first() else {
        return Ok(None);
    };

    match ports.get(&ssl_port) {
        None => Err(StackError::ssl_redirect(format!(
            "listener does not exist for SSLRedirect port: {}",
            ssl_port
        ))),
        Some(config) if config.protocol != Protocol::Https => Err(StackError::ssl_redirect(
            format!("listener protocol non-SSL for SSLRedirect port: {}", ssl_port),
        )),
        Some(_) => Ok(Some(SslRedirectConfig {
            ssl_port,
            status_code: SSL_REDIRECT_STATUS_CODE.to_string(),
        })),
    }
}
