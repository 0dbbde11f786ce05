//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the address is consistent with the transport type
//! - Require the default certificate and key paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: no DNS lookups, no filesystem access

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::{ServerConfig, Transport};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("address cannot be empty")]
    EmptyAddress,

    #[error("invalid {transport} address `{address}`: {reason}")]
    InvalidAddress {
        address: String,
        transport: Transport,
        reason: String,
    },

    #[error("certificate path cannot be empty")]
    MissingCertificate,

    #[error("key path cannot be empty")]
    MissingKey,

    #[error("log target cannot be empty")]
    EmptyLog,
}

/// Validate a resolved server configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.address.trim().is_empty() {
        errors.push(ValidationError::EmptyAddress);
    } else if !config.transport.is_unix() {
        if let Err(reason) = check_tcp_address(&config.address, config.transport) {
            errors.push(ValidationError::InvalidAddress {
                address: config.address.clone(),
                transport: config.transport,
                reason,
            });
        }
    }

    if config.certificate.as_os_str().is_empty() {
        errors.push(ValidationError::MissingCertificate);
    }
    if config.key.as_os_str().is_empty() {
        errors.push(ValidationError::MissingKey);
    }
    if config.log.trim().is_empty() {
        errors.push(ValidationError::EmptyLog);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port`, where host may be empty, a name, or an IP literal
/// (IPv6 in brackets) of the transport's family.
fn check_tcp_address(address: &str, transport: Transport) -> Result<(), String> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| "missing port".to_string())?;

    port.parse::<u16>()
        .map_err(|_| format!("invalid port `{port}`"))?;

    let host = match host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        Some(inner) => inner,
        None if host.contains(':') => {
            return Err("IPv6 literals must be enclosed in brackets".to_string())
        }
        None => host,
    };

    if let Ok(ip) = host.parse::<IpAddr>() {
        let family_ok = match transport {
            Transport::Tcp4 => ip.is_ipv4(),
            Transport::Tcp6 => ip.is_ipv6(),
            _ => true,
        };
        if !family_ok {
            return Err(format!("{ip} is not usable with {transport}"));
        }
    }

    Ok(())
}
