//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and formats.
//! Every problem is reported, not just the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::FacadeConfig;
use crate::http::cookie::has_cookie_delimiter;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &FacadeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.cookies.path.starts_with('/') || has_cookie_delimiter(&config.cookies.path) {
        errors.push(ValidationError {
            field: "cookies.path",
            message: format!(
                "'{}' must start with '/' and contain no cookie delimiters",
                config.cookies.path
            ),
        });
    }

    if config.cookies.domain.contains(char::is_whitespace)
        || has_cookie_delimiter(&config.cookies.domain)
    {
        errors.push(ValidationError {
            field: "cookies.domain",
            message: format!("'{}' is not a valid cookie domain", config.cookies.domain),
        });
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "server.bind_address",
            message: format!("'{}' is not a socket address", config.server.bind_address),
        });
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "server.request_timeout_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError {
            field: "observability.log_level",
            message: format!("unknown level '{}'", config.observability.log_level),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
