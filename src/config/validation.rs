//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot
//! work (unparseable addresses, zero-sized buffers, empty paths). All
//! problems are reported at once, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{RelayConfig, MAX_DATAGRAM_SIZE};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., `transport.address`).
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration, returning every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "http.bind_address", &config.http.bind_address);
    check_addr(&mut errors, "transport.address", &config.transport.address);
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::new("http.request_timeout_secs", "must be greater than 0"));
    }
    if config.http.max_body_size == 0 {
        errors.push(ValidationError::new("http.max_body_size", "must be greater than 0"));
    }

    let buffer = config.transport.buffer_size;
    if buffer == 0 || buffer > MAX_DATAGRAM_SIZE {
        errors.push(ValidationError::new(
            "transport.buffer_size",
            format!("must be between 1 and {MAX_DATAGRAM_SIZE}, got {buffer}"),
        ));
    }

    if config.storage.path.trim().is_empty() {
        errors.push(ValidationError::new("storage.path", "must not be empty"));
    }

    for (field, value) in [
        ("site.index_page", &config.site.index_page),
        ("site.message_page", &config.site.message_page),
        ("site.not_found_page", &config.site.not_found_page),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = value.parse::<SocketAddr>() {
        errors.push(ValidationError::new(field, format!("invalid socket address '{value}': {e}")));
    }
}
