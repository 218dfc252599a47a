//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check URLs and addresses parse
//! - Detect duplicate or unmatchable routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::Method;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. "auth.connect_timeout_ms").
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    // Auth
    if Url::parse(&config.auth.service_url).is_err() {
        errors.push(ValidationError::new(
            "auth.service_url",
            format!("'{}' is not a valid URL", config.auth.service_url),
        ));
    }
    if !config.auth.validate_endpoint.starts_with('/') {
        errors.push(ValidationError::new(
            "auth.validate_endpoint",
            "must start with '/'",
        ));
    }
    if config.auth.connect_timeout_ms == 0 {
        errors.push(ValidationError::new("auth.connect_timeout_ms", "must be greater than 0"));
    }
    if config.auth.response_timeout_ms == 0 {
        errors.push(ValidationError::new("auth.response_timeout_ms", "must be greater than 0"));
    }

    // Body rewrite
    if config.body_rewrite.max_body_size == 0 {
        errors.push(ValidationError::new("body_rewrite.max_body_size", "must be greater than 0"));
    }
    if config.body_rewrite.identity_field.is_empty() {
        errors.push(ValidationError::new("body_rewrite.identity_field", "must not be empty"));
    }
    if config.body_rewrite.methods.is_empty() {
        errors.push(ValidationError::new("body_rewrite.methods", "must list at least one method"));
    }
    for method in &config.body_rewrite.methods {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "body_rewrite.methods",
                format!("'{}' is not a valid HTTP method", method),
            ));
        }
    }

    if config.upstream.timeout_ms == 0 {
        errors.push(ValidationError::new("upstream.timeout_ms", "must be greater than 0"));
    }

    // Routes
    let mut seen = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        let field = format!("routes[{}]", i);
        if route.name.is_empty() {
            errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::new(
                format!("{}.name", field),
                format!("duplicate route name '{}'", route.name),
            ));
        }
        if route.host.is_none() && route.path_prefix.is_none() {
            errors.push(ValidationError::new(
                field.clone(),
                "needs at least one of 'host' or 'path_prefix'",
            ));
        }
        match Url::parse(&route.upstream) {
            Ok(url) if url.scheme() == "http" => {}
            Ok(url) => errors.push(ValidationError::new(
                format!("{}.upstream", field),
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(_) => errors.push(ValidationError::new(
                format!("{}.upstream", field),
                format!("'{}' is not a valid URL", route.upstream),
            )),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
