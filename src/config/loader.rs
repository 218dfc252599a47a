//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply `GATEWAY_*`
/// environment overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())
        .map_err(ConfigError::Validation)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using the given variable lookup.
///
/// Values that fail to parse are reported rather than ignored.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), Vec<ValidationError>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    if let Some(v) = lookup("GATEWAY_BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = lookup("GATEWAY_AUTH_SERVICE_URL") {
        config.auth.service_url = v;
    }
    if let Some(v) = lookup("GATEWAY_AUTH_VALIDATE_ENDPOINT") {
        config.auth.validate_endpoint = v;
    }
    override_parsed(&lookup, "GATEWAY_AUTH_ENABLED", &mut config.auth.enabled, &mut errors);
    override_parsed(
        &lookup,
        "GATEWAY_AUTH_CONNECT_TIMEOUT_MS",
        &mut config.auth.connect_timeout_ms,
        &mut errors,
    );
    override_parsed(
        &lookup,
        "GATEWAY_AUTH_RESPONSE_TIMEOUT_MS",
        &mut config.auth.response_timeout_ms,
        &mut errors,
    );
    override_parsed(
        &lookup,
        "GATEWAY_MAX_BODY_SIZE",
        &mut config.body_rewrite.max_body_size,
        &mut errors,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T, errors: &mut Vec<ValidationError>)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => errors.push(ValidationError::new(key, format!("cannot parse '{}'", raw))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("GATEWAY_AUTH_ENABLED", "false"),
                ("GATEWAY_AUTH_RESPONSE_TIMEOUT_MS", "250"),
                ("GATEWAY_MAX_BODY_SIZE", "1024"),
                ("GATEWAY_AUTH_SERVICE_URL", "http://auth:9000"),
            ]),
        )
        .unwrap();

        assert!(!config.auth.enabled);
        assert_eq!(config.auth.response_timeout_ms, 250);
        assert_eq!(config.auth.connect_timeout_ms, 5_000);
        assert_eq!(config.body_rewrite.max_body_size, 1024);
        assert_eq!(config.auth.service_url, "http://auth:9000");
    }

    #[test]
    fn test_bad_override_is_reported() {
        let mut config = GatewayConfig::default();
        let errors = apply_env_overrides(&mut config, env(&[("GATEWAY_AUTH_ENABLED", "yes please")]))
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "GATEWAY_AUTH_ENABLED");
        assert!(config.auth.enabled);
    }

    #[test]
    fn test_example_file_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("gateway.example.toml");
        let content = fs::read_to_string(path).unwrap();
        let config: GatewayConfig = toml::from_str(&content).unwrap();

        assert!(validate_config(&config).is_ok());
        assert_eq!(config.routes.len(), 4);
        assert!(config.routes[0].public);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/gateway.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
