use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use utils_core::assets::{default_database_url, default_upload_dir};

mod schema;

pub use schema::{
    AccessControl, AccessControlMode, Config, DEFAULT_CORS_ORIGIN, DEFAULT_HOST, DEFAULT_PORT,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Blank values count as
    /// unset; malformed numbers fall back to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => default_database_url()?,
        };
        let upload_dir = match var("UPLOAD_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_upload_dir()?,
        };

        let mut config = Config::new(&database_url, upload_dir);

        if let Some(base) = var("PUBLIC_BASE_URL") {
            config.public_base_url = base.trim_end_matches('/').to_string();
        }

        if let Some(raw) = var("CORS_ALLOWED_ORIGINS") {
            config.cors_allowed_origins = parse_origins(&raw)?;
        }

        if let Some(raw) = var("MAX_UPLOAD_BYTES") {
            match raw.parse::<u64>() {
                Ok(value) if value > 0 => config.max_upload_bytes = value,
                _ => tracing::warn!(value = %raw, "Invalid MAX_UPLOAD_BYTES; using default"),
            }
        }

        if let Some(host) = var("HOST") {
            config.host = host;
        }
        if let Some(raw) = var("BACKEND_PORT").or_else(|| var("PORT")) {
            match raw.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(err) => {
                    tracing::warn!(value = %raw, error = %err, "Invalid port; using default")
                }
            }
        }

        config.access_control = AccessControl {
            token: var("ADMIN_TOKEN").map(SecretString::from),
            admin_username: var("ADMIN_USERNAME"),
            admin_password: var("ADMIN_PASSWORD").map(SecretString::from),
        };

        Ok(config)
    }
}

fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(bad) = origins
        .iter()
        .find(|origin| !(origin.starts_with("http://") || origin.starts_with("https://")))
    {
        return Err(ConfigError::ValidationError(format!(
            "CORS origin must start with http:// or https://: {bad}"
        )));
    }
    Ok(origins)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn explicit_values_are_used() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite://site.db?mode=rwc"),
            ("UPLOAD_DIR", "/srv/site/uploads"),
            ("PUBLIC_BASE_URL", "https://dept.example/"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:5173, https://dept.example/"),
            ("MAX_UPLOAD_BYTES", "2048"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
        ])
        .unwrap();

        assert_eq!(config.database_url.expose_secret(), "sqlite://site.db?mode=rwc");
        assert_eq!(config.upload_dir, PathBuf::from("/srv/site/uploads"));
        assert_eq!(config.public_base_url, "https://dept.example");
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://localhost:5173", "https://dept.example"]
        );
        assert_eq!(config.max_upload_bytes, 2048);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.access_control.mode(), AccessControlMode::Disabled);
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("UPLOAD_DIR", "/tmp/uploads"),
            ("MAX_UPLOAD_BYTES", "lots"),
            ("BACKEND_PORT", "99999"),
        ])
        .unwrap();

        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.cors_allowed_origins, vec![DEFAULT_CORS_ORIGIN]);
        assert!(config.public_base_url.is_empty());
    }

    #[test]
    fn backend_port_wins_over_port() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("UPLOAD_DIR", "/tmp/uploads"),
            ("BACKEND_PORT", "6000"),
            ("PORT", "7000"),
        ])
        .unwrap();
        assert_eq!(config.port, 6000);
    }

    #[test]
    fn rejects_origins_without_scheme() {
        let err = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("UPLOAD_DIR", "/tmp/uploads"),
            ("CORS_ALLOWED_ORIGINS", "localhost:5173"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn admin_token_enables_access_control() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("UPLOAD_DIR", "/tmp/uploads"),
            ("ADMIN_TOKEN", "sekrit"),
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "   "),
        ])
        .unwrap();

        assert_eq!(config.access_control.mode(), AccessControlMode::Token);
        assert!(config.access_control.admin_password.is_none());
        assert!(!config.access_control.has_login());
        assert!(!format!("{config:?}").contains("sekrit"));
    }
}
