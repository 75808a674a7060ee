use std::path::PathBuf;

use secrecy::SecretString;

use crate::services::upload::DEFAULT_MAX_UPLOAD_BYTES;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessControlMode {
    Disabled,
    Token,
}

#[derive(Debug, Default)]
pub struct AccessControl {
    pub token: Option<SecretString>,
    pub admin_username: Option<String>,
    pub admin_password: Option<SecretString>,
}

impl AccessControl {
    pub fn mode(&self) -> AccessControlMode {
        if self.token.is_some() {
            AccessControlMode::Token
        } else {
            AccessControlMode::Disabled
        }
    }

    pub fn has_login(&self) -> bool {
        self.token.is_some() && self.admin_username.is_some() && self.admin_password.is_some()
    }
}

/// Process configuration, read once from the environment before serving.
#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub upload_dir: PathBuf,
    /// Prefix for blob URLs handed to clients, without a trailing slash.
    /// Empty means root-relative URLs.
    pub public_base_url: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: u64,
    pub access_control: AccessControl,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn new(database_url: &str, upload_dir: PathBuf) -> Self {
        Self {
            database_url: SecretString::from(database_url.to_string()),
            upload_dir,
            public_base_url: String::new(),
            cors_allowed_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            access_control: AccessControl::default(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
