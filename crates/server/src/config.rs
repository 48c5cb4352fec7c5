//! Server configuration: optional TOML file, then environment overrides.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Env var naming the config file; `outlay.toml` in the working directory is
/// read when it is unset and the file exists.
pub const CONFIG_PATH_ENV: &str = "OUTLAY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "outlay.toml";

/// HS256 keys shorter than this are refused.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("{0} must be set")]
    MissingSecret(&'static str),
    #[error("{0} must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" | "bunyan" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Signs access tokens.
    pub access_secret: String,
    /// Signs refresh tokens; must differ from `access_secret`.
    pub refresh_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            refresh_secret: String::new(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    /// Origins allowed by CORS. Credentials are allowed for these.
    pub allowed_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_format: LogFormat::default(),
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:5174".to_string(),
            ],
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from the config file (if any) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Override fields from environment variables looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(host) = var("OUTLAY_HOST") {
            self.host = host;
        }
        if let Some(port) = var("OUTLAY_PORT") {
            self.port = parse_value("OUTLAY_PORT", &port)?;
        }
        if let Some(format) = var("OUTLAY_LOG_FORMAT") {
            self.log_format = parse_value("OUTLAY_LOG_FORMAT", &format)?;
        }
        if let Some(secret) = var("AUTH_SECRET") {
            self.auth.access_secret = secret;
        }
        if let Some(secret) = var("AUTH_REFRESH_SECRET") {
            self.auth.refresh_secret = secret;
        }
        if let Some(ttl) = var("AUTH_SECRET_EXPIRES_IN") {
            self.auth.access_ttl_secs = parse_value("AUTH_SECRET_EXPIRES_IN", &ttl)?;
        }
        if let Some(ttl) = var("AUTH_REFRESH_SECRET_EXPIRES_IN") {
            self.auth.refresh_ttl_secs = parse_value("AUTH_REFRESH_SECRET_EXPIRES_IN", &ttl)?;
        }
        if let Some(origin) = var("FRONTEND_URL").filter(|o| !o.trim().is_empty()) {
            if !self.allowed_origins.contains(&origin) {
                self.allowed_origins.push(origin);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_secret("AUTH_SECRET", &self.auth.access_secret)?;
        check_secret("AUTH_REFRESH_SECRET", &self.auth.refresh_secret)?;
        if self.auth.access_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "AUTH_SECRET_EXPIRES_IN",
                value: self.auth.access_ttl_secs.to_string(),
            });
        }
        if self.auth.refresh_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "AUTH_REFRESH_SECRET_EXPIRES_IN",
                value: self.auth.refresh_ttl_secs.to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn check_secret(key: &'static str, secret: &str) -> Result<(), ConfigError> {
    if secret.is_empty() {
        return Err(ConfigError::MissingSecret(key));
    }
    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::WeakSecret(key));
    }
    Ok(())
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
