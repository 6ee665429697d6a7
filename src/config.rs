use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use std::fmt;

use crate::services::cookies::CookieConfig;

/// Shortest signing secret accepted outside development.
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Runtime environment: "development", "production" or "test"
    pub environment: String,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub jwt: JwtConfig,
    pub cookies: CookieConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory for request-scoped temporary upload files
    pub upload_dir: String,
    /// Maximum accepted request body size in bytes
    pub body_limit_bytes: usize,
}

/// Which implementation backs the store handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Hosted platform reached over its REST API
    Rest,
    /// In-process tables, for local development and tests
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Base URL of the hosted platform (e.g. https://xyz.supabase.co)
    pub url: String,
    /// Restricted key, subject to row-level policies
    #[serde(skip_serializing)]
    pub anon_key: SecretString,
    /// Privileged key, bypasses row-level policies
    #[serde(skip_serializing)]
    pub service_key: SecretString,
    /// Object bucket holding proof uploads
    pub bucket: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwtConfig {
    #[serde(skip_serializing)]
    pub secret: SecretString,
    pub expiration_hours: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed in addition to the built-in list
    pub extra_origins: Vec<String>,
    /// Regular expressions matched against the request origin
    pub origin_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub window_seconds: u64,
    pub max_requests: u32,
}

impl Config {
    /// Load configuration from environment variables, with defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            // Override with environment variables using `TUTOR__` prefix and `__` separator
            // e.g., TUTOR__STORE__URL="https://xyz.supabase.co"
            .add_source(
                config::Environment::with_prefix("TUTOR")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.extra_origins")
                    .with_list_parse_key("cors.origin_patterns")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Refuses to start without a usable signing secret.
    ///
    /// The secret has no default. Outside development it must also be at
    /// least [`MIN_JWT_SECRET_LEN`] bytes.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let secret = self.jwt.secret.expose_secret().trim();
        if secret.is_empty() {
            return Err(config::ConfigError::Message(
                "jwt.secret is required (set TUTOR__JWT__SECRET)".to_string(),
            ));
        }
        if !self.is_development() && secret.len() < MIN_JWT_SECRET_LEN {
            return Err(config::ConfigError::Message(format!(
                "jwt.secret must be at least {} characters in {}",
                MIN_JWT_SECRET_LEN, self.environment
            )));
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StoreConfig {
    /// Key for the given privilege level, exposed only to build request headers.
    pub fn key(&self, privileged: bool) -> &str {
        if privileged {
            self.service_key.expose_secret()
        } else {
            self.anon_key.expose_secret()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "production".to_string(),
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            jwt: JwtConfig::default(),
            cookies: CookieConfig::default(),
            cors: CorsConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            upload_dir: "./uploads".to_string(),
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Rest,
            url: "http://localhost:54321".to_string(),
            anon_key: SecretString::from(String::new()),
            service_key: SecretString::from(String::new()),
            bucket: "attendance-proofs".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: SecretString::from(String::new()),
            expiration_hours: 24,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_seconds: 15 * 60,
            max_requests: 100,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets are skipped by serde
        match serde_json::to_string_pretty(&self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "Error serializing config"),
        }
    }
}
