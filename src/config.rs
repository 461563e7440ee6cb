use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "https://mishukinfo.com",
    "http://localhost:3001",
    "https://powderblue-goldfinch-362369.hostingersite.com/",
];

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub cloudinary: CloudinaryConfig,
}

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub api_base: String,
    pub timeout: Duration,
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &REDACTED)
            .field("db_max_connections", &self.db_max_connections)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("cloudinary", &self.cloudinary)
            .finish()
    }
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &REDACTED)
            .field("folder", &self.folder)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn env_required(key: &str) -> Result<String> {
    env_non_empty(key).ok_or_else(|| anyhow!("{key} must be set"))
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_non_empty(key) {
        Some(raw) => raw.parse().with_context(|| format!("Invalid {key}: {raw}")),
        None => Ok(default),
    }
}

/// Trims whitespace and the trailing slash so entries compare equal to the
/// `Origin` header browsers send.
pub fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_string()
}

/// Splits a comma separated allow-list. `*` is refused: credentialed CORS
/// cannot answer with a wildcard origin.
pub fn parse_origin_list(raw: &str) -> Result<Vec<String>> {
    let origins: Vec<String> = raw
        .split(',')
        .map(normalize_origin)
        .filter(|origin| !origin.is_empty())
        .collect();

    if origins.iter().any(|origin| origin == "*") {
        return Err(anyhow!(
            "Invalid CORS_ALLOWED_ORIGINS: `*` is not allowed, list the origins explicitly"
        ));
    }
    Ok(origins)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let allowed_origins = match env_non_empty("CORS_ALLOWED_ORIGINS") {
            Some(raw) => parse_origin_list(&raw)?,
            None => DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|origin| normalize_origin(origin))
                .collect(),
        };

        Ok(Config {
            database_url: env_required("DATABASE_URL")?,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 5)?,
            port: env_parse("PORT", 5000)?,
            allowed_origins,
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", 25 * 1024 * 1024)?,
            cloudinary: CloudinaryConfig {
                cloud_name: env_required("CLOUDINARY_CLOUD_NAME")?,
                api_key: env_required("CLOUDINARY_API_KEY")?,
                api_secret: env_required("CLOUDINARY_API_SECRET")?,
                folder: env_non_empty("CLOUDINARY_FOLDER")
                    .unwrap_or_else(|| "survey_uploads".to_string()),
                api_base: env_non_empty("CLOUDINARY_API_BASE")
                    .unwrap_or_else(|| "https://api.cloudinary.com".to_string()),
                timeout: Duration::from_secs(env_parse("CLOUDINARY_TIMEOUT_SECS", 60)?),
            },
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
