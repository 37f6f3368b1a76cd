//! Configuration module
//!
//! Environment-driven configuration for the API binary and the services it wires
//! together: HTTP server, session store, blob storage, media limits and the sweeper.

use std::env;
use std::str::FromStr;

use crate::constants::{
    BATCH_VIDEO_MAX_MB, BYTES_PER_MB, DEFAULT_SESSION_TTL_SECS, HANDOFF_VIDEO_MAX_MB,
    IMAGE_MAX_DIMENSION, IMAGE_MAX_INPUT_MB, IMAGE_MAX_OUTPUT_MB, MAX_FILES_PER_BATCH,
    SWEEPER_GRACE_SECS, SWEEPER_INTERVAL_SECS,
};
use crate::storage_types::StorageBackend;

// Common constants
const DEFAULT_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOCAL_STORAGE_PATH: &str = "./data/media";

/// Which session store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStoreBackend {
    Postgres,
    Memory,
}

impl FromStr for SessionStoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(SessionStoreBackend::Postgres),
            "memory" => Ok(SessionStoreBackend::Memory),
            other => Err(anyhow::anyhow!(
                "SESSION_STORE must be 'postgres' or 'memory', got '{}'",
                other
            )),
        }
    }
}

impl std::fmt::Display for SessionStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStoreBackend::Postgres => write!(f, "postgres"),
            SessionStoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Server-level settings shared by every binary
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    pub log_format: String,
}

/// Handoff service configuration
#[derive(Clone, Debug)]
pub struct HandoffConfig {
    pub base: BaseConfig,
    /// Origin embedded in handoff URLs, without trailing slash
    pub public_origin: String,
    pub session_store: SessionStoreBackend,
    pub database_url: Option<String>,
    pub session_ttl_secs: i64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    // Media limits
    pub image_max_dimension: u32,
    pub image_max_output_bytes: usize,
    pub image_max_input_bytes: usize,
    pub batch_video_max_bytes: usize,
    pub handoff_video_max_bytes: usize,
    pub max_files_per_batch: usize,
    // Sweeper
    pub sweeper_enabled: bool,
    pub sweeper_interval_secs: u64,
    pub sweeper_grace_secs: i64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<HandoffConfig>);

impl Config {
    fn inner(&self) -> &HandoffConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = HandoffConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn public_origin(&self) -> &str {
        &self.inner().public_origin
    }

    pub fn session_store(&self) -> SessionStoreBackend {
        self.inner().session_store
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().database_url.as_deref()
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.inner().session_ttl_secs)
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn local_storage_path(&self) -> &str {
        &self.inner().local_storage_path
    }

    pub fn local_storage_base_url(&self) -> &str {
        &self.inner().local_storage_base_url
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    /// `S3_REGION` wins over `AWS_REGION`
    pub fn s3_region(&self) -> Option<&str> {
        self.inner()
            .s3_region
            .as_deref()
            .or(self.inner().aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn image_max_dimension(&self) -> u32 {
        self.inner().image_max_dimension
    }

    pub fn image_max_output_bytes(&self) -> usize {
        self.inner().image_max_output_bytes
    }

    pub fn image_max_input_bytes(&self) -> usize {
        self.inner().image_max_input_bytes
    }

    pub fn batch_video_max_bytes(&self) -> usize {
        self.inner().batch_video_max_bytes
    }

    pub fn handoff_video_max_bytes(&self) -> usize {
        self.inner().handoff_video_max_bytes
    }

    pub fn max_files_per_batch(&self) -> usize {
        self.inner().max_files_per_batch
    }

    /// Largest request body accepted by the upload routes: a full batch of
    /// videos at the larger ceiling plus one megabyte of form overhead.
    pub fn max_request_body_bytes(&self) -> usize {
        let largest_video = self
            .batch_video_max_bytes()
            .max(self.handoff_video_max_bytes());
        largest_video
            .saturating_mul(self.max_files_per_batch())
            .saturating_add(BYTES_PER_MB)
    }

    pub fn sweeper_enabled(&self) -> bool {
        self.inner().sweeper_enabled
    }

    pub fn sweeper_interval_secs(&self) -> u64 {
        self.inner().sweeper_interval_secs
    }

    pub fn sweeper_grace(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.inner().sweeper_grace_secs)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl HandoffConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port: u16 = match var("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => DEFAULT_PORT,
        };

        let base = BaseConfig {
            server_port,
            cors_origins,
            db_max_connections: parse_or(var("DB_MAX_CONNECTIONS"), MAX_CONNECTIONS),
            db_timeout_seconds: parse_or(var("DB_TIMEOUT_SECONDS"), CONNECTION_TIMEOUT_SECS),
            environment,
            log_format: var("LOG_FORMAT")
                .unwrap_or_else(|| "compact".to_string())
                .to_lowercase(),
        };

        let public_origin = non_empty(var("PUBLIC_ORIGIN"))
            .unwrap_or_else(|| format!("http://localhost:{}", server_port))
            .trim_end_matches('/')
            .to_string();

        let session_store = match non_empty(var("SESSION_STORE")) {
            Some(s) => s.parse()?,
            None => SessionStoreBackend::Postgres,
        };

        let storage_backend = match non_empty(var("STORAGE_BACKEND")) {
            Some(s) => s.parse()?,
            None => StorageBackend::Local,
        };

        let local_storage_base_url = non_empty(var("LOCAL_STORAGE_BASE_URL"))
            .unwrap_or_else(|| format!("{}/media", public_origin));

        let config = HandoffConfig {
            base,
            public_origin,
            session_store,
            database_url: non_empty(var("DATABASE_URL")),
            session_ttl_secs: parse_or(var("SESSION_TTL_SECS"), DEFAULT_SESSION_TTL_SECS),
            storage_backend,
            local_storage_path: non_empty(var("LOCAL_STORAGE_PATH"))
                .unwrap_or_else(|| DEFAULT_LOCAL_STORAGE_PATH.to_string()),
            local_storage_base_url,
            s3_bucket: non_empty(var("S3_BUCKET")),
            s3_region: non_empty(var("S3_REGION")),
            s3_endpoint: non_empty(var("S3_ENDPOINT")),
            aws_region: non_empty(var("AWS_REGION")),
            image_max_dimension: parse_or(var("IMAGE_MAX_DIMENSION"), IMAGE_MAX_DIMENSION),
            image_max_output_bytes: parse_or(var("IMAGE_MAX_OUTPUT_MB"), IMAGE_MAX_OUTPUT_MB)
                * BYTES_PER_MB,
            image_max_input_bytes: parse_or(var("IMAGE_MAX_INPUT_MB"), IMAGE_MAX_INPUT_MB)
                * BYTES_PER_MB,
            batch_video_max_bytes: parse_or(var("BATCH_VIDEO_MAX_MB"), BATCH_VIDEO_MAX_MB)
                * BYTES_PER_MB,
            handoff_video_max_bytes: parse_or(var("HANDOFF_VIDEO_MAX_MB"), HANDOFF_VIDEO_MAX_MB)
                * BYTES_PER_MB,
            max_files_per_batch: parse_or(var("MAX_FILES_PER_BATCH"), MAX_FILES_PER_BATCH),
            sweeper_enabled: parse_or(
                var("SWEEPER_ENABLED").map(|s| s.to_lowercase()),
                true,
            ),
            sweeper_interval_secs: parse_or(var("SWEEPER_INTERVAL_SECS"), SWEEPER_INTERVAL_SECS),
            sweeper_grace_secs: parse_or(var("SWEEPER_GRACE_SECS"), SWEEPER_GRACE_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.session_ttl_secs <= 0 {
            return Err(anyhow::anyhow!("SESSION_TTL_SECS must be positive"));
        }

        if !self.public_origin.starts_with("http://") && !self.public_origin.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "PUBLIC_ORIGIN must start with http:// or https://"
            ));
        }

        if self.session_store == SessionStoreBackend::Postgres {
            match self.database_url.as_deref() {
                None => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when SESSION_STORE=postgres"
                    ))
                }
                Some(url) if !url.starts_with("postgres://") && !url.starts_with("postgresql://") => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
                Some(_) => {}
            }
        }

        if self.image_max_dimension == 0 || self.image_max_output_bytes == 0 {
            return Err(anyhow::anyhow!(
                "IMAGE_MAX_DIMENSION and IMAGE_MAX_OUTPUT_MB must be greater than zero"
            ));
        }

        if self.max_files_per_batch == 0 {
            return Err(anyhow::anyhow!("MAX_FILES_PER_BATCH must be at least 1"));
        }

        if self.sweeper_enabled && self.sweeper_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "SWEEPER_INTERVAL_SECS must be greater than zero when the sweeper is enabled"
            ));
        }

        if self.storage_backend == StorageBackend::S3 {
            if self.s3_bucket.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_BUCKET must be set when using S3 storage backend"
                ));
            }
            if self.s3_region.is_none() && self.aws_region.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                ));
            }
        }

        Ok(())
    }
}
