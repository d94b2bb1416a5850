//! Configuration module
//!
//! Env-var based configuration loaded once at startup. Validation happens in
//! `Config::from_env` so a misconfigured process fails fast.

use std::env;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600;
const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 600;

/// Retention window in days for an uploaded file before scheduled deletion.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;
/// Grace window in minutes after a successful transcription before deletion.
pub const DEFAULT_COMPLETED_GRACE_MINUTES: i64 = 30;
/// Maximum transcription attempts per file.
pub const DEFAULT_MAX_RETRIES: i32 = 3;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    // Storage
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    pub max_upload_size_bytes: usize,
    pub audio_allowed_extensions: Vec<String>,
    pub video_allowed_extensions: Vec<String>,
    // Retention policy
    pub retention_days: i64,
    pub completed_grace_minutes: i64,
    pub max_transcription_retries: i32,
    pub cleanup_interval_secs: u64,
    /// Transcriptions stuck in `processing` longer than this are failed by
    /// the watchdog. 0 = disabled.
    pub processing_timeout_secs: u64,
    // Transcription provider
    pub transcription_provider: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base_url: Option<String>,
    /// Shared secret the billing provider signs webhook calls with.
    /// Webhook delivery is rejected when unset.
    pub billing_webhook_secret: Option<String>,
    /// Operator token for admin endpoints (manual cleanup trigger).
    pub admin_api_token: Option<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    env::var(key)
        .map(|s| {
            s.split(',')
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_else(|_| default.iter().map(|s| s.to_string()).collect())
}

impl Config {
    /// Load configuration from environment variables (and .env in development).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters");
        }

        let config = Self {
            server_port: env_or("PORT", DEFAULT_PORT),
            cors_origins: env_list("CORS_ORIGINS", &["http://localhost:3000"]),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECS),
            jwt_secret,
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./data/recordings".to_string()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3001/files".to_string()),
            max_upload_size_bytes: env_or("MAX_UPLOAD_SIZE_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            audio_allowed_extensions: env_list(
                "AUDIO_ALLOWED_EXTENSIONS",
                &["mp3", "wav", "m4a", "ogg", "flac", "webm"],
            ),
            video_allowed_extensions: env_list(
                "VIDEO_ALLOWED_EXTENSIONS",
                &["mp4", "webm", "mov", "avi", "mkv"],
            ),
            retention_days: env_or("RETENTION_DAYS", DEFAULT_RETENTION_DAYS),
            completed_grace_minutes: env_or(
                "COMPLETED_GRACE_MINUTES",
                DEFAULT_COMPLETED_GRACE_MINUTES,
            ),
            max_transcription_retries: env_or("MAX_TRANSCRIPTION_RETRIES", DEFAULT_MAX_RETRIES),
            cleanup_interval_secs: env_or("CLEANUP_INTERVAL_SECS", DEFAULT_CLEANUP_INTERVAL_SECS),
            processing_timeout_secs: env_or(
                "PROCESSING_TIMEOUT_SECS",
                DEFAULT_PROCESSING_TIMEOUT_SECS,
            ),
            transcription_provider: env::var("TRANSCRIPTION_PROVIDER")
                .unwrap_or_else(|_| "mock".to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            gemini_api_base_url: env::var("GEMINI_API_BASE_URL").ok(),
            billing_webhook_secret: env::var("BILLING_WEBHOOK_SECRET").ok(),
            admin_api_token: env::var("ADMIN_API_TOKEN").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.retention_days < 1 {
            anyhow::bail!("RETENTION_DAYS must be at least 1");
        }
        if self.max_transcription_retries < 1 {
            anyhow::bail!("MAX_TRANSCRIPTION_RETRIES must be at least 1");
        }
        if self.transcription_provider == "gemini" && self.gemini_api_key.is_none() {
            anyhow::bail!("GEMINI_API_KEY must be set when TRANSCRIPTION_PROVIDER=gemini");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 3001,
            cors_origins: vec!["http://localhost:3000".to_string()],
            environment: "development".to_string(),
            database_url: "postgres://localhost/voxpost".to_string(),
            db_max_connections: 20,
            db_timeout_seconds: 30,
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            local_storage_path: "./data/recordings".to_string(),
            local_storage_base_url: "http://localhost:3001/files".to_string(),
            max_upload_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            audio_allowed_extensions: vec!["mp3".to_string()],
            video_allowed_extensions: vec!["mp4".to_string()],
            retention_days: DEFAULT_RETENTION_DAYS,
            completed_grace_minutes: DEFAULT_COMPLETED_GRACE_MINUTES,
            max_transcription_retries: DEFAULT_MAX_RETRIES,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
            processing_timeout_secs: DEFAULT_PROCESSING_TIMEOUT_SECS,
            transcription_provider: "mock".to_string(),
            gemini_api_key: None,
            gemini_api_base_url: None,
            billing_webhook_secret: None,
            admin_api_token: None,
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_retention() {
        let mut config = base_config();
        config.retention_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_gemini_key() {
        let mut config = base_config();
        config.transcription_provider = "gemini".to_string();
        assert!(config.validate().is_err());
        config.gemini_api_key = Some("key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_production() {
        let mut config = base_config();
        assert!(!config.is_production());
        config.environment = "production".to_string();
        assert!(config.is_production());
    }
}
