/// Configuration management for Photo Service
///
/// Settings are read from environment variables (a `.env` file is loaded by
/// the binary first) into typed sections with development defaults.
use db_pool::env_utils::{parse_env_bool, parse_env_with_default};
use db_pool::DbConfig;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Uploaded media storage
    pub media: MediaConfig,
    /// Reverse geocoding client
    pub geocoder: GeocoderConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Fallback URL when db-pool finds no `DATABASE_URL`; pool sizing is
    /// read by `db_pool::DbConfig::from_env`
    pub url: String,
}

impl DatabaseConfig {
    /// Pool settings from the `DB_*` variables, falling back to `url` when
    /// `DATABASE_URL` is unset
    pub fn pool_config(&self, service_name: &str) -> DbConfig {
        let mut db_cfg = DbConfig::from_env(service_name);
        if db_cfg.database_url.is_empty() {
            db_cfg.database_url = self.url.clone();
        }
        db_cfg
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded images are written under
    pub root: String,
    /// Public prefix joined with the stored file reference
    pub url: String,
    /// Largest accepted image part, in bytes
    pub max_upload_bytes: usize,
    /// Most image parts accepted in one post
    pub max_upload_files: usize,
    /// Cap on all parts of one form together, in bytes
    pub max_form_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    pub enabled: bool,
    pub base_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("PHOTO_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_with_default("PHOTO_SERVICE_PORT", 8000),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/photos".to_string()),
            },
            media: MediaConfig {
                root: std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string()),
                url: normalize_media_url(
                    &std::env::var("MEDIA_URL").unwrap_or_else(|_| "/media/".to_string()),
                ),
                max_upload_bytes: parse_env_with_default("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
                max_upload_files: parse_env_with_default("MAX_UPLOAD_FILES", 100),
                max_form_bytes: parse_env_with_default("MAX_FORM_BYTES", 50 * 1024 * 1024),
            },
            geocoder: GeocoderConfig {
                enabled: parse_env_bool("GEOCODER_ENABLED", true),
                base_url: std::env::var("GEOCODER_BASE_URL")
                    .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                user_agent: std::env::var("GEOCODER_USER_AGENT")
                    .unwrap_or_else(|_| "photo_social_app".to_string()),
                timeout_ms: parse_env_with_default("GEOCODER_TIMEOUT_MS", 30_000),
            },
        })
    }
}

fn normalize_media_url(raw: &str) -> String {
    if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    }
}
