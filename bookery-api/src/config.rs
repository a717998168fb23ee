/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides a
/// type-safe configuration struct. The struct is built once in `main` and
/// passed down inside the application state; nothing reads the environment
/// after startup.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ALLOWED_ORIGINS`: Comma-separated browser origin allow-list
/// - `UPLOAD_DIR`: Scratch directory for staging uploads (default: /tmp/bookery-uploads)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for token signing (required, min 32 bytes)
/// - `JWT_TTL_HOURS`: Fixed token lifetime in hours (default: 168 = 7 days)
/// - `MEDIA_CLOUD_NAME`: Media host account name (required)
/// - `MEDIA_API_KEY`: Media host API key (required)
/// - `MEDIA_API_SECRET`: Media host API secret (required)
/// - `MEDIA_API_BASE`: Media host API base URL (default: https://api.cloudinary.com)
///
/// # Example
///
/// ```no_run
/// use bookery_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token configuration
    pub jwt: JwtConfig,

    /// Media host configuration
    pub media: MediaConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Browser origins allowed to call the API (storefront + admin dashboard)
    pub cors_origins: Vec<String>,

    /// Scratch directory where multipart uploads are staged
    pub upload_dir: PathBuf,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for token signing
    ///
    /// IMPORTANT: must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Fixed token lifetime in hours
    pub ttl_hours: i64,
}

/// Media host (remote object storage) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Account name, used in upload URLs
    pub cloud_name: String,

    /// API key
    pub api_key: String,

    /// API secret used for request signing
    pub api_secret: String,

    /// API base URL; overridable so tests can point at a local stub
    pub api_base: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or have
    /// invalid values.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp/bookery-uploads"));

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let jwt_ttl_hours = env::var("JWT_TTL_HOURS")
            .unwrap_or_else(|_| "168".to_string())
            .parse::<i64>()?;

        let cloud_name = env::var("MEDIA_CLOUD_NAME")
            .map_err(|_| anyhow::anyhow!("MEDIA_CLOUD_NAME environment variable is required"))?;
        let api_key = env::var("MEDIA_API_KEY")
            .map_err(|_| anyhow::anyhow!("MEDIA_API_KEY environment variable is required"))?;
        let api_secret = env::var("MEDIA_API_SECRET")
            .map_err(|_| anyhow::anyhow!("MEDIA_API_SECRET environment variable is required"))?;
        let api_base = env::var("MEDIA_API_BASE")
            .unwrap_or_else(|_| "https://api.cloudinary.com".to_string());

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                upload_dir,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                ttl_hours: jwt_ttl_hours,
            },
            media: MediaConfig {
                cloud_name,
                api_key,
                api_secret,
                api_base,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec![
                    "https://store.example.com".to_string(),
                    "https://admin.example.com".to_string(),
                ],
                upload_dir: PathBuf::from("/tmp/bookery-uploads"),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                ttl_hours: 168,
            },
            media: MediaConfig {
                cloud_name: "demo".to_string(),
                api_key: "key".to_string(),
                api_secret: "secret".to_string(),
                api_base: "https://api.cloudinary.com".to_string(),
            },
        }
    }

    #[test]
    fn test_bind_address() {
        let config = test_config();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_cors_origins_listed() {
        let config = test_config();
        assert_eq!(config.api.cors_origins.len(), 2);
        assert!(config
            .api
            .cors_origins
            .contains(&"https://admin.example.com".to_string()));
    }
}
