/// Configuration management for the API server
///
/// Configuration is loaded from environment variables (a `.env` file is
/// honored in development). A missing or too-short `JWT_SECRET` is fatal at
/// process start - token signing must never limp along per-request with a
/// bad secret.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 8080)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default: *)
/// - `PUBLIC_BASE_URL`: base URL used in verification links
/// - `PASSWORD_RESET_URL`: frontend URL that consumes reset tokens
/// - `COOKIE_SECURE`: mark auth cookies Secure (default: true)
/// - `JWT_SECRET`: token signing secret, at least 32 bytes (required)
/// - `RESEND_API_KEY`: outbound mail API key (empty disables sending)
/// - `EMAIL_FROM`: From address for outbound mail
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Outbound mail configuration
    pub mail: MailConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins ("*" means permissive, for development)
    pub cors_origins: Vec<String>,

    /// Base URL used when building email verification links
    pub public_base_url: String,

    /// Whether auth cookies carry the Secure attribute
    ///
    /// Only disable behind a dev server that is not on HTTPS.
    pub cookie_secure: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Outbound mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Resend API key; empty string disables sending (sends are logged
    /// and skipped)
    pub resend_api_key: String,

    /// From address for outbound mail
    pub email_from: String,

    /// Frontend URL that consumes password-reset tokens
    pub password_reset_url: String,
}

impl JwtConfig {
    /// Validates the signing secret
    ///
    /// Called during startup; failure here aborts the boot.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }
        Ok(())
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid; the
    /// caller (main) treats that as fatal.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        let resend_api_key = env::var("RESEND_API_KEY").unwrap_or_default();
        let email_from = env::var("EMAIL_FROM")
            .unwrap_or_else(|_| "TaskCamp <noreply@taskcamp.dev>".to_string());
        let password_reset_url = env::var("PASSWORD_RESET_URL")
            .unwrap_or_else(|_| format!("{}/reset-password", public_base_url));

        let config = Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                public_base_url,
                cookie_secure,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            mail: MailConfig {
                resend_api_key,
                email_from,
                password_reset_url,
            },
        };

        config.jwt.validate()?;

        Ok(config)
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
