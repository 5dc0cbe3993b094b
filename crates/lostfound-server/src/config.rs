//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.  The default admin credentials and
//! JWT secret are development-only; `main` warns loudly when they are used.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Development fallback for `JWT_SECRET`.
pub const DEV_JWT_SECRET: &str = "lostfound-dev-secret";

/// Development fallback for `ADMIN_PW`.
pub const DEV_ADMIN_PASSWORD: &str = "changeme";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:4000`
    pub http_addr: SocketAddr,

    /// Explicit SQLite database file path.
    /// Env: `DB_PATH`
    /// Default: unset (platform data directory).
    pub db_path: Option<PathBuf>,

    /// Filesystem path where uploaded images are stored and served from.
    /// Env: `UPLOAD_DIR`
    /// Default: `./uploads`
    pub upload_dir: PathBuf,

    /// Maximum uploaded image size in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 3 MiB (documents embedding the path stay small).
    pub max_upload_size: usize,

    /// HMAC secret for signing admin tokens.
    /// Env: `JWT_SECRET`
    /// Default: [`DEV_JWT_SECRET`] (development only).
    pub jwt_secret: String,

    /// Static admin login id.
    /// Env: `ADMIN_ID`
    /// Default: `admin`
    pub admin_id: String,

    /// Static admin password.
    /// Env: `ADMIN_PW`
    /// Default: [`DEV_ADMIN_PASSWORD`] (development only).
    pub admin_password: String,

    /// Origins allowed by CORS, comma-separated in the env var.
    /// Env: `CORS_ORIGINS`
    /// Default: local dev origins plus the hosted frontend.
    pub cors_origins: Vec<String>,

    /// Escape hatch that disables the CORS allow-list entirely.
    /// Env: `CORS_ALLOW_ALL` (`1` to enable)
    /// Default: `false`
    pub cors_allow_all: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 4000).into(),
            db_path: None,
            upload_dir: PathBuf::from("./uploads"),
            max_upload_size: 3 * 1024 * 1024, // 3 MiB
            jwt_secret: DEV_JWT_SECRET.to_string(),
            admin_id: "admin".to_string(),
            admin_password: DEV_ADMIN_PASSWORD.to_string(),
            cors_origins: vec![
                "http://127.0.0.1:5500".to_string(),
                "http://localhost:5500".to_string(),
                "https://ho109.github.io".to_string(),
            ],
            cors_allow_all: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Ok(path) = std::env::var("DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(path);
        }

        if let Ok(val) = std::env::var("MAX_UPLOAD_SIZE") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_upload_size = n;
            } else {
                tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default");
            }
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                config.jwt_secret = secret;
            }
        }

        if let Ok(id) = std::env::var("ADMIN_ID") {
            if !id.is_empty() {
                config.admin_id = id;
            }
        }

        if let Ok(pw) = std::env::var("ADMIN_PW") {
            if !pw.is_empty() {
                config.admin_password = pw;
            }
        }

        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            let parsed: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !parsed.is_empty() {
                config.cors_origins = parsed;
            }
        }

        if let Ok(val) = std::env::var("CORS_ALLOW_ALL") {
            config.cors_allow_all = val == "1" || val == "true";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 4000).into());
        assert_eq!(config.max_upload_size, 3 * 1024 * 1024);
        assert!(!config.cors_allow_all);
        // zero-config deployments must keep serving the hosted frontend
        assert!(config
            .cors_origins
            .iter()
            .any(|o| o == "https://ho109.github.io"));
    }
}
