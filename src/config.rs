use std::net::IpAddr;

use chrono::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub log_level: String,
    /// Include the raw reset token in the forgot-password response.
    pub expose_reset_token: bool,
    pub auth: AuthConfig,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub reset_token_ttl: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("reset_token_ttl", &self.reset_token_ttl)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;
        if jwt_secret.is_empty() {
            return Err("JWT_SECRET must not be empty".to_string());
        }

        let token_ttl = env_hours("JWT_EXPIRES_IN", 24)?;
        let reset_token_ttl = env_hours("RESET_TOKEN_EXPIRES_IN", 24)?;

        let host: IpAddr = env_or("KEYSTONE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid KEYSTONE_HOST: {e}"))?;

        let port: u16 = env_or("KEYSTONE_PORT", "8080")
            .parse()
            .map_err(|e| format!("Invalid KEYSTONE_PORT: {e}"))?;

        let max_body_size: usize = env_or("KEYSTONE_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid KEYSTONE_MAX_BODY_SIZE: {e}"))?;

        let cors_origins = parse_list(&env_or("KEYSTONE_CORS_ORIGINS", ""));

        let log_level = env_or("KEYSTONE_LOG_LEVEL", "info");

        let expose_reset_token = parse_bool(&env_or("KEYSTONE_EXPOSE_RESET_TOKEN", "true"))
            .ok_or_else(|| "Invalid KEYSTONE_EXPOSE_RESET_TOKEN: expected true or false".to_string())?;

        Ok(Config {
            database_url,
            host,
            port,
            max_body_size,
            cors_origins,
            log_level,
            expose_reset_token,
            auth: AuthConfig {
                jwt_secret,
                token_ttl,
                reset_token_ttl,
            },
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_hours(key: &str, default: i64) -> Result<Duration, String> {
    let hours: i64 = env_or(key, &default.to_string())
        .parse()
        .map_err(|e| format!("Invalid {key}: {e}"))?;
    if hours <= 0 {
        return Err(format!("Invalid {key}: must be a positive number of hours"));
    }
    Ok(Duration::hours(hours))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
