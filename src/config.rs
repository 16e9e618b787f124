use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub token_ttl_hours: i64,
    pub log_level: String,
    pub super_admin: Option<SuperAdminConfig>,
}

/// Credentials for the super admin created on first start.
#[derive(Debug, Clone)]
pub struct SuperAdminConfig {
    pub username: String,
    pub password: String,
    pub email: String,
    /// Kept raw; checked by the bootstrap so a bad value never stops startup.
    pub fingerprint_id: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("VERILOC_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid VERILOC_HOST: {e}"))?;

        let port: u16 = env_or("VERILOC_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid VERILOC_PORT: {e}"))?;

        let cors_origins = parse_list(&env_or("VERILOC_CORS_ORIGINS", "http://localhost:5173"));

        let token_ttl_hours: i64 = env_or("VERILOC_TOKEN_TTL_HOURS", "24")
            .parse()
            .map_err(|e| format!("Invalid VERILOC_TOKEN_TTL_HOURS: {e}"))?;
        if token_ttl_hours <= 0 {
            return Err("VERILOC_TOKEN_TTL_HOURS must be positive".to_string());
        }

        let log_level = env_or("VERILOC_LOG_LEVEL", "info");

        let super_admin = super_admin_from(|key| std::env::var(key).ok());

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            cors_origins,
            token_ttl_hours,
            log_level,
            super_admin,
        })
    }
}

/// All four `SUPER_ADMIN_*` values, or `None` when any is missing.
fn super_admin_from(var: impl Fn(&str) -> Option<String>) -> Option<SuperAdminConfig> {
    Some(SuperAdminConfig {
        username: var("SUPER_ADMIN_USERNAME")?,
        password: var("SUPER_ADMIN_PASSWORD")?,
        email: var("SUPER_ADMIN_EMAIL")?,
        fingerprint_id: var("SUPER_ADMIN_FINGERPRINT_ID")?,
    })
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
