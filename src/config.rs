use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to_admin: String,
    pub use_tls: bool,
    pub use_ssl: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub upload_dir: String,
    pub status_check_interval_minutes: u64,
    pub status_check_timeout_secs: u64,
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 30),
        };
        let email = EmailConfig {
            enabled: env_bool("EMAIL_ENABLED", false),
            host: std::env::var("EMAIL_HOST").unwrap_or_else(|_| "localhost".into()),
            port: env_parse("EMAIL_PORT", 587),
            username: std::env::var("EMAIL_USERNAME").unwrap_or_default(),
            password: std::env::var("EMAIL_PASSWORD").unwrap_or_default(),
            from: std::env::var("EMAIL_FROM").unwrap_or_else(|_| "portfolio@localhost".into()),
            to_admin: std::env::var("EMAIL_TO_ADMIN").unwrap_or_default(),
            use_tls: env_bool("EMAIL_USE_TLS", true),
            use_ssl: env_bool("EMAIL_USE_SSL", false),
        };
        Ok(Self {
            database_url,
            jwt,
            email,
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
            status_check_interval_minutes: env_parse("STATUS_CHECK_INTERVAL_MINUTES", 20),
            status_check_timeout_secs: env_parse("STATUS_CHECK_TIMEOUT_SECS", 10),
        })
    }
}
