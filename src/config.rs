use std::str::FromStr;

use serde::Deserialize;

use crate::auth::password::BCRYPT_COST;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    /// Origin allowed by CORS; permissive when unset.
    pub frontend_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub password_hash_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => database_url_from_parts(
                &env_or("DB_HOST", "localhost".to_string()),
                &env_or("DB_USER", "postgres".to_string()),
                &env_or("DB_PASSWORD", String::new()),
                &env_or("DB_NAME", "meeple_guild".to_string()),
            ),
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            issuer: env_or("JWT_ISSUER", "meeple-guild".to_string()),
            audience: env_or("JWT_AUDIENCE", "meeple-guild-web".to_string()),
            ttl_hours: env_or("JWT_TTL_HOURS", 24),
        };
        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("APP_PORT"))
            .ok();

        Ok(Self {
            database_url,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            jwt,
            frontend_url: std::env::var("FRONTEND_URL").ok().filter(|v| !v.is_empty()),
            host: env_or("APP_HOST", "0.0.0.0".to_string()),
            port: parse_or(port, 5000),
            password_hash_cost: env_or("PASSWORD_HASH_COST", BCRYPT_COST),
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(std::env::var(key).ok(), default)
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

fn database_url_from_parts(host: &str, user: &str, password: &str, name: &str) -> String {
    if password.is_empty() {
        format!("postgres://{user}@{host}/{name}")
    } else {
        format!("postgres://{user}:{password}@{host}/{name}")
    }
}
