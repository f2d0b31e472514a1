/*
 * Responsibility
 * - Load settings from the environment (.env is honoured via dotenvy)
 * - Validate them up front so a misconfigured process fails at startup
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Minimum secret length accepted in production (HS256 key size).
const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_SECONDS: u64 = 72 * 60 * 60;
const DEFAULT_CORS_ORIGIN: &str = "https://wallet-log.vercel.app";

/// Argon2 cost knobs. `None` keeps the argon2 crate defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashingConfig {
    pub memory_kib: Option<u32>,
    pub iterations: Option<u32>,
    pub parallelism: Option<u32>,
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: Option<String>,
    pub database_max_connections: u32,

    pub cors_allowed_origins: Vec<String>,
    pub request_body_limit_bytes: usize,
    pub request_timeout: Duration,

    // Signing secret for identity tokens; injected into TokenService
    pub jwt_secret: String,
    pub token_ttl_seconds: u64,

    pub hashing: HashingConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // secret and database url stay out of logs
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("database", &self.database_url.as_ref().map(|_| "postgres"))
            .field("database_max_connections", &self.database_max_connections)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("request_body_limit_bytes", &self.request_body_limit_bytes)
            .field("request_timeout", &self.request_timeout)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("hashing", &self.hashing)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => DEFAULT_PORT,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = lookup("APP_ENV")
            .map(|raw| AppEnv::parse(&raw))
            .unwrap_or(AppEnv::Development);

        let database_url = lookup("DATABASE_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_body_limit_bytes =
            parse_or(&lookup, "REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let request_timeout =
            Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?);

        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.is_empty()
            || (app_env.is_production() && jwt_secret.len() < MIN_PRODUCTION_SECRET_BYTES)
        {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let token_ttl_seconds =
            parse_or(&lookup, "TOKEN_TTL_SECONDS", DEFAULT_TOKEN_TTL_SECONDS)?;
        if token_ttl_seconds == 0 {
            return Err(ConfigError::Invalid("TOKEN_TTL_SECONDS"));
        }

        let hashing = HashingConfig {
            memory_kib: parse_opt(&lookup, "ARGON2_MEMORY_KIB")?,
            iterations: parse_opt(&lookup, "ARGON2_ITERATIONS")?,
            parallelism: parse_opt(&lookup, "ARGON2_PARALLELISM")?,
        };

        Ok(Self {
            addr,
            app_env,
            database_url,
            database_max_connections,
            cors_allowed_origins,
            request_body_limit_bytes,
            request_timeout,
            jwt_secret,
            token_ttl_seconds,
            hashing,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self::from_lookup(|key| (key == "JWT_SECRET").then(|| "test-secret".to_string()))
            .unwrap_or_else(|e| panic!("test config: {e}"))
    }
}

fn parse_opt<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid(key)))
        .transpose()
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "dev-secret")])).unwrap();

        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.token_ttl_seconds, 259_200);
        assert!(config.database_url.is_none());
        assert_eq!(config.cors_allowed_origins, vec![DEFAULT_CORS_ORIGIN.to_string()]);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_secret_fails_startup() {
        let err = Config::from_lookup(lookup(&[])).err().unwrap();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn production_rejects_short_secret() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "short"), ("APP_ENV", "prod")]))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Invalid("JWT_SECRET")));
    }

    #[test]
    fn malformed_port_is_reported() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("PORT", "eighty")]))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Invalid("PORT")));
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s"),
            ("CORS_ALLOWED_ORIGINS", " https://a.example , ,https://b.example"),
            ("DATABASE_URL", "  "),
        ]))
        .unwrap();

        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(config.database_url.is_none());
    }
}
